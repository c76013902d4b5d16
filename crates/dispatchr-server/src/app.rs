// File: src/app.rs
// Purpose: Build the demo router from configuration

use crate::actions::{self, Locals};
use axum::extract::Request;
use axum::middleware::{from_fn, Next};
use axum::routing::get;
use axum::Router;
use dispatchr::{
    resolve_path, ActionSource, CachedSource, Config, Dispatch, Dispatcher, Parts, Registry,
    TemplateEngine, Templates,
};
use std::sync::Arc;
use tracing::info;

/// Registry of the demo actions, keyed under the configured actions directory.
pub fn registry(config: &Config) -> Registry<Parts, Locals> {
    let dir = &config.actions.dir;
    Registry::new()
        .with_action(resolve_path(dir, "session"), actions::session)
        .with_action(resolve_path(dir, "welcome"), actions::welcome)
        .with_action(resolve_path(dir, "welcome_json"), actions::welcome_json)
        .with_action(
            resolve_path(dir, "image"),
            actions::image(&config.server.public_dir),
        )
}

pub fn build_app(config: &Config) -> Router {
    let registry: Arc<dyn ActionSource<Parts, Locals>> = Arc::new(registry(config));
    let source: Arc<dyn ActionSource<Parts, Locals>> = if config.actions.cache {
        Arc::new(CachedSource::new(registry))
    } else {
        registry
    };
    let dispatcher = Dispatcher::new(&config.actions.dir, source);

    let templates: Arc<dyn TemplateEngine> = Arc::new(
        Templates::new(&config.views.dir).with_extension(&config.views.extension),
    );
    let dispatch = |file: &str| Dispatch::new(dispatcher.dispatch(file)).with_templates(templates.clone());

    let session = dispatch("session");
    let welcome = dispatch("welcome");
    let welcome_json = dispatch("welcome_json");
    let image = dispatch("image");

    info!(
        actions = %config.actions.dir,
        views = %config.views.dir,
        cache = config.actions.cache,
        "dispatcher ready"
    );

    Router::new()
        .route("/", get(move |req: Request| welcome.clone().respond(req)))
        .route("/json", get(move |req: Request| welcome_json.clone().respond(req)))
        .route("/image", get(move |req: Request| image.clone().respond(req)))
        .layer(from_fn(move |req: Request, next: Next| {
            session.clone().handle(req, next)
        }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, StatusCode};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    struct Fixture {
        root: std::path::PathBuf,
        config: Config,
    }

    impl Fixture {
        fn new(name: &str) -> Self {
            let root = std::env::temp_dir().join(format!("dispatchr-{}-{}", name, std::process::id()));
            std::fs::create_dir_all(root.join("views")).unwrap();
            std::fs::create_dir_all(root.join("public")).unwrap();
            std::fs::write(root.join("views/index.html"), "<h1>Welcome, {user}</h1>").unwrap();
            std::fs::write(root.join("public/cat.jpeg"), b"\xff\xd8jpeg").unwrap();

            let mut config = Config::default();
            config.views.dir = root.join("views").to_string_lossy().into_owned();
            config.server.public_dir = root.join("public").to_string_lossy().into_owned();
            Self { root, config }
        }
    }

    impl Drop for Fixture {
        fn drop(&mut self) {
            std::fs::remove_dir_all(&self.root).ok();
        }
    }

    async fn send(config: &Config, uri: &str, user: Option<&str>) -> axum::response::Response {
        let mut builder = axum::http::Request::builder().uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-authenticated-user", user);
        }
        build_app(config)
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    async fn body_bytes(response: axum::response::Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX).await.unwrap().to_vec()
    }

    #[tokio::test]
    async fn test_welcome_renders_session_user() {
        let fixture = Fixture::new("welcome");

        let response = send(&fixture.config, "/", Some("42")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, b"<h1>Welcome, user 42</h1>".to_vec());

        let response = send(&fixture.config, "/", None).await;
        assert_eq!(body_bytes(response).await, b"<h1>Welcome, stranger</h1>".to_vec());
    }

    #[tokio::test]
    async fn test_welcome_json() {
        let fixture = Fixture::new("json");

        let response = send(&fixture.config, "/json", Some("42")).await;
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(body_bytes(response).await, br#"{"welcome":"user 42"}"#.to_vec());
    }

    #[tokio::test]
    async fn test_image_streams_jpeg() {
        let fixture = Fixture::new("image");

        let response = send(&fixture.config, "/image?file=cat.jpeg", None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
        assert_eq!(body_bytes(response).await, b"\xff\xd8jpeg".to_vec());
    }

    #[tokio::test]
    async fn test_image_validation_failure_is_server_error() {
        let fixture = Fixture::new("image-invalid");

        let response = send(&fixture.config, "/image?file=cat.png", None).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_registry_uses_actions_dir() {
        let mut config = Config::default();
        config.actions.dir = "./app/actions".to_string();

        let registry = registry(&config);
        assert_eq!(registry.len(), 4);
        assert!(registry
            .paths()
            .any(|path| path == std::path::Path::new("app/actions/welcome_json")));
    }
}
