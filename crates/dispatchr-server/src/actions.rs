// File: src/actions.rs
// Purpose: Demo actions served by dispatchr-server

use anyhow::anyhow;
use axum::extract::Query;
use dispatchr::{json, next, render, stream, Parts, Reason, Response, StreamSource};
use serde::Deserialize;
use serde_json::json as value;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use tokio::fs::File;
use tokio_util::io::ReaderStream;

/// Who is making the request, if anyone
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub id: Option<String>,
}

/// State shared between the session middleware and the endpoints
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Locals {
    pub session: Session,
}

impl Locals {
    fn display_name(&self) -> String {
        match &self.session.id {
            Some(id) => format!("user {}", id),
            None => "stranger".to_string(),
        }
    }
}

/// Reads the session from the `x-authenticated-user` header and passes on.
pub async fn session(parts: Parts, mut locals: Locals) -> Result<Response<Locals>, Reason> {
    locals.session.id = parts
        .headers
        .get("x-authenticated-user")
        .and_then(|value| value.to_str().ok())
        .map(String::from);
    Ok(next(locals))
}

pub async fn welcome(_parts: Parts, locals: Locals) -> Result<Response<Locals>, Reason> {
    Ok(render("index", value!({ "user": locals.display_name() })))
}

pub async fn welcome_json(_parts: Parts, locals: Locals) -> Result<Response<Locals>, Reason> {
    Ok(json(value!({ "welcome": locals.display_name() })))
}

type ActionFuture = Pin<Box<dyn Future<Output = Result<Response<Locals>, Reason>> + Send>>;

#[derive(Debug, Deserialize)]
struct ImageQuery {
    file: Option<String>,
}

/// Streams `?file=<name>.jpeg` out of `public_dir`.
///
/// Only the file name of the query is used, so requests cannot leave
/// `public_dir`.
pub fn image(
    public_dir: impl Into<PathBuf>,
) -> impl Fn(Parts, Locals) -> ActionFuture + Send + Sync + 'static {
    let public_dir = public_dir.into();
    move |parts: Parts, _locals: Locals| {
        let public_dir = public_dir.clone();
        Box::pin(async move { serve_image(&public_dir, &parts).await }) as ActionFuture
    }
}

async fn serve_image(public_dir: &Path, parts: &Parts) -> Result<Response<Locals>, Reason> {
    let requested = Query::<ImageQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(query)| query.file)
        .filter(|file| !file.is_empty())
        .ok_or_else(|| anyhow!("You need to provide a query named \"file\""))?;

    let requested = Path::new(&requested);
    let extension = requested
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext))
        .unwrap_or_default();
    if extension != ".jpeg" {
        return Err(anyhow!("You can only load JPEGs"));
    }

    let file_name = requested
        .file_name()
        .ok_or_else(|| anyhow!("You can only load JPEGs"))?;
    let path = public_dir.join(file_name);

    File::open(&path)
        .await
        .map_err(|_| anyhow!("No read access to the requested file"))?;

    let source = StreamSource::new(move || {
        let path = path.clone();
        async move {
            let file = File::open(&path).await?;
            Ok::<_, std::io::Error>(ReaderStream::new(file))
        }
    });

    Ok(stream(source).with_type(extension))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use dispatchr::{Body, Head};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parts(uri: &str, user: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri(uri);
        if let Some(user) = user {
            builder = builder.header("x-authenticated-user", user);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[tokio::test]
    async fn test_session_reads_header() {
        let response = session(parts("/", Some("7")), Locals::default())
            .await
            .unwrap();
        assert_eq!(
            response,
            next(Locals {
                session: Session {
                    id: Some("7".to_string())
                }
            })
        );
    }

    #[tokio::test]
    async fn test_welcome_json_for_stranger() {
        let response = welcome_json(parts("/json", None), Locals::default())
            .await
            .unwrap();
        assert_eq!(response, json(value!({ "welcome": "stranger" })));
    }

    #[rstest]
    #[case("public", "/image", "You need to provide a query named \"file\"")]
    #[case("public", "/image?file=", "You need to provide a query named \"file\"")]
    #[case("public", "/image?file=notes.txt", "You can only load JPEGs")]
    #[case("public", "/image?file=cat.JPEG", "You can only load JPEGs")]
    #[case("/definitely/not/here", "/image?file=cat.jpeg", "No read access to the requested file")]
    #[tokio::test]
    async fn test_image_rejections(#[case] public_dir: &str, #[case] uri: &str, #[case] message: &str) {
        let err = image(public_dir)(parts(uri, None), Locals::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), message);
    }

    #[tokio::test]
    async fn test_image_streams_with_jpeg_type() {
        let dir = std::env::temp_dir().join(format!("dispatchr-public-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("cat.jpeg"), b"jpeg bytes").unwrap();

        let response = image(&dir)(parts("/image?file=../../cat.jpeg", None), Locals::default())
            .await
            .unwrap();

        assert_eq!(response.heads(), &[Head::Type(".jpeg".to_string())]);
        assert!(matches!(response.body(), Some(Body::Stream(_))));

        std::fs::remove_dir_all(&dir).ok();
    }
}
