// File: src/layer.rs
// Purpose: Run handlers as axum middleware or endpoints

use crate::axum_sink::AxumSink;
use crate::error::{DispatchError, Reason};
use crate::loader::Handler;
use crate::templates::TemplateEngine;
use axum::extract::Request;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::fmt::Debug;
use std::sync::Arc;
use tracing::{debug, error};

/// A handler bound to axum.
///
/// Actions receive the request [`Parts`] and the state found in the request
/// extensions (`S::default()` when absent). A `Next(state)` puts the new
/// state back into the extensions for whoever runs after.
///
/// ```ignore
/// let session = Dispatch::new(dispatcher.dispatch("session"));
/// let app = Router::new()
///     .route("/", get(move |req: Request| welcome.clone().respond(req)))
///     .layer(from_fn(move |req: Request, next: Next| session.clone().handle(req, next)));
/// ```
pub struct Dispatch<S> {
    handler: Handler<Parts, S>,
    templates: Option<Arc<dyn TemplateEngine>>,
}

impl<S> Clone for Dispatch<S> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            templates: self.templates.clone(),
        }
    }
}

enum Outcome<S> {
    Responded(AxumSink<S>),
    Continue(S),
    Failed(Reason),
    Crashed(DispatchError),
}

impl<S> Dispatch<S>
where
    S: Clone + Default + Debug + Send + Sync + 'static,
{
    pub fn new(handler: Handler<Parts, S>) -> Self {
        Self {
            handler,
            templates: None,
        }
    }

    pub fn with_templates(mut self, templates: Arc<dyn TemplateEngine>) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn name(&self) -> &str {
        self.handler.name()
    }

    async fn execute(&self, parts: &Parts) -> Outcome<S> {
        let state = parts.extensions.get::<S>().cloned().unwrap_or_default();
        let mut sink = AxumSink::new(state);
        if let Some(templates) = &self.templates {
            sink = sink.with_templates(templates.clone());
        }

        let mut proceeded: Option<Option<Reason>> = None;
        let result = self
            .handler
            .call(parts.clone(), &mut sink, |reason| proceeded = Some(reason))
            .await;

        match (result, proceeded) {
            (Err(err), _) => Outcome::Crashed(err),
            (Ok(()), Some(Some(reason))) => Outcome::Failed(reason),
            (Ok(()), Some(None)) => Outcome::Continue(sink.into_state()),
            (Ok(()), None) => Outcome::Responded(sink),
        }
    }

    /// Middleware: respond, or pass the request on with the updated state.
    pub async fn handle(self, request: Request, next: Next) -> Response {
        let (mut parts, body) = request.into_parts();
        match self.execute(&parts).await {
            Outcome::Responded(sink) => sink.into_response(),
            Outcome::Continue(state) => {
                debug!(action = self.name(), "passing request on");
                parts.extensions.insert(state);
                next.run(Request::from_parts(parts, body)).await
            }
            Outcome::Failed(reason) => failure(self.name(), reason),
            Outcome::Crashed(err) => crash(err),
        }
    }

    /// Endpoint: like [`Dispatch::handle`], but nothing runs after, so a
    /// `Next` ends in 404.
    pub async fn respond(self, request: Request) -> Response {
        let (parts, _body) = request.into_parts();
        match self.execute(&parts).await {
            Outcome::Responded(sink) => sink.into_response(),
            Outcome::Continue(_) => {
                debug!(action = self.name(), "nothing left to handle the request");
                StatusCode::NOT_FOUND.into_response()
            }
            Outcome::Failed(reason) => failure(self.name(), reason),
            Outcome::Crashed(err) => crash(err),
        }
    }
}

fn failure(action: &str, reason: Reason) -> Response {
    error!(action, error = %format!("{:#}", reason), "action failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

fn crash(err: DispatchError) -> Response {
    error!(action = err.action(), error = %err, "dispatch failed");
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}
