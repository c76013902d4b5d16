// File: src/axum_sink.rs
// Purpose: Sink implementation that builds an axum Response

use crate::body::{ByteStream, Payload};
use crate::head::{CookieOptions, Links, SameSite};
use crate::sink::Sink;
use crate::templates::TemplateEngine;
use anyhow::{ensure, Context, Result};
use async_trait::async_trait;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, LINK, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, HeaderName, HeaderValue, StatusCode};
use axum::response::Response;
use cookie::time::Duration;
use cookie::Cookie;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::warn;

// -- Shared helpers --

fn header_name(key: &str) -> Option<HeaderName> {
    match HeaderName::from_bytes(key.as_bytes()) {
        Ok(name) => Some(name),
        Err(err) => {
            warn!(header = key, %err, "skipping invalid header name");
            None
        }
    }
}

fn header_value(value: &str) -> Option<HeaderValue> {
    match HeaderValue::from_str(value) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(value, %err, "skipping invalid header value");
            None
        }
    }
}

/// `json` -> `application/json`, `.jpeg` -> `image/jpeg`; full types pass through.
pub fn resolve_mime(mime: &str) -> String {
    if mime.contains('/') {
        return mime.to_string();
    }
    mime_guess::from_ext(mime.trim_start_matches('.'))
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

impl From<SameSite> for cookie::SameSite {
    fn from(value: SameSite) -> Self {
        match value {
            SameSite::Strict => cookie::SameSite::Strict,
            SameSite::Lax => cookie::SameSite::Lax,
            SameSite::None => cookie::SameSite::None,
        }
    }
}

fn build_cookie(key: &str, value: &str, options: &CookieOptions) -> Cookie<'static> {
    let mut builder = Cookie::build((key.to_string(), value.to_string()))
        .path(options.path.clone().unwrap_or_else(|| "/".to_string()))
        .http_only(options.http_only)
        .secure(options.secure);

    if let Some(domain) = &options.domain {
        builder = builder.domain(domain.clone());
    }
    if let Some(seconds) = options.max_age {
        builder = builder.max_age(Duration::seconds(seconds));
    }
    if let Some(same_site) = options.same_site {
        builder = builder.same_site(same_site.into());
    }

    builder.build()
}

// ============================================================================
// AxumSink
// ============================================================================

/// Accumulates status, headers and body, then turns into an axum
/// [`Response`] with [`AxumSink::into_response`].
///
/// Invalid header names or values are skipped with a warning, the same way
/// the response builders treat them.
pub struct AxumSink<S> {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Body>,
    state: S,
    templates: Option<Arc<dyn TemplateEngine>>,
}

impl<S> AxumSink<S> {
    pub fn new(state: S) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: None,
            state,
            templates: None,
        }
    }

    /// Engine used for `Render` bodies.
    pub fn with_templates(mut self, templates: Arc<dyn TemplateEngine>) -> Self {
        self.templates = Some(templates);
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Whether a body operation has run.
    pub fn is_finished(&self) -> bool {
        self.body.is_some()
    }

    pub fn into_state(self) -> S {
        self.state
    }

    pub fn into_response(self) -> Response {
        let mut response = Response::new(self.body.unwrap_or_else(Body::empty));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }

    fn insert(&mut self, name: HeaderName, value: &str) {
        if let Some(value) = header_value(value) {
            self.headers.insert(name, value);
        }
    }

    fn append(&mut self, name: HeaderName, value: &str) {
        if let Some(value) = header_value(value) {
            self.headers.append(name, value);
        }
    }

    fn default_type(&mut self, mime: &'static str) {
        if !self.headers.contains_key(CONTENT_TYPE) {
            self.headers.insert(CONTENT_TYPE, HeaderValue::from_static(mime));
        }
    }

    fn finish(&mut self, body: Body) -> Result<()> {
        ensure!(self.body.is_none(), "response body was already written");
        self.body = Some(body);
        Ok(())
    }
}

#[async_trait]
impl<S: Clone + Send + 'static> Sink for AxumSink<S> {
    type State = S;

    fn state(&self) -> &S {
        &self.state
    }

    fn replace_state(&mut self, state: S) {
        self.state = state;
    }

    fn status(&mut self, code: u16) -> Result<()> {
        self.status = StatusCode::from_u16(code)
            .with_context(|| format!("invalid status code {code}"))?;
        Ok(())
    }

    fn content_type(&mut self, mime: &str) -> Result<()> {
        self.insert(CONTENT_TYPE, &resolve_mime(mime));
        Ok(())
    }

    fn location(&mut self, url: &str) -> Result<()> {
        self.insert(LOCATION, url);
        Ok(())
    }

    fn links(&mut self, links: &Links) -> Result<()> {
        if links.is_empty() {
            return Ok(());
        }
        let formatted = links
            .iter()
            .map(|(rel, url)| format!("<{url}>; rel=\"{rel}\""))
            .collect::<Vec<_>>()
            .join(", ");
        // Every earlier Link value survives, including appended parts
        let mut values = self
            .headers
            .get_all(LINK)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(String::from)
            .collect::<Vec<_>>();
        values.push(formatted);
        self.insert(LINK, &values.join(", "));
        Ok(())
    }

    fn cookie(&mut self, key: &str, value: &str, options: &CookieOptions) -> Result<()> {
        let cookie = build_cookie(key, value, options);
        self.append(SET_COOKIE, &cookie.to_string());
        Ok(())
    }

    fn clear_cookie(&mut self, key: &str, options: &CookieOptions) -> Result<()> {
        let mut cookie = build_cookie(key, "", options);
        cookie.make_removal();
        self.append(SET_COOKIE, &cookie.to_string());
        Ok(())
    }

    fn append_header(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(name) = header_name(key) {
            self.append(name, value);
        }
        Ok(())
    }

    fn set_header(&mut self, key: &str, value: &str) -> Result<()> {
        if let Some(name) = header_name(key) {
            self.insert(name, value);
        }
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.finish(Body::empty())
    }

    fn send(&mut self, payload: Payload) -> Result<()> {
        match &payload {
            Payload::Text(_) => self.default_type("text/html; charset=utf-8"),
            Payload::Bytes(_) => self.default_type("application/octet-stream"),
        }
        self.finish(Body::from(payload.into_bytes()))
    }

    fn json(&mut self, value: &Value) -> Result<()> {
        let bytes = serde_json::to_vec(value).context("failed to serialize JSON body")?;
        self.default_type("application/json");
        self.finish(Body::from(bytes))
    }

    async fn pipe(&mut self, stream: ByteStream) -> Result<()> {
        self.finish(Body::from_stream(stream))
    }

    fn render(&mut self, template: &str, data: &Map<String, Value>) -> Result<()> {
        let engine = self
            .templates
            .as_ref()
            .context("no template engine configured for render")?;
        let html = engine.render(template, data)?;
        self.default_type("text/html; charset=utf-8");
        self.finish(Body::from(html))
    }
}
