// File: src/sink.rs
// Purpose: The mutable response object the dispatcher drives

use crate::body::{ByteStream, Payload};
use crate::head::{CookieOptions, Links};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Outgoing response plus the shared state attached to it.
///
/// One sink belongs to one request. The dispatcher calls one method per head
/// entry in order, then exactly one body method (`end`, `send`, `json`,
/// `pipe` or `render`). Conflicts between entries, such as two `set_header`
/// calls for the same key, are resolved by the sink.
#[async_trait]
pub trait Sink: Send {
    /// Shared state carried from handler to handler.
    type State: Clone + Send + 'static;

    fn state(&self) -> &Self::State;

    fn replace_state(&mut self, state: Self::State);

    fn status(&mut self, code: u16) -> Result<()>;

    /// `mime` is a full type (`image/jpeg`) or a bare extension (`jpeg`, `.jpeg`).
    fn content_type(&mut self, mime: &str) -> Result<()>;

    fn location(&mut self, url: &str) -> Result<()>;

    fn links(&mut self, links: &Links) -> Result<()>;

    fn cookie(&mut self, key: &str, value: &str, options: &CookieOptions) -> Result<()>;

    fn clear_cookie(&mut self, key: &str, options: &CookieOptions) -> Result<()>;

    fn append_header(&mut self, key: &str, value: &str) -> Result<()>;

    fn set_header(&mut self, key: &str, value: &str) -> Result<()>;

    /// Finish without a body.
    fn end(&mut self) -> Result<()>;

    fn send(&mut self, payload: Payload) -> Result<()>;

    fn json(&mut self, value: &Value) -> Result<()>;

    async fn pipe(&mut self, stream: ByteStream) -> Result<()>;

    fn render(&mut self, template: &str, data: &Map<String, Value>) -> Result<()>;
}
