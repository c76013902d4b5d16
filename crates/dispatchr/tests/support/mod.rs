// Shared fixtures for the integration tests

#![allow(dead_code)]

use anyhow::{bail, Result};
use async_trait::async_trait;
use dispatchr::{ByteStream, CookieOptions, Links, Payload, Sink};
use futures::StreamExt;
use serde_json::{Map, Value};

/// One sink operation, in the order it was performed.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Status(u16),
    Type(String),
    Location(String),
    Links(Links),
    Cookie(String, String, CookieOptions),
    ClearCookie(String, CookieOptions),
    AppendHeader(String, String),
    SetHeader(String, String),
    End,
    Send(Vec<u8>),
    Json(Value),
    Pipe(Vec<u8>),
    Render(String, Map<String, Value>),
}

/// Sink that records every call instead of writing anything.
#[derive(Debug, Default)]
pub struct RecordingSink<S> {
    pub state: S,
    pub calls: Vec<Call>,
    /// When set, `status` fails without recording anything.
    pub reject_status: bool,
}

impl<S> RecordingSink<S> {
    pub fn new(state: S) -> Self {
        Self {
            state,
            calls: Vec::new(),
            reject_status: false,
        }
    }

    pub fn rejecting_status(state: S) -> Self {
        Self {
            reject_status: true,
            ..Self::new(state)
        }
    }
}

#[async_trait]
impl<S: Clone + Send + 'static> Sink for RecordingSink<S> {
    type State = S;

    fn state(&self) -> &S {
        &self.state
    }

    fn replace_state(&mut self, state: S) {
        self.state = state;
    }

    fn status(&mut self, code: u16) -> Result<()> {
        if self.reject_status {
            bail!("status {code} rejected");
        }
        self.calls.push(Call::Status(code));
        Ok(())
    }

    fn content_type(&mut self, mime: &str) -> Result<()> {
        self.calls.push(Call::Type(mime.to_string()));
        Ok(())
    }

    fn location(&mut self, url: &str) -> Result<()> {
        self.calls.push(Call::Location(url.to_string()));
        Ok(())
    }

    fn links(&mut self, links: &Links) -> Result<()> {
        self.calls.push(Call::Links(links.clone()));
        Ok(())
    }

    fn cookie(&mut self, key: &str, value: &str, options: &CookieOptions) -> Result<()> {
        self.calls
            .push(Call::Cookie(key.to_string(), value.to_string(), options.clone()));
        Ok(())
    }

    fn clear_cookie(&mut self, key: &str, options: &CookieOptions) -> Result<()> {
        self.calls
            .push(Call::ClearCookie(key.to_string(), options.clone()));
        Ok(())
    }

    fn append_header(&mut self, key: &str, value: &str) -> Result<()> {
        self.calls
            .push(Call::AppendHeader(key.to_string(), value.to_string()));
        Ok(())
    }

    fn set_header(&mut self, key: &str, value: &str) -> Result<()> {
        self.calls
            .push(Call::SetHeader(key.to_string(), value.to_string()));
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.calls.push(Call::End);
        Ok(())
    }

    fn send(&mut self, payload: Payload) -> Result<()> {
        self.calls.push(Call::Send(payload.into_bytes().to_vec()));
        Ok(())
    }

    fn json(&mut self, value: &Value) -> Result<()> {
        self.calls.push(Call::Json(value.clone()));
        Ok(())
    }

    async fn pipe(&mut self, mut stream: ByteStream) -> Result<()> {
        let mut collected = Vec::new();
        while let Some(chunk) = stream.next().await {
            collected.extend_from_slice(&chunk?);
        }
        self.calls.push(Call::Pipe(collected));
        Ok(())
    }

    fn render(&mut self, template: &str, data: &Map<String, Value>) -> Result<()> {
        self.calls
            .push(Call::Render(template.to_string(), data.clone()));
        Ok(())
    }
}

/// Records what `proceed` was called with.
#[derive(Debug, Default)]
pub struct Proceeded {
    pub calls: Vec<Option<String>>,
}

impl Proceeded {
    pub fn record(&mut self) -> impl FnOnce(Option<dispatchr::Reason>) + Send + '_ {
        move |reason| self.calls.push(reason.map(|r| r.to_string()))
    }
}
