// File: src/response.rs
// Purpose: The Response description and its builder combinators

use crate::body::{into_template_data, Body, Payload, StreamSource};
use crate::head::{CookieOptions, Head, Links};
use serde::Serialize;
use serde_json::Value;

/// What an action wants done with the outgoing response.
///
/// A `Response` is plain data: building one has no side effects. The
/// dispatcher applies it to a [`Sink`](crate::Sink) exactly once.
#[derive(Debug, Clone, PartialEq)]
pub enum Response<S> {
    /// Write `heads` in order, then exactly one `body`.
    Respond { heads: Vec<Head>, body: Body },
    /// Don't respond; hand the new shared state to the next handler.
    Next(S),
}

// ============================================================================
// Constructors
// ============================================================================

/// Stream the bytes produced by `source`.
pub fn stream<S>(source: StreamSource) -> Response<S> {
    Response::Respond {
        heads: Vec::new(),
        body: Body::Stream(source),
    }
}

/// Send a raw payload. Accepts `String`, `&str`, `Bytes` or `Vec<u8>`.
pub fn text<S>(value: impl Into<Payload>) -> Response<S> {
    Response::Respond {
        heads: Vec::new(),
        body: Body::Send(value.into()),
    }
}

/// Send `value` as JSON.
pub fn json<S>(value: impl Into<Value>) -> Response<S> {
    Response::Respond {
        heads: Vec::new(),
        body: Body::Json(value.into()),
    }
}

/// Serialize `value` and send it as JSON.
pub fn try_json<S, T: Serialize>(value: &T) -> Result<Response<S>, serde_json::Error> {
    serde_json::to_value(value).map(|value| json(value))
}

/// Render `template` with `data`. Non-object data is wrapped as `{"data": ..}`.
pub fn render<S>(template: impl Into<String>, data: impl Into<Value>) -> Response<S> {
    Response::Respond {
        heads: Vec::new(),
        body: Body::Render {
            template: template.into(),
            data: into_template_data(data.into()),
        },
    }
}

/// Permanent redirect (301) to `url`.
pub fn redirect<S>(url: impl Into<String>) -> Response<S> {
    Response::Respond {
        heads: vec![Head::Status(301), Head::Location(url.into())],
        body: Body::None,
    }
}

/// 204 with no body.
pub fn empty<S>() -> Response<S> {
    Response::Respond {
        heads: vec![Head::Status(204)],
        body: Body::None,
    }
}

/// Pass through to the next handler with `state`.
pub fn next<S>(state: S) -> Response<S> {
    Response::Next(state)
}

// ============================================================================
// Combinators
// ============================================================================

impl<S> Response<S> {
    /// Append a head entry. `Next` passes through untouched.
    pub fn with_head(self, head: Head) -> Self {
        match self {
            Response::Respond { mut heads, body } => {
                heads.push(head);
                Response::Respond { heads, body }
            }
            next @ Response::Next(_) => next,
        }
    }

    pub fn with_status(self, code: u16) -> Self {
        self.with_head(Head::Status(code))
    }

    /// Set the content type. Bare extensions such as `json` or `.jpeg` are
    /// resolved by the sink.
    pub fn with_type(self, mime: impl Into<String>) -> Self {
        self.with_head(Head::Type(mime.into()))
    }

    pub fn with_location(self, url: impl Into<String>) -> Self {
        self.with_head(Head::Location(url.into()))
    }

    pub fn with_links(self, links: Links) -> Self {
        self.with_head(Head::Links(links))
    }

    pub fn with_cookie(
        self,
        options: CookieOptions,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.with_head(Head::Cookie {
            key: key.into(),
            value: value.into(),
            options,
        })
    }

    pub fn with_clear_cookie(self, options: CookieOptions, key: impl Into<String>) -> Self {
        self.with_head(Head::ClearCookie {
            key: key.into(),
            options,
        })
    }

    /// Add a value to a header, keeping earlier values.
    pub fn with_header_part(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_head(Head::HeaderPart {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Set a header, replacing earlier values.
    pub fn with_header(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.with_head(Head::Header {
            key: key.into(),
            value: value.into(),
        })
    }

    /// Drop every head entry that writes to header `name` (case-insensitive).
    /// Status entries are never removed.
    pub fn without_header(self, name: &str) -> Self {
        match self {
            Response::Respond { heads, body } => Response::Respond {
                heads: heads
                    .into_iter()
                    .filter(|head| !head.writes_header(name))
                    .collect(),
                body,
            },
            next @ Response::Next(_) => next,
        }
    }

    pub fn is_next(&self) -> bool {
        matches!(self, Response::Next(_))
    }

    /// Head entries in application order. Empty for `Next`.
    pub fn heads(&self) -> &[Head] {
        match self {
            Response::Respond { heads, .. } => heads,
            Response::Next(_) => &[],
        }
    }

    pub fn body(&self) -> Option<&Body> {
        match self {
            Response::Respond { body, .. } => Some(body),
            Response::Next(_) => None,
        }
    }
}
