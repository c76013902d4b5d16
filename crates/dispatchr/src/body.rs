// File: src/body.rs
// Purpose: Response payload descriptors

use crate::error::Reason;
use axum::body::Bytes;
use futures::future::BoxFuture;
use futures::stream::{self, BoxStream};
use futures::{FutureExt, Stream, StreamExt};
use serde_json::{Map, Value};
use std::fmt;
use std::future::Future;
use std::io;
use std::sync::Arc;

/// Byte stream piped into the sink by a `Stream` body.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

type Producer = dyn Fn() -> BoxFuture<'static, Result<ByteStream, Reason>> + Send + Sync;

/// Deferred producer of a byte stream.
///
/// Nothing runs until the dispatcher applies the body. The producer may be
/// opened more than once, so a cloned `Response` stays usable.
#[derive(Clone)]
pub struct StreamSource(Arc<Producer>);

impl StreamSource {
    pub fn new<F, Fut, St, E>(produce: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<St, E>> + Send + 'static,
        St: Stream<Item = io::Result<Bytes>> + Send + 'static,
        E: Into<Reason> + 'static,
    {
        Self(Arc::new(
            move || -> BoxFuture<'static, Result<ByteStream, Reason>> {
                let opening = produce();
                async move {
                    opening
                        .await
                        .map(|stream| stream.boxed())
                        .map_err(Into::into)
                }
                .boxed()
            },
        ))
    }

    /// A stream yielding `bytes` as a single chunk.
    pub fn from_bytes(bytes: impl Into<Bytes>) -> Self {
        let bytes = bytes.into();
        Self::new(move || {
            let chunk = bytes.clone();
            async move { Ok::<_, Reason>(stream::iter([Ok::<_, io::Error>(chunk)])) }
        })
    }

    /// Runs the producer.
    pub async fn open(&self) -> Result<ByteStream, Reason> {
        (self.0)().await
    }
}

impl fmt::Debug for StreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StreamSource(..)")
    }
}

/// Producers have no structural identity; two sources are equal when they
/// share the same producer.
impl PartialEq for StreamSource {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

/// Raw payload for a `Send` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Bytes(Bytes),
}

impl Payload {
    pub fn into_bytes(self) -> Bytes {
        match self {
            Payload::Text(text) => Bytes::from(text),
            Payload::Bytes(bytes) => bytes,
        }
    }
}

impl From<String> for Payload {
    fn from(value: String) -> Self {
        Payload::Text(value)
    }
}

impl From<&str> for Payload {
    fn from(value: &str) -> Self {
        Payload::Text(value.to_string())
    }
}

impl From<Bytes> for Payload {
    fn from(value: Bytes) -> Self {
        Payload::Bytes(value)
    }
}

impl From<Vec<u8>> for Payload {
    fn from(value: Vec<u8>) -> Self {
        Payload::Bytes(Bytes::from(value))
    }
}

/// The payload half of a response. Exactly one per response.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    None,
    Send(Payload),
    Json(Value),
    Stream(StreamSource),
    Render {
        template: String,
        data: Map<String, Value>,
    },
}

/// Template data must be an object; anything else is wrapped as `{"data": ..}`.
pub(crate) fn into_template_data(data: Value) -> Map<String, Value> {
    match data {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("data".into(), other);
            map
        }
    }
}
