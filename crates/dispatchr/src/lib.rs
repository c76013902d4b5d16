// ./crates/dispatchr/src/lib.rs
// Pure request actions: describe the response, let the dispatcher apply it

pub mod body;
pub mod deferred;
pub mod error;
pub mod head;
pub mod response;
pub mod sink;

// Interpreter and loading
pub mod loader;
pub mod runner;

// Axum integration
pub mod axum_sink;
pub mod config;
pub mod layer;
pub mod templates;

// Re-export the core API so actions can just `use dispatchr::*`
pub use body::{Body, ByteStream, Payload, StreamSource};
pub use deferred::{erase, Deferred, Dynamic, RawAction, Returned};
pub use error::{DispatchError, Reason};
pub use head::{CookieOptions, Head, Links, SameSite};
pub use response::{empty, json, next, redirect, render, stream, text, try_json, Response};
pub use sink::Sink;

pub use loader::{resolve_path, ActionSource, CachedSource, Dispatcher, Handler, Registry};
pub use runner::run_action;

pub use axum_sink::{resolve_mime, AxumSink};
pub use config::Config;
pub use layer::Dispatch;
pub use templates::{TemplateEngine, Templates};

// Re-export Axum primitives actions need for convenience
pub use axum;
pub use axum::http::request::Parts;
