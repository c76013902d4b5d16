// File: src/runner.rs
// Purpose: Apply an action's Response description to a sink, exactly once

use crate::body::Body;
use crate::deferred::{downcast, Deferred, RawAction};
use crate::error::{DispatchError, Reason};
use crate::head::Head;
use crate::response::Response;
use crate::sink::Sink;
use std::future::Future;
use tracing::{debug, error};

/// Invoke `action` and apply whatever it settles to.
///
/// The action is called right away; if it did not return a [`Deferred`]
/// this fails before anything is awaited. The returned future then waits for
/// the settlement and:
///
/// - on failure, calls `proceed(Some(reason))`;
/// - on `Next(state)`, replaces the sink's state and calls `proceed(None)`;
/// - on `Respond`, writes every head in order and then the body. A stream
///   body whose producer fails calls `proceed(Some(reason))` instead.
///
/// `proceed` runs at most once. Settling to something other than a
/// `Response` is reported as [`DispatchError::NotResponse`].
pub fn run_action<'a, Req, K, P>(
    name: &'a str,
    action: &RawAction<Req, K::State>,
    request: Req,
    sink: &'a mut K,
    proceed: P,
) -> Result<impl Future<Output = Result<(), DispatchError>> + Send + 'a, DispatchError>
where
    K: Sink,
    P: FnOnce(Option<Reason>) + Send + 'a,
{
    debug!(action = name, "invoking action");
    let deferred = downcast::<Deferred>(action(request, sink.state().clone())).map_err(|seen| {
        error!(action = name, "action did not return a deferred computation");
        DispatchError::NotDeferred {
            action: name.to_string(),
            seen,
        }
    })?;

    Ok(async move {
        let value = match deferred.settle().await {
            Ok(value) => value,
            Err(reason) => {
                debug!(action = name, %reason, "action failed, proceeding with reason");
                proceed(Some(reason));
                return Ok(());
            }
        };

        let response = downcast::<Response<K::State>>(value).map_err(|seen| {
            error!(action = name, "deferred did not resolve to a response");
            DispatchError::NotResponse {
                action: name.to_string(),
                seen,
            }
        })?;

        interpret(name, response, sink, proceed).await
    })
}

async fn interpret<K, P>(
    name: &str,
    response: Response<K::State>,
    sink: &mut K,
    proceed: P,
) -> Result<(), DispatchError>
where
    K: Sink,
    P: FnOnce(Option<Reason>) + Send,
{
    let sink_error = |source: anyhow::Error| DispatchError::Sink {
        action: name.to_string(),
        source,
    };

    match response {
        Response::Next(state) => {
            debug!(action = name, "action passed, proceeding");
            sink.replace_state(state);
            proceed(None);
            Ok(())
        }
        Response::Respond { heads, body } => {
            for head in &heads {
                apply_head(sink, head).map_err(sink_error)?;
            }
            debug!(action = name, heads = heads.len(), "heads applied");

            match body {
                Body::None => sink.end(),
                Body::Send(payload) => sink.send(payload),
                Body::Json(value) => sink.json(&value),
                Body::Render { template, data } => sink.render(&template, &data),
                Body::Stream(source) => match source.open().await {
                    Ok(stream) => sink.pipe(stream).await,
                    Err(reason) => {
                        debug!(action = name, %reason, "stream producer failed, proceeding with reason");
                        proceed(Some(reason));
                        return Ok(());
                    }
                },
            }
            .map_err(sink_error)?;

            debug!(action = name, "body applied");
            Ok(())
        }
    }
}

fn apply_head<K: Sink>(sink: &mut K, head: &Head) -> anyhow::Result<()> {
    match head {
        Head::Status(code) => sink.status(*code),
        Head::Type(mime) => sink.content_type(mime),
        Head::Location(url) => sink.location(url),
        Head::Links(links) => sink.links(links),
        Head::Cookie {
            key,
            value,
            options,
        } => sink.cookie(key, value, options),
        Head::ClearCookie { key, options } => sink.clear_cookie(key, options),
        Head::HeaderPart { key, value } => sink.append_header(key, value),
        Head::Header { key, value } => sink.set_header(key, value),
    }
}
