// File: src/deferred.rs
// Purpose: Type-erased action results checked by the dispatcher at runtime

use crate::error::Reason;
use crate::response::Response;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::any::Any;
use std::fmt::{self, Debug};
use std::future::Future;
use std::sync::Arc;

/// Any value an erased action can hand back. Debug is kept so contract
/// violations can echo what was actually returned.
pub trait Dynamic: Any + Debug + Send {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T: Any + Debug + Send> Dynamic for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}

/// What an erased action returns. Must hold a [`Deferred`].
pub type Returned = Box<dyn Dynamic>;

/// A computation that has not run yet. Settles once, with a value or a
/// failure [`Reason`].
pub struct Deferred(BoxFuture<'static, Result<Returned, Reason>>);

impl Deferred {
    pub fn new<F, T, E>(future: F) -> Self
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Dynamic,
        E: Into<Reason> + 'static,
    {
        Self(
            async move {
                future
                    .await
                    .map(|value| Box::new(value) as Returned)
                    .map_err(Into::into)
            }
            .boxed(),
        )
    }

    /// Settles successfully with `value`.
    pub fn resolve<T: Dynamic>(value: T) -> Self {
        Self::new(async move { Ok::<_, Reason>(value) })
    }

    /// Settles with a failure.
    pub fn reject(reason: impl Into<Reason>) -> Self {
        let reason = reason.into();
        Self(async move { Err(reason) }.boxed())
    }

    pub(crate) async fn settle(self) -> Result<Returned, Reason> {
        self.0.await
    }
}

impl Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Deferred(..)")
    }
}

/// An action with its types erased, as produced by loaders.
///
/// Called with the request and a copy of the shared state; the dispatcher
/// checks at runtime that it returned a `Deferred` settling to a
/// `Response<S>`.
pub type RawAction<Req, S> = Arc<dyn Fn(Req, S) -> Returned + Send + Sync>;

/// Erase a typed async action.
///
/// ```ignore
/// let action = erase(|_req: Parts, locals: Locals| async move {
///     Ok::<_, anyhow::Error>(json(serde_json::json!({ "user": locals.user })))
/// });
/// ```
pub fn erase<Req, S, F, Fut, E>(action: F) -> RawAction<Req, S>
where
    F: Fn(Req, S) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response<S>, E>> + Send + 'static,
    E: Into<Reason> + 'static,
    S: Debug + Send + 'static,
{
    Arc::new(move |request: Req, state: S| {
        Box::new(Deferred::new(action(request, state))) as Returned
    })
}

/// Take `value` out of its box if it is a `T`, otherwise describe it.
pub(crate) fn downcast<T: Any>(value: Returned) -> Result<T, String> {
    if !(*value).as_any().is::<T>() {
        return Err(format!("{:?}", value));
    }
    value
        .into_any()
        .downcast::<T>()
        .map(|boxed| *boxed)
        .map_err(|_| "<unknown>".to_string())
}
