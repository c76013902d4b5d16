// File: src/error.rs
// Purpose: Error types for action dispatch

/// Why an action (or a stream producer) failed. Handed to `proceed`.
pub type Reason = anyhow::Error;

/// Failures the dispatcher reports to its caller instead of `proceed`.
///
/// `NotDeferred` and `NotResponse` are programmer errors: the action broke
/// its contract and nothing was written to the sink.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("The \"{action}\" action did not return a Deferred, instead saw:\n\n  {seen}")]
    NotDeferred { action: String, seen: String },

    #[error(
        "The Deferred returned by the \"{action}\" action did not resolve to a Response, instead saw:\n\n  {seen}"
    )]
    NotResponse { action: String, seen: String },

    #[error("Failed to load the \"{action}\" action")]
    Load {
        action: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("The response sink rejected output of the \"{action}\" action")]
    Sink {
        action: String,
        #[source]
        source: anyhow::Error,
    },
}

impl DispatchError {
    /// Name of the action the error belongs to.
    pub fn action(&self) -> &str {
        match self {
            DispatchError::NotDeferred { action, .. }
            | DispatchError::NotResponse { action, .. }
            | DispatchError::Load { action, .. }
            | DispatchError::Sink { action, .. } => action,
        }
    }
}
