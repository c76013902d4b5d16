// File: src/loader.rs
// Purpose: Resolve actions by name and wrap them as handlers

use crate::deferred::{erase, RawAction};
use crate::error::{DispatchError, Reason};
use crate::response::Response;
use crate::runner::run_action;
use crate::sink::Sink;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, error};

/// Join `file` onto `directory` and fold `.` and `..` lexically.
/// The file system is never consulted.
pub fn resolve_path(directory: impl AsRef<Path>, file: impl AsRef<Path>) -> PathBuf {
    let mut resolved = PathBuf::new();
    for component in directory.as_ref().join(file).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    resolved.push(component);
                }
            }
            other => resolved.push(other),
        }
    }
    resolved
}

// ============================================================================
// Sources
// ============================================================================

/// Loads the action stored at a resolved path.
#[async_trait]
pub trait ActionSource<Req, S>: Send + Sync {
    async fn load(&self, path: &Path) -> Result<RawAction<Req, S>>;
}

/// In-memory source keyed by resolved path.
pub struct Registry<Req, S> {
    actions: HashMap<PathBuf, RawAction<Req, S>>,
}

impl<Req, S> Registry<Req, S> {
    pub fn new() -> Self {
        Self {
            actions: HashMap::new(),
        }
    }

    /// Register an already erased action (functional builder pattern)
    pub fn with_raw(mut self, path: impl AsRef<Path>, action: RawAction<Req, S>) -> Self {
        self.actions.insert(resolve_path(path, ""), action);
        self
    }

    /// Register a typed async action (functional builder pattern)
    pub fn with_action<F, Fut, E>(self, path: impl AsRef<Path>, action: F) -> Self
    where
        F: Fn(Req, S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<S>, E>> + Send + 'static,
        E: Into<Reason> + 'static,
        S: Debug + Send + 'static,
    {
        self.with_raw(path, erase(action))
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Get all registered paths
    pub fn paths(&self) -> impl Iterator<Item = &PathBuf> {
        self.actions.keys()
    }
}

impl<Req, S> Default for Registry<Req, S> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<Req: 'static, S: 'static> ActionSource<Req, S> for Registry<Req, S> {
    async fn load(&self, path: &Path) -> Result<RawAction<Req, S>> {
        self.actions
            .get(path)
            .cloned()
            .with_context(|| format!("No action registered at {:?}", path))
    }
}

/// Memoizes another source by resolved path.
///
/// Meant to be created once and shared; nothing is cached globally.
pub struct CachedSource<Req, S> {
    inner: Arc<dyn ActionSource<Req, S>>,
    cache: RwLock<HashMap<PathBuf, RawAction<Req, S>>>,
}

impl<Req, S> CachedSource<Req, S> {
    pub fn new(inner: Arc<dyn ActionSource<Req, S>>) -> Self {
        Self {
            inner,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Number of cached actions
    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn clear(&self) {
        self.cache.write().await.clear();
    }
}

#[async_trait]
impl<Req: 'static, S: 'static> ActionSource<Req, S> for CachedSource<Req, S> {
    async fn load(&self, path: &Path) -> Result<RawAction<Req, S>> {
        let cached = self.cache.read().await.get(path).cloned();
        if let Some(action) = cached {
            return Ok(action);
        }

        let action = self.inner.load(path).await?;
        debug!(path = ?path, "caching loaded action");
        self.cache
            .write()
            .await
            .insert(path.to_path_buf(), action.clone());
        Ok(action)
    }
}

// ============================================================================
// Handlers
// ============================================================================

enum Target<Req, S> {
    Ready(RawAction<Req, S>),
    Deferred {
        path: PathBuf,
        source: Arc<dyn ActionSource<Req, S>>,
    },
}

impl<Req, S> Clone for Target<Req, S> {
    fn clone(&self) -> Self {
        match self {
            Target::Ready(action) => Target::Ready(action.clone()),
            Target::Deferred { path, source } => Target::Deferred {
                path: path.clone(),
                source: source.clone(),
            },
        }
    }
}

/// A named action ready to be called as `(request, sink, proceed)`.
pub struct Handler<Req, S> {
    name: String,
    target: Target<Req, S>,
}

impl<Req, S> Clone for Handler<Req, S> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            target: self.target.clone(),
        }
    }
}

impl<Req, S> Handler<Req, S>
where
    Req: Send + 'static,
    S: Clone + Send + 'static,
{
    /// Wrap a typed async action. An empty name becomes `"anonymous"`.
    pub fn from_action<F, Fut, E>(name: impl Into<String>, action: F) -> Self
    where
        F: Fn(Req, S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response<S>, E>> + Send + 'static,
        E: Into<Reason> + 'static,
        S: Debug,
    {
        Self::from_raw(name, erase(action))
    }

    pub fn from_raw(name: impl Into<String>, action: RawAction<Req, S>) -> Self {
        let name = name.into();
        Self {
            name: if name.is_empty() {
                "anonymous".to_string()
            } else {
                name
            },
            target: Target::Ready(action),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Load the action if needed, then run it against `sink`.
    ///
    /// A load failure is returned as [`DispatchError::Load`] and the action
    /// is never invoked.
    pub async fn call<K, P>(&self, request: Req, sink: &mut K, proceed: P) -> Result<(), DispatchError>
    where
        K: Sink<State = S>,
        P: FnOnce(Option<Reason>) + Send,
    {
        let action = match &self.target {
            Target::Ready(action) => action.clone(),
            Target::Deferred { path, source } => {
                source.load(path).await.map_err(|source| {
                    error!(action = %self.name, error = %source, "failed to load action");
                    DispatchError::Load {
                        action: self.name.clone(),
                        source,
                    }
                })?
            }
        };

        run_action(&self.name, &action, request, sink, proceed)?.await
    }
}

/// Creates handlers for the actions in one directory.
pub struct Dispatcher<Req, S> {
    directory: PathBuf,
    source: Arc<dyn ActionSource<Req, S>>,
}

impl<Req, S> Dispatcher<Req, S> {
    pub fn new(directory: impl Into<PathBuf>, source: Arc<dyn ActionSource<Req, S>>) -> Self {
        Self {
            directory: directory.into(),
            source,
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Handler for `file` in this directory. Loading happens when the
    /// handler is called.
    pub fn dispatch(&self, file: &str) -> Handler<Req, S> {
        Handler {
            name: file.to_string(),
            target: Target::Deferred {
                path: resolve_path(&self.directory, file),
                source: self.source.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("actions", "welcome", "actions/welcome")]
    #[case("./actions", "welcome", "actions/welcome")]
    #[case("app/actions", "../views/index", "app/views/index")]
    #[case("/srv/actions", "./nested/../session", "/srv/actions/session")]
    #[case("actions", "", "actions")]
    fn test_resolve_path(#[case] directory: &str, #[case] file: &str, #[case] expected: &str) {
        assert_eq!(resolve_path(directory, file), PathBuf::from(expected));
    }

    #[test]
    fn test_registry_builder_normalizes_paths() {
        let registry: Registry<(), ()> = Registry::new()
            .with_action("./actions/welcome", |_req: (), _s: ()| async {
                Ok::<_, Reason>(crate::response::empty())
            })
            .with_action("actions/json", |_req: (), _s: ()| async {
                Ok::<_, Reason>(crate::response::empty())
            });

        assert_eq!(registry.len(), 2);
        assert!(registry
            .paths()
            .any(|path| path == Path::new("actions/welcome")));
    }

    #[test]
    fn test_empty_name_is_anonymous() {
        let handler: Handler<(), ()> = Handler::from_action("", |_req: (), _s: ()| async {
            Ok::<_, Reason>(crate::response::empty())
        });
        assert_eq!(handler.name(), "anonymous");
    }
}
