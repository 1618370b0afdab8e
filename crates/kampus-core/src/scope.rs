// ── View-bound task scopes ──
//
// A consuming view creates a `ViewScope` when it mounts and drops it when it
// goes away. Store operations run through the scope are cancelled at that
// point, so their completion never touches the view.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::CoreError;

/// Cancellation scope tied to one consumer's lifetime.
///
/// Cancelling the registry cancels every scope derived from it. Dropping
/// the scope cancels it.
#[derive(Debug)]
pub struct ViewScope {
    name: String,
    token: CancellationToken,
}

impl ViewScope {
    pub(crate) fn new(name: impl Into<String>, parent: &CancellationToken) -> Self {
        Self {
            name: name.into(),
            token: parent.child_token(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `fut` unless the scope is cancelled first.
    ///
    /// A cancelled operation is dropped at its current suspension point:
    /// a fetch that has not completed applies nothing.
    pub async fn run<F>(&self, fut: F) -> Result<F::Output, CoreError>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            () = self.token.cancelled() => Err(CoreError::Cancelled),
            out = fut => Ok(out),
        }
    }

    /// Spawn `fut` on the runtime, bound to this scope. The handle yields
    /// `None` if the scope was cancelled before `fut` finished.
    pub fn spawn<F>(&self, fut: F) -> JoinHandle<Option<F::Output>>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let token = self.token.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                () = token.cancelled() => None,
                out = fut => Some(out),
            }
        })
    }

    /// Nested scope cancelled together with this one.
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self::new(name, &self.token)
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

impl Drop for ViewScope {
    fn drop(&mut self) {
        if !self.token.is_cancelled() {
            debug!(scope = %self.name, "view scope closed, cancelling pending tasks");
            self.token.cancel();
        }
    }
}
