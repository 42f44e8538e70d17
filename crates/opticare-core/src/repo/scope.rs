//! Caller lifetimes for in-flight reads.
//!
//! A view that issues a fetch holds a [`ScopeGuard`]; dropping the guard
//! (navigating away) ends the [`FetchScope`] and any read still waiting on
//! the store resolves to an empty result instead of an error.

use tokio::sync::watch;

/// Lifetime of the context that is waiting on a fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchScope {
    ended: Option<watch::Receiver<bool>>,
}

/// Owner side of a [`FetchScope`]. Ends the scope when dropped.
#[derive(Debug)]
pub struct ScopeGuard {
    tx: watch::Sender<bool>,
}

impl FetchScope {
    /// Scope that never ends (server handlers, batch jobs).
    pub fn detached() -> Self {
        Self::default()
    }

    /// New scope tied to the returned guard.
    pub fn new() -> (ScopeGuard, Self) {
        let (tx, rx) = watch::channel(false);
        (ScopeGuard { tx }, Self { ended: Some(rx) })
    }

    /// True once the guard has ended the scope.
    pub fn is_ended(&self) -> bool {
        match &self.ended {
            None => false,
            Some(rx) => *rx.borrow() || rx.has_changed().is_err(),
        }
    }

    /// Resolves when the scope ends. Never resolves for a detached scope.
    pub async fn ended(&self) {
        match &self.ended {
            None => std::future::pending::<()>().await,
            Some(rx) => {
                let mut rx = rx.clone();
                // Err means the guard is gone, which also ends the scope.
                let _ = rx.wait_for(|ended| *ended).await;
            }
        }
    }
}

impl ScopeGuard {
    /// End the scope now.
    pub fn end(self) {
        drop(self);
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let _ = self.tx.send(true);
    }
}
