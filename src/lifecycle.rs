use tokio_util::sync::{CancellationToken, DropGuard};

/// Liveness flag for one live session.
///
/// Live from the moment the session's `Context` is created, dead once the
/// session loop ends, and never live again after that. Handles are cheap to
/// clone into spawned work, which reads the flag before committing anything.
#[derive(Clone)]
pub struct Lifecycle {
    token: CancellationToken,
}

impl Lifecycle {
    pub(crate) fn new() -> Self {
        Self {
            token: CancellationToken::new(),
        }
    }

    /// True while the owning session is still running.
    pub fn is_live(&self) -> bool {
        !self.token.is_cancelled()
    }

    /// Cancellation handle for one unit of work. It can be cancelled on its
    /// own, and teardown cancels every handle that is still outstanding.
    pub fn request_token(&self) -> CancellationToken {
        self.token.child_token()
    }

    /// Flips the flag. Idempotent; there is no way back.
    pub(crate) fn shutdown(&self) {
        self.token.cancel();
    }

    /// Guard that shuts the lifecycle down when dropped, so every exit path
    /// of the session loop tears down exactly once.
    pub(crate) fn guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }
}
