//! Best-effort keep-awake hint for the duration of a session.

use std::process::{Child, Command, Stdio};
use tracing::{info, warn};

/// Holds an idle/sleep inhibitor as a `systemd-inhibit` child process.
///
/// Everything here is best-effort: a missing binary or a denied
/// request is logged and the session carries on without the
/// keep-awake guarantee.
pub struct WakeLock {
    child: Option<Child>,
}

impl WakeLock {
    pub fn new() -> Self {
        Self { child: None }
    }

    /// No-op while an inhibitor is held. If the OS reaped it behind
    /// our back, a fresh one is spawned.
    pub fn acquire(&mut self) {
        if let Some(child) = self.child.as_mut() {
            match child.try_wait() {
                Ok(None) => return,
                _ => self.child = None,
            }
        }
        match Command::new("systemd-inhibit")
            .args([
                "--what=idle:sleep",
                "--who=tabata",
                "--why=workout session in progress",
                "--mode=block",
                "sleep",
                "infinity",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
        {
            Ok(child) => {
                info!("wake lock acquired (inhibitor pid {})", child.id());
                self.child = Some(child);
            }
            Err(e) => warn!("wake lock unavailable: {e}"),
        }
    }

    /// Idempotent: releasing an unheld lock is a no-op.
    pub fn release(&mut self) {
        if let Some(mut child) = self.child.take() {
            if let Err(e) = child.kill() {
                warn!("failed to kill inhibitor: {e}");
            }
            let _ = child.wait();
            info!("wake lock released");
        }
    }

    pub fn is_held(&self) -> bool {
        self.child.is_some()
    }
}

impl Default for WakeLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for WakeLock {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_release_without_acquire_is_a_no_op() {
        let mut lock = WakeLock::new();
        assert!(!lock.is_held());
        lock.release();
        lock.release();
        assert!(!lock.is_held());
    }
}
