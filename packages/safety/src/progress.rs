//! Progress reporting for route planning.
//!
//! Planning a safer route can take several provider round-trips, so the
//! planner reports what it is doing through [`RouteProgress`]. Callers pick
//! how (or whether) to surface it.

/// Receives human-readable status updates while routes are planned.
pub trait RouteProgress: Send + Sync {
    /// Replaces the current status message.
    fn set_message(&self, msg: &str);
}

/// Ignores all progress updates.
pub struct NullProgress;

impl RouteProgress for NullProgress {
    fn set_message(&self, _msg: &str) {}
}

/// Writes progress updates to the log at debug level.
pub struct LogProgress;

impl RouteProgress for LogProgress {
    fn set_message(&self, msg: &str) {
        log::debug!("{msg}");
    }
}
