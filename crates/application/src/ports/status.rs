//! User-facing status notices and view context.

/// Two notice slots shown to the user: the latest error and the latest
/// success. `None` clears a slot.
pub trait StatusReporter: Send + Sync {
    /// Sets or clears the error notice.
    fn set_error(&self, message: Option<String>);

    /// Sets or clears the success notice.
    fn set_success(&self, message: Option<String>);

    /// Shorthand for `set_error(Some(..))`.
    fn error(&self, message: &str) {
        self.set_error(Some(message.to_string()));
    }

    /// Shorthand for `set_success(Some(..))`.
    fn success(&self, message: &str) {
        self.set_success(Some(message.to_string()));
    }
}

/// Tells the log controller whether the traffic view is on screen.
pub trait ViewContext: Send + Sync {
    /// Returns true while the log-consuming view is active.
    fn is_active_view(&self) -> bool;
}
