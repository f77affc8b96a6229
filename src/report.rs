use tracing::{error, warn};

/// Server-side sink for conditions the caller only sees as a JSON error.
/// Implementations never receive secret values.
pub trait Reporter: Send + Sync {
    /// The access-code secret is missing, so every request is refused.
    fn misconfigured(&self, detail: &str);

    /// A caller presented a missing or wrong access code.
    fn access_denied(&self);

    /// An action was accepted but the relay failed.
    fn dispatch_failed(&self, action: &str, message: &str);
}

/// Reporter backed by `tracing`.
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn misconfigured(&self, detail: &str) {
        error!("SERVER ERROR: {}", detail);
    }

    fn access_denied(&self) {
        warn!("Rejected request with invalid access code");
    }

    fn dispatch_failed(&self, action: &str, message: &str) {
        error!(action, "Proxy error: {}", message);
    }
}
