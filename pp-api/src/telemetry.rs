use std::error::Error;

/// Reports unexpected errors.
///
/// Sending to Sentry only happens when `enabled`; the client queues events on
/// its own transport thread so capturing never waits on delivery.
#[derive(Clone, Copy, Debug, Default)]
pub struct Telemetry {
    enabled: bool,
}

impl Telemetry {
    pub fn new(enabled: bool) -> Self {
        Telemetry { enabled }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn capture<E>(&self, module: &str, error: &E)
    where
        E: Error + ?Sized,
    {
        tracing::error!(module, error = %error, source = ?error.source(), "unknown error");
        if self.enabled {
            let event_id = sentry::capture_error(error);
            tracing::debug!(%event_id, "error captured");
        }
    }
}
