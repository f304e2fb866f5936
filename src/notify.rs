/// The user-facing notification sink. Fire-and-forget: calls are not
/// awaited and never retried.
pub trait Notifier: Send + Sync {
    fn notify_success(&self, message: &str);
    fn notify_error(&self, message: &str);
}

/// A notifier that degrades toasts to structured log lines. The default
/// sink for headless hosts and background tasks.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify_success(&self, message: &str) {
        tracing::info!("✅ {}", message);
    }

    fn notify_error(&self, message: &str) {
        tracing::warn!("❌ {}", message);
    }
}
