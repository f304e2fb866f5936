/// The host's navigation surface.
///
/// `replace` is a history-replacing route change (back-navigation must not
/// return to the guarded page); `hard_redirect` is a full reload navigation
/// that guarantees no stale in-memory state survives.
pub trait Navigator: Send + Sync {
    /// Navigates to `path`, replacing the current history entry.
    fn replace(&self, path: &str);

    /// Performs a hard (full reload) navigation to `path`.
    fn hard_redirect(&self, path: &str);

    /// Whether the current location is an unauthenticated-allowed page.
    fn on_public_page(&self) -> bool;
}
