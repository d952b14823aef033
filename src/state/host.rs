/// Lifecycle notifications from whatever hosts a game screen.
///
/// Fed into the time accounting machine explicitly instead of being
/// special-cased inside each game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The screen was backgrounded (tab hidden, window minimised).
    Hidden,
    /// The screen is visible again.
    Visible,
    /// The host is about to tear the screen down.
    Unloading,
}
