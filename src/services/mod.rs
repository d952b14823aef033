/// Log-and-continue persistence helpers for game sessions.
pub mod persistence;
/// Backend connection with retry and health checks.
pub mod store_supervisor;
