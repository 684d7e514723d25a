// Library surface for headless/integration tests and reuse.
// Keep this lean to avoid coupling to bin-only types in main.rs.
pub mod clock;
pub mod config;
pub mod controller;
pub mod leaderboard;
pub mod quotes;
pub mod runtime;
pub mod scorer;
pub mod session;
