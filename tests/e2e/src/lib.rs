//! End-to-end test support for Reprise
//!
//! - `harness`: isolated SQLite databases
//! - `mocks`: card factories and canned scenarios

pub mod harness;
pub mod mocks;

pub use harness::TestDatabaseManager;
pub use mocks::TestDataFactory;
