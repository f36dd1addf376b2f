// ABOUTME: PostgreSQL utilities module
// ABOUTME: Exports connection management used by the pre-flight probe and validate command

pub mod connection;

pub use connection::{connect, probe};
