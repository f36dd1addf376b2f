// ABOUTME: Command implementations for the CLI
// ABOUTME: Exports check, inspect, and validate commands

pub mod check;
pub mod inspect;
pub mod validate;

pub use check::check;
pub use inspect::inspect;
pub use validate::validate;
