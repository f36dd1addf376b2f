// ABOUTME: Library module for postgres-schema-drift
// ABOUTME: Exports the schema model, inspector, comparator, and CLI commands

pub mod commands;
pub mod config;
pub mod diff;
pub mod error;
pub mod inspect;
pub mod postgres;
pub mod report;
pub mod schema;
pub mod utils;
