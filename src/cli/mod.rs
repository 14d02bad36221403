//! CLI command handlers

pub mod commands;

pub use commands::{get, list, sheets, titles, ParseArgs};
