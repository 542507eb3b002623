//! Cadenza command-line front end
//!
//! Loads the queue state, applies one command, and lets the queue persist
//! the result.

pub mod commands;
pub mod config;
pub mod error;
pub mod library;
pub mod notifier;
