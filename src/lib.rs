//! SoulScript command line runner
//!
//! Exposes modules for integration testing

pub mod cli;
pub mod config;

pub use config::{BrowserSettings, Config, WindowSize};
