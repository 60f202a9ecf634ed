//! Statewalker CLI: configuration, the scripted site driver, and the
//! command surface over the exploration engine.

pub mod cli;
pub mod config;
pub mod scripted;

pub use config::Config;
pub use scripted::{ScriptedDriver, SiteScript};
