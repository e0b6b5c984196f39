//! seven library - reconciles a local checkout with its remote sprite sandbox

pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod error;
pub mod host;
pub mod identity;
pub mod orchestrator;
pub mod process;
pub mod progress;
pub mod repo;
pub mod sprite;
pub mod upgrade;

pub use error::{Result, SevenError};
