// src/lib.rs
// Library interface for bounty-scout
pub mod badge;
pub mod cache;
pub mod cli;
pub mod config;
pub mod credentials;
pub mod dedupe;
pub mod lookup;
pub mod messaging;
pub mod output;
pub mod platforms;
pub mod probes;
pub mod progress;
pub mod registry;
pub mod settings;
pub mod stats;
pub mod types;
