//! Command implementations for the icpsr-filter CLI

pub mod config;
pub mod filter;
pub mod version;
