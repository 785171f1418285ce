//! Cross-module scenario flows.

pub mod access_flows;
pub mod persistence;
