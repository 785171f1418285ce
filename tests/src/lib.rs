//! # VeloBox Test Suite
//!
//! Cross-module scenario tests exercising the dispatcher, engine, actuator,
//! and stores together, with real files where persistence matters.
//!
//! ```bash
//! # All scenarios
//! cargo test -p velobox-tests
//!
//! # By area
//! cargo test -p velobox-tests integration::access_flows
//! cargo test -p velobox-tests integration::persistence
//! ```

pub mod integration;
