//! Port traits wiring the access core to the outside world.
//!
//! The runtime picks concrete adapters once at startup and injects them;
//! nothing in the domain inspects the platform.

pub mod outbound;
