//! Application layer - Use cases orchestrating the simulation engines
//!
//! Services here own persistence and event publication. They depend on the
//! outbound ports only.

pub mod dto;
pub mod ports;
pub mod services;
