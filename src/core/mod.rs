//! Core device-setup functionality
//!
//! This module provides:
//! - TCP transport with a single handshake deadline
//! - SW16 wire codec and delimiter framing
//! - Connection probe (status-query handshake)
//! - Outcome classification
//! - Two-step setup flow with duplicate detection
//! - Configured-device registry

pub mod classify;
pub mod flow;
pub mod probe;
pub mod protocol;
pub mod registry;
pub mod transport;
