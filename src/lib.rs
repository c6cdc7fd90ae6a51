//! smppsim - SMPP SMSC simulator.
//!
//! Accepts ESME binds, acknowledges every `submit_sm` and, after a jittered
//! delay, sends a `deliver_sm` delivery receipt whose outcome rotates through
//! a configured list.

pub mod bootstrap;
pub mod config;
pub mod listener;
pub mod protocol;
pub mod simulator;
pub mod telemetry;
