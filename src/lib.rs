//! Driver library for New Focus / Newport 8742 and 8743-CL Picomotor
//! controllers.
//!
//! The controller speaks an ASCII, line-oriented command/response protocol
//! over TCP (port 23) or serial. This crate provides the framed transport,
//! the command codec, the do/ask command descriptors with the controller's
//! full command table, and an async driver that serializes every exchange on
//! one connection.

pub mod adapters;
pub mod config;
pub mod error;
pub mod hardware;
pub mod protocol;
pub mod tracing_init;

pub use error::{DriverError, DriverResult};
pub use hardware::NewFocus8743;
