//! Controller drivers
//!
//! - [`newfocus8743`]: New Focus 8742 / 8743-CL Picomotor controllers

pub mod newfocus8743;

pub use newfocus8743::NewFocus8743;
