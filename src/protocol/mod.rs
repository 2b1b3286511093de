//! Command/response protocol
//!
//! - [`codec`]: command line rendering and reply decoding
//! - [`convert`]: reply converters
//! - [`command`]: the do/ask command descriptors
//! - [`vocabulary`]: the controller's command table
//! - [`controller_error`]: decoding of controller-reported errors

pub mod codec;
pub mod command;
pub mod controller_error;
pub mod convert;
pub mod vocabulary;

pub use codec::CommandValue;
pub use command::{Arity, AskCommand, CommandDescriptor, Conversion, DoCommand, Shape};
pub use controller_error::{parse_error_reply, ControllerError};
