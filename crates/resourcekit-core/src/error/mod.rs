//! Unified error handling for resourcekit.
//!
//! Every fallible operation in the workspace returns [`Error`]:
//!
//! - **Registration**: [`Error::DuplicatePattern`], [`Error::InvalidTemplate`]
//! - **Lookup**: [`Error::NoMatch`]
//! - **Handlers**: [`Error::MissingParameter`], [`Error::Handler`], [`Error::Cancelled`]
//! - **Serving**: [`Error::Parse`], [`Error::InvalidRequest`],
//!   [`Error::MethodNotFound`], [`Error::Transport`]
//!
//! Registration and lookup errors are returned synchronously. Handler errors
//! are turned into an [`ErrorObject`] and sent back to the requester; they
//! never stop the server.
//!
//! ```rust
//! use resourcekit_core::error::{Error, ResultExt, codes};
//!
//! fn read() -> Result<String, Error> {
//!     let result: Result<String, Error> = Err(Error::no_match("db://orders/7"));
//!     result.context("Failed to read order")
//! }
//!
//! let err = read().unwrap_err();
//! assert_eq!(err.code(), codes::RESOURCE_NOT_FOUND);
//! ```

pub mod codes;
mod context;
mod object;
mod types;

pub use codes::*;
pub use context::ResultExt;
pub use object::ErrorObject;
pub use types::{BoxError, Error};
