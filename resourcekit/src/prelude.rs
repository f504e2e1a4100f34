//! Convenient imports for building resource servers.
//!
//! ```rust
//! use resourcekit::prelude::*;
//! ```

pub use resourcekit_core::prelude::*;
pub use resourcekit_server::prelude::*;
pub use resourcekit_transport::prelude::*;
