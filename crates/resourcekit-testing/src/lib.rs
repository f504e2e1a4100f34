//! Testing utilities for resourcekit.
//!
//! This crate provides fixtures, an in-process client and assertions for
//! testing resource servers. It includes:
//!
//! - A sample server covering literals, templates, shadowing and failures
//! - [`TestClient`], which runs a server over a memory transport
//! - Assertions on replies
//!
//! # Overview
//!
//! ```rust
//! use resourcekit_core::error::codes;
//! use resourcekit_testing::prelude::*;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let client = TestClient::start(sample_server());
//!
//! assert_text_contents(&client.read("file://readme.txt").await, "read me first");
//! assert_error_code(&client.read("fail://disk-full").await, codes::HANDLER_ERROR);
//!
//! client.shutdown().await.unwrap();
//! # }
//! ```

#![deny(missing_docs)]

pub mod assertions;
pub mod client;
pub mod fixtures;

// Re-export commonly used types
pub use assertions::{assert_error_code, assert_text_contents};
pub use client::TestClient;
pub use fixtures::{sample_definitions, sample_server};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::assertions::{
        assert_error_code, assert_text_contents, list_result, read_result,
        template_list_result,
    };
    pub use crate::client::TestClient;
    pub use crate::fixtures::{sample_definitions, sample_server};
}
