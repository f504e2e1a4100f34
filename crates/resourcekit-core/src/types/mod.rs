//! Resource descriptors, contents and list/read payloads.

pub mod resource;

pub use resource::*;
