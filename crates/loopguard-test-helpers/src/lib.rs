//! Shared test utilities for loopguard.
//!
//! # Modules
//!
//! - [`mod@must`] - Unwrap helpers with good error messages and `#[track_caller]`
//! - [`rig`] - In-memory session rig and frame helpers for the relay peers
//!
//! # Usage
//!
//! ```toml
//! [dev-dependencies]
//! loopguard-test-helpers = { workspace = true }
//! ```
//!
//! ```rust,ignore
//! use loopguard_test_helpers::prelude::*;
//! ```

#![deny(unsafe_op_in_unsafe_fn)]
#![allow(clippy::unwrap_used, clippy::panic)]

pub mod must;
pub mod prelude;
pub mod rig;

pub use must::*;
