//! # TonFusion Coordinator Test Suite
//!
//! Cross-component integration tests. Unit tests live next to the code in
//! each crate; everything here exercises several components at once through
//! an assembled [`coordinator_runtime::Coordinator`].
//!
//! ```bash
//! cargo test -p swap-tests
//! cargo test -p swap-tests integration::
//! ```

#![allow(dead_code)]

pub mod integration;
