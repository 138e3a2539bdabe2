//! Unit test suite for bdmetrics
//!
//! Fast tests of individual public APIs that do not spawn the binary.
//!
//! ```bash
//! cargo test --test unit
//! ```

mod config_layering;
mod pagination;
