//! # Context Bridge Test Suite
//!
//! Unified test crate for flows that cross crate boundaries.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── messaging_flows.rs   # coordinator <-> views over the runtime
//!     ├── storage_flows.rs     # stores, areas, encryption, observers
//!     └── bridge_flows.rs      # messaging driven by store changes
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cb-tests
//!
//! # By flow
//! cargo test -p cb-tests integration::messaging_flows
//!
//! # Benchmarks
//! cargo bench -p cb-tests
//! ```

#![allow(dead_code)]

pub mod integration;
