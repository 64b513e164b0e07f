//! Testing utilities and mock implementations
//!
//! Provides an in-memory queue implementing every capability trait so the
//! drain pipeline can be exercised without a real queue service.

pub mod mocks;

pub use mocks::*;
