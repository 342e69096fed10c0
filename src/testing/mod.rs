//! Testing utilities and mock implementations
//!
//! Mocks for the measurement tool and the broker so the monitor loop can be
//! tested without external dependencies.

pub mod mocks;

pub use mocks::*;
