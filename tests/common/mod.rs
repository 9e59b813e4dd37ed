//! Shared test fixtures (used by unit, integration, and proptest).

#![allow(dead_code)]

pub mod fixtures;

pub use fixtures::*;
