//! Test support module
//!
//! Shared encoders, stores and temp-dir helpers for the integration tests.

#![allow(dead_code)]

pub mod helpers;

pub mod fixtures;
