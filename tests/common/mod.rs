//! Common test utilities shared by the integration test files.

#![allow(dead_code)]

pub mod mocks;
