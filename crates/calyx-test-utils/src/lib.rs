//! calyx-test-utils — Shared fixtures for Calyx workspace tests.

pub mod fixtures;
