//! Shared fixtures for integration tests.

pub mod sqlite_db;
