//! Shared infrastructure for the daily check-in application
//!
//! This crate provides the pieces of the check-in service that are not
//! specific to attendance logic: PostgreSQL connection pooling, health
//! checks, and the database error types.

pub mod database;
pub mod error;
