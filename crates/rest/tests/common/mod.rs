//! Common test utilities for the JSON:API integration suites.
//!
//! This module provides test infrastructure including:
//!
//! - [`harness`] - In-memory test server harness
//! - [`fixtures`] - Schema and permit fixtures for the blog domain
//! - [`assertions`] - JSON:API response assertions

pub mod assertions;
pub mod fixtures;
pub mod harness;
