//! Repository list handling.
//!
//! This module provides the built-in repository list and helpers for
//! turning configured URLs into repository references.

pub mod list;

pub use list::{default_repository_urls, extract_repository_urls, normalize_all};
