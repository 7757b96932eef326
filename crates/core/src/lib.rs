//! Shopforge Core - Shared domain types.
//!
//! This crate provides the types used across all Shopforge components:
//! - `api` - Multi-tenant REST API (owners, public storefronts, super-admin)
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Money rounding, status transition tables, slug generation
//! and pagination math live here so they can be tested without a database.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, money helpers, status enums, slugs, pagination

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
