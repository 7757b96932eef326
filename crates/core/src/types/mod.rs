//! Core types for Shopforge.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod pagination;
pub mod slug;
pub mod status;

pub use id::*;
pub use money::{MAX_MONEY, is_storable_amount, line_total, percent_of, round_money};
pub use pagination::{Page, PageRequest, total_pages};
pub use slug::{is_valid_slug, random_suffix, slugify, with_random_suffix};
pub use status::*;
