//! Shopforge API library.
//!
//! Multi-tenant storefront-builder backend: owners manage their shops,
//! visitors browse published storefronts and place orders, super-admins
//! oversee the platform. The binary in `main.rs` wires this library into an
//! HTTP server; the CLI reuses its repositories.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod telemetry;
