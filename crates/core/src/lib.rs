//! Novel LMS Core - Shared types library.
//!
//! This crate provides common types used across all Novel LMS client components:
//! - `client` - Backend API client, session gate, and permission resolver
//! - `cli` - Command-line driver for the client library
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no caches. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Identities, role classes, progress normalization, and routes

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
