//! StorePulse Core - Shared domain types.
//!
//! This crate provides the types shared by the StorePulse components:
//! - `dashboard` - Server-rendered analytics dashboard (talks to the backend)
//! - `cli` - Command-line access to the same backend operations
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no HTTP
//! clients. The backend owns every entity; these are transient copies.
//!
//! # Modules
//!
//! - [`types`] - Tenant/user IDs, shop domains, emails, session identities,
//!   and analytics windows

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
