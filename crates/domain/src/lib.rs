//! Domain layer for the wiki admin backend.
//!
//! This crate contains:
//! - Domain models (configuration namespaces, settings forms, users, groups)
//! - Admin workflows (settings pipeline, provider lifecycle, user removal)
//! - Traits implemented by the persistence and api crates

pub mod models;
pub mod services;
