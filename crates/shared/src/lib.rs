//! Shared utilities for the wiki admin backend.
//!
//! This crate provides functionality used across the other crates:
//! - Page-window calculation for paginated lists
//! - Random credential generation
//! - Password hashing with Argon2id
//! - JWT access tokens
//! - Validation and input normalization helpers

pub mod crypto;
pub mod jwt;
pub mod pagination;
pub mod password;
pub mod validation;
