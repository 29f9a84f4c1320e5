//! # Vessel Identification Common Library
//!
//! Shared code for the vessel-identification client crates:
//! - Field catalog (static selectable values)
//! - Form configuration for both deployment variants
//! - Bootstrap configuration loading
//! - Error types
//! - Timestamp helpers

pub mod catalog;
pub mod config;
pub mod error;
pub mod fields;
pub mod time;

pub use error::{Error, Result};
pub use fields::{FieldKind, FieldSpec, FormConfig, FormVariant};
