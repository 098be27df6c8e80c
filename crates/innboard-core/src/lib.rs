//! # innboard-core
//!
//! Core types, traits, and abstractions for the innboard onboarding
//! document subsystem.
//!
//! This crate provides the foundational data structures and trait
//! definitions that the other innboard crates depend on: the error
//! taxonomy, the document/attachment data model, the lenient payload
//! parsing used by the metadata resolver, and the repository traits
//! that the database layer implements.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod payload;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::*;
pub use payload::{extract_signature_image, extract_slot_reference, SlotExtraction};
pub use traits::*;
