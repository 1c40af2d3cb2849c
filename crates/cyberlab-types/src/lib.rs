//! Foundation types for cyberlab.
//!
//! Platform-agnostic types shared by every cyberlab crate: the challenge
//! data model, TOML configuration, and the error taxonomy.

pub mod challenge;
pub mod config;
pub mod error;
