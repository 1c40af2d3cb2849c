//! Virtual file store for challenge artifacts.
//!
//! Artifacts are declared by the challenge and fetched lazily over HTTP the
//! first time a builtin reads them. Content is cached per session keyed by
//! normalized name, so each artifact costs at most one round trip.

mod store;

pub use store::{FileStore, join_origin, normalize_name};
