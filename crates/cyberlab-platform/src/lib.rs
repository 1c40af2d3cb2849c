//! Platform services for cyberlab.
//!
//! Trait seams for everything that touches the outside world (HTTP and
//! client-local storage) plus the desktop implementations. Interpreter and
//! host code only see the traits so tests can substitute [`mock`] doubles.

pub mod mock;
pub mod services;
pub mod storage;

pub use services::{HttpResponse, NetworkService, UreqNetwork};
pub use storage::{JsonFileStore, KeyValueStore, MemoryStore};
