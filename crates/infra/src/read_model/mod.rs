//! Disposable read model storage.

pub mod store;

pub use store::{InMemoryReadStore, ReadStore};
