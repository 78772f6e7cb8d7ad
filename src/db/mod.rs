//! Document stores.
//!
//! The [`DocumentStore`] trait abstracts persistence of documents and
//! their chunk+embedding records, including the vector similarity
//! operator. Two backends are provided:
//!
//! - [`libsql::LibsqlStore`] - libsql with native vector search
//!   (local file, `:memory:`, or remote Turso via the `turso` feature)
//! - [`memory::MemoryStore`] - in-process store for tests and
//!   ephemeral runs

pub mod libsql;
pub mod memory;
pub mod store;

pub use self::libsql::LibsqlStore;
pub use self::memory::MemoryStore;
pub use self::store::{DocumentStore, StoreProvider, MIN_CONTENT_LEN};
