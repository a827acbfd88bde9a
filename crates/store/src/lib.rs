//! `firefleet-store`: document collections.
//!
//! Every record type lives in its own named collection and is addressed by its
//! typed id. Filtering, ordering and limits are expressed as a [`Query`] and
//! evaluated by the backend.

pub mod collection;
pub mod error;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod query;

pub use collection::{Change, Collection, Mutator, UniqueKey};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryCollection;
#[cfg(feature = "postgres")]
pub use postgres::{PostgresCollection, migrate};
pub use query::Query;
