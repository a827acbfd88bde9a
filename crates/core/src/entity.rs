//! Entity trait: identity + continuity across state changes.

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};
use uuid::Uuid;

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + core::hash::Hash + core::fmt::Debug + core::fmt::Display + Into<Uuid> + Send + Sync + 'static;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;
}

/// An entity persisted as a standalone document in a named collection.
pub trait Document: Entity + Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection (table / bucket) name the document lives in.
    const COLLECTION: &'static str;

    /// Creation timestamp, used for newest-first listings.
    fn created_at(&self) -> DateTime<Utc>;
}

/// Implements [`Entity`] and [`Document`] for a record with an `id` field.
#[macro_export]
macro_rules! document {
    ($t:ty, $id:ty, $collection:literal) => {
        impl $crate::entity::Entity for $t {
            type Id = $id;

            fn id(&self) -> Self::Id {
                self.id
            }
        }

        impl $crate::entity::Document for $t {
            const COLLECTION: &'static str = $collection;

            fn created_at(&self) -> chrono::DateTime<chrono::Utc> {
                self.created_at
            }
        }
    };
}
