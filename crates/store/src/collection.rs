use async_trait::async_trait;

use firefleet_core::{Document, DomainResult};

use crate::{Query, StoreResult};

/// In-place edit applied atomically by [`Collection::update`].
pub type Mutator<D> = Box<dyn FnOnce(&mut D) -> DomainResult<()> + Send>;

/// Derives the value that must be unique across a collection, e.g. a
/// normalized email.
pub type UniqueKey<D> = fn(&D) -> String;

/// Result of a successful update: the document before and after the edit.
#[derive(Debug, Clone, PartialEq)]
pub struct Change<D> {
    pub before: D,
    pub after: D,
}

/// A named collection of documents of one type.
#[async_trait]
pub trait Collection<D: Document>: Send + Sync {
    /// Insert a new document. Fails with `Conflict` if the id is taken.
    async fn insert(&self, doc: D) -> StoreResult<D>;

    /// Insert `doc` unless another document shares its `key`. The check and
    /// the insert happen atomically; a clash fails with `Conflict`.
    async fn insert_unique(&self, doc: D, key: UniqueKey<D>) -> StoreResult<D>;

    async fn get(&self, id: D::Id) -> StoreResult<Option<D>>;

    /// Documents matching `query`, ordered and limited as it specifies.
    async fn find(&self, query: &Query<D>) -> StoreResult<Vec<D>>;

    /// Number of matching documents (the query's limit is ignored).
    async fn count(&self, query: &Query<D>) -> StoreResult<usize>;

    /// Read-modify-write a single document. `None` when no document matched;
    /// a mutator error leaves the stored document untouched.
    async fn update(&self, id: D::Id, mutate: Mutator<D>) -> StoreResult<Option<Change<D>>>;

    /// [`Collection::update`] that also fails with `Conflict` when the edited
    /// document's `key` matches any other document.
    async fn update_unique(
        &self,
        id: D::Id,
        mutate: Mutator<D>,
        key: UniqueKey<D>,
    ) -> StoreResult<Option<Change<D>>>;

    /// Remove a document. Returns whether one was removed.
    async fn delete(&self, id: D::Id) -> StoreResult<bool>;

    /// Remove every document in the collection.
    async fn clear(&self) -> StoreResult<()>;
}
