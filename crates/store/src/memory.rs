use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use tracing::debug;

use firefleet_core::{Document, DomainError};

use crate::{Change, Collection, Mutator, Query, StoreError, StoreResult, UniqueKey};

/// In-memory collection for tests/dev.
#[derive(Debug)]
pub struct InMemoryCollection<D: Document> {
    inner: RwLock<HashMap<D::Id, D>>,
}

impl<D: Document> InMemoryCollection<D> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(HashMap::new()),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<D::Id, D>>> {
        self.inner
            .read()
            .map_err(|_| StoreError::Backend(format!("{} lock poisoned", D::COLLECTION)))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<D::Id, D>>> {
        self.inner
            .write()
            .map_err(|_| StoreError::Backend(format!("{} lock poisoned", D::COLLECTION)))
    }

    fn apply_update(
        &self,
        id: D::Id,
        mutate: Mutator<D>,
        key: Option<UniqueKey<D>>,
    ) -> StoreResult<Option<Change<D>>> {
        let mut map = self.write()?;
        let Some(before) = map.get(&id).cloned() else {
            return Ok(None);
        };

        let mut after = before.clone();
        mutate(&mut after).map_err(StoreError::Rejected)?;
        if after.id() != id {
            return Err(StoreError::Rejected(DomainError::validation("id is immutable")));
        }
        if let Some(key) = key {
            let wanted = key(&after);
            if map.values().any(|other| other.id() != id && key(other) == wanted) {
                return Err(duplicate::<D>(&wanted));
            }
        }

        debug!(collection = D::COLLECTION, %id, "update");
        map.insert(id, after.clone());
        Ok(Some(Change { before, after }))
    }
}

fn duplicate<D: Document>(key: &str) -> StoreError {
    StoreError::Conflict(format!("{} '{key}' already exists", D::COLLECTION))
}

impl<D: Document> Default for InMemoryCollection<D> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<D: Document> Collection<D> for InMemoryCollection<D> {
    async fn insert(&self, doc: D) -> StoreResult<D> {
        let id = doc.id();
        let mut map = self.write()?;
        if map.contains_key(&id) {
            return Err(StoreError::Conflict(format!("{} {id} already exists", D::COLLECTION)));
        }
        debug!(collection = D::COLLECTION, %id, "insert");
        map.insert(id, doc.clone());
        Ok(doc)
    }

    async fn insert_unique(&self, doc: D, key: UniqueKey<D>) -> StoreResult<D> {
        let id = doc.id();
        let wanted = key(&doc);
        let mut map = self.write()?;
        if map.contains_key(&id) {
            return Err(StoreError::Conflict(format!("{} {id} already exists", D::COLLECTION)));
        }
        if map.values().any(|existing| key(existing) == wanted) {
            return Err(duplicate::<D>(&wanted));
        }
        debug!(collection = D::COLLECTION, %id, "insert");
        map.insert(id, doc.clone());
        Ok(doc)
    }

    async fn get(&self, id: D::Id) -> StoreResult<Option<D>> {
        Ok(self.read()?.get(&id).cloned())
    }

    async fn find(&self, query: &Query<D>) -> StoreResult<Vec<D>> {
        let map = self.read()?;
        Ok(query.apply(map.values().cloned()))
    }

    async fn count(&self, query: &Query<D>) -> StoreResult<usize> {
        Ok(self.read()?.values().filter(|d| query.matches(d)).count())
    }

    async fn update(&self, id: D::Id, mutate: Mutator<D>) -> StoreResult<Option<Change<D>>> {
        self.apply_update(id, mutate, None)
    }

    async fn update_unique(
        &self,
        id: D::Id,
        mutate: Mutator<D>,
        key: UniqueKey<D>,
    ) -> StoreResult<Option<Change<D>>> {
        self.apply_update(id, mutate, Some(key))
    }

    async fn delete(&self, id: D::Id) -> StoreResult<bool> {
        let removed = self.write()?.remove(&id).is_some();
        debug!(collection = D::COLLECTION, %id, removed, "delete");
        Ok(removed)
    }

    async fn clear(&self) -> StoreResult<()> {
        self.write()?.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use firefleet_core::model::{FaultType, NewFaultType};

    fn fault_type(name: &str, age_minutes: i64) -> FaultType {
        let mut t = NewFaultType {
            name: name.into(),
            description: None,
        }
        .into_fault_type(Utc::now());
        t.created_at -= Duration::minutes(age_minutes);
        t
    }

    #[tokio::test]
    async fn insert_get_delete() {
        let col = InMemoryCollection::<FaultType>::new();
        let t = col.insert(fault_type("Engine", 0)).await.unwrap();

        assert_eq!(col.get(t.id).await.unwrap(), Some(t.clone()));
        assert!(col.delete(t.id).await.unwrap());
        assert!(!col.delete(t.id).await.unwrap());
        assert_eq!(col.get(t.id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_id_conflicts() {
        let col = InMemoryCollection::<FaultType>::new();
        let t = col.insert(fault_type("Engine", 0)).await.unwrap();
        assert!(matches!(col.insert(t).await, Err(StoreError::Conflict(_))));
    }

    #[tokio::test]
    async fn query_filters_sorts_and_limits() {
        let col = InMemoryCollection::<FaultType>::new();
        for (name, age) in [("Engine", 3), ("Brakes", 1), ("Electrical", 2), ("Pump", 0)] {
            col.insert(fault_type(name, age)).await.unwrap();
        }

        let q = Query::all()
            .filter(|t: &FaultType| t.name != "Pump")
            .newest_first()
            .limit(2);
        let names: Vec<_> = col.find(&q).await.unwrap().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["Brakes", "Electrical"]);
        assert_eq!(col.count(&q).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn update_reports_before_and_after() {
        let col = InMemoryCollection::<FaultType>::new();
        let t = col.insert(fault_type("Engine", 0)).await.unwrap();

        let change = col
            .update(t.id, Box::new(|t| {
                t.name = "Motor".into();
                Ok(())
            }))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(change.before.name, "Engine");
        assert_eq!(change.after.name, "Motor");
        assert_eq!(col.get(t.id).await.unwrap().unwrap().name, "Motor");
    }

    #[tokio::test]
    async fn rejected_update_leaves_document_untouched() {
        let col = InMemoryCollection::<FaultType>::new();
        let t = col.insert(fault_type("Engine", 0)).await.unwrap();

        let err = col
            .update(t.id, Box::new(|t| {
                t.name = "half-applied".into();
                Err(DomainError::conflict("nope"))
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Rejected(DomainError::Conflict(_))));
        assert_eq!(col.get(t.id).await.unwrap().unwrap().name, "Engine");
    }

    fn name_key(t: &FaultType) -> String {
        t.name.to_lowercase()
    }

    #[tokio::test]
    async fn insert_unique_rejects_clashing_key() {
        let col = InMemoryCollection::<FaultType>::new();
        col.insert_unique(fault_type("Engine", 0), name_key).await.unwrap();

        let err = col.insert_unique(fault_type("ENGINE", 0), name_key).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(col.count(&Query::all()).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_insert_unique_admits_exactly_one() {
        let col = std::sync::Arc::new(InMemoryCollection::<FaultType>::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let col = col.clone();
                tokio::spawn(async move { col.insert_unique(fault_type("Pump", 0), name_key).await })
            })
            .collect();

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(col.count(&Query::all()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn update_unique_ignores_the_document_itself() {
        let col = InMemoryCollection::<FaultType>::new();
        let engine = col.insert(fault_type("Engine", 0)).await.unwrap();
        col.insert(fault_type("Brakes", 0)).await.unwrap();

        let renamed = col
            .update_unique(engine.id, Box::new(|t| {
                t.name = "engine".into();
                Ok(())
            }), name_key)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(renamed.after.name, "engine");

        let err = col
            .update_unique(engine.id, Box::new(|t| {
                t.name = "brakes".into();
                Ok(())
            }), name_key)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert_eq!(col.get(engine.id).await.unwrap().unwrap().name, "engine");
    }

    #[tokio::test]
    async fn update_of_missing_document_is_none() {
        let col = InMemoryCollection::<FaultType>::new();
        let missing = fault_type("Ghost", 0).id;
        let res = col.update(missing, Box::new(|_| Ok(()))).await.unwrap();
        assert!(res.is_none());
    }
}
