//! Backend-agnostic document queries.

use std::cmp::Ordering;
use std::sync::Arc;

use firefleet_core::Document;

type Predicate<D> = Arc<dyn Fn(&D) -> bool + Send + Sync>;
type Comparator<D> = Arc<dyn Fn(&D, &D) -> Ordering + Send + Sync>;

/// Filter + ordering + limit over a collection.
///
/// Filters added with [`Query::filter`] are AND-ed together.
pub struct Query<D> {
    predicate: Option<Predicate<D>>,
    order: Option<Comparator<D>>,
    limit: Option<usize>,
}

impl<D> Clone for Query<D> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
            order: self.order.clone(),
            limit: self.limit,
        }
    }
}

impl<D> Default for Query<D> {
    fn default() -> Self {
        Self {
            predicate: None,
            order: None,
            limit: None,
        }
    }
}

impl<D> core::fmt::Debug for Query<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Query")
            .field("filtered", &self.predicate.is_some())
            .field("ordered", &self.order.is_some())
            .field("limit", &self.limit)
            .finish()
    }
}

impl<D: Document> Query<D> {
    /// Match every document.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn filter(mut self, f: impl Fn(&D) -> bool + Send + Sync + 'static) -> Self {
        self.predicate = Some(match self.predicate.take() {
            Some(prev) => Arc::new(move |d: &D| prev(d) && f(d)),
            None => Arc::new(f),
        });
        self
    }

    /// Add a filter only when `value` is present.
    pub fn filter_opt<T>(self, value: Option<T>, f: impl Fn(&D, &T) -> bool + Send + Sync + 'static) -> Self
    where
        T: Send + Sync + 'static,
    {
        match value {
            Some(v) => self.filter(move |d| f(d, &v)),
            None => self,
        }
    }

    pub fn sort_by(mut self, cmp: impl Fn(&D, &D) -> Ordering + Send + Sync + 'static) -> Self {
        self.order = Some(Arc::new(cmp));
        self
    }

    /// Most recently created first.
    pub fn newest_first(self) -> Self {
        self.sort_by(|a, b| b.created_at().cmp(&a.created_at()))
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn matches(&self, doc: &D) -> bool {
        self.predicate.as_ref().is_none_or(|p| p(doc))
    }

    /// Filter, order and truncate an unordered batch of documents.
    pub fn apply(&self, docs: impl IntoIterator<Item = D>) -> Vec<D> {
        let mut out: Vec<D> = docs.into_iter().filter(|d| self.matches(d)).collect();
        if let Some(order) = &self.order {
            out.sort_by(|a, b| order(a, b));
        }
        if let Some(limit) = self.limit {
            out.truncate(limit);
        }
        out
    }
}
