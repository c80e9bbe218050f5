//! Memoization of dialect-filtered function items.
//!
//! Building the function list means filtering the static catalog and
//! formatting detail strings. The result only depends on the dialect (and
//! optionally the category), so it is computed once and shared behind an
//! `Arc`. Readers never block each other; a miss takes the write lock once.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock, PoisonError, RwLock};

#[cfg(feature = "tracing")]
use tracing::debug;

use crate::sql::FunctionCategory;
use crate::types::{CompletionItem, Dialect};

type Items = Arc<Vec<CompletionItem>>;

pub(crate) static FUNCTION_CACHE: LazyLock<FunctionCache> = LazyLock::new(FunctionCache::default);

#[derive(Debug, Default)]
pub(crate) struct FunctionCache {
    by_dialect: RwLock<HashMap<Dialect, Items>>,
    by_category: RwLock<HashMap<(Dialect, FunctionCategory), Items>>,
}

impl FunctionCache {
    pub(crate) fn for_dialect(
        &self,
        dialect: Dialect,
        build: impl FnOnce() -> Vec<CompletionItem>,
    ) -> Items {
        get_or_insert(&self.by_dialect, dialect, build)
    }

    pub(crate) fn for_category(
        &self,
        dialect: Dialect,
        category: FunctionCategory,
        build: impl FnOnce() -> Vec<CompletionItem>,
    ) -> Items {
        get_or_insert(&self.by_category, (dialect, category), build)
    }

    pub(crate) fn clear(&self) {
        self.by_dialect
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.by_category
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.by_dialect
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
            + self
                .by_category
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .len()
    }
}

fn get_or_insert<K>(
    map: &RwLock<HashMap<K, Items>>,
    key: K,
    build: impl FnOnce() -> Vec<CompletionItem>,
) -> Items
where
    K: std::hash::Hash + Eq,
{
    if let Some(items) = map
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .get(&key)
    {
        return Arc::clone(items);
    }
    let mut guard = map.write().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(guard.entry(key).or_insert_with(|| Arc::new(build())))
}

/// Drops all memoized function items. Idempotent.
///
/// Call after swapping the function catalog or to release memory; the next
/// completion request rebuilds what it needs.
pub fn clear_function_cache() {
    FUNCTION_CACHE.clear();
    #[cfg(feature = "tracing")]
    debug!("function completion cache cleared");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CompletionItemKind;

    #[test]
    fn test_builds_once_per_key() {
        let cache = FunctionCache::default();
        let mut builds = 0;
        let first = cache.for_dialect(Dialect::Sqlite, || {
            builds += 1;
            vec![CompletionItem::new("X", CompletionItemKind::Function)]
        });
        let second = cache.for_dialect(Dialect::Sqlite, || {
            builds += 1;
            Vec::new()
        });
        assert_eq!(builds, 1);
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let cache = FunctionCache::default();
        cache.for_category(Dialect::Mysql, FunctionCategory::Aggregate, Vec::new);
        assert_eq!(cache.len(), 1);
        cache.clear();
        cache.clear();
        assert_eq!(cache.len(), 0);
    }
}
