//! Lazy, cursor-paginated collections.
//!
//! # Responsibility
//! - Define the `Collection` contract consumed by every read path.
//! - Own the cursor/limit window arithmetic so all backends page identically.
//!
//! # Invariants
//! - `get()` is the only call that realizes elements; building a collection
//!   and applying `after`/`limit` never yields data.
//! - `after(id)` fails with NotFound when `id` is outside the collection's
//!   universe.
//! - A realized iterator emits elements strictly in the collection order.

use crate::repo::error::{EntityKind, RepoError, RepoResult};
use std::marker::PhantomData;
use uuid::Uuid;

mod map;
mod peek;
mod scan;

pub use map::{map, try_map, Mapped};
pub use peek::PeekCollection;
pub use scan::ScanCollection;

/// Single-pass iterator returned by [`Collection::get`].
pub type Items<'a, T> = Box<dyn Iterator<Item = T> + 'a>;

/// Boxed collection whose elements may fail individually.
pub type BoxCollection<'a, T> = Box<dyn Collection<Item = RepoResult<T>> + 'a>;

/// Not-yet-materialized ordered sequence.
pub trait Collection {
    type Item;

    /// Restricts the next realization to elements strictly after `id`.
    fn after(&mut self, id: Uuid) -> RepoResult<()>;

    /// Caps how many elements the next realization may yield.
    fn limit(&mut self, n: usize);

    /// Realizes the current window as a fresh iterator.
    fn get(&self) -> RepoResult<Items<'_, Self::Item>>;
}

impl<C: Collection + ?Sized> Collection for Box<C> {
    type Item = C::Item;

    fn after(&mut self, id: Uuid) -> RepoResult<()> {
        (**self).after(id)
    }

    fn limit(&mut self, n: usize) {
        (**self).limit(n)
    }

    fn get(&self) -> RepoResult<Items<'_, Self::Item>> {
        (**self).get()
    }
}

/// Pagination state of one collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cursor {
    /// Exclusive lower boundary, by element id.
    pub after: Option<Uuid>,
    /// Maximum number of elements to yield.
    pub limit: Option<usize>,
}

impl Cursor {
    /// Slices an already ordered sequence by cursor and limit.
    ///
    /// The cursor matches the first element whose id equals `after`; the
    /// window starts right behind it.
    ///
    /// # Errors
    /// - `NotFound` when `after` is set but absent from `items`.
    pub fn window<'a, T>(
        &self,
        entity: EntityKind,
        items: &'a [T],
        id_of: impl Fn(&T) -> Uuid,
    ) -> RepoResult<&'a [T]> {
        let start = match self.after {
            Some(after) => {
                items
                    .iter()
                    .position(|item| id_of(item) == after)
                    .ok_or_else(|| RepoError::not_found(entity, after))?
                    + 1
            }
            None => 0,
        };
        let end = match self.limit {
            Some(limit) => items.len().min(start.saturating_add(limit)),
            None => items.len(),
        };
        Ok(&items[start..end])
    }
}

/// Collection over an empty universe.
pub struct Empty<T> {
    entity: EntityKind,
    _item: PhantomData<fn() -> T>,
}

/// Returns a collection that never yields and rejects every cursor.
pub fn empty<T>(entity: EntityKind) -> Empty<T> {
    Empty {
        entity,
        _item: PhantomData,
    }
}

impl<T> Collection for Empty<T> {
    type Item = T;

    fn after(&mut self, id: Uuid) -> RepoResult<()> {
        Err(RepoError::not_found(self.entity, id))
    }

    fn limit(&mut self, _n: usize) {}

    fn get(&self) -> RepoResult<Items<'_, T>> {
        Ok(Box::new(std::iter::empty()))
    }
}
