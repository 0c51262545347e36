//! Collection bound to a caller-supplied id list.
//!
//! # Invariants
//! - Output is positionally aligned with the (windowed) id list, duplicates
//!   included; a missing id becomes a NotFound element, never a gap.
//! - `after(id)` only accepts ids present in the list.

use crate::collection::{Collection, Cursor, Items};
use crate::repo::error::{EntityKind, RepoError, RepoResult};
use std::marker::PhantomData;
use uuid::Uuid;

/// Peek-style collection.
///
/// `fetch` receives the windowed id slice and must return one slot per id,
/// in the same order, with `None` for ids that do not exist.
pub struct PeekCollection<T, F> {
    entity: EntityKind,
    ids: Vec<Uuid>,
    cursor: Cursor,
    fetch: F,
    _item: PhantomData<fn() -> T>,
}

impl<T, F> PeekCollection<T, F>
where
    F: Fn(&[Uuid]) -> RepoResult<Vec<Option<T>>>,
{
    pub fn new(entity: EntityKind, ids: Vec<Uuid>, fetch: F) -> Self {
        Self {
            entity,
            ids,
            cursor: Cursor::default(),
            fetch,
            _item: PhantomData,
        }
    }
}

impl<T, F> Collection for PeekCollection<T, F>
where
    F: Fn(&[Uuid]) -> RepoResult<Vec<Option<T>>>,
{
    type Item = RepoResult<T>;

    fn after(&mut self, id: Uuid) -> RepoResult<()> {
        if !self.ids.contains(&id) {
            return Err(RepoError::not_found(self.entity, id));
        }
        self.cursor.after = Some(id);
        Ok(())
    }

    fn limit(&mut self, n: usize) {
        self.cursor.limit = Some(n);
    }

    fn get(&self) -> RepoResult<Items<'_, RepoResult<T>>> {
        let window = self.cursor.window(self.entity, &self.ids, |id| *id)?;
        if window.is_empty() {
            return Ok(Box::new(std::iter::empty()));
        }

        let slots = (self.fetch)(window)?;
        if slots.len() != window.len() {
            return Err(RepoError::InvalidData(format!(
                "peek fetch returned {} slots for {} ids",
                slots.len(),
                window.len()
            )));
        }

        let entity = self.entity;
        Ok(Box::new(window.iter().zip(slots).map(move |(id, slot)| {
            slot.ok_or_else(|| RepoError::not_found(entity, *id))
        })))
    }
}
