//! Collection over a filtered, ordered view of a whole store.

use crate::collection::{Collection, Cursor, Items};
use crate::repo::error::{EntityKind, RepoError, RepoResult};
use std::marker::PhantomData;
use uuid::Uuid;

/// Scan-style collection.
///
/// - `contains` answers whether an id belongs to the filtered universe and
///   backs the `after` membership check.
/// - `fetch` returns the ordered window described by the cursor and must
///   fail with NotFound if the cursor no longer resolves.
pub struct ScanCollection<T, P, F> {
    entity: EntityKind,
    cursor: Cursor,
    contains: P,
    fetch: F,
    _item: PhantomData<fn() -> T>,
}

impl<T, P, F> ScanCollection<T, P, F>
where
    P: Fn(Uuid) -> RepoResult<bool>,
    F: Fn(&Cursor) -> RepoResult<Vec<T>>,
{
    pub fn new(entity: EntityKind, contains: P, fetch: F) -> Self {
        Self {
            entity,
            cursor: Cursor::default(),
            contains,
            fetch,
            _item: PhantomData,
        }
    }
}

impl<T, P, F> Collection for ScanCollection<T, P, F>
where
    P: Fn(Uuid) -> RepoResult<bool>,
    F: Fn(&Cursor) -> RepoResult<Vec<T>>,
{
    type Item = RepoResult<T>;

    fn after(&mut self, id: Uuid) -> RepoResult<()> {
        if !(self.contains)(id)? {
            return Err(RepoError::not_found(self.entity, id));
        }
        self.cursor.after = Some(id);
        Ok(())
    }

    fn limit(&mut self, n: usize) {
        self.cursor.limit = Some(n);
    }

    fn get(&self) -> RepoResult<Items<'_, RepoResult<T>>> {
        let rows = (self.fetch)(&self.cursor)?;
        Ok(Box::new(rows.into_iter().map(Ok)))
    }
}

#[cfg(test)]
mod tests {
    use super::ScanCollection;
    use crate::collection::{Collection, Cursor};
    use crate::repo::error::EntityKind;
    use uuid::Uuid;

    #[test]
    fn after_probes_membership_and_fetch_sees_cursor() {
        let rows: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let mut collection = ScanCollection::new(
            EntityKind::Post,
            |id: Uuid| Ok(rows.contains(&id)),
            |cursor: &Cursor| {
                Ok(cursor
                    .window(EntityKind::Post, &rows, |id| *id)?
                    .to_vec())
            },
        );

        assert!(collection.after(Uuid::new_v4()).unwrap_err().is_not_found());
        collection.after(rows[0]).unwrap();
        collection.limit(1);
        let page: Vec<Uuid> = collection.get().unwrap().map(Result::unwrap).collect();
        assert_eq!(page, vec![rows[1]]);
    }
}
