//! Deferred projection over a collection.

use crate::collection::{Collection, Items};
use crate::repo::error::RepoResult;
use std::marker::PhantomData;
use uuid::Uuid;

/// Collection that applies `f` to each element as the iterator is pulled.
pub struct Mapped<C, F, U> {
    inner: C,
    f: F,
    _out: PhantomData<fn() -> U>,
}

/// Wraps `inner` so that every realized element passes through `f`.
///
/// Cursor and limit calls are forwarded to `inner`; nothing is evaluated
/// until `get()` and the returned iterator is consumed.
pub fn map<C, F, U>(inner: C, f: F) -> Mapped<C, F, U>
where
    C: Collection,
    F: Fn(C::Item) -> U,
{
    Mapped {
        inner,
        f,
        _out: PhantomData,
    }
}

/// Maps the `Ok` side of fallible elements with a fallible function.
pub fn try_map<C, F, T, U>(
    inner: C,
    f: F,
) -> Mapped<C, impl Fn(RepoResult<T>) -> RepoResult<U>, RepoResult<U>>
where
    C: Collection<Item = RepoResult<T>>,
    F: Fn(T) -> RepoResult<U>,
{
    map(inner, move |item: RepoResult<T>| item.and_then(&f))
}

impl<C, F, U> Collection for Mapped<C, F, U>
where
    C: Collection,
    F: Fn(C::Item) -> U,
{
    type Item = U;

    fn after(&mut self, id: Uuid) -> RepoResult<()> {
        self.inner.after(id)
    }

    fn limit(&mut self, n: usize) {
        self.inner.limit(n)
    }

    fn get(&self) -> RepoResult<Items<'_, U>> {
        let items = self.inner.get()?;
        let f = &self.f;
        Ok(Box::new(items.map(move |item| f(item))))
    }
}
