//! Collision-free id allocation.
//!
//! # Invariants
//! - Ids are random UUID v4 values and are never reused.
//! - Callers run the probe inside the same critical section or transaction
//!   as the insert that consumes the id.

use crate::repo::error::{RepoError, RepoResult};
use uuid::Uuid;

/// Upper bound on probes before giving up.
pub(crate) const MAX_ID_ATTEMPTS: usize = 8;

/// Draws random ids until `taken` reports a free one.
pub(crate) fn allocate_id(mut taken: impl FnMut(Uuid) -> RepoResult<bool>) -> RepoResult<Uuid> {
    allocate_with(Uuid::new_v4, &mut taken)
}

fn allocate_with(
    mut generate: impl FnMut() -> Uuid,
    taken: &mut impl FnMut(Uuid) -> RepoResult<bool>,
) -> RepoResult<Uuid> {
    for _ in 0..MAX_ID_ATTEMPTS {
        let candidate = generate();
        if !taken(candidate)? {
            return Ok(candidate);
        }
    }
    Err(RepoError::IdAllocation {
        attempts: MAX_ID_ATTEMPTS,
    })
}
