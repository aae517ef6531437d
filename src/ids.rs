//! Revision identifier allocation.
//!
//! Every markup construct in one comparison draws its identifier from a
//! single [`IdAllocator`], shared across the body, footnote, and endnote
//! streams. Identifiers start at 1 and never repeat within a comparison,
//! with one sanctioned exception: a move range start/end marker pair shares
//! an identifier reserved through [`IdAllocator::reserve_range_pair`].
//!
//! [`audit_ids`] re-checks that contract over the identifiers actually
//! emitted into a document.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of a single revision-markup construct.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RevisionId(pub u32);

/// A deliberately shared identifier for a range start/end marker pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangePair {
    pub start: RevisionId,
    pub end: RevisionId,
}

/// Monotonic identifier source for one comparison.
#[derive(Debug)]
pub struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        IdAllocator { next: 1 }
    }

    /// Allocates a fresh identifier for a standalone construct.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> RevisionId {
        let id = RevisionId(self.next);
        self.next += 1;
        id
    }

    /// Reserves one identifier for use by both halves of a range marker
    /// pair. The shared value is the intentional duplicate the audit
    /// recognizes.
    pub fn reserve_range_pair(&mut self) -> RangePair {
        let id = self.next();
        RangePair { start: id, end: id }
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        IdAllocator::new()
    }
}

/// How an identifier was used in the emitted markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdUse {
    Construct,
    RangeStart,
    RangeEnd,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdAuditError {
    #[error("[REDLINE_ID_001] revision id {id} used {count} times")]
    Collision { id: u32, count: usize },
    #[error("[REDLINE_ID_002] range marker id {id} has no matching partner")]
    UnpairedRangeMarker { id: u32 },
    #[error("[REDLINE_ID_003] revision id {id} mixes construct and range-marker use")]
    MixedUse { id: u32 },
}

/// Verifies that each identifier is either unique or an exact range
/// start/end pair.
pub fn audit_ids(
    uses: impl IntoIterator<Item = (RevisionId, IdUse)>,
) -> Result<(), IdAuditError> {
    use std::collections::BTreeMap;

    let mut by_id: BTreeMap<u32, Vec<IdUse>> = BTreeMap::new();
    for (id, use_kind) in uses {
        by_id.entry(id.0).or_default().push(use_kind);
    }
    for (id, uses) in by_id {
        match uses.as_slice() {
            [_] => {}
            [a, b] => {
                let pair = matches!(
                    (a, b),
                    (IdUse::RangeStart, IdUse::RangeEnd) | (IdUse::RangeEnd, IdUse::RangeStart)
                );
                if !pair {
                    let constructs = uses.iter().filter(|u| **u == IdUse::Construct).count();
                    return Err(match constructs {
                        2 => IdAuditError::Collision { id, count: 2 },
                        1 => IdAuditError::MixedUse { id },
                        _ => IdAuditError::UnpairedRangeMarker { id },
                    });
                }
            }
            _ => {
                return Err(IdAuditError::Collision {
                    id,
                    count: uses.len(),
                })
            }
        }
    }
    Ok(())
}
