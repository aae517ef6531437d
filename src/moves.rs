//! Move detection over classified ranges.
//!
//! After refinement, a block moved within the document still shows up as an
//! unrelated Deleted range and Inserted range. This pass pairs such ranges by
//! textual similarity so the markup can present them as a move rather than an
//! independent delete and insert.
//!
//! Similarity is the Jaccard index over the distinct word keys of each range.
//! Candidate pairs below `move_similarity_threshold`, or whose shorter side
//! has fewer than `move_minimum_word_count` words, are rejected. Surviving
//! candidates are matched greedily, best score first, with ties broken by
//! document position so the result is deterministic.

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::atom::{word_tokens, ContentAtom};
use crate::config::CompareConfig;
use crate::lcs::{DiffRange, RangeKind};

/// Ties a classified range to the move group it participates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveLink {
    /// 1-based group ordinal, shared between source and destination.
    pub group: u32,
    pub is_source: bool,
}

/// One detected move: the Deleted ranges it vacated and the Inserted ranges
/// it landed in, as indices into the classified range list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveGroup {
    pub ordinal: u32,
    pub source_ranges: Vec<usize>,
    pub dest_ranges: Vec<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct MoveDetection {
    /// Parallel to the classified range list.
    pub links: Vec<Option<MoveLink>>,
    pub groups: Vec<MoveGroup>,
}

impl MoveDetection {
    pub(crate) fn none(range_count: usize) -> Self {
        MoveDetection {
            links: vec![None; range_count],
            groups: Vec::new(),
        }
    }
}

struct RangeWords {
    range_index: usize,
    distinct: FxHashSet<u64>,
    word_count: usize,
}

#[derive(Debug, Clone, Copy)]
struct Candidate {
    score: f64,
    del_ord: usize,
    ins_ord: usize,
}

/// Pairs Deleted and Inserted ranges that carry near-identical words.
pub(crate) fn detect_moves(
    atoms_a: &[ContentAtom],
    atoms_b: &[ContentAtom],
    ranges: &[DiffRange],
    config: &CompareConfig,
) -> MoveDetection {
    if !config.detect_moves {
        return MoveDetection::none(ranges.len());
    }

    let deleted = collect_words(atoms_a, ranges, RangeKind::Deleted, SideOf::A, config);
    let inserted = collect_words(atoms_b, ranges, RangeKind::Inserted, SideOf::B, config);
    if deleted.is_empty() || inserted.is_empty() {
        return MoveDetection::none(ranges.len());
    }

    let mut candidates = Vec::new();
    for (del_ord, del) in deleted.iter().enumerate() {
        for (ins_ord, ins) in inserted.iter().enumerate() {
            if del.word_count.min(ins.word_count) < config.move_minimum_word_count as usize {
                continue;
            }
            let score = jaccard(&del.distinct, &ins.distinct);
            if score >= config.move_similarity_threshold {
                candidates.push(Candidate {
                    score,
                    del_ord,
                    ins_ord,
                });
            }
        }
    }
    if candidates.is_empty() {
        return MoveDetection::none(ranges.len());
    }

    // Best score first; position ties keep the result deterministic.
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then(a.del_ord.cmp(&b.del_ord))
            .then(a.ins_ord.cmp(&b.ins_ord))
    });

    let mut del_taken = vec![false; deleted.len()];
    let mut ins_taken = vec![false; inserted.len()];
    let mut accepted: Vec<Candidate> = Vec::new();
    for cand in candidates {
        if del_taken[cand.del_ord] || ins_taken[cand.ins_ord] {
            continue;
        }
        del_taken[cand.del_ord] = true;
        ins_taken[cand.ins_ord] = true;
        accepted.push(cand);
    }
    accepted.sort_by_key(|c| c.del_ord);

    let groups = coalesce_groups(&accepted, &deleted, &inserted, ranges);
    debug!(
        pairs = accepted.len(),
        groups = groups.len(),
        "move detection finished"
    );

    let mut links = vec![None; ranges.len()];
    for group in &groups {
        for &idx in &group.source_ranges {
            links[idx] = Some(MoveLink {
                group: group.ordinal,
                is_source: true,
            });
        }
        for &idx in &group.dest_ranges {
            links[idx] = Some(MoveLink {
                group: group.ordinal,
                is_source: false,
            });
        }
    }
    MoveDetection { links, groups }
}

enum SideOf {
    A,
    B,
}

fn collect_words(
    atoms: &[ContentAtom],
    ranges: &[DiffRange],
    kind: RangeKind,
    side: SideOf,
    config: &CompareConfig,
) -> Vec<RangeWords> {
    ranges
        .iter()
        .enumerate()
        .filter(|(_, r)| r.kind == kind)
        .map(|(range_index, r)| {
            let span = match side {
                SideOf::A => r.start_a..r.start_a + r.len_a,
                SideOf::B => r.start_b..r.start_b + r.len_b,
            };
            let tokens = word_tokens(atoms, span, config.case_insensitive);
            let mut distinct = FxHashSet::default();
            let mut word_count = 0usize;
            for token in tokens.iter().filter(|t| t.is_word) {
                word_count += 1;
                distinct.insert(token.key);
            }
            RangeWords {
                range_index,
                distinct,
                word_count,
            }
        })
        .collect()
}

fn jaccard(a: &FxHashSet<u64>, b: &FxHashSet<u64>) -> f64 {
    let intersection = a.intersection(b).count();
    let union = a.len() + b.len() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f64 / union as f64
}

/// Merges accepted pairs whose source ranges and destination ranges are both
/// contiguous in their documents into a single multi-range group.
fn coalesce_groups(
    accepted: &[Candidate],
    deleted: &[RangeWords],
    inserted: &[RangeWords],
    ranges: &[DiffRange],
) -> Vec<MoveGroup> {
    let mut groups: Vec<MoveGroup> = Vec::new();
    for cand in accepted {
        let src_idx = deleted[cand.del_ord].range_index;
        let dst_idx = inserted[cand.ins_ord].range_index;
        let extend = groups.last().is_some_and(|g| {
            let prev_src = ranges[*g.source_ranges.last().expect("non-empty group")];
            let prev_dst = ranges[*g.dest_ranges.last().expect("non-empty group")];
            let src = ranges[src_idx];
            let dst = ranges[dst_idx];
            prev_src.start_a + prev_src.len_a == src.start_a
                && prev_dst.start_b + prev_dst.len_b == dst.start_b
        });
        if extend {
            let group = groups.last_mut().expect("checked above");
            group.source_ranges.push(src_idx);
            group.dest_ranges.push(dst_idx);
        } else {
            groups.push(MoveGroup {
                ordinal: 0,
                source_ranges: vec![src_idx],
                dest_ranges: vec![dst_idx],
            });
        }
    }
    // Ordinals follow source position in the original document.
    groups.sort_by_key(|g| ranges[g.source_ranges[0]].start_a);
    for (i, group) in groups.iter_mut().enumerate() {
        group.ordinal = (i + 1) as u32;
    }
    groups
}
