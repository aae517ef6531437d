//! Recursive correlation refinement.
//!
//! The coarse diff runs at paragraph granularity, so a one-word edit inside a
//! long paragraph initially surfaces as "delete paragraph, insert paragraph".
//! This module re-diffs each adjacent Deleted+Inserted pair (the replace
//! pattern) at word granularity, then adjacent word-level pairs at character
//! granularity, splicing the finer result back in place of the coarse pair.
//!
//! Refinement is driven by an explicit worklist of `(pair, level)` items with
//! a level budget, not by language-level recursion: each item re-diffs a
//! strictly smaller sub-range of its parent, so the pass terminates on any
//! input. Refinement is best-effort; a refined result that does not strictly
//! reduce total edit cost is discarded and the coarse pair kept.

use std::collections::VecDeque;

use tracing::debug;

use crate::atom::{word_tokens, ContentAtom, WordToken};
use crate::config::CompareConfig;
use crate::lcs::{coalesce, demote_short_equal_runs, diff_keys, DiffRange, RangeKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Word,
    Character,
}

impl Level {
    fn depth(self) -> u32 {
        match self {
            Level::Word => 1,
            Level::Character => 2,
        }
    }

}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RefineOutcome {
    pub ranges: Vec<DiffRange>,
    pub complete: bool,
}

/// Refines every adjacent Deleted+Inserted pair in `coarse`, to at most
/// `config.max_refine_depth` levels below the coarse granularity.
pub(crate) fn refine_ranges(
    atoms_a: &[ContentAtom],
    atoms_b: &[ContentAtom],
    coarse: Vec<DiffRange>,
    config: &CompareConfig,
) -> RefineOutcome {
    let mut complete = true;
    if config.max_refine_depth == 0 {
        return RefineOutcome {
            ranges: coarse,
            complete,
        };
    }

    // Worklist items carry the level to try; finer-level items are queued
    // only for pairs produced by a coarser refinement, so every item covers
    // a strictly smaller range than its parent.
    let mut worklist: VecDeque<(DiffRange, DiffRange, Level)> = VecDeque::new();
    let mut ranges = coarse;

    for level in [Level::Word, Level::Character] {
        if level.depth() > config.max_refine_depth {
            break;
        }
        for (del, ins) in adjacent_pairs(&ranges) {
            worklist.push_back((del, ins, level));
        }
        if worklist.is_empty() {
            continue;
        }
        let mut refined_pairs = Vec::new();
        while let Some((del, ins, level)) = worklist.pop_front() {
            if let Some(sub) = refine_pair(atoms_a, atoms_b, &del, &ins, level, config, &mut complete)
            {
                debug!(
                    coarse_cost = del.len_a + ins.len_b,
                    refined_cost = sub.iter().map(DiffRange::edit_cost).sum::<usize>(),
                    ?level,
                    "refined replace pair"
                );
                refined_pairs.push(((del, ins), sub));
            }
        }
        ranges = splice_refinements(ranges, refined_pairs);
    }

    RefineOutcome { ranges, complete }
}

/// Adjacent (Deleted, Inserted) pairs in range order: the replace pattern.
fn adjacent_pairs(ranges: &[DiffRange]) -> Vec<(DiffRange, DiffRange)> {
    ranges
        .windows(2)
        .filter(|w| w[0].kind == RangeKind::Deleted && w[1].kind == RangeKind::Inserted)
        .map(|w| (w[0], w[1]))
        .collect()
}

/// Replaces each refined (del, ins) pair by its finer ranges, in order.
fn splice_refinements(
    ranges: Vec<DiffRange>,
    mut refined: Vec<((DiffRange, DiffRange), Vec<DiffRange>)>,
) -> Vec<DiffRange> {
    if refined.is_empty() {
        return ranges;
    }
    let mut out = Vec::with_capacity(ranges.len());
    let mut iter = ranges.into_iter().peekable();
    while let Some(range) = iter.next() {
        let hit = refined
            .iter()
            .position(|((del, ins), _)| *del == range && iter.peek() == Some(ins));
        if let Some(pos) = hit {
            let (_, sub) = refined.remove(pos);
            iter.next();
            out.extend(sub);
        } else {
            out.push(range);
        }
    }
    coalesce(out)
}

/// Re-diffs one replace pair at the given level. Returns `None` when the
/// refined result is not a strict improvement.
fn refine_pair(
    atoms_a: &[ContentAtom],
    atoms_b: &[ContentAtom],
    del: &DiffRange,
    ins: &DiffRange,
    level: Level,
    config: &CompareConfig,
    complete: &mut bool,
) -> Option<Vec<DiffRange>> {
    let coarse_cost = del.len_a + ins.len_b;
    if coarse_cost == 0 {
        return None;
    }

    let refined = match level {
        Level::Word => refine_at_word_level(atoms_a, atoms_b, del, ins, config, complete),
        Level::Character => refine_at_char_level(atoms_a, atoms_b, del, ins, config, complete),
    }?;

    let refined_cost: usize = refined.iter().map(DiffRange::edit_cost).sum();
    if refined_cost < coarse_cost {
        Some(refined)
    } else {
        None
    }
}

fn refine_at_word_level(
    atoms_a: &[ContentAtom],
    atoms_b: &[ContentAtom],
    del: &DiffRange,
    ins: &DiffRange,
    config: &CompareConfig,
    complete: &mut bool,
) -> Option<Vec<DiffRange>> {
    let tokens_a = word_tokens(
        atoms_a,
        del.start_a..del.start_a + del.len_a,
        config.case_insensitive,
    );
    let tokens_b = word_tokens(
        atoms_b,
        ins.start_b..ins.start_b + ins.len_b,
        config.case_insensitive,
    );
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return None;
    }

    let keys_a: Vec<u64> = tokens_a.iter().map(|t| t.key).collect();
    let keys_b: Vec<u64> = tokens_b.iter().map(|t| t.key).collect();
    let outcome = diff_keys(&keys_a, &keys_b, config.lcs_work_limit);
    *complete &= outcome.complete;

    let token_len = |tokens: &[WordToken], start: usize, len: usize| -> usize {
        tokens[start..start + len].iter().map(|t| t.len).sum()
    };
    let filtered = demote_short_equal_runs(
        outcome.ranges,
        config.min_match_length as usize,
        |r| token_len(&tokens_a, r.start_a, r.len_a),
    );

    Some(map_token_ranges(&filtered, &tokens_a, &tokens_b, del, ins))
}

fn refine_at_char_level(
    atoms_a: &[ContentAtom],
    atoms_b: &[ContentAtom],
    del: &DiffRange,
    ins: &DiffRange,
    config: &CompareConfig,
    complete: &mut bool,
) -> Option<Vec<DiffRange>> {
    let keys_a: Vec<u64> = atoms_a[del.start_a..del.start_a + del.len_a]
        .iter()
        .map(|a| a.kind.comparison_key(config.case_insensitive))
        .collect();
    let keys_b: Vec<u64> = atoms_b[ins.start_b..ins.start_b + ins.len_b]
        .iter()
        .map(|a| a.kind.comparison_key(config.case_insensitive))
        .collect();
    if keys_a.is_empty() || keys_b.is_empty() {
        return None;
    }

    let outcome = diff_keys(&keys_a, &keys_b, config.lcs_work_limit);
    *complete &= outcome.complete;
    let filtered = demote_short_equal_runs(
        outcome.ranges,
        config.min_match_length as usize,
        |r| r.len_a,
    );

    // Character keys map one-to-one onto atoms; only rebase the offsets.
    Some(
        filtered
            .into_iter()
            .map(|r| DiffRange {
                kind: r.kind,
                start_a: del.start_a + r.start_a,
                len_a: r.len_a,
                start_b: ins.start_b + r.start_b,
                len_b: r.len_b,
            })
            .collect(),
    )
}

/// Maps token-index ranges back to absolute atom offsets.
fn map_token_ranges(
    ranges: &[DiffRange],
    tokens_a: &[WordToken],
    tokens_b: &[WordToken],
    del: &DiffRange,
    ins: &DiffRange,
) -> Vec<DiffRange> {
    let a_end = del.start_a + del.len_a;
    let b_end = ins.start_b + ins.len_b;
    let start_of = |tokens: &[WordToken], idx: usize, end: usize| -> usize {
        tokens.get(idx).map_or(end, |t| t.start)
    };
    let len_of = |tokens: &[WordToken], start: usize, len: usize| -> usize {
        tokens[start..start + len].iter().map(|t| t.len).sum()
    };

    ranges
        .iter()
        .map(|r| DiffRange {
            kind: r.kind,
            start_a: start_of(tokens_a, r.start_a, a_end),
            len_a: len_of(tokens_a, r.start_a, r.len_a),
            start_b: start_of(tokens_b, r.start_b, b_end),
            len_b: len_of(tokens_b, r.start_b, r.len_b),
        })
        .collect()
}
