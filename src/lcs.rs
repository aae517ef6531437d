//! Longest-common-subsequence diff over comparison keys.
//!
//! The engine works on opaque `u64` keys so the same code serves every
//! granularity: paragraph span keys, word token keys, and per-atom keys.
//! Output is an ordered list of [`DiffRange`]s covering both inputs. Ties in
//! the dynamic program break toward consuming the A side first, which yields
//! the earliest-occurring alignment and keeps output deterministic.

/// Classification of a contiguous span of compared units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeKind {
    Equal,
    Inserted,
    Deleted,
}

/// A contiguous span over one or both input sequences.
///
/// `Equal` ranges cover both sides with `len_a == len_b`. `Inserted` ranges
/// have `len_a == 0` and `Deleted` ranges have `len_b == 0`; the empty side's
/// start still records the position the edit aligns to, which document-order
/// assembly relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffRange {
    pub kind: RangeKind,
    pub start_a: usize,
    pub len_a: usize,
    pub start_b: usize,
    pub len_b: usize,
}

impl DiffRange {
    pub(crate) fn equal(start_a: usize, start_b: usize, len: usize) -> DiffRange {
        DiffRange {
            kind: RangeKind::Equal,
            start_a,
            len_a: len,
            start_b,
            len_b: len,
        }
    }

    pub(crate) fn deleted(start_a: usize, len_a: usize, start_b: usize) -> DiffRange {
        DiffRange {
            kind: RangeKind::Deleted,
            start_a,
            len_a,
            start_b,
            len_b: 0,
        }
    }

    pub(crate) fn inserted(start_a: usize, start_b: usize, len_b: usize) -> DiffRange {
        DiffRange {
            kind: RangeKind::Inserted,
            start_a,
            len_a: 0,
            start_b,
            len_b,
        }
    }

    /// Number of units this range contributes to total edit cost.
    pub(crate) fn edit_cost(&self) -> usize {
        match self.kind {
            RangeKind::Equal => 0,
            RangeKind::Inserted | RangeKind::Deleted => self.len_a + self.len_b,
        }
    }
}

/// Result of one LCS pass. `complete` is false when the work limit forced a
/// whole-range replace fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LcsOutcome {
    pub ranges: Vec<DiffRange>,
    pub complete: bool,
}

/// Diffs two key sequences. `work_limit` bounds the DP table size (cells);
/// above it the middle section degrades to a replace.
pub(crate) fn diff_keys(keys_a: &[u64], keys_b: &[u64], work_limit: usize) -> LcsOutcome {
    let mut ranges = Vec::new();
    let mut complete = true;

    // Common prefix/suffix are equal by construction; the DP only sees the
    // differing middle.
    let prefix = common_prefix(keys_a, keys_b);
    let mid_a_end = keys_a.len();
    let mid_b_end = keys_b.len();
    let suffix = common_suffix(&keys_a[prefix..], &keys_b[prefix..]);

    if prefix > 0 {
        ranges.push(DiffRange::equal(0, 0, prefix));
    }

    let mid_a = &keys_a[prefix..mid_a_end - suffix];
    let mid_b = &keys_b[prefix..mid_b_end - suffix];

    if mid_a.is_empty() && !mid_b.is_empty() {
        ranges.push(DiffRange::inserted(prefix, prefix, mid_b.len()));
    } else if !mid_a.is_empty() && mid_b.is_empty() {
        ranges.push(DiffRange::deleted(prefix, mid_a.len(), prefix));
    } else if !mid_a.is_empty() {
        if mid_a.len().saturating_mul(mid_b.len()) > work_limit {
            ranges.push(DiffRange::deleted(prefix, mid_a.len(), prefix));
            ranges.push(DiffRange::inserted(prefix + mid_a.len(), prefix, mid_b.len()));
            complete = false;
        } else {
            middle_ranges(mid_a, mid_b, prefix, prefix, &mut ranges);
        }
    }

    if suffix > 0 {
        ranges.push(DiffRange::equal(mid_a_end - suffix, mid_b_end - suffix, suffix));
    }

    LcsOutcome {
        ranges: coalesce(ranges),
        complete,
    }
}

fn common_prefix(a: &[u64], b: &[u64]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

fn common_suffix(a: &[u64], b: &[u64]) -> usize {
    a.iter()
        .rev()
        .zip(b.iter().rev())
        .take_while(|(x, y)| x == y)
        .count()
}

/// Suffix-LCS dynamic program with forward traceback, emitting unit steps
/// that `coalesce` folds into ranges.
fn middle_ranges(
    keys_a: &[u64],
    keys_b: &[u64],
    base_a: usize,
    base_b: usize,
    out: &mut Vec<DiffRange>,
) {
    let m = keys_a.len();
    let n = keys_b.len();

    let mut dp = vec![0u32; (m + 1) * (n + 1)];
    let idx = |i: usize, j: usize| i * (n + 1) + j;
    for i in (0..m).rev() {
        for j in (0..n).rev() {
            dp[idx(i, j)] = if keys_a[i] == keys_b[j] {
                dp[idx(i + 1, j + 1)] + 1
            } else {
                dp[idx(i + 1, j)].max(dp[idx(i, j + 1)])
            };
        }
    }

    let mut i = 0usize;
    let mut j = 0usize;
    while i < m && j < n {
        if keys_a[i] == keys_b[j] {
            out.push(DiffRange::equal(base_a + i, base_b + j, 1));
            i += 1;
            j += 1;
        } else if dp[idx(i + 1, j)] >= dp[idx(i, j + 1)] {
            out.push(DiffRange::deleted(base_a + i, 1, base_b + j));
            i += 1;
        } else {
            out.push(DiffRange::inserted(base_a + i, base_b + j, 1));
            j += 1;
        }
    }
    if i < m {
        out.push(DiffRange::deleted(base_a + i, m - i, base_b + j));
    }
    if j < n {
        out.push(DiffRange::inserted(base_a + i, base_b + j, n - j));
    }
}

/// Merges adjacent ranges of the same kind.
pub(crate) fn coalesce(ranges: Vec<DiffRange>) -> Vec<DiffRange> {
    let mut out: Vec<DiffRange> = Vec::with_capacity(ranges.len());
    for range in ranges {
        if range.len_a == 0 && range.len_b == 0 {
            continue;
        }
        if let Some(last) = out.last_mut() {
            if last.kind == range.kind
                && last.start_a + last.len_a == range.start_a
                && last.start_b + last.len_b == range.start_b
            {
                last.len_a += range.len_a;
                last.len_b += range.len_b;
                continue;
            }
        }
        out.push(range);
    }
    out
}

/// Demotes `Equal` runs whose measured length (in atoms) falls below
/// `min_atoms` to insert+delete, then re-normalizes so each gap between
/// surviving anchors is one `Deleted` followed by one `Inserted`.
///
/// A demotion never applies to a run that is the entire result, so identical
/// inputs always survive as a single `Equal` range. Runs touching a sequence
/// boundary count the boundary as an edit: a short coincidental match at the
/// very start of two otherwise-divergent texts is still noise.
pub(crate) fn demote_short_equal_runs(
    ranges: Vec<DiffRange>,
    min_atoms: usize,
    measure: impl Fn(&DiffRange) -> usize,
) -> Vec<DiffRange> {
    if min_atoms <= 1 || ranges.len() <= 1 {
        return ranges;
    }

    let demoted: Vec<DiffRange> = ranges
        .iter()
        .flat_map(|range| {
            if range.kind == RangeKind::Equal && measure(range) < min_atoms {
                vec![
                    DiffRange::deleted(range.start_a, range.len_a, range.start_b),
                    DiffRange::inserted(range.start_a + range.len_a, range.start_b, range.len_b),
                ]
            } else {
                vec![*range]
            }
        })
        .collect();

    normalize_gaps(demoted)
}

/// Rewrites each maximal run of non-Equal ranges into a single `Deleted`
/// followed by a single `Inserted`. Between two Equal anchors the edited
/// units are contiguous on each side, so the merge is always valid.
fn normalize_gaps(ranges: Vec<DiffRange>) -> Vec<DiffRange> {
    let mut out: Vec<DiffRange> = Vec::with_capacity(ranges.len());
    let mut pending: Option<(usize, usize, usize, usize)> = None; // (start_a, len_a, start_b, len_b)

    let flush = |pending: &mut Option<(usize, usize, usize, usize)>, out: &mut Vec<DiffRange>| {
        if let Some((start_a, len_a, start_b, len_b)) = pending.take() {
            if len_a > 0 {
                out.push(DiffRange::deleted(start_a, len_a, start_b));
            }
            if len_b > 0 {
                out.push(DiffRange::inserted(start_a + len_a, start_b, len_b));
            }
        }
    };

    for range in ranges {
        match range.kind {
            RangeKind::Equal => {
                flush(&mut pending, &mut out);
                out.push(range);
            }
            RangeKind::Deleted | RangeKind::Inserted => {
                let entry = pending.get_or_insert((range.start_a, 0, range.start_b, 0));
                entry.1 += range.len_a;
                entry.3 += range.len_b;
            }
        }
    }
    flush(&mut pending, &mut out);
    coalesce(out)
}
