//! Per-stream comparison pipeline.
//!
//! One stream (body, a footnote, an endnote) runs the full sequence:
//! atomize both sides, align at paragraph granularity, refine replace pairs
//! down to words and characters, detect moves, then assemble markup. The
//! caller supplies the id allocator so identifiers stay unique across every
//! stream of one comparison.

use tracing::debug;

use crate::atom::{atomize, paragraph_spans, ParagraphSpan, StreamKind};
use crate::config::CompareConfig;
use crate::document::Paragraph;
use crate::ids::IdAllocator;
use crate::lcs::{diff_keys, DiffRange};
use crate::markup::{assemble_stream, MarkupParagraph, RevisionMeta, StreamInput};
use crate::moves::detect_moves;
use crate::refine::refine_ranges;

pub(crate) struct StreamOutcome {
    pub paragraphs: Vec<MarkupParagraph>,
    pub complete: bool,
    pub warnings: Vec<String>,
}

pub(crate) fn compare_stream(
    paras_a: &[Paragraph],
    paras_b: &[Paragraph],
    stream: StreamKind,
    config: &CompareConfig,
    ids: &mut IdAllocator,
    meta: &RevisionMeta,
) -> StreamOutcome {
    let seq_a = atomize(paras_a, stream);
    let seq_b = atomize(paras_b, stream);
    debug!(
        ?stream,
        paragraphs_a = paras_a.len(),
        paragraphs_b = paras_b.len(),
        atoms_a = seq_a.len(),
        atoms_b = seq_b.len(),
        "comparing stream"
    );

    let mut warnings = Vec::new();

    // Paragraph-level alignment over whole-paragraph keys. No minimum match
    // length applies here; a single matching paragraph is a real anchor.
    let spans_a = paragraph_spans(&seq_a.atoms, config.case_insensitive);
    let spans_b = paragraph_spans(&seq_b.atoms, config.case_insensitive);
    let keys_a: Vec<u64> = spans_a.iter().map(|s| s.key).collect();
    let keys_b: Vec<u64> = spans_b.iter().map(|s| s.key).collect();
    let aligned = diff_keys(&keys_a, &keys_b, config.lcs_work_limit);
    let mut complete = aligned.complete;
    if !aligned.complete {
        warnings.push(format!(
            "[REDLINE_DIFF_001] {stream:?}: paragraph alignment exceeded the work limit, \
             classification is coarse"
        ));
    }

    let atom_ranges = span_ranges_to_atom_ranges(
        &aligned.ranges,
        &spans_a,
        &spans_b,
        seq_a.len(),
        seq_b.len(),
    );

    let refined = refine_ranges(&seq_a.atoms, &seq_b.atoms, atom_ranges, config);
    if !refined.complete {
        complete = false;
        warnings.push(format!(
            "[REDLINE_DIFF_002] {stream:?}: refinement exceeded the work limit, \
             some replace pairs kept their coarse classification"
        ));
    }

    let detection = detect_moves(&seq_a.atoms, &seq_b.atoms, &refined.ranges, config);

    let input = StreamInput {
        paras_a,
        paras_b,
        atoms_a: &seq_a.atoms,
        atoms_b: &seq_b.atoms,
    };
    let paragraphs = assemble_stream(&input, &refined.ranges, &detection, ids, meta);
    debug!(
        ?stream,
        ranges = refined.ranges.len(),
        move_groups = detection.groups.len(),
        paragraphs = paragraphs.len(),
        "stream assembled"
    );

    StreamOutcome {
        paragraphs,
        complete,
        warnings,
    }
}

/// Translates paragraph-index ranges into atom-index ranges.
fn span_ranges_to_atom_ranges(
    ranges: &[DiffRange],
    spans_a: &[ParagraphSpan],
    spans_b: &[ParagraphSpan],
    total_a: usize,
    total_b: usize,
) -> Vec<DiffRange> {
    let extent = |spans: &[ParagraphSpan], start: usize, len: usize, total: usize| {
        let atom_start = spans.get(start).map_or(total, |s| s.start);
        let atom_len = spans[start..start + len].iter().map(|s| s.len).sum();
        (atom_start, atom_len)
    };
    ranges
        .iter()
        .map(|r| {
            let (start_a, len_a) = extent(spans_a, r.start_a, r.len_a, total_a);
            let (start_b, len_b) = extent(spans_b, r.start_b, r.len_b, total_b);
            DiffRange {
                kind: r.kind,
                start_a,
                len_a,
                start_b,
                len_b,
            }
        })
        .collect()
}
