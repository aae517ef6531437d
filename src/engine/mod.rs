//! Top-level document comparison.
//!
//! [`compare_documents`] runs every stream of the two documents through the
//! per-stream pipeline and stitches the results into one
//! [`CompareResult`]: the body first, then each footnote and endnote
//! stream, all drawing revision ids from one shared allocator so an id
//! never repeats across streams. Numbering definitions from both sides are
//! merged, the revised side winning conflicts.

mod stream;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{SecondsFormat, Utc};
use tracing::debug;

use crate::atom::StreamKind;
use crate::config::CompareConfig;
use crate::document::{Document, NumberingTable, Paragraph};
use crate::ids::IdAllocator;
use crate::markup::{audit_markup_ids, simplify_move_markup, AnnotatedDocument, RevisionMeta};
use crate::revision::{extract_revisions, CompareReport, CompareResult, REPORT_VERSION};
use crate::session::CompareSession;

use stream::compare_stream;

/// Compares two documents using the thread-local default session.
pub fn compare_documents(
    old: &Document,
    new: &Document,
    config: &CompareConfig,
) -> CompareResult {
    crate::with_default_session(|session| {
        compare_documents_with_session(old, new, config, session)
    })
}

/// Compares two documents, interning report strings in the caller's
/// session.
pub fn compare_documents_with_session(
    old: &Document,
    new: &Document,
    config: &CompareConfig,
    session: &mut CompareSession,
) -> CompareResult {
    let config = config.sanitized();
    let meta = RevisionMeta {
        author: config.author.clone(),
        date: config
            .revision_date
            .clone()
            .unwrap_or_else(default_revision_date),
    };

    let mut ids = IdAllocator::new();
    let mut complete = true;
    let mut warnings = Vec::new();

    let body = {
        let outcome = compare_stream(
            &old.body,
            &new.body,
            StreamKind::Body,
            &config,
            &mut ids,
            &meta,
        );
        complete &= outcome.complete;
        warnings.extend(outcome.warnings);
        outcome.paragraphs
    };

    let footnotes = compare_note_streams(
        &old.footnotes,
        &new.footnotes,
        StreamKind::Footnote,
        &config,
        &mut ids,
        &meta,
        &mut complete,
        &mut warnings,
    );
    let endnotes = compare_note_streams(
        &old.endnotes,
        &new.endnotes,
        StreamKind::Endnote,
        &config,
        &mut ids,
        &meta,
        &mut complete,
        &mut warnings,
    );

    let mut document = AnnotatedDocument {
        body,
        footnotes,
        endnotes,
        numbering: NumberingTable::union(&old.numbering, &new.numbering),
    };
    if config.simplify_move_markup {
        simplify_move_markup(&mut document);
    }
    debug_assert!(
        audit_markup_ids(&document).is_ok(),
        "id discipline violated: {:?}",
        audit_markup_ids(&document)
    );

    let revisions = extract_revisions(&document, &mut session.strings);
    debug!(
        revisions = revisions.len(),
        complete,
        warnings = warnings.len(),
        "comparison finished"
    );
    let report = CompareReport {
        version: REPORT_VERSION.to_string(),
        strings: session.strings.strings().to_vec(),
        revisions,
        complete,
        warnings,
    };
    CompareResult { document, report }
}

/// Compares each note id present on either side; a note missing from one
/// side is compared against an empty stream and so comes out fully
/// inserted or fully deleted.
#[allow(clippy::too_many_arguments)]
fn compare_note_streams(
    old: &BTreeMap<u32, Vec<Paragraph>>,
    new: &BTreeMap<u32, Vec<Paragraph>>,
    stream_of: impl Fn(u32) -> StreamKind,
    config: &CompareConfig,
    ids: &mut IdAllocator,
    meta: &RevisionMeta,
    complete: &mut bool,
    warnings: &mut Vec<String>,
) -> BTreeMap<u32, Vec<crate::markup::MarkupParagraph>> {
    let note_ids: BTreeSet<u32> = old.keys().chain(new.keys()).copied().collect();
    let mut out = BTreeMap::new();
    for note_id in note_ids {
        let paras_a = old.get(&note_id).map_or(&[][..], Vec::as_slice);
        let paras_b = new.get(&note_id).map_or(&[][..], Vec::as_slice);
        let outcome = compare_stream(paras_a, paras_b, stream_of(note_id), config, ids, meta);
        *complete &= outcome.complete;
        warnings.extend(outcome.warnings);
        if !outcome.paragraphs.is_empty() {
            out.insert(note_id, outcome.paragraphs);
        }
    }
    out
}

fn default_revision_date() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
