//! Document comparison with revision markup.
//!
//! `redline` compares two structured documents and produces the revised
//! document annotated with tracked changes: insertions, deletions, and
//! detected moves, each attributed and carrying a unique revision id. A
//! flat [`CompareReport`] summarizes the same changes for reviewers.
//!
//! The pipeline, per stream (body, footnotes, endnotes):
//!
//! 1. [`atom::atomize`] flattens paragraphs into comparable atoms.
//! 2. The diff engine aligns whole paragraphs, then refines each replaced
//!    region at word and character granularity.
//! 3. Move detection pairs deleted and inserted ranges by word-level
//!    similarity.
//! 4. The markup assembler rebuilds paragraphs with revision spans, move
//!    brackets, and paragraph-mark revisions.
//!
//! ```
//! use redline::{compare_documents, CompareConfig, Document};
//!
//! let old = Document::from_paragraph_texts(&["the quick brown fox"]);
//! let new = Document::from_paragraph_texts(&["the quick brown cat"]);
//! let result = compare_documents(&old, &new, &CompareConfig::default());
//! assert_eq!(result.report.revisions.len(), 2);
//! ```

use std::cell::RefCell;

pub mod atom;
pub mod config;
pub mod document;
mod engine;
mod hashing;
pub mod ids;
pub mod lcs;
pub mod markup;
pub mod moves;
pub mod output;
mod refine;
pub mod revision;
pub mod session;
pub mod string_pool;

pub use atom::{AtomKind, AtomSequence, ContentAtom, StreamKind};
pub use config::{CompareConfig, CompareConfigBuilder, ConfigError};
pub use document::{
    Document, NumberFormat, NumberingDefinition, NumberingLevel, NumberingTable, Paragraph, Run,
    RunContent, RunFormat,
};
pub use engine::{compare_documents, compare_documents_with_session};
pub use ids::{audit_ids, IdAllocator, IdAuditError, IdUse, RevisionId};
pub use lcs::{DiffRange, RangeKind};
pub use markup::{
    audit_markup_ids, collect_markup_ids, AnnotatedDocument, MarkRevision, MarkRevisionKind,
    MarkupNode, MarkupParagraph, RevisionMeta, RevisionSpan,
};
pub use moves::{MoveGroup, MoveLink};
pub use output::{revision_views, serialize_report, serialize_result, RevisionView};
pub use revision::{CompareReport, CompareResult, Revision, RevisionKind, REPORT_VERSION};
pub use session::CompareSession;
pub use string_pool::{StringId, StringPool};

thread_local! {
    static DEFAULT_SESSION: RefCell<CompareSession> = RefCell::new(CompareSession::new());
}

/// Runs `f` with the thread-local default session. [`compare_documents`]
/// uses this session; long-running callers that want control over interned
/// string lifetime should hold their own [`CompareSession`] and call
/// [`compare_documents_with_session`] instead.
pub fn with_default_session<R>(f: impl FnOnce(&mut CompareSession) -> R) -> R {
    DEFAULT_SESSION.with(|session| f(&mut session.borrow_mut()))
}
