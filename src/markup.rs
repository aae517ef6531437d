//! Revision markup assembly.
//!
//! Turns classified atom ranges back into a structured document with
//! tracked-change annotations:
//!
//! - Equal content is re-emitted as plain runs, formatted from the revised
//!   side.
//! - Deleted, Inserted, and moved content is wrapped in revision spans, one
//!   span per paragraph-contained construct, each carrying a fresh id from
//!   the shared allocator plus author and date attribution.
//! - Paragraph marks carry their own revision record on the paragraph, so
//!   splits, joins, and whole-paragraph edits round-trip.
//! - Each side of a move is bracketed by named range markers; the start and
//!   end marker of one bracket share a reserved id pair and both sides share
//!   the `move{N}` name.
//!
//! [`audit_markup_ids`] walks a finished document and re-verifies the id
//! discipline the allocator promises.

use std::collections::BTreeMap;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::atom::{AtomKind, ContentAtom};
use crate::document::{NumberingTable, Paragraph, Run, RunContent, RunFormat};
use crate::ids::{audit_ids, IdAllocator, IdAuditError, IdUse, RevisionId};
use crate::lcs::{DiffRange, RangeKind};
use crate::moves::MoveDetection;

/// Attribution stamped on every revision construct of one comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionMeta {
    pub author: String,
    pub date: String,
}

/// A contiguous run of revised content inside one paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevisionSpan {
    pub id: RevisionId,
    pub author: String,
    pub date: String,
    pub runs: Vec<Run>,
}

impl RevisionSpan {
    /// Plain text of the span's runs, markers rendered as in
    /// [`Paragraph::plain_text`].
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            run.append_plain_text(&mut out);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkupNode {
    /// Unchanged content.
    Run(Run),
    Insert(RevisionSpan),
    Delete(RevisionSpan),
    MoveFrom { span: RevisionSpan, group: u32 },
    MoveTo { span: RevisionSpan, group: u32 },
    MoveRangeStart { id: RevisionId, name: String, source: bool },
    MoveRangeEnd { id: RevisionId, name: String, source: bool },
}

/// Revision recorded on a paragraph's closing mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkRevision {
    pub kind: MarkRevisionKind,
    pub id: RevisionId,
    pub author: String,
    pub date: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkRevisionKind {
    Inserted,
    Deleted,
    MovedFrom { group: u32 },
    MovedTo { group: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkupParagraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering_id: Option<u32>,
    pub nodes: Vec<MarkupNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mark_revision: Option<MarkRevision>,
}

/// The comparison output document: revised-side structure annotated with
/// every change needed to recover the original.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedDocument {
    pub body: Vec<MarkupParagraph>,
    pub footnotes: BTreeMap<u32, Vec<MarkupParagraph>>,
    pub endnotes: BTreeMap<u32, Vec<MarkupParagraph>>,
    pub numbering: NumberingTable,
}

/// Which construct a range contributes to the markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConstructKind {
    Plain,
    Insert,
    Delete,
    MoveFrom(u32),
    MoveTo(u32),
}

/// Source material for one stream's assembly.
pub(crate) struct StreamInput<'a> {
    pub paras_a: &'a [Paragraph],
    pub paras_b: &'a [Paragraph],
    pub atoms_a: &'a [ContentAtom],
    pub atoms_b: &'a [ContentAtom],
}

/// Rebuilds one stream's paragraphs from its classified ranges.
pub(crate) fn assemble_stream(
    input: &StreamInput<'_>,
    ranges: &[DiffRange],
    detection: &MoveDetection,
    ids: &mut IdAllocator,
    meta: &RevisionMeta,
) -> Vec<MarkupParagraph> {
    // Bracket events keyed by range index: the first and last range of each
    // move group side open and close that side's marker pair.
    let mut opens: FxHashMap<usize, (u32, bool)> = FxHashMap::default();
    let mut closes: FxHashMap<usize, (u32, bool)> = FxHashMap::default();
    for group in &detection.groups {
        for (indices, source) in [(&group.source_ranges, true), (&group.dest_ranges, false)] {
            if let (Some(first), Some(last)) = (indices.first(), indices.last()) {
                opens.insert(*first, (group.ordinal, source));
                closes.insert(*last, (group.ordinal, source));
            }
        }
    }

    let mut asm = Assembler::new();
    // Reserved end-marker ids for brackets that are currently open.
    let mut open_brackets: FxHashMap<(u32, bool), (RevisionId, String)> = FxHashMap::default();

    for (idx, range) in ranges.iter().enumerate() {
        let link = detection.links.get(idx).copied().flatten();
        let kind = match (range.kind, link) {
            (RangeKind::Equal, _) => ConstructKind::Plain,
            (RangeKind::Deleted, Some(link)) => ConstructKind::MoveFrom(link.group),
            (RangeKind::Deleted, None) => ConstructKind::Delete,
            (RangeKind::Inserted, Some(link)) => ConstructKind::MoveTo(link.group),
            (RangeKind::Inserted, None) => ConstructKind::Insert,
        };
        let (atoms, paras) = match range.kind {
            RangeKind::Deleted => (
                &input.atoms_a[range.start_a..range.start_a + range.len_a],
                input.paras_a,
            ),
            _ => (
                &input.atoms_b[range.start_b..range.start_b + range.len_b],
                input.paras_b,
            ),
        };

        if let Some(&(ordinal, source)) = opens.get(&idx) {
            let pair = ids.reserve_range_pair();
            let name = format!("move{ordinal}");
            asm.nodes.push(MarkupNode::MoveRangeStart {
                id: pair.start,
                name: name.clone(),
                source,
            });
            open_brackets.insert((ordinal, source), (pair.end, name));
        }
        let mut close_pending = closes.get(&idx).copied();

        let last = atoms.len();
        for (i, atom) in atoms.iter().enumerate() {
            if atom.kind.is_paragraph_mark() {
                asm.flush_construct(kind, ids, meta);
                // A bracket ending on this paragraph's mark closes inside
                // the paragraph, ahead of the mark it covers.
                if i + 1 == last {
                    if let Some(key) = close_pending.take() {
                        asm.emit_close(key, &mut open_brackets);
                    }
                }
                asm.close_paragraph(kind, &paras[atom.para as usize], ids, meta);
            } else {
                asm.push_atom(atom, paras);
            }
        }
        asm.flush_construct(kind, ids, meta);
        if let Some(key) = close_pending.take() {
            asm.emit_close(key, &mut open_brackets);
        }
    }

    asm.finish()
}

struct RunAccum {
    para: u32,
    run: u32,
    format: RunFormat,
    content: Vec<RunContent>,
    text: String,
}

impl RunAccum {
    fn flush_text(&mut self) {
        if !self.text.is_empty() {
            self.content
                .push(RunContent::Text(std::mem::take(&mut self.text)));
        }
    }

    fn finish(mut self) -> Run {
        self.flush_text();
        Run {
            format: self.format,
            content: self.content,
        }
    }
}

struct Assembler {
    out: Vec<MarkupParagraph>,
    nodes: Vec<MarkupNode>,
    construct_runs: Vec<Run>,
    accum: Option<RunAccum>,
}

impl Assembler {
    fn new() -> Assembler {
        Assembler {
            out: Vec::new(),
            nodes: Vec::new(),
            construct_runs: Vec::new(),
            accum: None,
        }
    }

    fn push_atom(&mut self, atom: &ContentAtom, paras: &[Paragraph]) {
        let same_run = self
            .accum
            .as_ref()
            .is_some_and(|a| a.para == atom.para && a.run == atom.run);
        if !same_run {
            self.flush_run();
            let template = &paras[atom.para as usize].runs[atom.run as usize];
            self.accum = Some(RunAccum {
                para: atom.para,
                run: atom.run,
                format: template.format.clone(),
                content: Vec::new(),
                text: String::new(),
            });
        }
        let accum = self.accum.as_mut().expect("accumulator just ensured");
        match atom.kind {
            AtomKind::Char(c) => accum.text.push(c),
            AtomKind::Break => {
                accum.flush_text();
                accum.content.push(RunContent::Break);
            }
            AtomKind::Tab => {
                accum.flush_text();
                accum.content.push(RunContent::Tab);
            }
            // Hashed payloads are recovered through the back-reference.
            AtomKind::FieldCode(_) | AtomKind::Symbol { .. } => {
                accum.flush_text();
                let original = paras[atom.para as usize].runs[atom.run as usize].content
                    [atom.item as usize]
                    .clone();
                accum.content.push(original);
            }
            AtomKind::FootnoteRef(id) => {
                accum.flush_text();
                accum.content.push(RunContent::FootnoteReference(id));
            }
            AtomKind::EndnoteRef(id) => {
                accum.flush_text();
                accum.content.push(RunContent::EndnoteReference(id));
            }
            AtomKind::ParagraphMark => unreachable!("marks are handled by the range walker"),
        }
    }

    fn flush_run(&mut self) {
        if let Some(accum) = self.accum.take() {
            let run = accum.finish();
            if !run.content.is_empty() {
                self.construct_runs.push(run);
            }
        }
    }

    fn flush_construct(&mut self, kind: ConstructKind, ids: &mut IdAllocator, meta: &RevisionMeta) {
        self.flush_run();
        if self.construct_runs.is_empty() {
            return;
        }
        let runs = std::mem::take(&mut self.construct_runs);
        match kind {
            ConstructKind::Plain => self.nodes.extend(runs.into_iter().map(MarkupNode::Run)),
            _ => {
                let span = RevisionSpan {
                    id: ids.next(),
                    author: meta.author.clone(),
                    date: meta.date.clone(),
                    runs,
                };
                let node = match kind {
                    ConstructKind::Insert => MarkupNode::Insert(span),
                    ConstructKind::Delete => MarkupNode::Delete(span),
                    ConstructKind::MoveFrom(group) => MarkupNode::MoveFrom { span, group },
                    ConstructKind::MoveTo(group) => MarkupNode::MoveTo { span, group },
                    ConstructKind::Plain => unreachable!("plain handled above"),
                };
                self.nodes.push(node);
            }
        }
    }

    fn close_paragraph(
        &mut self,
        kind: ConstructKind,
        source: &Paragraph,
        ids: &mut IdAllocator,
        meta: &RevisionMeta,
    ) {
        let mark_kind = match kind {
            ConstructKind::Plain => None,
            ConstructKind::Insert => Some(MarkRevisionKind::Inserted),
            ConstructKind::Delete => Some(MarkRevisionKind::Deleted),
            ConstructKind::MoveFrom(group) => Some(MarkRevisionKind::MovedFrom { group }),
            ConstructKind::MoveTo(group) => Some(MarkRevisionKind::MovedTo { group }),
        };
        let mark_revision = mark_kind.map(|kind| MarkRevision {
            kind,
            id: ids.next(),
            author: meta.author.clone(),
            date: meta.date.clone(),
        });
        self.out.push(MarkupParagraph {
            style: source.style.clone(),
            numbering_id: source.numbering_id,
            nodes: std::mem::take(&mut self.nodes),
            mark_revision,
        });
    }

    fn emit_close(
        &mut self,
        key: (u32, bool),
        open_brackets: &mut FxHashMap<(u32, bool), (RevisionId, String)>,
    ) {
        if let Some((id, name)) = open_brackets.remove(&key) {
            self.nodes.push(MarkupNode::MoveRangeEnd {
                id,
                name,
                source: key.1,
            });
        }
    }

    fn finish(mut self) -> Vec<MarkupParagraph> {
        // Streams end on a paragraph mark, so this is empty except for the
        // degenerate empty-versus-empty stream.
        self.flush_run();
        if !self.construct_runs.is_empty() || !self.nodes.is_empty() {
            self.nodes.extend(
                std::mem::take(&mut self.construct_runs)
                    .into_iter()
                    .map(MarkupNode::Run),
            );
            self.out.push(MarkupParagraph {
                style: None,
                numbering_id: None,
                nodes: std::mem::take(&mut self.nodes),
                mark_revision: None,
            });
        }
        self.out
    }
}

/// Downgrades move markup to plain insert/delete markup. Construct ids are
/// preserved; the range markers and their reserved ids are dropped.
pub(crate) fn simplify_move_markup(document: &mut AnnotatedDocument) {
    let simplify_stream = |paragraphs: &mut Vec<MarkupParagraph>| {
        for paragraph in paragraphs {
            paragraph.nodes = std::mem::take(&mut paragraph.nodes)
                .into_iter()
                .filter_map(|node| match node {
                    MarkupNode::MoveFrom { span, .. } => Some(MarkupNode::Delete(span)),
                    MarkupNode::MoveTo { span, .. } => Some(MarkupNode::Insert(span)),
                    MarkupNode::MoveRangeStart { .. } | MarkupNode::MoveRangeEnd { .. } => None,
                    other => Some(other),
                })
                .collect();
            if let Some(mark) = paragraph.mark_revision.as_mut() {
                mark.kind = match mark.kind {
                    MarkRevisionKind::MovedFrom { .. } => MarkRevisionKind::Deleted,
                    MarkRevisionKind::MovedTo { .. } => MarkRevisionKind::Inserted,
                    other => other,
                };
            }
        }
    };
    simplify_stream(&mut document.body);
    for paragraphs in document.footnotes.values_mut() {
        simplify_stream(paragraphs);
    }
    for paragraphs in document.endnotes.values_mut() {
        simplify_stream(paragraphs);
    }
}

/// Every identifier in the document, in stream order, tagged by use.
pub fn collect_markup_ids(document: &AnnotatedDocument) -> Vec<(RevisionId, IdUse)> {
    let mut uses = Vec::new();
    let mut visit = |paragraphs: &[MarkupParagraph]| {
        for paragraph in paragraphs {
            for node in &paragraph.nodes {
                match node {
                    MarkupNode::Run(_) => {}
                    MarkupNode::Insert(span)
                    | MarkupNode::Delete(span)
                    | MarkupNode::MoveFrom { span, .. }
                    | MarkupNode::MoveTo { span, .. } => {
                        uses.push((span.id, IdUse::Construct));
                    }
                    MarkupNode::MoveRangeStart { id, .. } => uses.push((*id, IdUse::RangeStart)),
                    MarkupNode::MoveRangeEnd { id, .. } => uses.push((*id, IdUse::RangeEnd)),
                }
            }
            if let Some(mark) = &paragraph.mark_revision {
                uses.push((mark.id, IdUse::Construct));
            }
        }
    };
    visit(&document.body);
    for paragraphs in document.footnotes.values() {
        visit(paragraphs);
    }
    for paragraphs in document.endnotes.values() {
        visit(paragraphs);
    }
    uses
}

/// Checks the whole-document id discipline: unique everywhere, except the
/// start/end marker pairs that deliberately share one id.
pub fn audit_markup_ids(document: &AnnotatedDocument) -> Result<(), IdAuditError> {
    audit_ids(collect_markup_ids(document))
}
