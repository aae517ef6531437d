//! Flat revision summary of a comparison.
//!
//! The annotated document is the authoritative output; this module derives
//! the reviewer-facing list from it: one entry per markup construct, in
//! document order (body first, then footnotes by note id, then endnotes).
//! A paragraph-mark revision is folded into the construct that precedes it
//! in the same paragraph when both carry the same change, so deleting a
//! whole paragraph reads as one revision, not two.
//!
//! Strings are interned in a [`StringPool`] and resolved through the
//! report's string table, mirroring the pool-backed layout of the markup
//! pipeline.

use serde::{Deserialize, Serialize};

use crate::markup::{AnnotatedDocument, MarkRevisionKind, MarkupNode, MarkupParagraph};
use crate::string_pool::{StringId, StringPool};

pub const REPORT_VERSION: &str = "1";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevisionKind {
    Inserted,
    Deleted,
    Moved,
}

/// One tracked change, with its text and attribution held as pool ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub kind: RevisionKind,
    pub text: StringId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_group: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_move_source: Option<bool>,
    pub author: StringId,
    pub date: StringId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareReport {
    pub version: String,
    /// String table; [`StringId`] values index into it.
    pub strings: Vec<String>,
    pub revisions: Vec<Revision>,
    /// False when any diff fell back to coarse classification because a
    /// work limit was hit.
    pub complete: bool,
    pub warnings: Vec<String>,
}

impl CompareReport {
    pub fn resolve(&self, id: StringId) -> &str {
        &self.strings[id.0 as usize]
    }
}

/// Full output of one comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompareResult {
    pub document: AnnotatedDocument,
    pub report: CompareReport,
}

/// Category a revision belongs to, for mark folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Category {
    Inserted,
    Deleted,
    MovedFrom(u32),
    MovedTo(u32),
}

impl Category {
    fn of_node(node: &MarkupNode) -> Option<Category> {
        match node {
            MarkupNode::Insert(_) => Some(Category::Inserted),
            MarkupNode::Delete(_) => Some(Category::Deleted),
            MarkupNode::MoveFrom { group, .. } => Some(Category::MovedFrom(*group)),
            MarkupNode::MoveTo { group, .. } => Some(Category::MovedTo(*group)),
            _ => None,
        }
    }

    fn of_mark(kind: MarkRevisionKind) -> Category {
        match kind {
            MarkRevisionKind::Inserted => Category::Inserted,
            MarkRevisionKind::Deleted => Category::Deleted,
            MarkRevisionKind::MovedFrom { group } => Category::MovedFrom(group),
            MarkRevisionKind::MovedTo { group } => Category::MovedTo(group),
        }
    }

    fn to_revision(
        self,
        text: StringId,
        author: StringId,
        date: StringId,
    ) -> Revision {
        let (kind, move_group, is_move_source) = match self {
            Category::Inserted => (RevisionKind::Inserted, None, None),
            Category::Deleted => (RevisionKind::Deleted, None, None),
            Category::MovedFrom(group) => (RevisionKind::Moved, Some(group), Some(true)),
            Category::MovedTo(group) => (RevisionKind::Moved, Some(group), Some(false)),
        };
        Revision {
            kind,
            text,
            move_group,
            is_move_source,
            author,
            date,
        }
    }
}

/// Derives the flat revision list from an annotated document.
pub(crate) fn extract_revisions(
    document: &AnnotatedDocument,
    pool: &mut StringPool,
) -> Vec<Revision> {
    let mut revisions = Vec::new();
    extract_stream(&document.body, pool, &mut revisions);
    for paragraphs in document.footnotes.values() {
        extract_stream(paragraphs, pool, &mut revisions);
    }
    for paragraphs in document.endnotes.values() {
        extract_stream(paragraphs, pool, &mut revisions);
    }
    revisions
}

fn extract_stream(
    paragraphs: &[MarkupParagraph],
    pool: &mut StringPool,
    revisions: &mut Vec<Revision>,
) {
    for paragraph in paragraphs {
        let mut last_category = None;
        for node in &paragraph.nodes {
            let Some(category) = Category::of_node(node) else {
                if matches!(node, MarkupNode::Run(_)) {
                    last_category = None;
                }
                continue;
            };
            let span = match node {
                MarkupNode::Insert(span)
                | MarkupNode::Delete(span)
                | MarkupNode::MoveFrom { span, .. }
                | MarkupNode::MoveTo { span, .. } => span,
                _ => unreachable!("categorized nodes carry a span"),
            };
            let text = pool.intern(&span.plain_text());
            let author = pool.intern(&span.author);
            let date = pool.intern(&span.date);
            revisions.push(category.to_revision(text, author, date));
            last_category = Some(category);
        }
        if let Some(mark) = &paragraph.mark_revision {
            let category = Category::of_mark(mark.kind);
            // The mark rides along with a preceding construct of the same
            // change; a mark-only edit stands on its own as "\n".
            if last_category != Some(category) {
                let text = pool.intern("\n");
                let author = pool.intern(&mark.author);
                let date = pool.intern(&mark.date);
                revisions.push(category.to_revision(text, author, date));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{NumberingTable, Run};
    use crate::ids::RevisionId;
    use crate::markup::{MarkRevision, RevisionSpan};
    use std::collections::BTreeMap;

    fn span(id: u32, text: &str) -> RevisionSpan {
        RevisionSpan {
            id: RevisionId(id),
            author: "reviewer".to_string(),
            date: "2024-05-01T00:00:00Z".to_string(),
            runs: vec![Run::text(text)],
        }
    }

    fn mark(id: u32, kind: MarkRevisionKind) -> MarkRevision {
        MarkRevision {
            kind,
            id: RevisionId(id),
            author: "reviewer".to_string(),
            date: "2024-05-01T00:00:00Z".to_string(),
        }
    }

    fn document(body: Vec<MarkupParagraph>) -> AnnotatedDocument {
        AnnotatedDocument {
            body,
            footnotes: BTreeMap::new(),
            endnotes: BTreeMap::new(),
            numbering: NumberingTable::default(),
        }
    }

    #[test]
    fn deleted_paragraph_folds_into_one_revision() {
        let doc = document(vec![MarkupParagraph {
            style: None,
            numbering_id: None,
            nodes: vec![MarkupNode::Delete(span(1, "gone"))],
            mark_revision: Some(mark(2, MarkRevisionKind::Deleted)),
        }]);
        let mut pool = StringPool::new();
        let revisions = extract_revisions(&doc, &mut pool);
        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].kind, RevisionKind::Deleted);
        assert_eq!(pool.resolve(revisions[0].text), "gone");
    }

    #[test]
    fn mark_only_edit_surfaces_as_newline_revision() {
        // A paragraph split: content unchanged, a new mark inserted.
        let doc = document(vec![MarkupParagraph {
            style: None,
            numbering_id: None,
            nodes: vec![MarkupNode::Run(Run::text("unchanged"))],
            mark_revision: Some(mark(1, MarkRevisionKind::Inserted)),
        }]);
        let mut pool = StringPool::new();
        let revisions = extract_revisions(&doc, &mut pool);
        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].kind, RevisionKind::Inserted);
        assert_eq!(pool.resolve(revisions[0].text), "\n");
    }

    #[test]
    fn mark_of_a_different_change_is_not_folded() {
        // Deleted text, then an inserted mark: two distinct revisions.
        let doc = document(vec![MarkupParagraph {
            style: None,
            numbering_id: None,
            nodes: vec![MarkupNode::Delete(span(1, "tail"))],
            mark_revision: Some(mark(2, MarkRevisionKind::Inserted)),
        }]);
        let mut pool = StringPool::new();
        let revisions = extract_revisions(&doc, &mut pool);
        assert_eq!(revisions.len(), 2);
        assert_eq!(revisions[0].kind, RevisionKind::Deleted);
        assert_eq!(revisions[1].kind, RevisionKind::Inserted);
    }

    #[test]
    fn move_sides_carry_group_and_direction() {
        let doc = document(vec![
            MarkupParagraph {
                style: None,
                numbering_id: None,
                nodes: vec![MarkupNode::MoveFrom {
                    span: span(1, "moved"),
                    group: 1,
                }],
                mark_revision: Some(mark(2, MarkRevisionKind::MovedFrom { group: 1 })),
            },
            MarkupParagraph {
                style: None,
                numbering_id: None,
                nodes: vec![MarkupNode::MoveTo {
                    span: span(3, "moved"),
                    group: 1,
                }],
                mark_revision: Some(mark(4, MarkRevisionKind::MovedTo { group: 1 })),
            },
        ]);
        let mut pool = StringPool::new();
        let revisions = extract_revisions(&doc, &mut pool);
        assert_eq!(revisions.len(), 2);
        assert_eq!(revisions[0].kind, RevisionKind::Moved);
        assert_eq!(revisions[0].move_group, Some(1));
        assert_eq!(revisions[0].is_move_source, Some(true));
        assert_eq!(revisions[1].is_move_source, Some(false));
        // Identical text on both sides interns once.
        assert_eq!(revisions[0].text, revisions[1].text);
    }

    #[test]
    fn body_precedes_notes_in_the_flat_list() {
        let mut doc = document(vec![MarkupParagraph {
            style: None,
            numbering_id: None,
            nodes: vec![MarkupNode::Insert(span(1, "body change"))],
            mark_revision: None,
        }]);
        doc.footnotes.insert(
            1,
            vec![MarkupParagraph {
                style: None,
                numbering_id: None,
                nodes: vec![MarkupNode::Insert(span(2, "note change"))],
                mark_revision: None,
            }],
        );
        let mut pool = StringPool::new();
        let revisions = extract_revisions(&doc, &mut pool);
        assert_eq!(revisions.len(), 2);
        assert_eq!(pool.resolve(revisions[0].text), "body change");
        assert_eq!(pool.resolve(revisions[1].text), "note change");
    }
}
