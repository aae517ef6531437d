#![allow(dead_code)]

use redline::{
    AnnotatedDocument, Document, MarkupNode, MarkupParagraph, Paragraph, RevisionSpan,
};

pub fn document(texts: &[&str]) -> Document {
    Document::from_paragraph_texts(texts)
}

pub fn paragraphs(texts: &[&str]) -> Vec<Paragraph> {
    texts.iter().map(|t| Paragraph::from_text(t)).collect()
}

/// Plain text of every deleted span in the body, in document order.
pub fn deleted_texts(document: &AnnotatedDocument) -> Vec<String> {
    span_texts(&document.body, |node| match node {
        MarkupNode::Delete(span) => Some(span),
        _ => None,
    })
}

/// Plain text of every inserted span in the body, in document order.
pub fn inserted_texts(document: &AnnotatedDocument) -> Vec<String> {
    span_texts(&document.body, |node| match node {
        MarkupNode::Insert(span) => Some(span),
        _ => None,
    })
}

/// Plain text of every move-from span in the body.
pub fn move_from_texts(document: &AnnotatedDocument) -> Vec<String> {
    span_texts(&document.body, |node| match node {
        MarkupNode::MoveFrom { span, .. } => Some(span),
        _ => None,
    })
}

/// Plain text of every move-to span in the body.
pub fn move_to_texts(document: &AnnotatedDocument) -> Vec<String> {
    span_texts(&document.body, |node| match node {
        MarkupNode::MoveTo { span, .. } => Some(span),
        _ => None,
    })
}

fn span_texts<'a>(
    paragraphs: &'a [MarkupParagraph],
    select: impl Fn(&'a MarkupNode) -> Option<&'a RevisionSpan>,
) -> Vec<String> {
    paragraphs
        .iter()
        .flat_map(|p| p.nodes.iter())
        .filter_map(|n| select(n).map(RevisionSpan::plain_text))
        .collect()
}

/// True when no node anywhere in the body carries revision markup.
pub fn body_is_unrevised(document: &AnnotatedDocument) -> bool {
    document.body.iter().all(|p| {
        p.mark_revision.is_none() && p.nodes.iter().all(|n| matches!(n, MarkupNode::Run(_)))
    })
}
