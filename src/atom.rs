//! Atomization of structural content into comparable sequences.
//!
//! The atomizer flattens a paragraph tree into one ordered [`AtomSequence`]
//! per content stream. Every atom carries integer back-references
//! (paragraph, run, content item) into the source document, so the markup
//! assembler can regenerate structure and formatting from the sequence alone.
//! Each paragraph contributes a trailing [`AtomKind::ParagraphMark`] atom,
//! making paragraph boundaries part of the comparable content.

use std::hash::{Hash, Hasher};
use std::ops::Range;
use xxhash_rust::xxh64::Xxh64;

use crate::document::{Paragraph, RunContent};
use crate::hashing::{combine_hashes, format_fingerprint, hash_key_str, XXH64_SEED};

/// Which content stream a sequence was atomized from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Body,
    Footnote(u32),
    Endnote(u32),
}

/// Semantic payload of one atom: a single character or one indivisible
/// non-text marker. Marker payloads that carry free text (field codes,
/// symbol fonts) are reduced to hashes; the assembler reconstructs the
/// original item through the back-reference, never from the atom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtomKind {
    Char(char),
    ParagraphMark,
    Break,
    Tab,
    FieldCode(u64),
    Symbol { font: u64, code: char },
    FootnoteRef(u32),
    EndnoteRef(u32),
}

impl AtomKind {
    /// Content-equality key. Formatting fingerprints are deliberately not
    /// part of this key; only content participates in matching.
    pub(crate) fn comparison_key(&self, case_insensitive: bool) -> u64 {
        let mut hasher = Xxh64::new(XXH64_SEED);
        if case_insensitive {
            if let AtomKind::Char(c) = self {
                0u8.hash(&mut hasher);
                for folded in c.to_lowercase() {
                    folded.hash(&mut hasher);
                }
                return hasher.finish();
            }
        }
        self.hash(&mut hasher);
        hasher.finish()
    }

    pub(crate) fn is_paragraph_mark(&self) -> bool {
        matches!(self, AtomKind::ParagraphMark)
    }
}

/// The smallest comparable unit of content. Immutable once atomized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContentAtom {
    pub kind: AtomKind,
    /// Index of the owning paragraph within its stream.
    pub para: u32,
    /// Index of the owning run; `runs.len()` for the paragraph mark.
    pub run: u32,
    /// Index of the owning content item within the run.
    pub item: u32,
    /// Fingerprint of the owning run's effective formatting.
    pub fingerprint: u64,
}

/// Ordered atoms for one document side of one stream. Never mutated after
/// atomization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomSequence {
    pub stream: StreamKind,
    pub atoms: Vec<ContentAtom>,
}

impl AtomSequence {
    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Per-atom comparison keys for the diff engine.
    pub(crate) fn keys(&self, case_insensitive: bool) -> Vec<u64> {
        self.atoms
            .iter()
            .map(|a| a.kind.comparison_key(case_insensitive))
            .collect()
    }
}

/// Flattens one stream's paragraphs into an atom sequence.
pub fn atomize(paragraphs: &[Paragraph], stream: StreamKind) -> AtomSequence {
    let mut atoms = Vec::new();
    for (p_idx, paragraph) in paragraphs.iter().enumerate() {
        for (r_idx, run) in paragraph.runs.iter().enumerate() {
            let fingerprint = format_fingerprint(&run.format);
            for (i_idx, item) in run.content.iter().enumerate() {
                let push = |kind: AtomKind, atoms: &mut Vec<ContentAtom>| {
                    atoms.push(ContentAtom {
                        kind,
                        para: p_idx as u32,
                        run: r_idx as u32,
                        item: i_idx as u32,
                        fingerprint,
                    });
                };
                match item {
                    RunContent::Text(text) => {
                        for ch in text.chars() {
                            push(AtomKind::Char(ch), &mut atoms);
                        }
                    }
                    RunContent::Break => push(AtomKind::Break, &mut atoms),
                    RunContent::Tab => push(AtomKind::Tab, &mut atoms),
                    RunContent::FieldCode(code) => {
                        push(AtomKind::FieldCode(hash_key_str(code)), &mut atoms)
                    }
                    RunContent::Symbol { font, code } => push(
                        AtomKind::Symbol {
                            font: hash_key_str(font),
                            code: *code,
                        },
                        &mut atoms,
                    ),
                    RunContent::FootnoteReference(id) => {
                        push(AtomKind::FootnoteRef(*id), &mut atoms)
                    }
                    RunContent::EndnoteReference(id) => push(AtomKind::EndnoteRef(*id), &mut atoms),
                }
            }
        }
        atoms.push(ContentAtom {
            kind: AtomKind::ParagraphMark,
            para: p_idx as u32,
            run: paragraph.runs.len() as u32,
            item: 0,
            fingerprint: 0,
        });
    }
    AtomSequence { stream, atoms }
}

/// A paragraph's extent within an atom sequence, inclusive of its trailing
/// paragraph mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ParagraphSpan {
    pub start: usize,
    pub len: usize,
    /// Order-sensitive combination of the span's atom keys.
    pub key: u64,
}

pub(crate) fn paragraph_spans(atoms: &[ContentAtom], case_insensitive: bool) -> Vec<ParagraphSpan> {
    let mut spans = Vec::new();
    let mut start = 0usize;
    let mut key = 0u64;
    for (idx, atom) in atoms.iter().enumerate() {
        key = combine_hashes(key, atom.kind.comparison_key(case_insensitive));
        if atom.kind.is_paragraph_mark() {
            spans.push(ParagraphSpan {
                start,
                len: idx + 1 - start,
                key,
            });
            start = idx + 1;
            key = 0;
        }
    }
    debug_assert_eq!(start, atoms.len(), "atom sequence must end on a paragraph mark");
    spans
}

/// A word-granularity token over a slice of atoms. Consecutive non-whitespace
/// characters form one token; whitespace characters and non-text markers are
/// tokens of their own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct WordToken {
    pub start: usize,
    pub len: usize,
    pub key: u64,
    /// True when the token contains at least one alphanumeric character,
    /// i.e. it counts toward move-detection word counts.
    pub is_word: bool,
}

pub(crate) fn word_tokens(
    atoms: &[ContentAtom],
    range: Range<usize>,
    case_insensitive: bool,
) -> Vec<WordToken> {
    let mut tokens = Vec::new();
    let mut current: Option<WordToken> = None;

    for idx in range {
        let atom = &atoms[idx];
        let atom_key = atom.kind.comparison_key(case_insensitive);
        match atom.kind {
            AtomKind::Char(c) if !c.is_whitespace() => {
                let token = current.get_or_insert(WordToken {
                    start: idx,
                    len: 0,
                    key: 0,
                    is_word: false,
                });
                token.len += 1;
                token.key = combine_hashes(token.key, atom_key);
                token.is_word |= c.is_alphanumeric();
            }
            _ => {
                if let Some(token) = current.take() {
                    tokens.push(token);
                }
                tokens.push(WordToken {
                    start: idx,
                    len: 1,
                    key: combine_hashes(0, atom_key),
                    is_word: false,
                });
            }
        }
    }
    if let Some(token) = current.take() {
        tokens.push(token);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{Run, RunFormat};

    fn atoms_of(text: &str) -> AtomSequence {
        atomize(&[Paragraph::from_text(text)], StreamKind::Body)
    }

    #[test]
    fn empty_stream_produces_empty_sequence() {
        let seq = atomize(&[], StreamKind::Body);
        assert!(seq.is_empty());
    }

    #[test]
    fn every_paragraph_ends_with_a_mark() {
        let paras = vec![Paragraph::from_text("ab"), Paragraph::default()];
        let seq = atomize(&paras, StreamKind::Body);
        assert_eq!(seq.len(), 4);
        assert_eq!(seq.atoms[2].kind, AtomKind::ParagraphMark);
        assert_eq!(seq.atoms[3].kind, AtomKind::ParagraphMark);
        assert_eq!(seq.atoms[3].para, 1);
    }

    #[test]
    fn back_references_address_paragraph_run_item() {
        let para = Paragraph::from_runs(vec![
            Run::text("x"),
            Run::formatted("y", RunFormat {
                bold: true,
                ..RunFormat::default()
            }),
        ]);
        let seq = atomize(&[para], StreamKind::Body);
        assert_eq!(seq.atoms[0].run, 0);
        assert_eq!(seq.atoms[1].run, 1);
        assert_ne!(seq.atoms[0].fingerprint, seq.atoms[1].fingerprint);
    }

    #[test]
    fn comparison_key_ignores_formatting() {
        let plain = atoms_of("a");
        let bold = atomize(
            &[Paragraph::from_runs(vec![Run::formatted(
                "a",
                RunFormat {
                    bold: true,
                    ..RunFormat::default()
                },
            )])],
            StreamKind::Body,
        );
        assert_eq!(
            plain.atoms[0].kind.comparison_key(false),
            bold.atoms[0].kind.comparison_key(false)
        );
    }

    #[test]
    fn case_folding_applies_only_when_requested() {
        let upper = AtomKind::Char('A');
        let lower = AtomKind::Char('a');
        assert_ne!(upper.comparison_key(false), lower.comparison_key(false));
        assert_eq!(upper.comparison_key(true), lower.comparison_key(true));
    }

    #[test]
    fn paragraph_spans_cover_the_sequence() {
        let paras = vec![Paragraph::from_text("ab"), Paragraph::from_text("c")];
        let seq = atomize(&paras, StreamKind::Body);
        let spans = paragraph_spans(&seq.atoms, false);
        assert_eq!(spans.len(), 2);
        assert_eq!((spans[0].start, spans[0].len), (0, 3));
        assert_eq!((spans[1].start, spans[1].len), (3, 2));
        assert_ne!(spans[0].key, spans[1].key);
    }

    #[test]
    fn identical_paragraphs_share_span_keys() {
        let seq_a = atoms_of("hello world");
        let seq_b = atoms_of("hello world");
        let spans_a = paragraph_spans(&seq_a.atoms, false);
        let spans_b = paragraph_spans(&seq_b.atoms, false);
        assert_eq!(spans_a[0].key, spans_b[0].key);
    }

    #[test]
    fn word_tokens_split_on_whitespace() {
        let seq = atoms_of("ab cd");
        let tokens = word_tokens(&seq.atoms, 0..seq.len(), false);
        // "ab", " ", "cd", paragraph mark
        assert_eq!(tokens.len(), 4);
        assert!(tokens[0].is_word);
        assert!(!tokens[1].is_word);
        assert!(tokens[2].is_word);
        assert!(!tokens[3].is_word);
        assert_eq!(tokens[0].len, 2);
        assert_eq!(tokens[2].start, 3);
    }

    #[test]
    fn word_token_keys_fold_case_when_requested() {
        let seq_a = atoms_of("Word");
        let seq_b = atoms_of("word");
        let tok_a = word_tokens(&seq_a.atoms, 0..seq_a.len(), true);
        let tok_b = word_tokens(&seq_b.atoms, 0..seq_b.len(), true);
        assert_eq!(tok_a[0].key, tok_b[0].key);
    }
}
