//! Structural document model.
//!
//! This module defines the input representation the comparison engine works
//! over:
//! - [`Document`]: body paragraphs plus footnote/endnote streams and the
//!   numbering-definition table
//! - [`Paragraph`] / [`Run`] / [`RunContent`]: the ordered content tree
//! - [`NumberingTable`]: auxiliary list/numbering definitions keyed by id
//!
//! Storage is flat: paragraphs and runs live in plain `Vec`s and everything
//! downstream addresses them by integer index, never by pointer.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A structured document: the unit of comparison.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Document {
    /// Main-body paragraphs in document order.
    pub body: Vec<Paragraph>,
    /// Footnote content streams keyed by reference id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub footnotes: BTreeMap<u32, Vec<Paragraph>>,
    /// Endnote content streams keyed by reference id.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub endnotes: BTreeMap<u32, Vec<Paragraph>>,
    /// Numbering/style definitions referenced by paragraphs.
    #[serde(default, skip_serializing_if = "NumberingTable::is_empty")]
    pub numbering: NumberingTable,
}

impl Document {
    pub fn new() -> Document {
        Document::default()
    }

    /// Convenience constructor: one plain paragraph per input string.
    pub fn from_paragraph_texts<S: AsRef<str>>(texts: &[S]) -> Document {
        Document {
            body: texts
                .iter()
                .map(|t| Paragraph::from_text(t.as_ref()))
                .collect(),
            ..Document::default()
        }
    }
}

/// A paragraph: an ordered list of runs plus optional paragraph-level style.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    /// Numbering definition this paragraph references, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering_id: Option<u32>,
    pub runs: Vec<Run>,
}

impl Paragraph {
    pub fn from_text(text: &str) -> Paragraph {
        Paragraph {
            style: None,
            numbering_id: None,
            runs: vec![Run::text(text)],
        }
    }

    pub fn from_runs(runs: Vec<Run>) -> Paragraph {
        Paragraph {
            style: None,
            numbering_id: None,
            runs,
        }
    }

    /// Plain text of all runs, markers rendered as control characters.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            run.append_plain_text(&mut out);
        }
        out
    }
}

/// A run: a formatting boundary containing atomic content items.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Run {
    #[serde(default, skip_serializing_if = "RunFormat::is_default")]
    pub format: RunFormat,
    pub content: Vec<RunContent>,
}

impl Run {
    pub fn text(text: &str) -> Run {
        Run {
            format: RunFormat::default(),
            content: vec![RunContent::Text(text.to_owned())],
        }
    }

    pub fn formatted(text: &str, format: RunFormat) -> Run {
        Run {
            format,
            content: vec![RunContent::Text(text.to_owned())],
        }
    }

    pub fn append_plain_text(&self, out: &mut String) {
        for item in &self.content {
            match item {
                RunContent::Text(t) => out.push_str(t),
                RunContent::Break => out.push('\n'),
                RunContent::Tab => out.push('\t'),
                RunContent::FieldCode(_) => {}
                RunContent::Symbol { code, .. } => out.push(*code),
                RunContent::FootnoteReference(_) | RunContent::EndnoteReference(_) => {}
            }
        }
    }
}

/// Effective formatting of a run, reduced to the properties the comparison
/// fingerprint cares about.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RunFormat {
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
}

impl RunFormat {
    pub fn is_default(&self) -> bool {
        *self == RunFormat::default()
    }
}

/// One indivisible content item inside a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RunContent {
    Text(String),
    Break,
    Tab,
    /// An embedded field instruction (page number, cross-reference, ...).
    FieldCode(String),
    Symbol {
        font: String,
        code: char,
    },
    FootnoteReference(u32),
    EndnoteReference(u32),
}

/// Auxiliary numbering/style definition table, keyed by definition id.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NumberingTable {
    pub definitions: BTreeMap<u32, NumberingDefinition>,
}

impl NumberingTable {
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn insert(&mut self, id: u32, definition: NumberingDefinition) {
        self.definitions.insert(id, definition);
    }

    pub fn get(&self, id: u32) -> Option<&NumberingDefinition> {
        self.definitions.get(&id)
    }

    /// Union merge of the two sides' definition tables.
    ///
    /// Definitions present on either side survive. When both sides define the
    /// same id differently, the revised side's definition wins: the merged
    /// body text references the revised content, so its numbering semantics
    /// must render.
    pub fn union(base: &NumberingTable, revised: &NumberingTable) -> NumberingTable {
        let mut merged = base.clone();
        for (id, definition) in &revised.definitions {
            match merged.definitions.get(id) {
                Some(existing) if existing == definition => {}
                _ => {
                    merged.definitions.insert(*id, definition.clone());
                }
            }
        }
        merged
    }
}

/// One multi-level numbering definition.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct NumberingDefinition {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub levels: Vec<NumberingLevel>,
}

/// One level of a numbering definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumberingLevel {
    pub format: NumberFormat,
    /// Display template, e.g. `"%1."` or `"%1.%2"`.
    pub text: String,
    /// Legal-style numbering: render all levels as decimal regardless of
    /// `format`.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub legal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumberFormat {
    Decimal,
    LowerLetter,
    UpperLetter,
    LowerRoman,
    UpperRoman,
    Bullet,
    None,
}
