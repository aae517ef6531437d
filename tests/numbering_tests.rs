mod common;

use common::*;
use redline::{
    compare_documents, CompareConfig, NumberFormat, NumberingDefinition, NumberingLevel,
};

fn definition(name: &str, format: NumberFormat) -> NumberingDefinition {
    NumberingDefinition {
        name: Some(name.to_string()),
        levels: vec![NumberingLevel {
            format,
            text: "%1.".to_string(),
            legal: false,
        }],
    }
}

#[test]
fn numbering_tables_are_merged() {
    let mut old = document(&["numbered paragraph"]);
    let mut new = document(&["numbered paragraph"]);
    old.numbering
        .insert(1, definition("outline", NumberFormat::Decimal));
    new.numbering
        .insert(2, definition("bullets", NumberFormat::Bullet));

    let result = compare_documents(&old, &new, &CompareConfig::default());
    assert_eq!(result.document.numbering.definitions.len(), 2);
    assert!(result.document.numbering.get(1).is_some());
    assert!(result.document.numbering.get(2).is_some());
}

#[test]
fn revised_side_wins_conflicting_definitions() {
    let mut old = document(&["numbered paragraph"]);
    let mut new = document(&["numbered paragraph"]);
    old.numbering
        .insert(5, definition("original", NumberFormat::Decimal));
    new.numbering
        .insert(5, definition("replacement", NumberFormat::LowerRoman));

    let result = compare_documents(&old, &new, &CompareConfig::default());
    let merged = result
        .document
        .numbering
        .get(5)
        .expect("definition retained");
    assert_eq!(merged.name.as_deref(), Some("replacement"));
    assert_eq!(merged.levels[0].format, NumberFormat::LowerRoman);
}

#[test]
fn paragraph_numbering_ids_survive_markup() {
    let mut old = document(&[]);
    let mut new = document(&[]);
    let mut para_old = paragraphs(&["a numbered list item"]).remove(0);
    para_old.numbering_id = Some(3);
    let mut para_new = paragraphs(&["a renumbered list item"]).remove(0);
    para_new.numbering_id = Some(3);
    old.body.push(para_old);
    new.body.push(para_new);

    let result = compare_documents(&old, &new, &CompareConfig::default());
    assert_eq!(result.document.body[0].numbering_id, Some(3));
}
