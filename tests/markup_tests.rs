mod common;

use std::collections::HashMap;

use common::*;
use redline::{
    audit_markup_ids, collect_markup_ids, compare_documents, serialize_result, CompareConfig,
    CompareResult, IdUse, MarkupNode, Paragraph, RevisionId,
};

fn busy_comparison() -> CompareResult {
    let mut old = document(&[
        "the wandering paragraph of prose",
        "first anchor paragraph in place",
        "a paragraph that will disappear",
        "second anchor paragraph in place",
        "third anchor paragraph in place",
    ]);
    let mut new = document(&[
        "first anchor paragraph in place",
        "second anchor paragraph in place",
        "the wandering paragraph of prose",
        "third anchor paragraph in place",
        "a freshly written paragraph",
    ]);
    old.footnotes
        .insert(1, vec![Paragraph::from_text("the original note wording")]);
    new.footnotes
        .insert(1, vec![Paragraph::from_text("the revised note wording")]);
    old.endnotes
        .insert(3, vec![Paragraph::from_text("an endnote to be removed")]);
    compare_documents(&old, &new, &CompareConfig::default())
}

#[test]
fn ids_are_unique_across_all_streams() {
    let result = busy_comparison();
    assert_eq!(audit_markup_ids(&result.document), Ok(()));

    let mut counts: HashMap<RevisionId, usize> = HashMap::new();
    let mut uses: HashMap<RevisionId, Vec<IdUse>> = HashMap::new();
    for (id, use_kind) in collect_markup_ids(&result.document) {
        *counts.entry(id).or_default() += 1;
        uses.entry(id).or_default().push(use_kind);
    }
    for (id, count) in counts {
        let id_uses = &uses[&id];
        if count == 2 {
            assert!(
                id_uses.contains(&IdUse::RangeStart) && id_uses.contains(&IdUse::RangeEnd),
                "shared id {id:?} is not a marker pair"
            );
        } else {
            assert_eq!(count, 1, "id {id:?} reused {count} times");
        }
    }
}

#[test]
fn move_marker_names_follow_group_ordinals() {
    let result = busy_comparison();
    let mut names = Vec::new();
    for paragraph in &result.document.body {
        for node in &paragraph.nodes {
            if let MarkupNode::MoveRangeStart { name, source, .. } = node {
                names.push((name.clone(), *source));
            }
        }
    }
    names.sort();
    assert_eq!(
        names,
        vec![("move1".to_string(), false), ("move1".to_string(), true)]
    );
}

#[test]
fn marker_pairs_share_one_id_per_side() {
    let result = busy_comparison();
    let mut starts: HashMap<String, Vec<RevisionId>> = HashMap::new();
    let mut ends: HashMap<String, Vec<RevisionId>> = HashMap::new();
    for paragraph in &result.document.body {
        for node in &paragraph.nodes {
            match node {
                MarkupNode::MoveRangeStart { id, name, .. } => {
                    starts.entry(name.clone()).or_default().push(*id)
                }
                MarkupNode::MoveRangeEnd { id, name, .. } => {
                    ends.entry(name.clone()).or_default().push(*id)
                }
                _ => {}
            }
        }
    }
    assert_eq!(starts.len(), ends.len());
    for (name, start_ids) in &starts {
        let end_ids = &ends[name];
        assert_eq!(start_ids.len(), end_ids.len());
        let mut start_sorted = start_ids.clone();
        let mut end_sorted = end_ids.clone();
        start_sorted.sort();
        end_sorted.sort();
        assert_eq!(start_sorted, end_sorted, "marker ids mismatch for {name}");
    }
}

#[test]
fn attribution_reaches_every_span() {
    let config = CompareConfig::builder()
        .author("counsel")
        .revision_date("2024-06-01T12:00:00Z")
        .build();
    let old = document(&["the original paragraph text"]);
    let new = document(&["the amended paragraph text"]);
    let result = compare_documents(&old, &new, &config);

    for paragraph in &result.document.body {
        for node in &paragraph.nodes {
            match node {
                MarkupNode::Insert(span) | MarkupNode::Delete(span) => {
                    assert_eq!(span.author, "counsel");
                    assert_eq!(span.date, "2024-06-01T12:00:00Z");
                }
                MarkupNode::Run(_) => {}
                other => panic!("unexpected node {other:?}"),
            }
        }
    }
}

#[test]
fn result_round_trips_through_json() {
    let result = busy_comparison();
    let json = serialize_result(&result).expect("serializable result");
    let parsed: CompareResult = serde_json::from_str(&json).expect("parseable result");
    assert_eq!(parsed, result);
}

#[test]
fn revised_side_formatting_wins_for_unchanged_text() {
    use redline::{Run, RunFormat};

    let old = document(&["shared text"]);
    let mut new = document(&[]);
    new.body.push(Paragraph::from_runs(vec![Run::formatted(
        "shared text",
        RunFormat {
            bold: true,
            ..RunFormat::default()
        },
    )]));

    let result = compare_documents(&old, &new, &CompareConfig::default());
    assert_eq!(result.document.body.len(), 1);
    match &result.document.body[0].nodes[0] {
        MarkupNode::Run(run) => assert!(run.format.bold),
        other => panic!("expected plain run, got {other:?}"),
    }
}
