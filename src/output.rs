//! Report serialization and resolved views.

use serde::{Deserialize, Serialize};

use crate::revision::{CompareReport, CompareResult, RevisionKind};

/// A revision with its pool ids resolved to owned strings, for consumers
/// that do not want to carry the string table around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevisionView {
    pub kind: RevisionKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_group: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_move_source: Option<bool>,
    pub author: String,
    pub date: String,
}

/// Resolves every revision in the report against its string table.
pub fn revision_views(report: &CompareReport) -> Vec<RevisionView> {
    report
        .revisions
        .iter()
        .map(|r| RevisionView {
            kind: r.kind,
            text: report.resolve(r.text).to_string(),
            move_group: r.move_group,
            is_move_source: r.is_move_source,
            author: report.resolve(r.author).to_string(),
            date: report.resolve(r.date).to_string(),
        })
        .collect()
}

pub fn serialize_report(report: &CompareReport) -> serde_json::Result<String> {
    serde_json::to_string(report)
}

pub fn serialize_result(result: &CompareResult) -> serde_json::Result<String> {
    serde_json::to_string(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::Revision;
    use crate::string_pool::StringPool;

    fn report_with_one_revision() -> CompareReport {
        let mut pool = StringPool::new();
        let text = pool.intern("added words");
        let author = pool.intern("reviewer");
        let date = pool.intern("2024-05-01T00:00:00Z");
        CompareReport {
            version: "1".to_string(),
            strings: pool.strings().to_vec(),
            revisions: vec![Revision {
                kind: RevisionKind::Inserted,
                text,
                move_group: None,
                is_move_source: None,
                author,
                date,
            }],
            complete: true,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn views_resolve_pool_ids() {
        let report = report_with_one_revision();
        let views = revision_views(&report);
        assert_eq!(views.len(), 1);
        assert_eq!(views[0].text, "added words");
        assert_eq!(views[0].author, "reviewer");
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = report_with_one_revision();
        let json = serialize_report(&report).expect("serializable report");
        let parsed: CompareReport = serde_json::from_str(&json).expect("parseable report");
        assert_eq!(parsed, report);
    }
}
