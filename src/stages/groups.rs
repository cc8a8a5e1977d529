//! Parliamentary-group snapshot views.
//!
//! Clubs are derived from the organization hierarchy (children of the
//! current term whose name carries the club prefix), not from the flag
//! table, so candidate-list coalitions never leak into the group views.

use crate::core::config::{SourceConfig, Workspace, CLUB_PREFIX};
use crate::core::error::HemicycleError;
use crate::core::model::Organization;
use crate::core::table::{read_organizations, write_json_file};
use crate::stages::term::resolve_current_term;
use regex::Regex;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::info;

fn club_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^{}\s+", regex::escape(CLUB_PREFIX)))
            .expect("club prefix pattern is static")
    })
}

/// Clubs parented under the given term, with the club prefix stripped
/// from the display name and classification forced to `group`.
/// Sorted by `(name, id)` for output stability.
pub fn term_clubs(orgs: &[Organization], term_id: &str) -> Vec<Organization> {
    let prefix_re = club_prefix_re();
    let mut clubs: Vec<Organization> = orgs
        .iter()
        .filter(|o| o.parent_id.as_deref() == Some(term_id) && o.name.contains(CLUB_PREFIX))
        .cloned()
        .map(|mut o| {
            o.name = prefix_re.replace(&o.name, "").trim().to_string();
            o.classification = "group".to_string();
            o
        })
        .collect();
    clubs.sort_by(|a, b| (&a.name, &a.id).cmp(&(&b.name, &b.id)));
    clubs
}

#[derive(Debug, Clone)]
pub struct GroupOutputs {
    pub current_json: PathBuf,
    pub current_csv: PathBuf,
    pub all_json: PathBuf,
    pub all_csv: PathBuf,
}

fn write_view(
    json_path: &PathBuf,
    csv_path: &PathBuf,
    clubs: &[Organization],
) -> Result<(), HemicycleError> {
    write_json_file(json_path, &clubs)?;
    info!(rows = clubs.len(), "wrote {}", json_path.display());

    if let Some(parent) = csv_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut w = csv::Writer::from_path(csv_path)?;
    w.write_record([
        "id",
        "name",
        "classification",
        "parent_id",
        "founding_date",
        "dissolution_date",
    ])?;
    for c in clubs {
        w.write_record([
            c.id.as_str(),
            c.name.as_str(),
            c.classification.as_str(),
            c.parent_id.as_deref().unwrap_or(""),
            c.founding_date.as_deref().unwrap_or(""),
            c.dissolution_date.as_deref().unwrap_or(""),
        ])?;
    }
    w.flush()?;
    info!(rows = clubs.len(), "wrote {}", csv_path.display());
    Ok(())
}

/// Write the current-groups and all-groups snapshot views.
///
/// Both views currently share the selection predicate (all clubs under
/// the current term); whether "all" should additionally cover clubs
/// dissolved mid-term is unresolved upstream, so the views are kept
/// separate without inventing a distinction.
pub fn run(ws: &Workspace, _source: &SourceConfig) -> Result<GroupOutputs, HemicycleError> {
    let orgs = read_organizations(&ws.organizations_table())?;
    let term = resolve_current_term(&orgs)?;
    let clubs = term_clubs(&orgs, &term.id);

    let current_dir = ws.snapshot_dir("current-groups");
    let all_dir = ws.snapshot_dir("all-groups");
    let outputs = GroupOutputs {
        current_json: current_dir.join("current_groups.json"),
        current_csv: current_dir.join("current_groups.csv"),
        all_json: all_dir.join("all_groups.json"),
        all_csv: all_dir.join("all_groups.csv"),
    };
    write_view(&outputs.current_json, &outputs.current_csv, &clubs)?;
    write_view(&outputs.all_json, &outputs.all_csv, &clubs)?;
    Ok(outputs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn org(id: &str, name: &str, parent: Option<&str>) -> Organization {
        Organization {
            id: id.to_string(),
            name: name.to_string(),
            classification: "organization".to_string(),
            parent_id: parent.map(str::to_string),
            founding_date: Some("2025-01-01".to_string()),
            dissolution_date: None,
            identifiers: Vec::new(),
            sources: Vec::new(),
        }
    }

    #[test]
    fn clubs_are_selected_by_parent_and_name_prefix() {
        let orgs = vec![
            org("psp:org:200", "Poslanecká sněmovna", None),
            org("psp:org:201", "Poslanecký klub ANO", Some("psp:org:200")),
            org("psp:org:202", "Poslanecký klub SPD", Some("psp:org:200")),
            // a committee under the term is not a club
            org("psp:org:203", "Rozpočtový výbor", Some("psp:org:200")),
            // a club from another term is excluded
            org("psp:org:101", "Poslanecký klub ANO", Some("psp:org:100")),
        ];
        let clubs = term_clubs(&orgs, "psp:org:200");
        let names: Vec<&str> = clubs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["ANO", "SPD"]);
        assert!(clubs.iter().all(|c| c.classification == "group"));
    }

    #[test]
    fn club_display_name_strips_prefix_and_whitespace() {
        let orgs = vec![org(
            "psp:org:201",
            "Poslanecký klub  Starostové a nezávislí",
            Some("psp:org:200"),
        )];
        let clubs = term_clubs(&orgs, "psp:org:200");
        assert_eq!(clubs[0].name, "Starostové a nezávislí");
    }

    #[test]
    fn clubs_sort_by_name_then_id() {
        let orgs = vec![
            org("psp:org:2", "Poslanecký klub B", Some("t")),
            org("psp:org:1", "Poslanecký klub A", Some("t")),
            org("psp:org:3", "Poslanecký klub A", Some("t")),
        ];
        let clubs = term_clubs(&orgs, "t");
        let ids: Vec<&str> = clubs.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["psp:org:1", "psp:org:3", "psp:org:2"]);
    }
}
