//! Current-term resolution and the current-term snapshot.
//!
//! Every derived view hangs off the single organization that is "the
//! legislature, currently sitting". Zero or multiple candidates means
//! the source data no longer matches the assumed shape, and the whole
//! derivation batch aborts.

use crate::core::config::{Workspace, SourceConfig, LEGISLATURE_NAME, TERM_ABBR_PREFIX};
use crate::core::dates::add_years_clamped;
use crate::core::error::HemicycleError;
use crate::core::model::{Identifier, Organization};
use crate::core::table::{read_organizations, write_json_file};
use crate::core::unl::read_unl;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// The resolved current term, shared by all snapshot derivations.
#[derive(Debug, Clone)]
pub struct CurrentTerm {
    /// Namespaced organization id.
    pub id: String,
    /// Raw numeric surrogate (the trailing id segment).
    pub raw_id: String,
    pub name: String,
    /// Founding date; required, the term anchor is unusable without it.
    pub since: String,
    pub until: Option<String>,
}

impl CurrentTerm {
    pub fn start_year(&self) -> &str {
        self.since.split('-').next().unwrap_or(&self.since)
    }
}

/// Select the unique organization whose name contains the legislature
/// substring and whose dissolution date is null.
pub fn resolve_current_term(orgs: &[Organization]) -> Result<CurrentTerm, HemicycleError> {
    let matches: Vec<&Organization> = orgs
        .iter()
        .filter(|o| o.name.contains(LEGISLATURE_NAME) && o.dissolution_date.is_none())
        .collect();
    if matches.len() != 1 {
        return Err(HemicycleError::DataIntegrity(format!(
            "expected exactly 1 current term organization, found {}",
            matches.len()
        )));
    }
    let org = matches[0];
    let since = org.founding_date.clone().ok_or_else(|| {
        HemicycleError::DataIntegrity(format!(
            "current term organization {} is missing a founding date",
            org.id
        ))
    })?;
    let raw_id = org
        .id
        .rsplit(':')
        .next()
        .unwrap_or_default()
        .to_string();
    Ok(CurrentTerm {
        id: org.id.clone(),
        raw_id,
        name: org.name.clone(),
        since,
        until: org.dissolution_date.clone(),
    })
}

/// Derive the term's short identifier from the raw organization table:
/// the abbreviation of the term row must be the fixed prefix followed
/// by digits. Any other shape means the abbreviation convention
/// changed.
pub fn term_number_from_raw(
    raw_orgs_path: &Path,
    term_raw_id: &str,
) -> Result<String, HemicycleError> {
    for cols in read_unl(raw_orgs_path, None)? {
        if cols.len() < 4 || cols[0] != term_raw_id {
            continue;
        }
        let abbr = cols[3].as_str();
        let digits = abbr.strip_prefix(TERM_ABBR_PREFIX).unwrap_or("");
        if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
            return Ok(digits.to_string());
        }
        return Err(HemicycleError::UnexpectedFormat(format!(
            "abbreviation for current term organization {}: {:?}",
            term_raw_id, abbr
        )));
    }
    Err(HemicycleError::DataIntegrity(format!(
        "current term organization {} not found in {}",
        term_raw_id,
        raw_orgs_path.display()
    )))
}

#[derive(Debug, Serialize)]
struct TermSnapshot {
    id: String,
    name: String,
    since: String,
    until: Option<String>,
    /// Latest possible end of the term: founding date plus the fixed
    /// four-year mandate, Feb 29 clamped on non-leap targets.
    until_latest: String,
    identifiers: Vec<Identifier>,
}

#[derive(Debug, Clone)]
pub struct TermOutputs {
    pub json: PathBuf,
    pub csv: PathBuf,
}

/// Write the current-term snapshot view.
pub fn run(ws: &Workspace, source: &SourceConfig) -> Result<TermOutputs, HemicycleError> {
    let orgs = read_organizations(&ws.organizations_table())?;
    let term = resolve_current_term(&orgs)?;
    let term_no = term_number_from_raw(&ws.organizations_raw(), &term.raw_id)?;

    let until_latest = add_years_clamped(&term.since, 4).ok_or_else(|| {
        HemicycleError::DataIntegrity(format!(
            "current term founding date is not an ISO date: {:?}",
            term.since
        ))
    })?;
    let snapshot = TermSnapshot {
        id: term.id.clone(),
        name: format!("{} {} -", term.name, term.start_year()),
        since: term.since.clone(),
        until: term.until.clone(),
        until_latest,
        identifiers: vec![Identifier {
            scheme: source.namespace.clone(),
            identifier: term_no,
        }],
    };

    let dir = ws.snapshot_dir("current-term");
    let outputs = TermOutputs {
        json: dir.join("current_term.json"),
        csv: dir.join("current_term.csv"),
    };
    write_json_file(&outputs.json, &snapshot)?;
    info!("wrote {}", outputs.json.display());

    std::fs::create_dir_all(&dir)?;
    let mut w = csv::Writer::from_path(&outputs.csv)?;
    w.write_record(["id", "name", "since", "until", "until_latest"])?;
    w.write_record([
        snapshot.id.as_str(),
        snapshot.name.as_str(),
        snapshot.since.as_str(),
        snapshot.until.as_deref().unwrap_or(""),
        snapshot.until_latest.as_str(),
    ])?;
    w.flush()?;
    info!("wrote {}", outputs.csv.display());

    Ok(outputs)
}
