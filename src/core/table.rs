//! Tabular boundary for the canonical entity tables.
//!
//! The flat CSV encoding stores `identifiers`/`sources` as JSON text in
//! a single cell. That text exists only here: rows are decoded to
//! native structures immediately on read and encoded immediately before
//! write, so business logic never carries opaque JSON strings.

use crate::core::error::HemicycleError;
use crate::core::model::{Gender, Membership, Organization, Person};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Encode an array sub-field for a CSV cell.
pub fn encode_array<T: Serialize>(items: &[T]) -> Result<String, HemicycleError> {
    Ok(serde_json::to_string(items)?)
}

/// Decode an array sub-field from a CSV cell. An empty cell is an
/// empty array, anything else must be valid JSON.
pub fn decode_array<T: DeserializeOwned>(cell: &str) -> Result<Vec<T>, HemicycleError> {
    if cell.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(cell)?)
}

/// Serialize a value as pretty JSON with a trailing newline, UTF-8.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), HemicycleError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut text = serde_json::to_string_pretty(value)?;
    text.push('\n');
    fs::write(path, text)?;
    Ok(())
}

#[derive(Debug, Serialize, Deserialize)]
struct PersonRow {
    id: String,
    name: String,
    given_name: String,
    family_name: String,
    birth_date: Option<String>,
    death_date: Option<String>,
    gender: String,
    identifiers: String,
    sources: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct OrganizationRow {
    id: String,
    name: String,
    classification: String,
    parent_id: Option<String>,
    founding_date: Option<String>,
    dissolution_date: Option<String>,
    identifiers: String,
    sources: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct MembershipRow {
    id: String,
    person_id: String,
    organization_id: String,
    start_date: Option<String>,
    end_date: Option<String>,
    sources: String,
}

fn open_writer(path: &Path) -> Result<csv::Writer<fs::File>, HemicycleError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(csv::Writer::from_path(path)?)
}

pub fn write_persons(path: &Path, persons: &[Person]) -> Result<(), HemicycleError> {
    let mut w = open_writer(path)?;
    for p in persons {
        w.serialize(PersonRow {
            id: p.id.clone(),
            name: p.name.clone(),
            given_name: p.given_name.clone(),
            family_name: p.family_name.clone(),
            birth_date: p.birth_date.clone(),
            death_date: p.death_date.clone(),
            gender: p.gender.as_str().to_string(),
            identifiers: encode_array(&p.identifiers)?,
            sources: encode_array(&p.sources)?,
        })?;
    }
    w.flush()?;
    Ok(())
}

pub fn read_persons(path: &Path) -> Result<Vec<Person>, HemicycleError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for row in reader.deserialize::<PersonRow>() {
        let row = row?;
        out.push(Person {
            id: row.id,
            name: row.name,
            given_name: row.given_name,
            family_name: row.family_name,
            birth_date: row.birth_date,
            death_date: row.death_date,
            gender: Gender::from_canonical(&row.gender),
            identifiers: decode_array(&row.identifiers)?,
            sources: decode_array(&row.sources)?,
        });
    }
    Ok(out)
}

pub fn write_organizations(path: &Path, orgs: &[Organization]) -> Result<(), HemicycleError> {
    let mut w = open_writer(path)?;
    for o in orgs {
        w.serialize(OrganizationRow {
            id: o.id.clone(),
            name: o.name.clone(),
            classification: o.classification.clone(),
            parent_id: o.parent_id.clone(),
            founding_date: o.founding_date.clone(),
            dissolution_date: o.dissolution_date.clone(),
            identifiers: encode_array(&o.identifiers)?,
            sources: encode_array(&o.sources)?,
        })?;
    }
    w.flush()?;
    Ok(())
}

pub fn read_organizations(path: &Path) -> Result<Vec<Organization>, HemicycleError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for row in reader.deserialize::<OrganizationRow>() {
        let row = row?;
        out.push(Organization {
            id: row.id,
            name: row.name,
            classification: row.classification,
            parent_id: row.parent_id,
            founding_date: row.founding_date,
            dissolution_date: row.dissolution_date,
            identifiers: decode_array(&row.identifiers)?,
            sources: decode_array(&row.sources)?,
        });
    }
    Ok(out)
}

pub fn write_memberships(path: &Path, memberships: &[Membership]) -> Result<(), HemicycleError> {
    let mut w = open_writer(path)?;
    for m in memberships {
        w.serialize(MembershipRow {
            id: m.id.clone(),
            person_id: m.person_id.clone(),
            organization_id: m.organization_id.clone(),
            start_date: m.start_date.clone(),
            end_date: m.end_date.clone(),
            sources: encode_array(&m.sources)?,
        })?;
    }
    w.flush()?;
    Ok(())
}

pub fn read_memberships(path: &Path) -> Result<Vec<Membership>, HemicycleError> {
    let mut reader = csv::Reader::from_path(path)?;
    let mut out = Vec::new();
    for row in reader.deserialize::<MembershipRow>() {
        let row = row?;
        out.push(Membership {
            id: row.id,
            person_id: row.person_id,
            organization_id: row.organization_id,
            start_date: row.start_date,
            end_date: row.end_date,
            sources: decode_array(&row.sources)?,
        });
    }
    Ok(out)
}
