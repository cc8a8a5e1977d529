//! Entity Standardizer: raw person/organization/membership dumps into
//! the canonical tables.

use crate::core::config::{SourceConfig, Workspace};
use crate::core::dates::parse_legacy_date;
use crate::core::error::HemicycleError;
use crate::core::model::{Gender, Identifier, Membership, Organization, Person, Source};
use crate::core::table;
use crate::core::unl::read_unl;
use std::path::PathBuf;
use tracing::info;

/// Raw column counts are a versioned contract with the upstream dump;
/// a deviation fails the run rather than being negotiated.
const PERSONS_NCOLS: usize = 10;
const ORGANIZATIONS_NCOLS: usize = 11;
const MEMBERSHIPS_NCOLS: usize = 8;

/// Locations of the three canonical tables written by one run.
#[derive(Debug, Clone)]
pub struct EntityTables {
    pub persons: PathBuf,
    pub organizations: PathBuf,
    pub memberships: PathBuf,
}

fn entity_source(source: &SourceConfig, note: String) -> Vec<Source> {
    vec![Source {
        url: source.members_url.clone(),
        note,
    }]
}

fn namespace_identifier(source: &SourceConfig, raw_id: &str) -> Vec<Identifier> {
    vec![Identifier {
        scheme: source.namespace.clone(),
        identifier: raw_id.to_string(),
    }]
}

fn standardize_persons(
    rows: &[Vec<String>],
    source: &SourceConfig,
) -> Vec<Person> {
    // 0 id | 1 title-before | 2 family name | 3 given name | 4 title-after
    // 5 birth date | 6 gender | 7 death date | 8-9 unused
    rows.iter()
        .map(|r| {
            let raw_id = r[0].as_str();
            let given = r[3].trim();
            let family = r[2].trim();
            Person {
                id: source.person_id(raw_id),
                name: format!("{} {}", given, family).trim().to_string(),
                given_name: given.to_string(),
                family_name: family.to_string(),
                birth_date: parse_legacy_date(&r[5]),
                death_date: parse_legacy_date(&r[7]),
                gender: Gender::parse(&r[6]),
                identifiers: namespace_identifier(source, raw_id),
                sources: entity_source(source, format!("id_osoba={}", raw_id)),
            }
        })
        .collect()
}

fn standardize_organizations(
    rows: &[Vec<String>],
    source: &SourceConfig,
) -> Vec<Organization> {
    // 0 id | 1 parent id | 2 org type | 3 abbreviation | 4 name
    // 5 name (en) | 6 from | 7 to | 8-10 unused
    rows.iter()
        .map(|r| {
            let raw_id = r[0].as_str();
            let parent = r[1].trim();
            Organization {
                id: source.org_id(raw_id),
                name: r[4].trim().to_string(),
                classification: "organization".to_string(),
                parent_id: if parent.is_empty() {
                    None
                } else {
                    Some(source.org_id(parent))
                },
                founding_date: parse_legacy_date(&r[6]),
                dissolution_date: parse_legacy_date(&r[7]),
                identifiers: namespace_identifier(source, raw_id),
                sources: entity_source(source, format!("id_organ={}", raw_id)),
            }
        })
        .collect()
}

fn standardize_memberships(
    rows: &[Vec<String>],
    source: &SourceConfig,
) -> Vec<Membership> {
    // 0 person id | 1 org id | 2 kind | 3 start | 4 end | 5-7 unused
    rows.iter()
        .map(|r| {
            let (person, org, start_raw, end_raw) =
                (r[0].as_str(), r[1].as_str(), r[3].as_str(), r[4].as_str());
            Membership {
                // Composite id over the raw tuple. If the raw data repeats
                // the same (person, org, start, end) tuple, downstream key
                // collisions silently drop duplicates; accepted behavior.
                id: source.membership_id(person, org, start_raw, end_raw),
                person_id: source.person_id(person),
                organization_id: source.org_id(org),
                start_date: parse_legacy_date(start_raw),
                end_date: parse_legacy_date(end_raw),
                sources: entity_source(
                    source,
                    format!("id_osoba={} id_organ={}", person, org),
                ),
            }
        })
        .collect()
}

/// Standardize the three raw tables and write the canonical tables.
/// Fails before any table is considered valid; nothing recovers a
/// partial write.
pub fn run(ws: &Workspace, source: &SourceConfig) -> Result<EntityTables, HemicycleError> {
    let persons = standardize_persons(
        &read_unl(&ws.persons_raw(), Some(PERSONS_NCOLS))?,
        source,
    );
    let organizations = standardize_organizations(
        &read_unl(&ws.organizations_raw(), Some(ORGANIZATIONS_NCOLS))?,
        source,
    );
    let memberships = standardize_memberships(
        &read_unl(&ws.memberships_raw(), Some(MEMBERSHIPS_NCOLS))?,
        source,
    );

    let tables = EntityTables {
        persons: ws.persons_table(),
        organizations: ws.organizations_table(),
        memberships: ws.memberships_table(),
    };
    table::write_persons(&tables.persons, &persons)?;
    info!(rows = persons.len(), "wrote {}", tables.persons.display());
    table::write_organizations(&tables.organizations, &organizations)?;
    info!(
        rows = organizations.len(),
        "wrote {}",
        tables.organizations.display()
    );
    table::write_memberships(&tables.memberships, &memberships)?;
    info!(
        rows = memberships.len(),
        "wrote {}",
        tables.memberships.display()
    );
    Ok(tables)
}
