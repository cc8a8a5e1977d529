//! Roster snapshot views: the current roster and the full historical
//! roster for the current term.
//!
//! The two views share the same assembly; they differ only in which
//! person ids are selected and in whether historical membership rows
//! are pre-filtered against the term start. The term organization id is
//! reused across historical terms in the membership table, so the "all"
//! view must drop rows that ended before the term began.

use crate::core::config::{SourceConfig, Workspace};
use crate::core::error::HemicycleError;
use crate::core::model::{
    Gender, Identifier, Membership, MembershipItem, Person, PersonMemberships, Source,
};
use crate::core::table::{
    encode_array, read_memberships, read_organizations, read_persons, write_json_file,
};
use crate::core::unl::read_unl;
use crate::stages::groups::term_clubs;
use crate::stages::term::{resolve_current_term, CurrentTerm};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use tracing::info;

const MEMBER_FLAGS_NCOLS: usize = 16;

/// One row of the raw per-member flag table, namespaced.
#[derive(Debug, Clone)]
struct MemberFlag {
    person_id: String,
    term_org_id: Option<String>,
    constituency_org_id: Option<String>,
    candidate_list_org_id: Option<String>,
    is_current: bool,
}

fn read_member_flags(
    path: &Path,
    source: &SourceConfig,
) -> Result<Vec<MemberFlag>, HemicycleError> {
    let opt_org = |cell: &str| -> Option<String> {
        let t = cell.trim();
        if t.is_empty() {
            None
        } else {
            Some(source.org_id(t))
        }
    };
    Ok(read_unl(path, Some(MEMBER_FLAGS_NCOLS))?
        .into_iter()
        .map(|r| MemberFlag {
            // 1 person | 2 constituency | 3 candidate list | 4 term | 14 current flag
            person_id: source.person_id(&r[1]),
            constituency_org_id: opt_org(&r[2]),
            candidate_list_org_id: opt_org(&r[3]),
            term_org_id: opt_org(&r[4]),
            is_current: r[14] == "1",
        })
        .collect())
}

/// Member photo location, derived from the term's start year and the
/// raw numeric person id. Pure string formatting; never validated for
/// reachability.
fn image_url(term_year: &str, raw_person_id: &str) -> Result<String, HemicycleError> {
    let n: i64 = raw_person_id.parse().map_err(|_| {
        HemicycleError::DataIntegrity(format!(
            "non-numeric raw person id: {:?}",
            raw_person_id
        ))
    })?;
    Ok(format!(
        "https://www.psp.cz/eknih/cdrom/{year}ps/eknih/{year}ps/poslanci/i{n}.jpg",
        year = term_year,
        n = n
    ))
}

#[derive(Debug)]
struct RosterEntry {
    person: Person,
    image: String,
    memberships: PersonMemberships,
}

struct RosterInputs<'a> {
    persons: &'a [Person],
    memberships: &'a [Membership],
    org_names: &'a HashMap<String, String>,
    club_names: &'a HashMap<String, String>,
    term: &'a CurrentTerm,
    flags: &'a [&'a MemberFlag],
}

fn membership_item(id: &str, name: &str, m: &Membership) -> MembershipItem {
    MembershipItem {
        id: id.to_string(),
        name: name.to_string(),
        start_date: m.start_date.clone(),
        end_date: m.end_date.clone(),
    }
}

/// Assemble roster entries for the selected person ids.
///
/// `synthesize_parliament` covers independents without an explicit term
/// membership row: they still get one parliament entry spanning from
/// the term start to an open end. The "all" view selects persons by
/// their term membership rows, so synthesis cannot trigger there.
fn assemble_roster(
    inputs: &RosterInputs<'_>,
    selected: &BTreeSet<String>,
    synthesize_parliament: bool,
) -> Result<Vec<RosterEntry>, HemicycleError> {
    let mut parliament_by_person: HashMap<&str, Vec<MembershipItem>> = HashMap::new();
    let mut groups_by_person: HashMap<&str, Vec<MembershipItem>> = HashMap::new();
    for m in inputs.memberships {
        if !selected.contains(&m.person_id) {
            continue;
        }
        if m.organization_id == inputs.term.id {
            parliament_by_person
                .entry(m.person_id.as_str())
                .or_default()
                .push(membership_item(&inputs.term.id, &inputs.term.name, m));
        } else if let Some(club_name) = inputs.club_names.get(&m.organization_id) {
            groups_by_person
                .entry(m.person_id.as_str())
                .or_default()
                .push(membership_item(&m.organization_id, club_name, m));
        }
    }

    // Last flag row wins per person, including a row with a blank
    // cell: it clears any value an earlier row carried.
    let mut candidate_by_person: HashMap<&str, Option<&str>> = HashMap::new();
    let mut constituency_by_person: HashMap<&str, Option<&str>> = HashMap::new();
    for f in inputs.flags {
        candidate_by_person.insert(f.person_id.as_str(), f.candidate_list_org_id.as_deref());
        constituency_by_person.insert(f.person_id.as_str(), f.constituency_org_id.as_deref());
    }

    let mut entries = Vec::new();
    for person in inputs.persons {
        if !selected.contains(&person.id) {
            continue;
        }
        let mut memberships = PersonMemberships {
            parliament: parliament_by_person
                .remove(person.id.as_str())
                .unwrap_or_default(),
            groups: groups_by_person.remove(person.id.as_str()).unwrap_or_default(),
            candidate_list: Vec::new(),
            constituency: Vec::new(),
        };
        if memberships.parliament.is_empty() && synthesize_parliament {
            memberships.parliament.push(MembershipItem {
                id: inputs.term.id.clone(),
                name: inputs.term.name.clone(),
                start_date: Some(inputs.term.since.clone()),
                end_date: None,
            });
        }
        memberships.sort();

        // Candidate-list and constituency facts carry no dates of their
        // own in the raw data; they borrow the first parliament entry's.
        let (start, end) = memberships
            .parliament
            .first()
            .map(|p| (p.start_date.clone(), p.end_date.clone()))
            .unwrap_or((None, None));
        let single = |org_id: &str| MembershipItem {
            id: org_id.to_string(),
            name: inputs
                .org_names
                .get(org_id)
                .cloned()
                .unwrap_or_else(|| org_id.to_string()),
            start_date: start.clone(),
            end_date: end.clone(),
        };
        if let Some(Some(org_id)) = candidate_by_person.get(person.id.as_str()) {
            memberships.candidate_list = vec![single(org_id)];
        }
        if let Some(Some(org_id)) = constituency_by_person.get(person.id.as_str()) {
            memberships.constituency = vec![single(org_id)];
        }

        let raw_person_id = person.id.rsplit(':').next().unwrap_or_default();
        entries.push(RosterEntry {
            image: image_url(inputs.term.start_year(), raw_person_id)?,
            person: person.clone(),
            memberships,
        });
    }
    entries.sort_by(|a, b| {
        (&a.person.name, &a.person.id).cmp(&(&b.person.name, &b.person.id))
    });
    Ok(entries)
}

/// Current-roster record; field order fixes the JSON key order.
#[derive(Serialize)]
struct CurrentMemberRecord<'a> {
    id: &'a str,
    name: &'a str,
    memberships: &'a PersonMemberships,
    identifiers: &'a [Identifier],
    sources: &'a [Source],
    given_name: &'a str,
    family_name: &'a str,
    birth_date: &'a Option<String>,
    death_date: &'a Option<String>,
    gender: Gender,
    image: &'a str,
}

/// Historical-roster record; same fields, memberships last.
#[derive(Serialize)]
struct AllMemberRecord<'a> {
    id: &'a str,
    name: &'a str,
    identifiers: &'a [Identifier],
    sources: &'a [Source],
    given_name: &'a str,
    family_name: &'a str,
    birth_date: &'a Option<String>,
    death_date: &'a Option<String>,
    gender: Gender,
    image: &'a str,
    memberships: &'a PersonMemberships,
}

const CURRENT_COLS: &[&str] = &[
    "id",
    "name",
    "memberships",
    "identifiers",
    "sources",
    "given_name",
    "family_name",
    "birth_date",
    "death_date",
    "gender",
    "image",
];

const ALL_COLS: &[&str] = &[
    "id",
    "name",
    "identifiers",
    "sources",
    "given_name",
    "family_name",
    "birth_date",
    "death_date",
    "gender",
    "image",
    "memberships",
];

fn csv_cell(entry: &RosterEntry, col: &str) -> Result<String, HemicycleError> {
    let p = &entry.person;
    Ok(match col {
        "id" => p.id.clone(),
        "name" => p.name.clone(),
        // Going through Value sorts object keys alphabetically, which
        // is the stable key order for this cell.
        "memberships" => serde_json::to_string(&serde_json::to_value(&entry.memberships)?)?,
        "identifiers" => encode_array(&p.identifiers)?,
        "sources" => encode_array(&p.sources)?,
        "given_name" => p.given_name.clone(),
        "family_name" => p.family_name.clone(),
        "birth_date" => p.birth_date.clone().unwrap_or_default(),
        "death_date" => p.death_date.clone().unwrap_or_default(),
        "gender" => p.gender.as_str().to_string(),
        "image" => entry.image.clone(),
        other => unreachable!("unknown roster column {other}"),
    })
}

fn write_roster_csv(
    path: &Path,
    entries: &[RosterEntry],
    cols: &[&str],
) -> Result<(), HemicycleError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut w = csv::Writer::from_path(path)?;
    w.write_record(cols)?;
    for entry in entries {
        let mut cells = Vec::with_capacity(cols.len());
        for col in cols {
            cells.push(csv_cell(entry, col)?);
        }
        w.write_record(&cells)?;
    }
    w.flush()?;
    info!(rows = entries.len(), "wrote {}", path.display());
    Ok(())
}

#[derive(Debug, Clone)]
pub struct RosterOutputs {
    pub current_json: PathBuf,
    pub current_csv: PathBuf,
    pub all_json: PathBuf,
    pub all_csv: PathBuf,
}

/// Write the current-roster and all-roster snapshot views.
pub fn run(ws: &Workspace, source: &SourceConfig) -> Result<RosterOutputs, HemicycleError> {
    let persons = read_persons(&ws.persons_table())?;
    let orgs = read_organizations(&ws.organizations_table())?;
    let memberships = read_memberships(&ws.memberships_table())?;

    let term = resolve_current_term(&orgs)?;
    let clubs = term_clubs(&orgs, &term.id);
    let club_names: HashMap<String, String> =
        clubs.iter().map(|c| (c.id.clone(), c.name.clone())).collect();
    let org_names: HashMap<String, String> =
        orgs.iter().map(|o| (o.id.clone(), o.name.clone())).collect();

    let flags = read_member_flags(&ws.member_flags_raw(), source)?;
    let term_flags: Vec<&MemberFlag> = flags
        .iter()
        .filter(|f| f.term_org_id.as_deref() == Some(term.id.as_str()))
        .collect();

    // Current roster: persons the flag table marks current in the term.
    let current_flags: Vec<&MemberFlag> = term_flags
        .iter()
        .copied()
        .filter(|f| f.is_current)
        .collect();
    let selected_current: BTreeSet<String> = current_flags
        .iter()
        .map(|f| f.person_id.clone())
        .collect();
    let current_entries = assemble_roster(
        &RosterInputs {
            persons: &persons,
            memberships: &memberships,
            org_names: &org_names,
            club_names: &club_names,
            term: &term,
            flags: &current_flags,
        },
        &selected_current,
        true,
    )?;

    // All roster: any person with a term membership that did not end
    // before the term began.
    let filtered_memberships: Vec<Membership> = memberships
        .iter()
        .filter(|m| match m.end_date.as_deref() {
            None => true,
            Some(end) => end >= term.since.as_str(),
        })
        .cloned()
        .collect();
    let selected_all: BTreeSet<String> = filtered_memberships
        .iter()
        .filter(|m| m.organization_id == term.id)
        .map(|m| m.person_id.clone())
        .collect();
    let all_entries = assemble_roster(
        &RosterInputs {
            persons: &persons,
            memberships: &filtered_memberships,
            org_names: &org_names,
            club_names: &club_names,
            term: &term,
            flags: &term_flags,
        },
        &selected_all,
        false,
    )?;

    let current_dir = ws.snapshot_dir("current-members");
    let all_dir = ws.snapshot_dir("all-members");
    let outputs = RosterOutputs {
        current_json: current_dir.join("current_members.json"),
        current_csv: current_dir.join("current_members.csv"),
        all_json: all_dir.join("all_members.json"),
        all_csv: all_dir.join("all_members.csv"),
    };

    let current_records: Vec<CurrentMemberRecord<'_>> = current_entries
        .iter()
        .map(|e| CurrentMemberRecord {
            id: &e.person.id,
            name: &e.person.name,
            memberships: &e.memberships,
            identifiers: &e.person.identifiers,
            sources: &e.person.sources,
            given_name: &e.person.given_name,
            family_name: &e.person.family_name,
            birth_date: &e.person.birth_date,
            death_date: &e.person.death_date,
            gender: e.person.gender,
            image: &e.image,
        })
        .collect();
    write_json_file(&outputs.current_json, &current_records)?;
    info!(
        rows = current_records.len(),
        "wrote {}",
        outputs.current_json.display()
    );
    write_roster_csv(&outputs.current_csv, &current_entries, CURRENT_COLS)?;

    let all_records: Vec<AllMemberRecord<'_>> = all_entries
        .iter()
        .map(|e| AllMemberRecord {
            id: &e.person.id,
            name: &e.person.name,
            identifiers: &e.person.identifiers,
            sources: &e.person.sources,
            given_name: &e.person.given_name,
            family_name: &e.person.family_name,
            birth_date: &e.person.birth_date,
            death_date: &e.person.death_date,
            gender: e.person.gender,
            image: &e.image,
            memberships: &e.memberships,
        })
        .collect();
    write_json_file(&outputs.all_json, &all_records)?;
    info!(rows = all_records.len(), "wrote {}", outputs.all_json.display());
    write_roster_csv(&outputs.all_csv, &all_entries, ALL_COLS)?;

    Ok(outputs)
}
