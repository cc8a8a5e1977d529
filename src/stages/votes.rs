//! Ballot Standardizer: vote-events, motions and the per-member ballot
//! stream.
//!
//! The void-vote set is built before anything is emitted. A void
//! vote-event never reaches the VoteEvent, Motion or Vote outputs, and
//! a ballot referencing a void id is dropped even when it parses
//! cleanly.

use crate::core::config::{SourceConfig, Workspace};
use crate::core::dates::{parse_legacy_date, vote_start_datetime};
use crate::core::error::HemicycleError;
use crate::core::model::{
    parse_result_code, Motion, Source, Vote, VoteEvent, VoteEventExtras, VoteOption,
};
use crate::core::sink::{write_motions_parquet, write_vote_events_parquet, VoteSink};
use crate::core::table::write_json_file;
use crate::core::unl::{read_unl, UnlReader};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const VOTE_EVENTS_NCOLS: usize = 18;
const BALLOT_NCOLS: usize = 4;
const MEMBER_FLAGS_NCOLS: usize = 16;

/// Columnar flush threshold for the ballot stream. Memory/IO tuning
/// only; never affects output content or order.
const BALLOT_BATCH_SIZE: usize = 50_000;

#[derive(Debug, Clone)]
pub struct VoteOutputs {
    pub votes_csv: PathBuf,
    pub vote_events_json: PathBuf,
    pub motions_json: PathBuf,
    pub votes_parquet: PathBuf,
    pub vote_events_parquet: PathBuf,
    pub motions_parquet: PathBuf,
}

impl VoteOutputs {
    pub fn for_workspace(ws: &Workspace) -> VoteOutputs {
        VoteOutputs {
            votes_csv: ws.standard_dir.join("votes.csv"),
            vote_events_json: ws.standard_dir.join("vote_events.json"),
            motions_json: ws.standard_dir.join("motions.json"),
            votes_parquet: ws.publish_dir.join("votes.parquet"),
            vote_events_parquet: ws.publish_dir.join("vote_events.parquet"),
            motions_parquet: ws.publish_dir.join("motions.parquet"),
        }
    }
}

fn trimmed_or_none(raw: &str) -> Option<String> {
    let t = raw.trim();
    if t.is_empty() {
        None
    } else {
        Some(t.to_string())
    }
}

/// Void vote-event identifiers. The file may be missing or empty when
/// the body has invalidated nothing yet.
fn read_void_ids(path: &Path) -> Result<HashSet<String>, HemicycleError> {
    let mut ids = HashSet::new();
    if !path.exists() || path.metadata()?.len() == 0 {
        return Ok(ids);
    }
    for row in read_unl(path, None)? {
        if let Some(first) = row.first() {
            if !first.is_empty() {
                ids.insert(first.clone());
            }
        }
    }
    Ok(ids)
}

/// Member-to-person surrogate mapping from the flag table. Rows with a
/// blank key on either side are unusable and skipped.
fn read_member_map(path: &Path) -> Result<HashMap<String, String>, HemicycleError> {
    let mut map = HashMap::new();
    for row in read_unl(path, Some(MEMBER_FLAGS_NCOLS))? {
        if !row[0].is_empty() && !row[1].is_empty() {
            map.insert(row[0].clone(), row[1].clone());
        }
    }
    Ok(map)
}

/// Standardize the raw vote-event rows, excluding void identifiers.
/// Returns the events, their motions, and the set of identifiers that
/// remain valid for the ballot pass.
fn standardize_vote_events(
    rows: &[Vec<String>],
    void_ids: &HashSet<String>,
    source: &SourceConfig,
) -> (Vec<VoteEvent>, Vec<Motion>, HashSet<String>) {
    let events_file = source.vote_events_file();
    let mut events = Vec::new();
    let mut motions = Vec::new();
    let mut valid_ids = HashSet::new();

    for r in rows {
        // 0 id | 1 org | 2 sitting | 3 voting no | 4 agenda item
        // 5 date | 6 time | 14 result code | 15 title
        let raw_id = r[0].as_str();
        if void_ids.contains(raw_id) {
            continue;
        }
        let extras = VoteEventExtras {
            sitting_number: trimmed_or_none(&r[2]),
            voting_number: trimmed_or_none(&r[3]),
            agenda_item_number: trimmed_or_none(&r[4]),
        };
        let (event_result, motion_result) = parse_result_code(&r[14]);
        let sources = vec![Source {
            url: source.votes_url.clone(),
            note: format!("{} id_hlasovani={}", events_file, raw_id),
        }];

        events.push(VoteEvent {
            id: source.vote_event_id(raw_id),
            identifier: raw_id.to_string(),
            motion_id: source.motion_id(raw_id),
            organization_id: source.org_id(&r[1]),
            extras: extras.clone(),
            start_date: vote_start_datetime(&r[5], &r[6]),
            result: event_result,
            sources: sources.clone(),
        });
        motions.push(Motion {
            id: source.motion_id(raw_id),
            identifier: raw_id.to_string(),
            organization_id: source.org_id(&r[1]),
            extras,
            date: parse_legacy_date(&r[5]),
            text: trimmed_or_none(&r[15]),
            result: motion_result,
            sources,
        });
        valid_ids.insert(raw_id.to_string());
    }
    (events, motions, valid_ids)
}

/// Ascending numeric identifier order keeps output diffs stable across
/// runs. A non-numeric identifier means the source changed shape.
fn sort_by_numeric_identifier<T>(
    items: Vec<T>,
    identifier: impl Fn(&T) -> &str,
) -> Result<Vec<T>, HemicycleError> {
    let mut keyed: Vec<(i64, T)> = Vec::with_capacity(items.len());
    for item in items {
        let n: i64 = {
            let raw = identifier(&item);
            raw.parse().map_err(|_| {
                HemicycleError::DataIntegrity(format!("non-numeric vote identifier: {raw:?}"))
            })?
        };
        keyed.push((n, item));
    }
    keyed.sort_by_key(|(n, _)| *n);
    Ok(keyed.into_iter().map(|(_, item)| item).collect())
}

/// Sorted ballot files for the session (`hl<session>h*.unl`).
fn ballot_files(ws: &Workspace, source: &SourceConfig) -> Result<Vec<PathBuf>, HemicycleError> {
    let prefix = source.ballot_prefix();
    let mut files = Vec::new();
    for entry in std::fs::read_dir(&ws.raw_votes_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with(&prefix) && name.ends_with(".unl") {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

/// Standardize the roll-call dump into canonical and columnar outputs.
pub fn run(ws: &Workspace, source: &SourceConfig) -> Result<VoteOutputs, HemicycleError> {
    let outputs = VoteOutputs::for_workspace(ws);

    let events_path = ws.raw_votes_dir.join(source.vote_events_file());
    let raw_events = read_unl(&events_path, Some(VOTE_EVENTS_NCOLS))?;
    let void_ids = read_void_ids(&ws.void_votes_raw())?;
    debug!(void = void_ids.len(), "void vote identifiers loaded");

    let (events, motions, valid_ids) =
        standardize_vote_events(&raw_events, &void_ids, source);
    let events = sort_by_numeric_identifier(events, |e| &e.identifier)?;
    let motions = sort_by_numeric_identifier(motions, |m| &m.identifier)?;

    write_json_file(&outputs.vote_events_json, &events)?;
    info!(
        rows = events.len(),
        "wrote {}",
        outputs.vote_events_json.display()
    );
    write_json_file(&outputs.motions_json, &motions)?;
    info!(rows = motions.len(), "wrote {}", outputs.motions_json.display());

    write_vote_events_parquet(&outputs.vote_events_parquet, &events)?;
    info!(
        rows = events.len(),
        "wrote {}",
        outputs.vote_events_parquet.display()
    );
    write_motions_parquet(&outputs.motions_parquet, &motions)?;
    info!(
        rows = motions.len(),
        "wrote {}",
        outputs.motions_parquet.display()
    );

    let member_map = read_member_map(&ws.member_flags_raw())?;

    let mut sink = VoteSink::create(
        &outputs.votes_csv,
        &outputs.votes_parquet,
        BALLOT_BATCH_SIZE,
    )?;
    let mut written: u64 = 0;
    let mut dropped_unmapped: u64 = 0;
    for file in ballot_files(ws, source)? {
        for row in UnlReader::open(&file, Some(BALLOT_NCOLS))? {
            let row = row?;
            // 0 member id | 1 vote-event id | 2 option code
            let raw_event_id = &row[1];
            if !valid_ids.contains(raw_event_id) {
                continue;
            }
            let Some(person) = member_map.get(&row[0]) else {
                // Known gap in the legacy join (e.g. alternates missing
                // from the roster file); counted, not an error.
                dropped_unmapped += 1;
                continue;
            };
            sink.push(Vote {
                vote_event_id: source.vote_event_id(raw_event_id),
                voter_id: source.person_id(person),
                option: VoteOption::parse(&row[2]),
            })?;
            written += 1;
        }
    }
    sink.finish()?;
    info!(
        rows = written,
        dropped = dropped_unmapped,
        "wrote {} and {}",
        outputs.votes_csv.display(),
        outputs.votes_parquet.display()
    );

    Ok(outputs)
}
