//! End-to-end pipeline tests over a small windows-1250 encoded fixture
//! set: two persons, two terms, one club, one constituency, two roll
//! calls (one voided) and four ballots.

use hemicycle::core::config::{SourceConfig, Workspace};
use hemicycle::core::model::Gender;
use hemicycle::core::table::read_persons;
use hemicycle::stages;
use std::fs;
use std::path::Path;

fn unl_row(cells: &[&[u8]]) -> Vec<u8> {
    let mut out = Vec::new();
    for (i, c) in cells.iter().enumerate() {
        if i > 0 {
            out.push(b'|');
        }
        out.extend_from_slice(c);
    }
    out.push(b'\n');
    out
}

fn write_unl(path: &Path, rows: &[Vec<u8>]) {
    let mut bytes = Vec::new();
    for r in rows {
        bytes.extend_from_slice(r);
    }
    fs::write(path, bytes).expect("write fixture");
}

/// Lay out the raw dumps. Names carry windows-1250 bytes on purpose:
/// 0xe1 a-acute, 0xec e-caron, 0xed i-acute, 0xfd y-acute, 0x8e Z-caron.
fn setup(ws: &Workspace) {
    fs::create_dir_all(&ws.raw_members_dir).expect("mkdir");
    fs::create_dir_all(&ws.raw_votes_dir).expect("mkdir");
    fs::create_dir_all(&ws.standard_dir).expect("mkdir");
    fs::create_dir_all(&ws.publish_dir).expect("mkdir");

    write_unl(
        &ws.raw_members_dir.join("osoby.unl"),
        &[
            unl_row(&[
                b"7",
                b"Ing.",
                b"Nov\xe1k",
                b"Karel",
                b"",
                b"09.07.1974",
                b"M",
                b"",
                b"",
                b"",
            ]),
            unl_row(&[
                b"8",
                b"",
                b"Svobodov\xe1",
                b"Jana",
                b"",
                b"01.02.1980",
                b"\x8e",
                b"",
                b"",
                b"",
            ]),
        ],
    );

    write_unl(
        &ws.raw_members_dir.join("organy.unl"),
        &[
            // dissolved previous term
            unl_row(&[
                b"100",
                b"",
                b"11",
                b"PSP9",
                b"Poslaneck\xe1 sn\xecmovna",
                b"",
                b"21.10.2021",
                b"20.10.2025",
                b"",
                b"",
                b"",
            ]),
            // current term
            unl_row(&[
                b"200",
                b"",
                b"11",
                b"PSP10",
                b"Poslaneck\xe1 sn\xecmovna",
                b"",
                b"21.10.2025",
                b"",
                b"",
                b"",
                b"",
            ]),
            // club under the current term
            unl_row(&[
                b"201",
                b"200",
                b"12",
                b"ANO",
                b"Poslaneck\xfd klub ANO",
                b"",
                b"21.10.2025",
                b"",
                b"",
                b"",
                b"",
            ]),
            // constituency
            unl_row(&[
                b"50",
                b"",
                b"80",
                b"PHA",
                b"Hlavn\xed m\xecsto Praha",
                b"",
                b"",
                b"",
                b"",
                b"",
                b"",
            ]),
        ],
    );

    write_unl(
        &ws.raw_members_dir.join("zarazeni.unl"),
        &[
            unl_row(&[b"7", b"200", b"1", b"21.10.2025", b"", b"", b"", b""]),
            unl_row(&[b"7", b"201", b"1", b"21.10.2025", b"", b"", b"", b""]),
            // person 8 left during the term; stays in the "all" view
            unl_row(&[
                b"8",
                b"200",
                b"1",
                b"21.10.2025",
                b"20.11.2025",
                b"",
                b"",
                b"",
            ]),
        ],
    );

    write_unl(
        &ws.raw_members_dir.join("poslanec.unl"),
        &[
            unl_row(&[
                b"300", b"7", b"50", b"60", b"200", b"", b"", b"", b"", b"", b"", b"", b"",
                b"", b"1", b"",
            ]),
            unl_row(&[
                b"301", b"8", b"50", b"60", b"200", b"", b"", b"", b"", b"", b"", b"", b"",
                b"", b"0", b"",
            ]),
        ],
    );

    write_unl(
        &ws.raw_votes_dir.join("hl2025s.unl"),
        &[
            unl_row(&[
                b"1000",
                b"200",
                b"5",
                b"12",
                b"33",
                b"17.12.2025",
                b"14:35",
                b"",
                b"",
                b"",
                b"",
                b"",
                b"",
                b"",
                b"A",
                b"N\xe1vrh usnesen\xed",
                b"",
                b"",
            ]),
            // voided downstream by zmatecne.unl
            unl_row(&[
                b"1001",
                b"200",
                b"5",
                b"13",
                b"",
                b"17.12.2025",
                b"14:40",
                b"",
                b"",
                b"",
                b"",
                b"",
                b"",
                b"",
                b"R",
                b"",
                b"",
                b"",
            ]),
        ],
    );
    write_unl(&ws.raw_votes_dir.join("zmatecne.unl"), &[unl_row(&[b"1001"])]);
    write_unl(
        &ws.raw_votes_dir.join("hl2025h1.unl"),
        &[
            unl_row(&[b"300", b"1000", b"A", b""]),
            // ballot on the voided roll call
            unl_row(&[b"300", b"1001", b"A", b""]),
            // member id absent from the flag table
            unl_row(&[b"999", b"1000", b"A", b""]),
            unl_row(&[b"301", b"1000", b"B", b""]),
        ],
    );
}

fn workspace(root: &Path) -> Workspace {
    Workspace {
        raw_members_dir: root.join("raw/poslanci"),
        raw_votes_dir: root.join("raw/hl-2025ps"),
        standard_dir: root.join("standard"),
        publish_dir: root.join("publish"),
        snapshots_dir: root.join("snapshots"),
    }
}

fn json(path: &Path) -> serde_json::Value {
    let text = fs::read_to_string(path).expect("read json");
    serde_json::from_str(&text).expect("parse json")
}

#[test]
fn entities_decode_and_standardize_the_raw_dumps() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let ws = workspace(tmp.path());
    setup(&ws);
    let source = SourceConfig::default();

    let tables = stages::entities::run(&ws, &source).expect("entities");

    let persons = read_persons(&tables.persons).expect("read back");
    assert_eq!(persons.len(), 2);
    assert_eq!(persons[0].id, "psp:person:7");
    assert_eq!(persons[0].name, "Karel Novák");
    assert_eq!(persons[0].birth_date.as_deref(), Some("1974-07-09"));
    assert_eq!(persons[0].gender, Gender::Male);
    assert_eq!(persons[1].name, "Jana Svobodová");
    assert_eq!(persons[1].gender, Gender::Female);
}

#[test]
fn votes_exclude_void_events_and_unmapped_members() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let ws = workspace(tmp.path());
    setup(&ws);
    let source = SourceConfig::default();

    stages::entities::run(&ws, &source).expect("entities");
    let outputs = stages::votes::run(&ws, &source).expect("votes");

    let events = json(&outputs.vote_events_json);
    let events = events.as_array().expect("array");
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["id"], "psp:vote-event:1000");
    assert_eq!(events[0]["start_date"], "2025-12-17T14:35:00");
    assert_eq!(events[0]["result"], "pass");
    assert_eq!(events[0]["extras"]["sitting_number"], "5");

    let motions = json(&outputs.motions_json);
    assert_eq!(motions[0]["id"], "psp:motion:1000");
    assert_eq!(motions[0]["text"], "Návrh usnesení");
    assert_eq!(motions[0]["result"], "passed");

    // the void ballot and the unmapped member never reach the stream
    let csv = fs::read_to_string(&outputs.votes_csv).expect("read csv");
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines,
        [
            "vote_event_id,voter_id,option",
            "psp:vote-event:1000,psp:person:7,yes",
            "psp:vote-event:1000,psp:person:8,no",
        ]
    );
    assert!(outputs.votes_parquet.exists());
    assert!(outputs.vote_events_parquet.exists());
    assert!(outputs.motions_parquet.exists());
}

#[test]
fn reruns_are_byte_identical() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let ws = workspace(tmp.path());
    setup(&ws);
    let source = SourceConfig::default();

    stages::entities::run(&ws, &source).expect("entities");
    let outputs = stages::votes::run(&ws, &source).expect("first run");
    let events_1 = fs::read(&outputs.vote_events_json).expect("read");
    let votes_1 = fs::read(&outputs.votes_csv).expect("read");

    stages::entities::run(&ws, &source).expect("entities again");
    stages::votes::run(&ws, &source).expect("second run");
    assert_eq!(events_1, fs::read(&outputs.vote_events_json).expect("read"));
    assert_eq!(votes_1, fs::read(&outputs.votes_csv).expect("read"));
}

#[test]
fn snapshot_reruns_are_byte_identical() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let ws = workspace(tmp.path());
    setup(&ws);
    let source = SourceConfig::default();

    let derive = || {
        stages::entities::run(&ws, &source).expect("entities");
        let term = stages::term::run(&ws, &source).expect("term");
        let groups = stages::groups::run(&ws, &source).expect("groups");
        let roster = stages::roster::run(&ws, &source).expect("roster");
        [
            term.json,
            term.csv,
            groups.current_json,
            groups.all_json,
            roster.current_json,
            roster.current_csv,
            roster.all_json,
            roster.all_csv,
        ]
        .map(|p| fs::read(&p).expect("read output"))
    };

    let first = derive();
    let second = derive();
    assert_eq!(first, second);
}

#[test]
fn snapshots_derive_term_groups_and_rosters() {
    let tmp = tempfile::tempdir().expect("tempdir");
    let ws = workspace(tmp.path());
    setup(&ws);
    let source = SourceConfig::default();

    stages::entities::run(&ws, &source).expect("entities");
    let term = stages::term::run(&ws, &source).expect("term");
    let groups = stages::groups::run(&ws, &source).expect("groups");
    let roster = stages::roster::run(&ws, &source).expect("roster");

    let term_json = json(&term.json);
    assert_eq!(term_json["id"], "psp:org:200");
    assert_eq!(term_json["name"], "Poslanecká sněmovna 2025 -");
    assert_eq!(term_json["since"], "2025-10-21");
    assert_eq!(term_json["until_latest"], "2029-10-21");
    assert_eq!(term_json["identifiers"][0]["identifier"], "10");

    let current_groups = json(&groups.current_json);
    let current_groups = current_groups.as_array().expect("array");
    assert_eq!(current_groups.len(), 1);
    assert_eq!(current_groups[0]["id"], "psp:org:201");
    assert_eq!(current_groups[0]["name"], "ANO");
    assert_eq!(current_groups[0]["classification"], "group");

    // only person 7 is flagged current
    let current = json(&roster.current_json);
    let current = current.as_array().expect("array");
    assert_eq!(current.len(), 1);
    let member = &current[0];
    assert_eq!(member["id"], "psp:person:7");
    assert_eq!(member["name"], "Karel Novák");
    assert_eq!(member["memberships"]["parliament"][0]["id"], "psp:org:200");
    assert_eq!(member["memberships"]["groups"][0]["name"], "ANO");
    assert_eq!(
        member["memberships"]["constituency"][0]["name"],
        "Hlavní město Praha"
    );
    assert_eq!(
        member["image"],
        "https://www.psp.cz/eknih/cdrom/2025ps/eknih/2025ps/poslanci/i7.jpg"
    );

    // person 8 left mid-term but still belongs to the historical view
    let all = json(&roster.all_json);
    let all = all.as_array().expect("array");
    assert_eq!(all.len(), 2);
    assert_eq!(all[0]["name"], "Jana Svobodová");
    assert_eq!(all[0]["gender"], "female");
    assert_eq!(all[1]["name"], "Karel Novák");
}
