//! Injected workspace and source configuration.
//!
//! Every stage receives its input and output locations through these
//! structs; nothing in the pipeline reaches for a global path. The
//! defaults reproduce the layout the upstream retrieval step unpacks
//! into (`work/raw/...`) and the layout downstream publication reads
//! from (`work/standard`, `work/publish`, `snapshots`).

use std::path::{Path, PathBuf};

/// Name substring that identifies a chamber/term organization.
pub const LEGISLATURE_NAME: &str = "Poslanecká sněmovna";

/// Name prefix that identifies a parliamentary club organization.
pub const CLUB_PREFIX: &str = "Poslanecký klub";

/// Abbreviation prefix for term organizations in the raw org table.
pub const TERM_ABBR_PREFIX: &str = "PSP";

/// Source-level facts: identifier namespace and provenance URLs.
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Identifier namespace, e.g. `psp` in `psp:person:123`.
    pub namespace: String,
    /// Provenance URL recorded on person/org/membership rows.
    pub members_url: String,
    /// Provenance URL recorded on vote-event/motion rows.
    pub votes_url: String,
    /// Session tag embedded in the roll-call dump file names
    /// (`hl<session>s.unl`, `hl<session>h*.unl`).
    pub session: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig {
            namespace: "psp".to_string(),
            members_url: "https://www.psp.cz/sqw/hp.sqw?k=1301".to_string(),
            votes_url: "https://www.psp.cz/eknih/cdrom/opendata/hl-2025ps.zip".to_string(),
            session: "2025".to_string(),
        }
    }
}

impl SourceConfig {
    pub fn person_id(&self, raw: &str) -> String {
        format!("{}:person:{}", self.namespace, raw)
    }

    pub fn org_id(&self, raw: &str) -> String {
        format!("{}:org:{}", self.namespace, raw)
    }

    pub fn vote_event_id(&self, raw: &str) -> String {
        format!("{}:vote-event:{}", self.namespace, raw)
    }

    pub fn motion_id(&self, raw: &str) -> String {
        format!("{}:motion:{}", self.namespace, raw)
    }

    /// Composite membership id built from raw (unparsed) field values so
    /// the id survives date-normalization changes.
    pub fn membership_id(&self, person: &str, org: &str, start: &str, end: &str) -> String {
        format!(
            "{}:membership:{}:{}:{}:{}",
            self.namespace, person, org, start, end
        )
    }

    /// Vote-events file inside the roll-call dump.
    pub fn vote_events_file(&self) -> String {
        format!("hl{}s.unl", self.session)
    }

    /// File-name prefix for the per-member ballot files.
    pub fn ballot_prefix(&self) -> String {
        format!("hl{}h", self.session)
    }
}

/// Filesystem layout for one pipeline run.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Unpacked member/organization dump (`osoby.unl` etc.).
    pub raw_members_dir: PathBuf,
    /// Unpacked roll-call dump (`hl*.unl`, `zmatecne.unl`).
    pub raw_votes_dir: PathBuf,
    /// Canonical tabular outputs.
    pub standard_dir: PathBuf,
    /// Columnar outputs handed to publication.
    pub publish_dir: PathBuf,
    /// Derived snapshot views.
    pub snapshots_dir: PathBuf,
}

impl Workspace {
    pub fn persons_table(&self) -> PathBuf {
        self.standard_dir.join("persons.csv")
    }

    pub fn organizations_table(&self) -> PathBuf {
        self.standard_dir.join("organizations.csv")
    }

    pub fn memberships_table(&self) -> PathBuf {
        self.standard_dir.join("memberships.csv")
    }

    pub fn persons_raw(&self) -> PathBuf {
        self.raw_members_dir.join("osoby.unl")
    }

    pub fn organizations_raw(&self) -> PathBuf {
        self.raw_members_dir.join("organy.unl")
    }

    pub fn memberships_raw(&self) -> PathBuf {
        self.raw_members_dir.join("zarazeni.unl")
    }

    /// Per-member flag table: current-flag, constituency and candidate
    /// list facts that never make it into the canonical model.
    pub fn member_flags_raw(&self) -> PathBuf {
        self.raw_members_dir.join("poslanec.unl")
    }

    pub fn void_votes_raw(&self) -> PathBuf {
        self.raw_votes_dir.join("zmatecne.unl")
    }

    pub fn snapshot_dir(&self, view: &str) -> PathBuf {
        self.snapshots_dir.join(view)
    }
}

pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(path)
}
