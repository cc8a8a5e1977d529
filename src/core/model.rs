//! Canonical data model produced by the standardization stages.
//!
//! Array-valued sub-fields (`identifiers`, `sources`) are native
//! structures here; they only become JSON text at the tabular storage
//! boundary (see [`crate::core::table`]).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    pub scheme: String,
    pub identifier: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    pub note: String,
}

/// Closed gender mapping. Unrecognized raw codes become an explicit
/// `Unknown`, never a silent default to either sex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    /// Raw codes are single letters, case-insensitive; the female code
    /// appears both bare and accented in the dumps.
    pub fn parse(raw: &str) -> Gender {
        match raw.trim().to_uppercase().as_str() {
            "M" => Gender::Male,
            "Z" | "Ž" => Gender::Female,
            _ => Gender::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }

    pub fn from_canonical(s: &str) -> Gender {
        match s {
            "male" => Gender::Male,
            "female" => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub given_name: String,
    pub family_name: String,
    pub birth_date: Option<String>,
    pub death_date: Option<String>,
    pub gender: Gender,
    pub identifiers: Vec<Identifier>,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
    pub classification: String,
    pub parent_id: Option<String>,
    pub founding_date: Option<String>,
    pub dissolution_date: Option<String>,
    pub identifiers: Vec<Identifier>,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Membership {
    pub id: String,
    pub person_id: String,
    pub organization_id: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub sources: Vec<Source>,
}

/// Per-member ballot option. Duplicates are preserved: votes are an
/// append-only fact stream keyed by nothing beyond the triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteOption {
    #[serde(rename = "yes")]
    Yes,
    #[serde(rename = "no")]
    No,
    #[serde(rename = "abstain")]
    Abstain,
    #[serde(rename = "not voting")]
    NotVoting,
    #[serde(rename = "absent")]
    Absent,
    #[serde(rename = "excused")]
    Excused,
    #[serde(rename = "not member")]
    NotMember,
    #[serde(rename = "unknown")]
    Unknown,
}

impl VoteOption {
    pub fn parse(code: &str) -> VoteOption {
        match code.trim().to_uppercase().as_str() {
            "A" => VoteOption::Yes,
            "B" | "N" => VoteOption::No,
            "C" | "K" => VoteOption::Abstain,
            "F" => VoteOption::NotVoting,
            "@" => VoteOption::Absent,
            "M" => VoteOption::Excused,
            "W" => VoteOption::NotMember,
            _ => VoteOption::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VoteOption::Yes => "yes",
            VoteOption::No => "no",
            VoteOption::Abstain => "abstain",
            VoteOption::NotVoting => "not voting",
            VoteOption::Absent => "absent",
            VoteOption::Excused => "excused",
            VoteOption::NotMember => "not member",
            VoteOption::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vote {
    pub vote_event_id: String,
    pub voter_id: String,
    pub option: VoteOption,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventResult {
    Pass,
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MotionResult {
    Passed,
    Failed,
}

/// Map the raw result code onto both result vocabularies. The alphabet
/// is open-ended in practice; unrecognized codes mean "result unknown".
pub fn parse_result_code(code: &str) -> (Option<EventResult>, Option<MotionResult>) {
    match code.trim().to_uppercase().as_str() {
        "A" => (Some(EventResult::Pass), Some(MotionResult::Passed)),
        "R" => (Some(EventResult::Fail), Some(MotionResult::Failed)),
        _ => (None, None),
    }
}

impl EventResult {
    pub fn as_str(self) -> &'static str {
        match self {
            EventResult::Pass => "pass",
            EventResult::Fail => "fail",
        }
    }
}

impl MotionResult {
    pub fn as_str(self) -> &'static str {
        match self {
            MotionResult::Passed => "passed",
            MotionResult::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteEventExtras {
    pub sitting_number: Option<String>,
    pub voting_number: Option<String>,
    pub agenda_item_number: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteEvent {
    pub id: String,
    pub identifier: String,
    pub motion_id: String,
    pub organization_id: String,
    pub extras: VoteEventExtras,
    pub start_date: Option<String>,
    pub result: Option<EventResult>,
    pub sources: Vec<Source>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Motion {
    pub id: String,
    pub identifier: String,
    pub organization_id: String,
    pub extras: VoteEventExtras,
    pub date: Option<String>,
    pub text: Option<String>,
    pub result: Option<MotionResult>,
    pub sources: Vec<Source>,
}

/// One entry of a derived per-person membership list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipItem {
    pub id: String,
    pub name: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Nested membership structure computed per roster entry. Never
/// persisted as a base entity; recomputed on every run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PersonMemberships {
    pub parliament: Vec<MembershipItem>,
    pub groups: Vec<MembershipItem>,
    pub candidate_list: Vec<MembershipItem>,
    pub constituency: Vec<MembershipItem>,
}

impl PersonMemberships {
    /// Deterministic ordering: within each list, start date ascending
    /// with absent dates first, then id ascending.
    pub fn sort(&mut self) {
        for list in [
            &mut self.parliament,
            &mut self.groups,
            &mut self.candidate_list,
            &mut self.constituency,
        ] {
            list.sort_by(|a, b| {
                let ka = (a.start_date.as_deref().unwrap_or(""), a.id.as_str());
                let kb = (b.start_date.as_deref().unwrap_or(""), b.id.as_str());
                ka.cmp(&kb)
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn option_codes_map_to_the_seven_value_enum() {
        let codes = ["A", "B", "C", "F", "@", "M", "W", "Z"];
        let expected = [
            "yes",
            "no",
            "abstain",
            "not voting",
            "absent",
            "excused",
            "not member",
            "unknown",
        ];
        for (code, want) in codes.iter().zip(expected.iter()) {
            assert_eq!(VoteOption::parse(code).as_str(), *want, "code {code}");
        }
        // aliases and case-insensitivity
        assert_eq!(VoteOption::parse("n"), VoteOption::No);
        assert_eq!(VoteOption::parse("k"), VoteOption::Abstain);
        assert_eq!(VoteOption::parse(" a "), VoteOption::Yes);
    }

    #[test]
    fn gender_codes_including_accented_variant() {
        assert_eq!(Gender::parse("M"), Gender::Male);
        assert_eq!(Gender::parse("m"), Gender::Male);
        assert_eq!(Gender::parse("Z"), Gender::Female);
        assert_eq!(Gender::parse("ž"), Gender::Female);
        assert_eq!(Gender::parse(""), Gender::Unknown);
        assert_eq!(Gender::parse("X"), Gender::Unknown);
    }

    #[test]
    fn result_codes_map_to_both_vocabularies() {
        assert_eq!(
            parse_result_code("A"),
            (Some(EventResult::Pass), Some(MotionResult::Passed))
        );
        assert_eq!(
            parse_result_code("r"),
            (Some(EventResult::Fail), Some(MotionResult::Failed))
        );
        assert_eq!(parse_result_code("Q"), (None, None));
        assert_eq!(parse_result_code(""), (None, None));
    }

    #[test]
    fn membership_lists_sort_nulls_first_then_id() {
        let mut m = PersonMemberships::default();
        m.groups = vec![
            MembershipItem {
                id: "psp:org:2".into(),
                name: "B".into(),
                start_date: Some("2025-01-01".into()),
                end_date: None,
            },
            MembershipItem {
                id: "psp:org:3".into(),
                name: "C".into(),
                start_date: None,
                end_date: None,
            },
            MembershipItem {
                id: "psp:org:1".into(),
                name: "A".into(),
                start_date: Some("2025-01-01".into()),
                end_date: None,
            },
        ];
        m.sort();
        let ids: Vec<&str> = m.groups.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, ["psp:org:3", "psp:org:1", "psp:org:2"]);
    }

    #[test]
    fn vote_option_serializes_with_spaces() {
        let v = Vote {
            vote_event_id: "psp:vote-event:1".into(),
            voter_id: "psp:person:1".into(),
            option: VoteOption::NotVoting,
        };
        let json = serde_json::to_string(&v).expect("json");
        assert!(json.contains("\"not voting\""));
    }
}
