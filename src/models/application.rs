use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline stage of an application. The ordering of the variants is the
/// forward direction of the funnel; `stage_rank` encodes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Applied,
    Viewed,
    Screened,
    Shortlisted,
    InterviewScheduled,
    Interviewed,
    Selected,
    Appointed,
    Hired,
    Rejected,
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Applied => "applied",
            ApplicationStatus::Viewed => "viewed",
            ApplicationStatus::Screened => "screened",
            ApplicationStatus::Shortlisted => "shortlisted",
            ApplicationStatus::InterviewScheduled => "interview_scheduled",
            ApplicationStatus::Interviewed => "interviewed",
            ApplicationStatus::Selected => "selected",
            ApplicationStatus::Appointed => "appointed",
            ApplicationStatus::Hired => "hired",
            ApplicationStatus::Rejected => "rejected",
        }
    }

    /// Position along the pipeline. Rejected carries no rank; it is an exit,
    /// not a stage.
    pub fn stage_rank(&self) -> Option<u8> {
        match self {
            ApplicationStatus::Applied => Some(0),
            ApplicationStatus::Viewed => Some(1),
            ApplicationStatus::Screened => Some(2),
            ApplicationStatus::Shortlisted => Some(3),
            ApplicationStatus::InterviewScheduled => Some(4),
            ApplicationStatus::Interviewed => Some(5),
            ApplicationStatus::Selected => Some(6),
            ApplicationStatus::Appointed => Some(7),
            ApplicationStatus::Hired => Some(8),
            ApplicationStatus::Rejected => None,
        }
    }

    /// No transitions are permitted out of a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ApplicationStatus::Hired | ApplicationStatus::Rejected)
    }

    /// Selected and Appointed count as hires for analytics purposes.
    pub fn is_hired_equivalent(&self) -> bool {
        matches!(
            self,
            ApplicationStatus::Selected | ApplicationStatus::Appointed | ApplicationStatus::Hired
        )
    }
}

impl std::str::FromStr for ApplicationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "applied" => Ok(ApplicationStatus::Applied),
            "viewed" => Ok(ApplicationStatus::Viewed),
            "screened" => Ok(ApplicationStatus::Screened),
            "shortlisted" => Ok(ApplicationStatus::Shortlisted),
            "interview_scheduled" => Ok(ApplicationStatus::InterviewScheduled),
            "interviewed" => Ok(ApplicationStatus::Interviewed),
            "selected" => Ok(ApplicationStatus::Selected),
            "appointed" => Ok(ApplicationStatus::Appointed),
            "hired" => Ok(ApplicationStatus::Hired),
            "rejected" => Ok(ApplicationStatus::Rejected),
            other => Err(anyhow::anyhow!("Unknown application status: {}", other)),
        }
    }
}

impl std::fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who applied. An application references either a registered platform user
/// or an external walk-in identified by contact details, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CandidateRef {
    Internal {
        user_id: Uuid,
    },
    External {
        name: String,
        email: String,
        phone: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationSource {
    Internal,
    External,
}

impl ApplicationSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationSource::Internal => "internal",
            ApplicationSource::External => "external",
        }
    }
}

impl std::str::FromStr for ApplicationSource {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "internal" => Ok(ApplicationSource::Internal),
            "external" => Ok(ApplicationSource::External),
            other => Err(anyhow::anyhow!("Unknown application source: {}", other)),
        }
    }
}

/// One candidate's submission for one job. `status` is a cached projection
/// of the history log; the log itself is authoritative for auditing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Application {
    pub id: Uuid,
    pub job_id: Uuid,
    pub candidate: CandidateRef,
    pub status: ApplicationStatus,
    pub source: ApplicationSource,
    pub score: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn terminal_statuses() {
        assert!(ApplicationStatus::Hired.is_terminal());
        assert!(ApplicationStatus::Rejected.is_terminal());
        assert!(!ApplicationStatus::Selected.is_terminal());
        assert!(!ApplicationStatus::Appointed.is_terminal());
        assert!(!ApplicationStatus::Applied.is_terminal());
    }

    #[test]
    fn hired_equivalents() {
        assert!(ApplicationStatus::Selected.is_hired_equivalent());
        assert!(ApplicationStatus::Appointed.is_hired_equivalent());
        assert!(ApplicationStatus::Hired.is_hired_equivalent());
        assert!(!ApplicationStatus::Interviewed.is_hired_equivalent());
        assert!(!ApplicationStatus::Rejected.is_hired_equivalent());
    }

    #[test]
    fn stage_ranks_are_monotonic() {
        let pipeline = [
            ApplicationStatus::Applied,
            ApplicationStatus::Viewed,
            ApplicationStatus::Screened,
            ApplicationStatus::Shortlisted,
            ApplicationStatus::InterviewScheduled,
            ApplicationStatus::Interviewed,
            ApplicationStatus::Selected,
            ApplicationStatus::Appointed,
            ApplicationStatus::Hired,
        ];
        for pair in pipeline.windows(2) {
            assert!(pair[0].stage_rank().unwrap() < pair[1].stage_rank().unwrap());
        }
        assert_eq!(ApplicationStatus::Rejected.stage_rank(), None);
    }

    #[test]
    fn status_round_trips_through_str() {
        for s in [
            "applied",
            "viewed",
            "screened",
            "shortlisted",
            "interview_scheduled",
            "interviewed",
            "selected",
            "appointed",
            "hired",
            "rejected",
        ] {
            let parsed = ApplicationStatus::from_str(s).unwrap();
            assert_eq!(parsed.as_str(), s);
        }
        assert!(ApplicationStatus::from_str("pending").is_err());
    }

    #[test]
    fn candidate_ref_serde_is_tagged() {
        let external = CandidateRef::External {
            name: "Alice".into(),
            email: "alice@example.com".into(),
            phone: None,
        };
        let value = serde_json::to_value(&external).unwrap();
        assert_eq!(value["kind"], "external");
        let internal: CandidateRef =
            serde_json::from_value(serde_json::json!({ "kind": "internal", "user_id": Uuid::nil() }))
                .unwrap();
        assert!(matches!(internal, CandidateRef::Internal { .. }));
    }
}
