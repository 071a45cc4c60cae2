//! Job and application status lifecycle.
//!
//! Job:  new -> reviewing -> tailoring -> ready -> applied, plus `rejected` from anywhere.
//! Application: draft -> ready -> submitted -> confirmed.
//!
//! Statuses are stored as lowercase text; every write goes through `apply` so an
//! illegal move surfaces as a `TransitionError` instead of a silent overwrite.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    New,
    Reviewing,
    Tailoring,
    Ready,
    Applied,
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Draft,
    Ready,
    Submitted,
    Confirmed,
}

/// Something that happened to a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobEvent {
    /// The user opened the job detail.
    Opened,
    TailoringRequested,
    TailoringSucceeded,
    /// Generation or document write failed. `documents_ready` is true when an
    /// earlier run left a complete document set behind.
    TailoringFailed { documents_ready: bool },
    /// Board submission succeeded, or the user marked the job applied by hand.
    MarkedApplied { documents_ready: bool },
    Rejected,
    /// The application and its files were deleted.
    ApplicationDiscarded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplicationEvent {
    DocumentsWritten,
    Submitted,
    Confirmed,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("cannot {action} a job that is {from}")]
    Job { from: JobStatus, action: &'static str },

    #[error("cannot mark applied before the resume and cover letter exist")]
    DocumentsMissing,

    #[error("cannot {action} an application that is {from}")]
    Application {
        from: ApplicationStatus,
        action: &'static str,
    },

    #[error("unknown status '{0}'")]
    UnknownStatus(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::New => "new",
            JobStatus::Reviewing => "reviewing",
            JobStatus::Tailoring => "tailoring",
            JobStatus::Ready => "ready",
            JobStatus::Applied => "applied",
            JobStatus::Rejected => "rejected",
        }
    }

    /// Returns the status after `event`, or why the move is not allowed.
    pub fn apply(self, event: JobEvent) -> Result<JobStatus, TransitionError> {
        use JobStatus::*;

        let refuse = |action| Err(TransitionError::Job { from: self, action });

        match (self, event) {
            (Rejected, JobEvent::Rejected) => Ok(Rejected),
            (Rejected, JobEvent::Opened) => Ok(Rejected),
            (Rejected, _) => refuse(event.verb()),

            (_, JobEvent::Rejected) => Ok(Rejected),

            (New, JobEvent::Opened) => Ok(Reviewing),
            (status, JobEvent::Opened) => Ok(status),

            (New | Reviewing | Ready, JobEvent::TailoringRequested) => Ok(Tailoring),
            (_, JobEvent::TailoringRequested) => refuse("tailor"),

            (Tailoring, JobEvent::TailoringSucceeded) => Ok(Ready),
            (_, JobEvent::TailoringSucceeded) => refuse("finish tailoring"),

            (Tailoring, JobEvent::TailoringFailed { documents_ready }) => {
                Ok(if documents_ready { Ready } else { Reviewing })
            }
            (_, JobEvent::TailoringFailed { .. }) => refuse("fail tailoring"),

            (Ready, JobEvent::MarkedApplied { documents_ready: true }) => Ok(Applied),
            (Ready, JobEvent::MarkedApplied { documents_ready: false }) => {
                Err(TransitionError::DocumentsMissing)
            }
            (_, JobEvent::MarkedApplied { .. }) => refuse("mark applied"),

            (Tailoring | Applied, JobEvent::ApplicationDiscarded) => refuse(event.verb()),
            (_, JobEvent::ApplicationDiscarded) => Ok(Reviewing),
        }
    }
}

impl JobEvent {
    fn verb(&self) -> &'static str {
        match self {
            JobEvent::Opened => "open",
            JobEvent::TailoringRequested => "tailor",
            JobEvent::TailoringSucceeded => "finish tailoring",
            JobEvent::TailoringFailed { .. } => "fail tailoring",
            JobEvent::MarkedApplied { .. } => "mark applied",
            JobEvent::Rejected => "reject",
            JobEvent::ApplicationDiscarded => "discard the application of",
        }
    }
}

impl ApplicationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplicationStatus::Draft => "draft",
            ApplicationStatus::Ready => "ready",
            ApplicationStatus::Submitted => "submitted",
            ApplicationStatus::Confirmed => "confirmed",
        }
    }

    pub fn apply(self, event: ApplicationEvent) -> Result<ApplicationStatus, TransitionError> {
        use ApplicationStatus::*;

        match (self, event) {
            (Draft | Ready, ApplicationEvent::DocumentsWritten) => Ok(Ready),
            (Ready, ApplicationEvent::Submitted) => Ok(Submitted),
            (Submitted, ApplicationEvent::Confirmed) => Ok(Confirmed),
            (from, event) => Err(TransitionError::Application {
                from,
                action: match event {
                    ApplicationEvent::DocumentsWritten => "write documents for",
                    ApplicationEvent::Submitted => "submit",
                    ApplicationEvent::Confirmed => "confirm",
                },
            }),
        }
    }
}

impl FromStr for JobStatus {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(JobStatus::New),
            "reviewing" => Ok(JobStatus::Reviewing),
            "tailoring" => Ok(JobStatus::Tailoring),
            "ready" => Ok(JobStatus::Ready),
            "applied" => Ok(JobStatus::Applied),
            "rejected" => Ok(JobStatus::Rejected),
            other => Err(TransitionError::UnknownStatus(other.to_string())),
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = TransitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ApplicationStatus::Draft),
            "ready" => Ok(ApplicationStatus::Ready),
            "submitted" => Ok(ApplicationStatus::Submitted),
            "confirmed" => Ok(ApplicationStatus::Confirmed),
            other => Err(TransitionError::UnknownStatus(other.to_string())),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_new_to_applied() {
        let status = JobStatus::New
            .apply(JobEvent::Opened)
            .and_then(|s| s.apply(JobEvent::TailoringRequested))
            .and_then(|s| s.apply(JobEvent::TailoringSucceeded))
            .and_then(|s| s.apply(JobEvent::MarkedApplied { documents_ready: true }))
            .unwrap();
        assert_eq!(status, JobStatus::Applied);
    }

    #[test]
    fn test_new_cannot_jump_to_applied() {
        let err = JobStatus::New
            .apply(JobEvent::MarkedApplied { documents_ready: true })
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::Job {
                from: JobStatus::New,
                action: "mark applied"
            }
        );
    }

    #[test]
    fn test_mark_applied_without_documents_is_rejected() {
        let err = JobStatus::Ready
            .apply(JobEvent::MarkedApplied { documents_ready: false })
            .unwrap_err();
        assert_eq!(err, TransitionError::DocumentsMissing);
    }

    #[test]
    fn test_tailoring_can_start_from_new_directly() {
        assert_eq!(
            JobStatus::New.apply(JobEvent::TailoringRequested),
            Ok(JobStatus::Tailoring)
        );
    }

    #[test]
    fn test_regeneration_from_ready_is_allowed() {
        assert_eq!(
            JobStatus::Ready.apply(JobEvent::TailoringRequested),
            Ok(JobStatus::Tailoring)
        );
    }

    #[test]
    fn test_concurrent_tailoring_is_refused() {
        assert!(JobStatus::Tailoring
            .apply(JobEvent::TailoringRequested)
            .is_err());
    }

    #[test]
    fn test_failed_tailoring_falls_back_by_document_state() {
        assert_eq!(
            JobStatus::Tailoring.apply(JobEvent::TailoringFailed {
                documents_ready: false
            }),
            Ok(JobStatus::Reviewing)
        );
        assert_eq!(
            JobStatus::Tailoring.apply(JobEvent::TailoringFailed {
                documents_ready: true
            }),
            Ok(JobStatus::Ready)
        );
    }

    #[test]
    fn test_opening_does_not_regress_status() {
        assert_eq!(JobStatus::Ready.apply(JobEvent::Opened), Ok(JobStatus::Ready));
        assert_eq!(
            JobStatus::Applied.apply(JobEvent::Opened),
            Ok(JobStatus::Applied)
        );
    }

    #[test]
    fn test_reject_from_every_state_and_terminal() {
        for status in [
            JobStatus::New,
            JobStatus::Reviewing,
            JobStatus::Tailoring,
            JobStatus::Ready,
            JobStatus::Applied,
        ] {
            assert_eq!(status.apply(JobEvent::Rejected), Ok(JobStatus::Rejected));
        }
        assert!(JobStatus::Rejected
            .apply(JobEvent::TailoringRequested)
            .is_err());
        assert!(JobStatus::Rejected
            .apply(JobEvent::MarkedApplied { documents_ready: true })
            .is_err());
    }

    #[test]
    fn test_discarding_application_of_tailoring_or_applied_job_is_refused() {
        assert!(JobStatus::Tailoring
            .apply(JobEvent::ApplicationDiscarded)
            .is_err());
        assert!(JobStatus::Applied
            .apply(JobEvent::ApplicationDiscarded)
            .is_err());
        assert_eq!(
            JobStatus::Ready.apply(JobEvent::ApplicationDiscarded),
            Ok(JobStatus::Reviewing)
        );
    }

    #[test]
    fn test_application_lifecycle() {
        let status = ApplicationStatus::Draft
            .apply(ApplicationEvent::DocumentsWritten)
            .and_then(|s| s.apply(ApplicationEvent::Submitted))
            .and_then(|s| s.apply(ApplicationEvent::Confirmed))
            .unwrap();
        assert_eq!(status, ApplicationStatus::Confirmed);
    }

    #[test]
    fn test_draft_application_cannot_be_submitted() {
        assert!(ApplicationStatus::Draft
            .apply(ApplicationEvent::Submitted)
            .is_err());
    }

    #[test]
    fn test_submitted_application_keeps_its_documents() {
        assert!(ApplicationStatus::Submitted
            .apply(ApplicationEvent::DocumentsWritten)
            .is_err());
    }

    #[test]
    fn test_status_text_roundtrip() {
        for status in ["new", "reviewing", "tailoring", "ready", "applied", "rejected"] {
            assert_eq!(status.parse::<JobStatus>().unwrap().as_str(), status);
        }
        assert!("saved".parse::<JobStatus>().is_err());
    }
}
