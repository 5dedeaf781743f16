//! Community submissions, voting, and the admin review desk.

use crate::catalog::{CatalogEntry, NewSubmission, Submission, SubmissionStatus};
use crate::error::{GronckleError, ReviewError, SubmissionError};
use crate::store::CatalogStore;
use std::str::FromStr;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Up,
    Down,
}

impl Vote {
    pub fn delta(&self) -> i64 {
        match self {
            Vote::Up => 1,
            Vote::Down => -1,
        }
    }
}

impl FromStr for Vote {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "up" | "+" => Ok(Vote::Up),
            "down" | "-" => Ok(Vote::Down),
            other => Err(format!("vote must be up or down, got {}", other)),
        }
    }
}

/// Community page tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Pending,
    Approved,
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(StatusFilter::All),
            "pending" => Ok(StatusFilter::Pending),
            "approved" => Ok(StatusFilter::Approved),
            other => Err(format!("unknown status filter: {}", other)),
        }
    }
}

pub fn filter_submissions(submissions: &[Submission], filter: StatusFilter) -> Vec<Submission> {
    submissions
        .iter()
        .filter(|s| match filter {
            StatusFilter::All => true,
            StatusFilter::Pending => s.status == SubmissionStatus::Pending,
            StatusFilter::Approved => s.status == SubmissionStatus::Approved,
        })
        .cloned()
        .collect()
}

/// Net votes at which a submission is picked up for review.
pub const REVIEW_THRESHOLD: i64 = 50;

/// Size of the contenders board.
pub const TOP_CONTENDERS: usize = 5;

/// A submission on the contenders board.
#[derive(Debug, Clone, PartialEq)]
pub struct Contender {
    pub submission: Submission,
    /// Progress toward [`REVIEW_THRESHOLD`], 0 to 100
    pub progress: u8,
}

/// Percent of the review threshold reached; negative tallies count as 0.
pub fn review_progress(votes: i64) -> u8 {
    (votes.clamp(0, REVIEW_THRESHOLD) * 100 / REVIEW_THRESHOLD) as u8
}

/// The `limit` most-voted submissions, highest first. Equal tallies keep
/// their input order.
pub fn top_contenders(submissions: &[Submission], limit: usize) -> Vec<Contender> {
    let mut ranked: Vec<&Submission> = submissions.iter().collect();
    ranked.sort_by(|a, b| b.votes.cmp(&a.votes));
    ranked
        .into_iter()
        .take(limit)
        .map(|s| Contender {
            submission: s.clone(),
            progress: review_progress(s.votes),
        })
        .collect()
}

/// Check submit-form input before it reaches the store.
pub fn validate_submission(submission: &NewSubmission) -> Result<(), SubmissionError> {
    if submission.tool_name.trim().is_empty() {
        return Err(SubmissionError::EmptyName);
    }
    let url = submission.url.trim();
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(SubmissionError::InvalidUrl(submission.url.clone()));
    }
    if submission.description.trim().is_empty() {
        return Err(SubmissionError::EmptyDescription);
    }
    if submission.submitted_by.trim().is_empty() {
        return Err(SubmissionError::EmptySubmitter);
    }
    Ok(())
}

/// Validate and record a submission.
pub fn submit<S: CatalogStore>(
    store: &S,
    submission: NewSubmission,
) -> Result<Submission, GronckleError> {
    validate_submission(&submission)?;
    Ok(store.insert_submission(submission)?)
}

// ============================================================================
// Review
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Member,
}

/// The signed-in user as reported by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub name: String,
    pub role: Role,
}

/// Admin operations on the submission queue.
pub struct ReviewDesk<'a, S: CatalogStore> {
    store: &'a S,
    actor: Actor,
}

impl<'a, S: CatalogStore> ReviewDesk<'a, S> {
    /// Open the desk for `actor`; only admins get in.
    pub fn open(store: &'a S, actor: Actor) -> Result<Self, ReviewError> {
        if actor.role != Role::Admin {
            warn!("Review access refused for {}", actor.name);
            return Err(ReviewError::NotAdmin(actor.name));
        }
        Ok(Self { store, actor })
    }

    /// Pending submissions, newest first.
    pub fn queue(&self) -> Result<Vec<Submission>, ReviewError> {
        Ok(self.store.pending_submissions()?)
    }

    /// Publish a pending submission as a gem and mark it approved.
    pub fn approve(&self, id: u64) -> Result<CatalogEntry, ReviewError> {
        let submission = self.pending(id)?;
        let entry = self.store.insert_entry(submission.to_new_entry())?;
        self.store
            .update_submission_status(id, SubmissionStatus::Approved)?;
        info!(
            "{} approved submission {} as gem {}",
            self.actor.name, id, entry.id
        );
        Ok(entry)
    }

    /// Mark a pending submission rejected. The record is kept.
    pub fn reject(&self, id: u64) -> Result<Submission, ReviewError> {
        self.pending(id)?;
        let updated = self
            .store
            .update_submission_status(id, SubmissionStatus::Rejected)?;
        info!("{} rejected submission {}", self.actor.name, id);
        Ok(updated)
    }

    fn pending(&self, id: u64) -> Result<Submission, ReviewError> {
        let submission = self.store.submission(id)?;
        if submission.status != SubmissionStatus::Pending {
            return Err(ReviewError::NotPending {
                id,
                status: submission.status.as_str(),
            });
        }
        Ok(submission)
    }
}
