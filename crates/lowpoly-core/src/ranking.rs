//! Vote tallies and the monthly winner.

use std::collections::HashMap;

use crate::error::{ContestError, Result};
use crate::store::{SubmissionStore, VoteStore};
use crate::types::{RankedSubmission, Submission, Vote};

/// Score every submission by the votes referencing it, highest first.
///
/// Ties are broken by title, then id.
pub fn rank(submissions: &[Submission], votes: &[Vote]) -> Vec<RankedSubmission> {
    let mut tally: HashMap<&str, u32> = HashMap::new();
    for vote in votes {
        *tally.entry(vote.submission_id.as_str()).or_default() += 1;
    }

    let mut ordered: Vec<&Submission> = submissions.iter().collect();
    ordered.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));

    let mut ranked: Vec<RankedSubmission> = ordered
        .into_iter()
        .map(|s| RankedSubmission {
            score: tally.get(s.id.as_str()).copied().unwrap_or(0),
            submission: s.clone(),
        })
        .collect();
    // Stable: equal scores keep the title order established above.
    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked
}

pub fn winner(submissions: &[Submission], votes: &[Vote]) -> Result<RankedSubmission> {
    rank(submissions, votes)
        .into_iter()
        .next()
        .ok_or(ContestError::NoSubmissions)
}

/// Current standings read straight from the stores.
pub fn standings<S: SubmissionStore + VoteStore + ?Sized>(
    store: &S,
) -> Result<Vec<RankedSubmission>> {
    let submissions = store.list_ordered_by_title()?;
    let votes = store.list_all()?;
    Ok(rank(&submissions, &votes))
}
