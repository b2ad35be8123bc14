//! Data-access contract between the engine and whatever persists contest state.

use crate::error::Result;
use crate::types::{CycleMetadata, MetadataUpdate, RunStamp, Submission, Vote};

pub trait MetadataStore {
    /// The singleton metadata record.
    fn read(&self) -> Result<CycleMetadata>;
    /// Merge the set fields of `update` into the record.
    fn write(&self, update: &MetadataUpdate) -> Result<()>;
}

pub trait SubmissionStore {
    /// Drop every stored submission and store `submissions` in their place.
    fn replace_all(&self, submissions: &[Submission]) -> Result<()>;
    fn list_ordered_by_title(&self) -> Result<Vec<Submission>>;
}

pub trait VoteStore {
    fn list_all(&self) -> Result<Vec<Vote>>;
    /// Record a vote, replacing the user's previous one.
    fn cast(&self, vote: &Vote) -> Result<()>;
}

/// Remembers the last action the engine completed.
pub trait RunLedger {
    fn last_run(&self) -> Result<Option<RunStamp>>;
    fn record_run(&self, stamp: &RunStamp) -> Result<()>;
}

/// Everything the cycle engine persists through.
pub trait ContestStore: MetadataStore + SubmissionStore + VoteStore + RunLedger {}

impl<T: MetadataStore + SubmissionStore + VoteStore + RunLedger> ContestStore for T {}
