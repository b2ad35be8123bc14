//! Persistent contest state using redb.
//!
//! # Table design
//!
//! ```text
//! meta         "meta"      -> CycleMetadata (JSON), created on open
//! submissions  post id     -> Submission (JSON)
//! votes        user id     -> Vote (JSON), one row per user
//! runs         "last"      -> RunStamp (JSON)
//! ```

use std::path::Path;

use redb::{Database, ReadableTable, TableDefinition};
use serde::de::DeserializeOwned;

use crate::error::{ContestError, Result};
use crate::store::{MetadataStore, RunLedger, SubmissionStore, VoteStore};
use crate::types::{CycleMetadata, MetadataUpdate, RunStamp, Submission, Vote};

// ---------------------------------------------------------------------------
// Table definitions
// ---------------------------------------------------------------------------

const META: TableDefinition<&str, &[u8]> = TableDefinition::new("meta");
const SUBMISSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("submissions");
const VOTES: TableDefinition<&str, &[u8]> = TableDefinition::new("votes");
const RUNS: TableDefinition<&str, &[u8]> = TableDefinition::new("runs");

const META_KEY: &str = "meta";
const LAST_RUN_KEY: &str = "last";

fn db_err(e: impl std::fmt::Display) -> ContestError {
    ContestError::Db(e.to_string())
}

fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(db_err)
}

// ---------------------------------------------------------------------------
// ContestDb
// ---------------------------------------------------------------------------

pub struct ContestDb {
    db: Database,
}

impl ContestDb {
    /// Open or create the database at `path`.
    ///
    /// Creates every table and the metadata record if they don't exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let db = Database::create(path).map_err(db_err)?;
        let wt = db.begin_write().map_err(db_err)?;
        {
            let mut meta = wt.open_table(META).map_err(db_err)?;
            if meta.get(META_KEY).map_err(db_err)?.is_none() {
                let value = serde_json::to_vec(&CycleMetadata::default())?;
                meta.insert(META_KEY, value.as_slice()).map_err(db_err)?;
            }
            wt.open_table(SUBMISSIONS).map_err(db_err)?;
            wt.open_table(VOTES).map_err(db_err)?;
            wt.open_table(RUNS).map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(Self { db })
    }

    fn list<T: DeserializeOwned>(
        &self,
        def: TableDefinition<'static, &'static str, &'static [u8]>,
    ) -> Result<Vec<T>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(def).map_err(db_err)?;
        let mut out = Vec::new();
        for entry in table.iter().map_err(db_err)? {
            let (_, v) = entry.map_err(db_err)?;
            out.push(decode(v.value())?);
        }
        Ok(out)
    }
}

impl MetadataStore for ContestDb {
    fn read(&self) -> Result<CycleMetadata> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(META).map_err(db_err)?;
        let guard = table
            .get(META_KEY)
            .map_err(db_err)?
            .ok_or_else(|| ContestError::Db("metadata record missing".into()))?;
        decode(guard.value())
    }

    fn write(&self, update: &MetadataUpdate) -> Result<()> {
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(META).map_err(db_err)?;
            let mut meta: CycleMetadata = match table.get(META_KEY).map_err(db_err)? {
                Some(guard) => decode(guard.value())?,
                None => CycleMetadata::default(),
            };
            meta.apply(update);
            let value = serde_json::to_vec(&meta)?;
            table.insert(META_KEY, value.as_slice()).map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }
}

impl SubmissionStore for ContestDb {
    fn replace_all(&self, submissions: &[Submission]) -> Result<()> {
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(SUBMISSIONS).map_err(db_err)?;
            let mut stale = Vec::new();
            for entry in table.iter().map_err(db_err)? {
                let (k, _) = entry.map_err(db_err)?;
                stale.push(k.value().to_string());
            }
            for key in &stale {
                table.remove(key.as_str()).map_err(db_err)?;
            }
            for submission in submissions {
                let value = serde_json::to_vec(submission)?;
                table
                    .insert(submission.id.as_str(), value.as_slice())
                    .map_err(db_err)?;
            }
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }

    fn list_ordered_by_title(&self) -> Result<Vec<Submission>> {
        let mut all: Vec<Submission> = self.list(SUBMISSIONS)?;
        all.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        Ok(all)
    }
}

impl VoteStore for ContestDb {
    fn list_all(&self) -> Result<Vec<Vote>> {
        self.list(VOTES)
    }

    fn cast(&self, vote: &Vote) -> Result<()> {
        let value = serde_json::to_vec(vote)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(VOTES).map_err(db_err)?;
            table
                .insert(vote.user_id.as_str(), value.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }
}

impl RunLedger for ContestDb {
    fn last_run(&self) -> Result<Option<RunStamp>> {
        let rt = self.db.begin_read().map_err(db_err)?;
        let table = rt.open_table(RUNS).map_err(db_err)?;
        match table.get(LAST_RUN_KEY).map_err(db_err)? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    fn record_run(&self, stamp: &RunStamp) -> Result<()> {
        let value = serde_json::to_vec(stamp)?;
        let wt = self.db.begin_write().map_err(db_err)?;
        {
            let mut table = wt.open_table(RUNS).map_err(db_err)?;
            table
                .insert(LAST_RUN_KEY, value.as_slice())
                .map_err(db_err)?;
        }
        wt.commit().map_err(db_err)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
