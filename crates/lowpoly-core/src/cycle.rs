//! The day-of-month state machine that drives the contest.
//!
//! Three days of every month carry an action; every other day is idle:
//!
//! | day                  | action                                         |
//! |----------------------|------------------------------------------------|
//! | month length - 7     | open theme voting for next month               |
//! | 1                    | close voting, announce theme, ingest entries   |
//! | 8                    | announce last month's winner, refresh cosmetics |
//!
//! Publishing a post is fatal on failure only while nothing has been
//! published yet. Once a post is up, every later step is logged and reported
//! instead of aborting, including the metadata writes and the ledger stamp,
//! so a rerun on the same day never publishes the same posts again.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::{days_in_month, month_name, next_month, previous_month};
use crate::color::ColorDeriver;
use crate::config::Config;
use crate::cosmetics::Cosmetics;
use crate::error::{ContestError, Result};
use crate::flair;
use crate::forum::{ForumClient, PostBody};
use crate::http::ImageFetcher;
use crate::ingest::ingest;
use crate::ranking::winner;
use crate::resolver::{ImageHost, ImageResolver};
use crate::store::ContestStore;
use crate::templates;
use crate::types::{CycleMetadata, MetadataUpdate, RunStamp};

/// Days before the end of the month on which theme voting opens.
pub const THEME_VOTING_LEAD_DAYS: u32 = 7;
pub const MONTH_OPEN_DAY: u32 = 1;
pub const WINNER_DAY: u32 = 8;

// ---------------------------------------------------------------------------
// CycleAction
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleAction {
    ThemeVoting,
    MonthOpen,
    Winner,
}

impl CycleAction {
    pub fn due_on(date: NaiveDate) -> Option<Self> {
        let day = date.day();
        let length = days_in_month(date.year(), date.month());
        if day + THEME_VOTING_LEAD_DAYS == length {
            Some(Self::ThemeVoting)
        } else if day == MONTH_OPEN_DAY {
            Some(Self::MonthOpen)
        } else if day == WINNER_DAY {
            Some(Self::Winner)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ThemeVoting => "theme_voting",
            Self::MonthOpen => "month_open",
            Self::Winner => "winner",
        }
    }
}

impl fmt::Display for CycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Plan and report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "action", rename_all = "snake_case")]
pub enum Plan {
    Idle,
    Due(CycleAction),
    /// The ledger shows this action already completed today.
    AlreadyDone(CycleAction),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    pub step: String,
    pub error: String,
}

impl StepFailure {
    pub fn new(step: &str, error: &ContestError) -> Self {
        Self {
            step: step.to_string(),
            error: error.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub date: NaiveDate,
    pub plan: Plan,
    /// Metadata updates persisted, in order.
    pub writes: Vec<MetadataUpdate>,
    pub step_failures: Vec<StepFailure>,
}

impl RunReport {
    fn new(date: NaiveDate, plan: Plan) -> Self {
        Self {
            date,
            plan,
            writes: Vec::new(),
            step_failures: Vec::new(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.step_failures.is_empty()
    }
}

// ---------------------------------------------------------------------------
// CycleEngine
// ---------------------------------------------------------------------------

pub struct CycleEngine<'a> {
    forum: &'a dyn ForumClient,
    host: &'a dyn ImageHost,
    fetcher: &'a dyn ImageFetcher,
    store: &'a dyn ContestStore,
    config: &'a Config,
}

impl<'a> CycleEngine<'a> {
    pub fn new(
        forum: &'a dyn ForumClient,
        host: &'a dyn ImageHost,
        fetcher: &'a dyn ImageFetcher,
        store: &'a dyn ContestStore,
        config: &'a Config,
    ) -> Self {
        Self {
            forum,
            host,
            fetcher,
            store,
            config,
        }
    }

    /// What [`run`](Self::run) would do on `today`. Touches nothing.
    pub fn plan(today: NaiveDate, last_run: Option<&RunStamp>) -> Plan {
        match CycleAction::due_on(today) {
            None => Plan::Idle,
            Some(action) => match last_run {
                Some(stamp) if stamp.action == action && stamp.date == today => {
                    Plan::AlreadyDone(action)
                }
                _ => Plan::Due(action),
            },
        }
    }

    /// Perform the action due on `today`, if any, and stamp the ledger.
    ///
    /// Pass `last_run = None` to ignore the ledger.
    pub fn run(
        &self,
        today: NaiveDate,
        metadata: &CycleMetadata,
        last_run: Option<&RunStamp>,
    ) -> Result<RunReport> {
        let plan = Self::plan(today, last_run);
        let mut report = RunReport::new(today, plan);
        let action = match plan {
            Plan::Due(action) => action,
            Plan::Idle => {
                tracing::debug!(%today, "no action due");
                return Ok(report);
            }
            Plan::AlreadyDone(action) => {
                tracing::info!(%today, %action, "already completed today; skipping");
                return Ok(report);
            }
        };

        tracing::info!(%today, %action, "running cycle action");
        match action {
            CycleAction::ThemeVoting => self.open_theme_voting(today, &mut report)?,
            CycleAction::MonthOpen => self.open_month(today, metadata, &mut report)?,
            CycleAction::Winner => self.announce_winner(today, &mut report)?,
        }

        let stamp = RunStamp {
            action,
            date: today,
        };
        let result = self.store.record_run(&stamp);
        self.attempt(&mut report, action, "record_run", result);
        tracing::info!(
            %action,
            writes = report.writes.len(),
            failures = report.step_failures.len(),
            "cycle action finished"
        );
        Ok(report)
    }

    // -----------------------------------------------------------------------
    // Actions
    // -----------------------------------------------------------------------

    fn open_theme_voting(&self, today: NaiveDate, report: &mut RunReport) -> Result<()> {
        let action = CycleAction::ThemeVoting;
        let text = templates::theme_voting(
            month_name(next_month(today)),
            month_name(today.month()),
            days_in_month(today.year(), today.month()),
            &self.config.footer,
        );
        let post = self.forum.submit(&text.title, &PostBody::Text(text.body))?;
        self.persist(report, action, "save_theme_voting", MetadataUpdate::theme_voting(&post.id));

        let result = self.forum.set_contest_mode(&post.id);
        self.attempt(report, action, "contest_mode", result);
        let result = self.forum.pin(&post.id, false);
        self.attempt(report, action, "pin_theme_voting", result);
        Ok(())
    }

    fn open_month(
        &self,
        today: NaiveDate,
        metadata: &CycleMetadata,
        report: &mut RunReport,
    ) -> Result<()> {
        let action = CycleAction::MonthOpen;
        let theme_voting_id = metadata
            .theme_voting_post_id
            .as_deref()
            .ok_or(ContestError::MissingPostId("theme_voting_post_id"))?;

        let suggestion = self
            .forum
            .top_comment(theme_voting_id)?
            .ok_or_else(|| ContestError::NoThemeSuggestions(theme_voting_id.to_string()))?;
        tracing::info!(theme = suggestion.body.trim(), author = %suggestion.author, "theme chosen");

        if let Some(winner_id) = metadata.monthly_winner_post_id.as_deref() {
            let result = self.forum.unpin(winner_id);
            self.attempt(report, action, "unpin_winner", result);
        }
        let result = self.forum.unpin(theme_voting_id);
        self.attempt(report, action, "unpin_theme_voting", result);
        let result = self.forum.lock(theme_voting_id);
        self.attempt(report, action, "lock_theme_voting", result);

        let resolver = ImageResolver::new(self.host);
        ingest(self.forum, &resolver, self.store, today)?;

        let (_, last_month) = previous_month(today);
        let voting = self.forum.submit(
            &templates::voting_open_title(month_name(last_month)),
            &PostBody::Link(self.config.voting_url.clone()),
        )?;
        self.persist(report, action, "save_voting", MetadataUpdate::voting(&voting.id));
        let result = self.forum.pin(&voting.id, false);
        self.attempt(report, action, "pin_voting", result);

        let month = month_name(today.month());
        let text = templates::theme_announcement(month, &suggestion, &self.config.footer);
        match self.forum.submit(&text.title, &PostBody::Text(text.body)) {
            Ok(theme) => {
                self.persist(report, action, "save_theme", MetadataUpdate::theme(&theme.id));
                let result = self.forum.pin(&theme.id, false);
                self.attempt(report, action, "pin_theme", result);
            }
            Err(e) => self.attempt(report, action, "publish_theme", Err(e)),
        }

        let flairs = flair::templates(&self.config.flair_labels, month, today.year());
        let result = self.forum.replace_flair_templates(&flairs);
        self.attempt(report, action, "flair_templates", result);
        Ok(())
    }

    fn announce_winner(&self, today: NaiveDate, report: &mut RunReport) -> Result<()> {
        let action = CycleAction::Winner;
        let submissions = self.store.list_ordered_by_title()?;
        let votes = self.store.list_all()?;
        let top = winner(&submissions, &votes)?;
        tracing::info!(winner = %top.submission.id, score = top.score, "winner chosen");

        let (_, last_month) = previous_month(today);
        let month = month_name(last_month);
        let text = templates::winner_announcement(month, &top.submission, &self.config.footer);
        let post = self.forum.submit(&text.title, &PostBody::Text(text.body))?;
        self.persist(report, action, "save_monthly_winner", MetadataUpdate::monthly_winner(&post.id));
        let result = self.forum.pin(&post.id, true);
        self.attempt(report, action, "pin_winner", result);

        let cosmetics = Cosmetics {
            forum: self.forum,
            fetcher: self.fetcher,
            deriver: ColorDeriver::new(self.config.colors.cube()),
            banner: self.config.banner,
            sidebar_marker: &self.config.markers.sidebar,
            stylesheet_marker: &self.config.markers.stylesheet,
        };
        for failure in cosmetics.publish(month, &top.submission) {
            tracing::warn!(%action, step = %failure.step, error = %failure.error, "cosmetic step failed; continuing");
            report.step_failures.push(failure);
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn persist(&self, report: &mut RunReport, action: CycleAction, step: &str, update: MetadataUpdate) {
        match self.store.write(&update) {
            Ok(()) => report.writes.push(update),
            Err(e) => {
                tracing::error!(?update, "post published but its id was not saved");
                self.attempt(report, action, step, Err(e));
            }
        }
    }

    fn attempt(&self, report: &mut RunReport, action: CycleAction, step: &str, result: Result<()>) {
        if let Err(e) = result {
            tracing::warn!(%action, step, error = %e, "step failed; continuing");
            report.step_failures.push(StepFailure::new(step, &e));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::ContestDb;
    use crate::store::{MetadataStore, RunLedger, SubmissionStore, VoteStore};
    use crate::testutil::{comment, png, post, FakeFetcher, FakeForum, TableHost};
    use crate::types::{Submission, Vote};
    use std::cell::Cell;
    use tempfile::TempDir;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    struct Harness {
        _dir: TempDir,
        db: ContestDb,
        host: TableHost,
        fetcher: FakeFetcher,
        config: Config,
    }

    impl Harness {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let db = ContestDb::open(&dir.path().join("contest.redb")).unwrap();
            let mut config = Config::new("low_poly", "https://vote.example.com");
            config.banner.width = 64;
            config.banner.height = 16;
            config.banner.centre_offset = 8;
            Self {
                _dir: dir,
                db,
                host: TableHost::default(),
                fetcher: FakeFetcher::default(),
                config,
            }
        }

        fn engine<'a>(&'a self, forum: &'a FakeForum) -> CycleEngine<'a> {
            CycleEngine::new(forum, &self.host, &self.fetcher, &self.db, &self.config)
        }

        fn run(&self, forum: &FakeForum, today: NaiveDate) -> Result<RunReport> {
            let meta = self.db.read().unwrap();
            let last = self.db.last_run().unwrap();
            self.engine(forum).run(today, &meta, last.as_ref())
        }
    }

    /// Delegates to a [`ContestDb`], failing the n-th metadata write and,
    /// optionally, every ledger stamp.
    struct FlakyStore<'a> {
        db: &'a ContestDb,
        fail_write: Option<u32>,
        fail_ledger: bool,
        writes: Cell<u32>,
    }

    impl<'a> FlakyStore<'a> {
        fn new(db: &'a ContestDb) -> Self {
            Self {
                db,
                fail_write: None,
                fail_ledger: false,
                writes: Cell::new(0),
            }
        }
    }

    impl MetadataStore for FlakyStore<'_> {
        fn read(&self) -> Result<CycleMetadata> {
            self.db.read()
        }

        fn write(&self, update: &MetadataUpdate) -> Result<()> {
            let n = self.writes.get() + 1;
            self.writes.set(n);
            if self.fail_write == Some(n) {
                return Err(ContestError::Db("disk full".into()));
            }
            self.db.write(update)
        }
    }

    impl SubmissionStore for FlakyStore<'_> {
        fn replace_all(&self, submissions: &[Submission]) -> Result<()> {
            self.db.replace_all(submissions)
        }

        fn list_ordered_by_title(&self) -> Result<Vec<Submission>> {
            self.db.list_ordered_by_title()
        }
    }

    impl VoteStore for FlakyStore<'_> {
        fn list_all(&self) -> Result<Vec<Vote>> {
            self.db.list_all()
        }

        fn cast(&self, vote: &Vote) -> Result<()> {
            self.db.cast(vote)
        }
    }

    impl RunLedger for FlakyStore<'_> {
        fn last_run(&self) -> Result<Option<RunStamp>> {
            self.db.last_run()
        }

        fn record_run(&self, stamp: &RunStamp) -> Result<()> {
            if self.fail_ledger {
                return Err(ContestError::Db("disk full".into()));
            }
            self.db.record_run(stamp)
        }
    }

    fn run_with(h: &Harness, store: &FlakyStore<'_>, forum: &FakeForum, today: NaiveDate) -> Result<RunReport> {
        let meta = store.read().unwrap();
        let last = store.last_run().unwrap();
        CycleEngine::new(forum, &h.host, &h.fetcher, store, &h.config).run(today, &meta, last.as_ref())
    }

    fn submission(id: &str, title: &str) -> Submission {
        Submission {
            id: id.into(),
            title: title.into(),
            image: Some(format!("https://i.imgur.com/{id}.png")),
            author: format!("u_{id}"),
            source_url: format!("https://redd.it/{id}"),
        }
    }

    fn vote(user: &str, submission: &str) -> Vote {
        Vote {
            user_id: user.into(),
            submission_id: submission.into(),
        }
    }

    // -----------------------------------------------------------------------
    // Classification
    // -----------------------------------------------------------------------

    #[test]
    fn due_days_follow_month_length() {
        assert_eq!(CycleAction::due_on(d(2024, 2, 22)), Some(CycleAction::ThemeVoting));
        assert_eq!(CycleAction::due_on(d(2023, 2, 21)), Some(CycleAction::ThemeVoting));
        assert_eq!(CycleAction::due_on(d(2024, 6, 23)), Some(CycleAction::ThemeVoting));
        assert_eq!(CycleAction::due_on(d(2024, 1, 24)), Some(CycleAction::ThemeVoting));
        assert_eq!(CycleAction::due_on(d(2024, 3, 1)), Some(CycleAction::MonthOpen));
        assert_eq!(CycleAction::due_on(d(2024, 3, 8)), Some(CycleAction::Winner));
        assert_eq!(CycleAction::due_on(d(2024, 2, 21)), None);
        assert_eq!(CycleAction::due_on(d(2024, 3, 2)), None);
        assert_eq!(CycleAction::due_on(d(2024, 3, 31)), None);
    }

    #[test]
    fn plan_consults_ledger() {
        let today = d(2024, 2, 22);
        let done = RunStamp {
            action: CycleAction::ThemeVoting,
            date: today,
        };
        let yesterday = RunStamp {
            action: CycleAction::ThemeVoting,
            date: d(2024, 1, 24),
        };
        assert_eq!(CycleEngine::plan(d(2024, 2, 10), None), Plan::Idle);
        assert_eq!(CycleEngine::plan(today, None), Plan::Due(CycleAction::ThemeVoting));
        assert_eq!(
            CycleEngine::plan(today, Some(&done)),
            Plan::AlreadyDone(CycleAction::ThemeVoting)
        );
        assert_eq!(
            CycleEngine::plan(today, Some(&yesterday)),
            Plan::Due(CycleAction::ThemeVoting)
        );
    }

    // -----------------------------------------------------------------------
    // Idle
    // -----------------------------------------------------------------------

    #[test]
    fn idle_day_touches_nothing() {
        let h = Harness::new();
        let forum = FakeForum::default();
        let report = h.run(&forum, d(2024, 3, 15)).unwrap();
        assert_eq!(report.plan, Plan::Idle);
        assert!(forum.calls().is_empty());
        assert_eq!(h.db.read().unwrap(), CycleMetadata::default());
        assert_eq!(h.db.last_run().unwrap(), None);
    }

    #[test]
    fn every_off_day_touches_nothing() {
        // 28, 29, 30 and 31 day months
        for (year, month) in [(2023, 2), (2024, 2), (2024, 4), (2024, 1)] {
            let h = Harness::new();
            let forum = FakeForum::default();
            let length = days_in_month(year, month);
            let mut due = 0;
            for day in 1..=length {
                let today = d(year, month, day);
                if CycleAction::due_on(today).is_some() {
                    due += 1;
                    continue;
                }
                let report = h.run(&forum, today).unwrap();
                assert_eq!(report.plan, Plan::Idle, "{today}");
                assert!(report.writes.is_empty(), "{today}");
            }
            assert_eq!(due, 3, "{year}-{month}");
            assert!(forum.calls().is_empty(), "{year}-{month}: {:?}", forum.calls());
            assert_eq!(h.db.read().unwrap(), CycleMetadata::default());
            assert_eq!(h.db.last_run().unwrap(), None);
        }
    }

    // -----------------------------------------------------------------------
    // Theme voting
    // -----------------------------------------------------------------------

    #[test]
    fn theme_voting_publishes_once_and_sets_only_its_id() {
        let h = Harness::new();
        let forum = FakeForum::default();
        let report = h.run(&forum, d(2024, 2, 22)).unwrap();

        assert_eq!(forum.titles(), vec!["March theme voting"]);
        assert_eq!(
            forum.calls(),
            vec!["submit:March theme voting", "contest_mode:p1", "pin:p1:top"]
        );
        let (_, body) = forum.submitted.borrow()[0].clone();
        match body {
            PostBody::Text(text) => assert!(text.contains("end of February 29")),
            other => panic!("expected a self post, got {other:?}"),
        }
        assert_eq!(
            h.db.read().unwrap(),
            CycleMetadata {
                theme_voting_post_id: Some("p1".into()),
                ..CycleMetadata::default()
            }
        );
        assert_eq!(report.writes, vec![MetadataUpdate::theme_voting("p1")]);
        assert!(report.is_clean());
    }

    #[test]
    fn second_run_same_day_is_already_done() {
        let h = Harness::new();
        let forum = FakeForum::default();
        h.run(&forum, d(2024, 2, 22)).unwrap();
        let again = h.run(&forum, d(2024, 2, 22)).unwrap();

        assert_eq!(again.plan, Plan::AlreadyDone(CycleAction::ThemeVoting));
        assert_eq!(forum.titles().len(), 1);
        assert_eq!(
            h.db.last_run().unwrap(),
            Some(RunStamp {
                action: CycleAction::ThemeVoting,
                date: d(2024, 2, 22),
            })
        );
    }

    #[test]
    fn moderation_failures_do_not_abort() {
        let h = Harness::new();
        let forum = FakeForum::default()
            .failing_on("pin")
            .failing_on("contest_mode");
        let report = h.run(&forum, d(2024, 2, 22)).unwrap();

        assert_eq!(
            h.db.read().unwrap().theme_voting_post_id.as_deref(),
            Some("p1")
        );
        let steps: Vec<&str> = report.step_failures.iter().map(|f| f.step.as_str()).collect();
        assert_eq!(steps, vec!["contest_mode", "pin_theme_voting"]);
        assert!(h.db.last_run().unwrap().is_some());
    }

    #[test]
    fn failed_publish_writes_nothing() {
        let h = Harness::new();
        let forum = FakeForum::default().failing_on("submit");
        let err = h.run(&forum, d(2024, 2, 22)).unwrap_err();

        assert!(matches!(err, ContestError::Upstream { .. }));
        assert_eq!(h.db.read().unwrap(), CycleMetadata::default());
        assert_eq!(h.db.last_run().unwrap(), None);
    }

    // -----------------------------------------------------------------------
    // Month open
    // -----------------------------------------------------------------------

    #[test]
    fn month_open_requires_theme_voting_id() {
        let h = Harness::new();
        let forum = FakeForum::default();
        let err = h.run(&forum, d(2024, 6, 1)).unwrap_err();

        assert!(matches!(err, ContestError::MissingPostId("theme_voting_post_id")));
        assert!(err.is_precondition());
        assert!(forum.calls().is_empty());
        assert_eq!(h.db.read().unwrap(), CycleMetadata::default());
    }

    #[test]
    fn month_open_without_suggestions_aborts_before_side_effects() {
        let h = Harness::new();
        h.db.write(&MetadataUpdate::theme_voting("tv")).unwrap();
        let forum = FakeForum::default();
        let err = h.run(&forum, d(2024, 6, 1)).unwrap_err();

        assert!(matches!(err, ContestError::NoThemeSuggestions(_)));
        assert_eq!(forum.calls(), vec!["top_comment:tv"]);
        assert_eq!(h.db.read().unwrap().voting_post_id, None);
        assert_eq!(h.db.last_run().unwrap(), None);
    }

    #[test]
    fn month_open_full_sequence() {
        let h = Harness::new();
        h.db.write(&MetadataUpdate::theme_voting("tv")).unwrap();
        h.db.write(&MetadataUpdate::monthly_winner("mw")).unwrap();
        let forum = FakeForum {
            top: Some(comment("Dinosaurs", "rex", 12)),
            search_results: vec![post("s1", "[OC] Fox", "https://example.com/fox.png")],
            ..FakeForum::default()
        };

        let report = h.run(&forum, d(2024, 6, 1)).unwrap();
        assert!(report.is_clean(), "{:?}", report.step_failures);

        assert_eq!(
            forum.calls(),
            vec![
                "top_comment:tv",
                "unpin:mw",
                "unpin:tv",
                "lock:tv",
                "search:May 2024 SUBMISSION",
                "submit:May voting now open! Click here to pick your favourite submission!",
                "pin:p1:top",
                "submit:June monthly theme: Dinosaurs",
                "pin:p2:top",
                "replace_flairs:14",
            ]
        );
        assert_eq!(
            forum.submitted.borrow()[0].1,
            PostBody::Link("https://vote.example.com".into())
        );

        let meta = h.db.read().unwrap();
        assert_eq!(meta.theme_voting_post_id.as_deref(), Some("tv"));
        assert_eq!(meta.voting_post_id.as_deref(), Some("p1"));
        assert_eq!(meta.theme_post_id.as_deref(), Some("p2"));
        assert_eq!(meta.monthly_winner_post_id.as_deref(), Some("mw"));

        let stored = h.db.list_ordered_by_title().unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].title, "Fox");
        assert_eq!(stored[0].image.as_deref(), Some("https://example.com/fox.png"));

        let flairs = forum.flairs.borrow();
        assert!(flairs
            .iter()
            .any(|f| f.text == "Blender \\\\ June 2024 SUBMISSION"));
    }

    #[test]
    fn month_open_reports_failed_moderation_steps() {
        let h = Harness::new();
        h.db.write(&MetadataUpdate::theme_voting("tv")).unwrap();
        let forum = FakeForum {
            top: Some(comment("Robots", "ada", 3)),
            ..FakeForum::default()
        }
        .failing_on("lock")
        .failing_on("replace_flairs");

        let report = h.run(&forum, d(2024, 6, 1)).unwrap();
        let steps: Vec<&str> = report.step_failures.iter().map(|f| f.step.as_str()).collect();
        assert_eq!(steps, vec!["lock_theme_voting", "flair_templates"]);
        assert_eq!(report.writes.len(), 2);
    }

    #[test]
    fn failed_metadata_write_after_publish_still_stamps_ledger() {
        let h = Harness::new();
        h.db.write(&MetadataUpdate::theme_voting("tv")).unwrap();
        let forum = FakeForum {
            top: Some(comment("Robots", "ada", 3)),
            ..FakeForum::default()
        };
        let store = FlakyStore {
            fail_write: Some(2),
            ..FlakyStore::new(&h.db)
        };

        let today = d(2024, 6, 1);
        let report = run_with(&h, &store, &forum, today).unwrap();
        let steps: Vec<&str> = report.step_failures.iter().map(|f| f.step.as_str()).collect();
        assert_eq!(steps, vec!["save_theme"]);
        assert_eq!(report.writes, vec![MetadataUpdate::voting("p1")]);
        assert_eq!(h.db.read().unwrap().theme_post_id, None);

        let again = run_with(&h, &store, &forum, today).unwrap();
        assert_eq!(again.plan, Plan::AlreadyDone(CycleAction::MonthOpen));
        assert_eq!(
            forum.titles(),
            vec![
                "May voting now open! Click here to pick your favourite submission!",
                "June monthly theme: Robots",
            ]
        );
    }

    #[test]
    fn failed_ledger_stamp_is_reported_not_fatal() {
        let h = Harness::new();
        let forum = FakeForum::default();
        let store = FlakyStore {
            fail_ledger: true,
            ..FlakyStore::new(&h.db)
        };

        let report = run_with(&h, &store, &forum, d(2024, 2, 22)).unwrap();
        let steps: Vec<&str> = report.step_failures.iter().map(|f| f.step.as_str()).collect();
        assert_eq!(steps, vec!["record_run"]);
        assert_eq!(
            h.db.read().unwrap().theme_voting_post_id.as_deref(),
            Some("p1")
        );
        assert_eq!(h.db.last_run().unwrap(), None);
    }

    #[test]
    fn failed_first_metadata_write_keeps_going() {
        let h = Harness::new();
        let forum = FakeForum::default();
        let store = FlakyStore {
            fail_write: Some(1),
            ..FlakyStore::new(&h.db)
        };

        let report = run_with(&h, &store, &forum, d(2024, 2, 22)).unwrap();
        let steps: Vec<&str> = report.step_failures.iter().map(|f| f.step.as_str()).collect();
        assert_eq!(steps, vec!["save_theme_voting"]);
        assert!(report.writes.is_empty());
        assert_eq!(forum.calls(), vec!["submit:March theme voting", "contest_mode:p1", "pin:p1:top"]);
        assert!(h.db.last_run().unwrap().is_some());
    }

    // -----------------------------------------------------------------------
    // Winner
    // -----------------------------------------------------------------------

    #[test]
    fn winner_day_without_submissions_makes_no_forum_call() {
        let h = Harness::new();
        let forum = FakeForum::default();
        let err = h.run(&forum, d(2024, 6, 8)).unwrap_err();

        assert!(matches!(err, ContestError::NoSubmissions));
        assert!(forum.calls().is_empty());
        assert_eq!(h.db.read().unwrap().monthly_winner_post_id, None);
    }

    #[test]
    fn winner_day_announces_pins_and_refreshes_cosmetics() {
        let mut h = Harness::new();
        h.fetcher.body = Some(png(96, 64, [230, 120, 30]));
        h.db.replace_all(&[submission("a", "Alpha"), submission("b", "Bravo")])
            .unwrap();
        for (user, sub) in [("u1", "b"), ("u2", "b"), ("u3", "a")] {
            h.db.cast(&vote(user, sub)).unwrap();
        }
        let forum = FakeForum::default();
        *forum.sidebar.borrow_mut() = "[](#BOTWINNER)[](/BOTWINNER)".into();
        *forum.stylesheet.borrow_mut() = "[](#POLYGONAUTOMATON)[](/POLYGONAUTOMATON)".into();

        let report = h.run(&forum, d(2024, 6, 8)).unwrap();
        assert!(report.is_clean(), "{:?}", report.step_failures);

        assert_eq!(forum.titles(), vec!["May monthly winner: u_b"]);
        assert!(forum.calls().contains(&"pin:p1:bottom".to_string()));
        assert!(forum.sidebar.borrow().contains("[Bravo](https://redd.it/b) by /u/u_b"));
        assert_eq!(forum.uploads.borrow().len(), 1);
        assert!(forum.stylesheet.borrow().contains("background-color"));
        assert_eq!(h.fetcher.fetched.borrow().as_slice(), ["https://i.imgur.com/b.png"]);
        assert_eq!(
            h.db.read().unwrap().monthly_winner_post_id.as_deref(),
            Some("p1")
        );
    }

    #[test]
    fn winner_cosmetic_failures_are_reported() {
        let h = Harness::new();
        h.db.replace_all(&[submission("a", "Alpha")]).unwrap();
        let forum = FakeForum::default().failing_on("sidebar");

        let report = h.run(&forum, d(2024, 6, 8)).unwrap();
        let steps: Vec<&str> = report.step_failures.iter().map(|f| f.step.as_str()).collect();
        // fetcher has no body, so the banner download fails too
        assert_eq!(steps, vec!["sidebar", "banner"]);
        assert_eq!(report.writes, vec![MetadataUpdate::monthly_winner("p1")]);
    }
}
