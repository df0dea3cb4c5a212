//! Save flow for one table-edit session
//!
//! ```text
//! Idle -> DiffChecked -> AwaitingConfirmation -> Executing -> Succeeded | Failed -> Idle
//! ```
//!
//! A save is only offered when the diff is non-empty, runs only after an
//! explicit confirmation, and executes exactly one overwrite statement.
//! Failures are never retried and leave the edited snapshot in place.

use crate::client::SqlExecutor;
use crate::diff::{self, RowDiff};
use crate::error::{EditorError, Result};
use crate::output::Notifier;
use crate::snapshot::TableSnapshot;
use crate::statement::{self, TableName};
use log::{debug, info, warn};
use std::io::{BufRead, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveState {
    Idle,
    DiffChecked { changed: bool },
    AwaitingConfirmation,
    Executing,
    Succeeded,
    Failed { message: String },
}

impl SaveState {
    fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed { .. })
    }
}

/// How one pass through the save flow ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing to save
    Unchanged,
    /// The user did not confirm
    Declined,
    Saved { rows: usize },
    /// The warehouse rejected the statement; message is reported verbatim
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub struct SaveSession {
    table: TableName,
    original: TableSnapshot,
    edited: TableSnapshot,
    state: SaveState,
}

impl SaveSession {
    /// Start a session. Both snapshots must have identical columns.
    pub fn new(table: TableName, original: TableSnapshot, edited: TableSnapshot) -> Result<Self> {
        diff::ensure_compatible(&original, &edited)?;
        Ok(Self {
            table,
            original,
            edited,
            state: SaveState::Idle,
        })
    }

    pub fn table(&self) -> &TableName {
        &self.table
    }

    pub fn original(&self) -> &TableSnapshot {
        &self.original
    }

    pub fn edited(&self) -> &TableSnapshot {
        &self.edited
    }

    pub fn state(&self) -> &SaveState {
        &self.state
    }

    /// Replace the edited snapshot, e.g. after the user fixed a failed save
    pub fn set_edited(&mut self, edited: TableSnapshot) -> Result<()> {
        self.ensure_not_busy("edit")?;
        diff::ensure_compatible(&self.original, &edited)?;
        self.edited = edited;
        self.state = SaveState::Idle;
        Ok(())
    }

    /// Row-level changes between the baseline and the edit
    pub fn summary(&self) -> RowDiff {
        diff::summarize(&self.original, &self.edited)
    }

    /// The overwrite statement a confirmed save would run
    pub fn statement(&self) -> String {
        statement::build_overwrite(&self.table, &self.edited)
    }

    /// Run the differ. Returns whether a save should be offered.
    ///
    /// A finished save returns to `Idle` first.
    pub fn check(&mut self) -> Result<bool> {
        self.ensure_not_busy("check")?;
        if self.state.is_terminal() {
            self.state = SaveState::Idle;
        }

        let changed = diff::differs(&self.original, &self.edited);
        debug!("Diff for {}: changed={}", self.table, changed);
        self.state = SaveState::DiffChecked { changed };
        Ok(changed)
    }

    /// Ask for confirmation; only valid after a check that found changes
    pub fn request_save(&mut self) -> Result<()> {
        match self.state {
            SaveState::DiffChecked { changed: true } => {
                self.state = SaveState::AwaitingConfirmation;
                Ok(())
            }
            SaveState::DiffChecked { changed: false } => Err(EditorError::invalid_input(
                format!("No changes to save for {}", self.table),
            )),
            ref other => Err(Self::invalid_transition("request a save", other)),
        }
    }

    pub fn decline(&mut self) -> Result<SaveOutcome> {
        match self.state {
            SaveState::AwaitingConfirmation => {
                self.state = SaveState::Idle;
                Ok(SaveOutcome::Declined)
            }
            ref other => Err(Self::invalid_transition("decline", other)),
        }
    }

    /// Execute the overwrite once.
    ///
    /// On success both snapshots become the rows as written, so the baseline
    /// matches the table even where a literal dropped precision.
    ///
    /// `Err` is only returned for a call out of order; warehouse failures end
    /// in `SaveState::Failed` and `SaveOutcome::Failed`.
    pub fn confirm(&mut self, executor: &dyn SqlExecutor) -> Result<SaveOutcome> {
        if self.state != SaveState::AwaitingConfirmation {
            return Err(Self::invalid_transition("confirm", &self.state));
        }

        self.state = SaveState::Executing;
        let sql = self.statement();
        info!(
            "Overwriting {} with {} rows",
            self.table,
            self.edited.row_count()
        );

        match executor.execute(&sql) {
            Ok(()) => {
                self.state = SaveState::Succeeded;
                let stored = self.edited.as_stored();
                self.original = stored.clone();
                self.edited = stored;
                Ok(SaveOutcome::Saved {
                    rows: self.edited.row_count(),
                })
            }
            Err(e) => {
                let message = match e {
                    EditorError::Statement { message } => message,
                    other => other.to_string(),
                };
                warn!("Overwrite of {} failed: {}", self.table, message);
                self.state = SaveState::Failed {
                    message: message.clone(),
                };
                Ok(SaveOutcome::Failed { message })
            }
        }
    }

    fn ensure_not_busy(&self, action: &str) -> Result<()> {
        match self.state {
            SaveState::AwaitingConfirmation | SaveState::Executing => {
                Err(Self::invalid_transition(action, &self.state))
            }
            _ => Ok(()),
        }
    }

    fn invalid_transition(action: &str, state: &SaveState) -> EditorError {
        EditorError::invalid_input(format!("Cannot {} while the save is {:?}", action, state))
    }
}

/// Decides whether a pending save goes ahead
pub trait Confirmer {
    fn confirm(&self, table: &TableName, diff: &RowDiff) -> Result<bool>;
}

/// Confirms every save (`--yes`)
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoConfirm;

impl Confirmer for AutoConfirm {
    fn confirm(&self, _table: &TableName, _diff: &RowDiff) -> Result<bool> {
        Ok(true)
    }
}

/// Asks on the terminal
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinConfirm;

impl Confirmer for StdinConfirm {
    fn confirm(&self, table: &TableName, diff: &RowDiff) -> Result<bool> {
        println!(
            "\n⚠️  This will overwrite {} (+{} / -{} rows). Continue? (y/N)",
            table,
            diff.added_rows(),
            diff.removed_rows()
        );
        std::io::stdout().flush()?;

        let mut user_input = String::new();
        std::io::stdin().lock().read_line(&mut user_input)?;
        Ok(user_input.trim().to_lowercase().starts_with('y'))
    }
}

/// Drive a session through check, confirmation and execution
pub fn run_save(
    session: &mut SaveSession,
    executor: &dyn SqlExecutor,
    confirmer: &dyn Confirmer,
    notifier: &dyn Notifier,
) -> Result<SaveOutcome> {
    if !session.check()? {
        notifier.info(&format!("No changes to save for {}", session.table()));
        return Ok(SaveOutcome::Unchanged);
    }

    session.request_save()?;
    if !confirmer.confirm(session.table(), &session.summary())? {
        notifier.warning("Save cancelled");
        return session.decline();
    }

    notifier.start_progress("Calling Databricks SQL...");
    let outcome = session.confirm(executor);
    notifier.finish_progress();

    match outcome? {
        SaveOutcome::Saved { rows } => {
            notifier.success("Changes saved");
            Ok(SaveOutcome::Saved { rows })
        }
        SaveOutcome::Failed { message } => {
            notifier.error(&message);
            Ok(SaveOutcome::Failed { message })
        }
        other => Ok(other),
    }
}
