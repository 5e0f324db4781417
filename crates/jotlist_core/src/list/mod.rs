//! In-memory note list kept in step with the store.
//!
//! # Responsibility
//! - Own the ordered view the UI renders and the observers that redraw it.
//! - Dispatch every store operation through the `AccessCoordinator`.
//! - Apply finished operations to the view on the owning thread.
//!
//! # Invariants
//! - The view is only touched by the thread that owns the `NoteList`.
//! - After a reload, create or edit completes, the view equals the store
//!   snapshot (`id DESC`) minus notes with an unconfirmed removal.
//! - `remove` updates the view before the durable delete is queued.
//! - A failed durable delete puts the note back at its ordered position,
//!   carrying the newest fields any snapshot reported for it.
//! - If the worker dies, every unconfirmed removal is put back and its
//!   outstanding tickets fail with `Stopped`.
//! - Blank creations never reach the store and never notify observers.

mod observer;

pub use observer::{ListChange, ListObserver, Operation, OperationFailure};

use crate::coordinator::{AccessCoordinator, Completion, CoordinatorConfig, CoordinatorError, Ticket};
use crate::model::note::{Note, NoteDraft, NoteId};
use crate::repo::note_repo::SqliteNoteRepository;
use crate::repo::{RepoError, RepoResult};
use crate::service::note_service::{CreateOutcome, EditOutcome, NoteService, ReloadOutcome};
use log::{error, info, warn};
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{Duration, Instant};

/// Failure to dispatch or await a list operation.
#[derive(Debug)]
pub enum SyncError {
    Coordinator(CoordinatorError),
    /// The ticket did not complete within the wait budget.
    Timeout(Ticket),
    /// The ticket was never issued by this list.
    UnknownTicket(Ticket),
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Coordinator(err) => write!(f, "{err}"),
            Self::Timeout(ticket) => write!(f, "operation {ticket} did not complete in time"),
            Self::UnknownTicket(ticket) => write!(f, "operation {ticket} was never dispatched"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Coordinator(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CoordinatorError> for SyncError {
    fn from(value: CoordinatorError) -> Self {
        Self::Coordinator(value)
    }
}

/// What a finished worker job hands back to the list.
pub(crate) enum StoreOutcome {
    Reloaded(RepoResult<ReloadOutcome>),
    Created(RepoResult<CreateOutcome>),
    Edited(NoteId, RepoResult<EditOutcome>),
    Removed(NoteId, RepoResult<bool>),
    Loaded(NoteId, RepoResult<Option<Note>>),
}

/// Observable, store-backed list of notes.
pub struct NoteList {
    notes: Vec<Note>,
    coordinator: AccessCoordinator<StoreOutcome>,
    observers: Vec<Box<dyn ListObserver>>,
    pending: BTreeSet<Ticket>,
    removals: BTreeMap<Ticket, Note>,
    abandoned: BTreeSet<Ticket>,
}

impl NoteList {
    /// Moves a migrated connection onto the store worker.
    ///
    /// The view starts empty; call `load_all` to fill it.
    pub fn start(conn: Connection, config: CoordinatorConfig) -> Result<Self, SyncError> {
        let coordinator = AccessCoordinator::start(conn, config)?;
        Ok(Self {
            notes: Vec::new(),
            coordinator,
            observers: Vec::new(),
            pending: BTreeSet::new(),
            removals: BTreeMap::new(),
            abandoned: BTreeSet::new(),
        })
    }

    /// Current view, newest first.
    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn subscribe(&mut self, observer: Box<dyn ListObserver>) {
        self.observers.push(observer);
    }

    /// Number of dispatched operations not yet applied.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Full reload: seeds a welcome note into an empty store, then replaces
    /// the view with the store snapshot.
    pub fn load_all(&mut self) -> Result<Ticket, SyncError> {
        self.dispatch(Operation::Reload, |conn| {
            StoreOutcome::Reloaded(with_service(conn, |service| service.reload()))
        })
    }

    /// Creates a note from raw input.
    ///
    /// Returns `Ok(None)` without dispatching when both fields are blank
    /// after trimming.
    pub fn create(&mut self, title: &str, content: &str) -> Result<Option<Ticket>, SyncError> {
        let Some(draft) = NoteDraft::from_user_input(title, content) else {
            info!("event=note_create module=list status=rejected reason=blank_input");
            return Ok(None);
        };
        let ticket = self.dispatch(Operation::Create, move |conn| {
            StoreOutcome::Created(with_service(conn, |service| service.create(&draft)))
        })?;
        Ok(Some(ticket))
    }

    /// Rewrites every field of note `id`. Blank fields are accepted.
    pub fn edit(
        &mut self,
        id: NoteId,
        title: &str,
        content: &str,
        important: bool,
    ) -> Result<Ticket, SyncError> {
        let note = Note {
            id,
            title: title.trim().to_string(),
            content: content.trim().to_string(),
            important,
        };
        self.dispatch(Operation::Edit(id), move |conn| {
            StoreOutcome::Edited(id, with_service(conn, |service| service.edit(&note)))
        })
    }

    /// Removes note `id` from the view now and queues its durable delete.
    pub fn remove(&mut self, id: NoteId) -> Result<Ticket, SyncError> {
        let removed = self
            .notes
            .iter()
            .position(|note| note.id == id)
            .map(|index| (index, self.notes.remove(index)));
        if let Some((index, note)) = &removed {
            let change = ListChange::Removed {
                index: *index,
                note: note.clone(),
            };
            notify(&mut self.observers, &change, &self.notes);
        }

        let dispatched = self.dispatch(Operation::Remove(id), move |conn| {
            StoreOutcome::Removed(id, with_service(conn, |service| service.remove(id)))
        });
        match dispatched {
            Ok(ticket) => {
                if let Some((_, note)) = removed {
                    self.removals.insert(ticket, note);
                }
                Ok(ticket)
            }
            Err(err) => {
                if let Some((_, note)) = removed {
                    self.restore(note);
                }
                Err(err)
            }
        }
    }

    /// Point lookup, reported through `ListObserver::on_note_loaded`.
    pub fn open_note(&mut self, id: NoteId) -> Result<Ticket, SyncError> {
        self.dispatch(Operation::Lookup(id), move |conn| {
            StoreOutcome::Loaded(id, with_service(conn, |service| service.lookup(id)))
        })
    }

    /// Applies every finished operation without blocking.
    ///
    /// Returns how many completions were applied.
    pub fn process_completions(&mut self) -> usize {
        let mut applied = 0;
        loop {
            match self.coordinator.try_next() {
                Ok(Some(completion)) => {
                    self.apply(completion);
                    applied += 1;
                }
                Ok(None) => break,
                Err(_) => {
                    self.abandon_outstanding();
                    break;
                }
            }
        }
        applied
    }

    /// Blocks, applying completions in order, until `ticket` is applied.
    pub fn wait_for(&mut self, ticket: Ticket, timeout: Duration) -> Result<(), SyncError> {
        if self.abandoned.contains(&ticket) {
            return Err(CoordinatorError::Stopped.into());
        }
        if !self.pending.contains(&ticket) {
            return match self.coordinator.last_ticket() {
                Some(last) if ticket <= last => Ok(()),
                _ => Err(SyncError::UnknownTicket(ticket)),
            };
        }

        let deadline = Instant::now() + timeout;
        while self.pending.contains(&ticket) {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(SyncError::Timeout(ticket));
            }
            match self.coordinator.next_timeout(remaining) {
                Ok(Some(completion)) => self.apply(completion),
                Ok(None) => return Err(SyncError::Timeout(ticket)),
                Err(err) => {
                    self.abandon_outstanding();
                    return Err(err.into());
                }
            }
        }
        Ok(())
    }

    /// Lets queued operations finish, applies them and stops the worker.
    pub fn shutdown(&mut self) {
        self.coordinator.shutdown();
        self.process_completions();
    }

    fn dispatch<F>(&mut self, operation: Operation, job: F) -> Result<Ticket, SyncError>
    where
        F: FnOnce(&mut Connection) -> StoreOutcome + Send + 'static,
    {
        match self.coordinator.run(job) {
            Ok(ticket) => {
                self.pending.insert(ticket);
                info!(
                    "event={} module=list status=start ticket={ticket}",
                    event_name(operation)
                );
                Ok(ticket)
            }
            Err(err) => {
                error!(
                    "event={} module=list status=error error_code=dispatch_failed error={err}",
                    event_name(operation)
                );
                Err(err.into())
            }
        }
    }

    fn apply(&mut self, completion: Completion<StoreOutcome>) {
        let Completion { ticket, output } = completion;
        self.pending.remove(&ticket);

        match output {
            StoreOutcome::Reloaded(Ok(outcome)) => {
                if let Some(id) = outcome.seeded {
                    info!("event=note_seed module=list status=ok ticket={ticket} note_id={id}");
                }
                self.replace(Operation::Reload, ticket, outcome.notes);
            }
            StoreOutcome::Reloaded(Err(err)) => self.fail(ticket, Operation::Reload, err),
            StoreOutcome::Created(Ok(outcome)) => {
                info!(
                    "event=note_create module=list status=ok ticket={ticket} note_id={}",
                    outcome.id
                );
                self.replace(Operation::Create, ticket, outcome.notes);
            }
            StoreOutcome::Created(Err(err)) => self.fail(ticket, Operation::Create, err),
            StoreOutcome::Edited(id, Ok(outcome)) => {
                if !outcome.found {
                    warn!("event=note_edit module=list status=missing ticket={ticket} note_id={id}");
                }
                self.replace(Operation::Edit(id), ticket, outcome.notes);
            }
            StoreOutcome::Edited(id, Err(err)) => self.fail(ticket, Operation::Edit(id), err),
            StoreOutcome::Removed(id, result) => {
                let removed = self.removals.remove(&ticket);
                match result {
                    Ok(true) => {
                        info!("event=note_remove module=list status=ok ticket={ticket} note_id={id}")
                    }
                    Ok(false) => {
                        warn!("event=note_remove module=list status=missing ticket={ticket} note_id={id}")
                    }
                    Err(err) => {
                        if let Some(note) = removed {
                            self.restore(note);
                        }
                        self.fail(ticket, Operation::Remove(id), err);
                    }
                }
            }
            StoreOutcome::Loaded(id, Ok(note)) => {
                info!(
                    "event=note_lookup module=list status=ok ticket={ticket} note_id={id} found={}",
                    note.is_some()
                );
                for observer in &mut self.observers {
                    observer.on_note_loaded(id, note.as_ref());
                }
            }
            StoreOutcome::Loaded(id, Err(err)) => self.fail(ticket, Operation::Lookup(id), err),
        }
    }

    fn replace(&mut self, operation: Operation, ticket: Ticket, snapshot: Vec<Note>) {
        // A held note must match the store in case its delete fails.
        for held in self.removals.values_mut() {
            if let Some(fresh) = snapshot.iter().find(|note| note.id == held.id) {
                *held = fresh.clone();
            }
        }
        let hidden: BTreeSet<NoteId> = self.removals.values().map(|note| note.id).collect();
        self.notes = snapshot
            .into_iter()
            .filter(|note| !hidden.contains(&note.id))
            .collect();
        info!(
            "event={} module=list status=ok ticket={ticket} count={} hidden={}",
            event_name(operation),
            self.notes.len(),
            hidden.len()
        );
        notify(&mut self.observers, &ListChange::Reset, &self.notes);
    }

    /// The worker is gone: nothing pending will ever complete.
    fn abandon_outstanding(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        error!(
            "event=note_list_abandon module=list status=error error_code=worker_stopped pending={} removals={}",
            self.pending.len(),
            self.removals.len()
        );
        self.abandoned.append(&mut self.pending);
        for note in std::mem::take(&mut self.removals).into_values() {
            self.restore(note);
        }
    }

    fn restore(&mut self, note: Note) {
        if self.notes.iter().any(|current| current.id == note.id) {
            return;
        }
        let index = self
            .notes
            .iter()
            .position(|current| current.id < note.id)
            .unwrap_or(self.notes.len());
        self.notes.insert(index, note.clone());
        notify(
            &mut self.observers,
            &ListChange::Restored { index, note },
            &self.notes,
        );
    }

    fn fail(&mut self, ticket: Ticket, operation: Operation, error: RepoError) {
        error!(
            "event={} module=list status=error ticket={ticket} operation={operation} error={error}",
            event_name(operation)
        );
        let failure = OperationFailure {
            ticket,
            operation,
            error,
        };
        for observer in &mut self.observers {
            observer.on_failure(&failure);
        }
    }
}

fn with_service<T, F>(conn: &mut Connection, work: F) -> RepoResult<T>
where
    F: FnOnce(&mut NoteService<SqliteNoteRepository<'_>>) -> RepoResult<T>,
{
    let repo = SqliteNoteRepository::try_new(conn)?;
    let mut service = NoteService::new(repo);
    work(&mut service)
}

fn notify(observers: &mut [Box<dyn ListObserver>], change: &ListChange, notes: &[Note]) {
    for observer in observers {
        observer.on_change(change, notes);
    }
}

fn event_name(operation: Operation) -> &'static str {
    match operation {
        Operation::Reload => "note_reload",
        Operation::Create => "note_create",
        Operation::Edit(_) => "note_edit",
        Operation::Remove(_) => "note_remove",
        Operation::Lookup(_) => "note_lookup",
    }
}
