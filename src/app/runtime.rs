//! Executes actions and feeds their results back as events.
//!
//! ```text
//! Event ─▶ handle_event ─▶ Vec<Action> ─▶ Runtime::execute ─▶ follow-up Event
//!   ▲                                                               │
//!   └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Everything runs on the caller's task; futures from the data layer are
//! awaited in place, one action at a time.

use super::clock::Clock;
use super::handler::{handle_event, Event};
use super::{Action, AppState, ViewModel};
use crate::backend::DataLayer;
use crate::search::{SearchStrategy, ServerSearch};
use crate::storage::LocalStore;
use crate::sync::replay_ready;
use std::collections::VecDeque;
use std::rc::Rc;

/// Owns the state together with the data layer and the local store.
pub struct Runtime<D: DataLayer> {
    state: AppState,
    data: Rc<D>,
    server: ServerSearch<D>,
    store: Box<dyn LocalStore>,
    running: bool,
}

impl<D: DataLayer> Runtime<D> {
    pub fn new(state: AppState, data: Rc<D>, store: Box<dyn LocalStore>) -> Self {
        Self {
            state,
            server: ServerSearch::new(Rc::clone(&data)),
            data,
            store,
            running: true,
        }
    }

    #[must_use]
    pub const fn state(&self) -> &AppState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    #[must_use]
    pub fn data(&self) -> &D {
        &self.data
    }

    /// `false` once an [`Action::Quit`] has run.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn viewmodel(&self) -> ViewModel {
        self.state.compute_viewmodel()
    }

    /// Loads data and replays anything left in the queue from a prior run.
    pub async fn start(&mut self) -> bool {
        let mut render = self.dispatch(Event::Tick, Clock::now()).await;
        if let Some(follow) = self.execute(Action::LoadData, Clock::now()).await {
            render |= self.dispatch(follow, Clock::now()).await;
        }
        render
    }

    /// Handles `event` and everything it leads to, all at time `now`.
    /// Returns whether the view changed.
    ///
    /// Handler errors are logged and shown in the status bar; they never
    /// stop the loop.
    pub async fn dispatch(&mut self, event: Event, now: Clock) -> bool {
        let mut pending = VecDeque::from([event]);
        let mut render = false;

        while let Some(event) = pending.pop_front() {
            match handle_event(&mut self.state, &event, now) {
                Ok((changed, actions)) => {
                    render |= changed;
                    for action in actions {
                        if let Some(follow) = self.execute(action, now).await {
                            pending.push_back(follow);
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "event rejected");
                    self.state.status = Some(e.to_string());
                    render = true;
                }
            }
        }

        render
    }

    async fn execute(&mut self, action: Action, now: Clock) -> Option<Event> {
        tracing::trace!(action = ?action, "executing action");

        match action {
            Action::Quit => {
                self.running = false;
                if let Err(e) = self.state.queue.persist(self.store.as_mut()) {
                    tracing::error!(error = %e, "failed to persist offline queue on exit");
                }
                None
            }
            Action::LoadData => {
                let loaded = async {
                    let lists = self.data.load_lists().await?;
                    let tasks = self.data.load_tasks().await?;
                    Ok::<_, crate::domain::TodoError>((lists, tasks))
                }
                .await;
                Some(match loaded {
                    Ok((lists, tasks)) => Event::DataLoaded { lists, tasks },
                    Err(e) => Event::LoadFailed { message: e.to_string() },
                })
            }
            Action::SendBatch(batch) => Some(match self.data.apply_batch(batch.clone()).await {
                Ok(receipt) => Event::BatchApplied(receipt),
                Err(e) => Event::BatchFailed {
                    batch,
                    message: e.to_string(),
                },
            }),
            Action::RunSearch(pending) => {
                let result = self.server.search(&pending.request).await.map_err(|e| e.to_string());
                Some(Event::SearchCompleted { seq: pending.seq, result })
            }
            Action::ReplayQueue => {
                let report = replay_ready(&mut self.state.queue, self.data.as_ref(), now.wall).await;
                Some(Event::ReplayFinished(report))
            }
            Action::PersistQueue => {
                if let Err(e) = self.state.queue.persist(self.store.as_mut()) {
                    tracing::error!(error = %e, "failed to persist offline queue");
                    self.state.status = Some(e.to_string());
                }
                None
            }
            Action::PersistRecent => {
                if let Err(e) = self.state.search.recent().save(self.store.as_mut()) {
                    tracing::warn!(error = %e, "failed to persist recent searches");
                }
                None
            }
        }
    }
}
