//! Shared access to the current notebook tree.
//!
//! A [`HierarchyContext`] owns the note source and the latest hierarchy
//! snapshot. Components that show or pick notes receive the context (or a
//! snapshot taken from it) explicitly.
//!
//! Refreshing follows two rules:
//!
//! - At most one rebuild runs at a time. A refresh requested while another is
//!   running waits for it and reports its result instead of rebuilding again.
//! - The snapshot is swapped as a whole, and only after a rebuild whose
//!   notebook listing succeeded. Readers never see a half-built tree.

use crate::commands::hierarchy::{try_build_hierarchy, FetchStrategy};
use crate::error::StickyError;
use crate::model::Hierarchy;
use crate::source::NoteSource;
use std::sync::{Arc, Condvar, Mutex, PoisonError, RwLock};
use tracing::{debug, warn};

#[derive(Debug)]
pub enum RefreshOutcome {
    /// This call rebuilt the tree.
    Rebuilt { notebooks: usize, notes: usize },
    /// Another refresh was already running; this call waited for it.
    Joined,
    /// The notebook list could not be fetched; the previous tree is kept.
    Unreachable(StickyError),
}

#[derive(Default)]
struct RefreshState {
    in_flight: bool,
    generation: u64,
}

pub struct HierarchyContext<S: NoteSource> {
    source: S,
    strategy: FetchStrategy,
    current: RwLock<Arc<Hierarchy>>,
    state: Mutex<RefreshState>,
    finished: Condvar,
}

impl<S: NoteSource + Sync> HierarchyContext<S> {
    pub fn new(source: S, strategy: FetchStrategy) -> Self {
        Self {
            source,
            strategy,
            current: RwLock::new(Arc::new(Hierarchy::default())),
            state: Mutex::new(RefreshState::default()),
            finished: Condvar::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn snapshot(&self) -> Arc<Hierarchy> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of rebuilds that have finished so far.
    pub fn generation(&self) -> u64 {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .generation
    }

    pub fn refresh(&self) -> RefreshOutcome {
        {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            if state.in_flight {
                let running = state.generation;
                while state.in_flight && state.generation == running {
                    state = self
                        .finished
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                debug!("joined a refresh that was already running");
                return RefreshOutcome::Joined;
            }
            state.in_flight = true;
        }
        let _finish = FinishRefresh {
            state: &self.state,
            finished: &self.finished,
        };

        match try_build_hierarchy(&self.source, self.strategy) {
            Ok(hierarchy) => {
                let outcome = RefreshOutcome::Rebuilt {
                    notebooks: hierarchy.notebook_count(),
                    notes: hierarchy.note_count(),
                };
                *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(hierarchy);
                outcome
            }
            Err(e) => {
                warn!(error = %e, "refresh failed, keeping the previous hierarchy");
                RefreshOutcome::Unreachable(e)
            }
        }
    }
}

/// Marks the running refresh as finished and wakes its waiters, also when
/// the rebuild unwinds.
struct FinishRefresh<'a> {
    state: &'a Mutex<RefreshState>,
    finished: &'a Condvar,
}

impl Drop for FinishRefresh<'_> {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state.in_flight = false;
        state.generation += 1;
        self.finished.notify_all();
    }
}
