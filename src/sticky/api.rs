//! # API Facade
//!
//! The single entry point for UI clients. [`StickyApi`] wires the hierarchy
//! context, the note loader and the persisted windows together and returns
//! [`CmdResult`] values; it never prints.
//!
//! ## Generic Over NoteSource
//!
//! `StickyApi<S: NoteSource>`:
//! - Production: `StickyApi<JoplinClient>`
//! - Testing: `StickyApi<InMemorySource>`

use crate::commands::config::ConfigAction;
use crate::commands::hierarchy::FetchStrategy;
use crate::commands::windows::{self, WindowAction};
use crate::commands::{self, note, CmdMessage, CmdResult, StickyPaths};
use crate::context::{HierarchyContext, RefreshOutcome};
use crate::error::Result;
use crate::model::Hierarchy;
use crate::picker;
use crate::settings::Settings;
use crate::source::NoteSource;
use std::sync::Arc;
use tracing::warn;

pub struct StickyApi<S: NoteSource> {
    context: HierarchyContext<S>,
    paths: StickyPaths,
}

impl<S: NoteSource + Sync> StickyApi<S> {
    pub fn new(source: S, strategy: FetchStrategy, paths: StickyPaths) -> Self {
        Self {
            context: HierarchyContext::new(source, strategy),
            paths,
        }
    }

    pub fn context(&self) -> &HierarchyContext<S> {
        &self.context
    }

    pub fn paths(&self) -> &StickyPaths {
        &self.paths
    }

    pub fn hierarchy(&self) -> Arc<Hierarchy> {
        self.context.snapshot()
    }

    /// Rebuilds the notebook tree from Joplin.
    pub fn refresh_hierarchy(&self) -> Result<CmdResult> {
        let mut result = CmdResult::default();
        match self.context.refresh() {
            RefreshOutcome::Rebuilt { notebooks, notes } => result.add_message(CmdMessage::info(
                format!("Loaded {} notebooks with {} notes.", notebooks, notes),
            )),
            RefreshOutcome::Joined => {
                result.add_message(CmdMessage::info("Used the refresh already in progress."))
            }
            RefreshOutcome::Unreachable(e) => result.add_message(CmdMessage::warning(format!(
                "Couldn't load notebooks from Joplin ({}). No notes available.",
                e
            ))),
        }

        let snapshot = self.context.snapshot();
        for id in &snapshot.incomplete {
            let title = snapshot
                .find_notebook(id)
                .map(|node| node.notebook.title.as_str())
                .unwrap_or(id.as_str());
            result.add_message(CmdMessage::warning(format!(
                "Notes of notebook '{}' could not be loaded.",
                title
            )));
        }
        Ok(result.with_hierarchy(snapshot))
    }

    /// The first request builds the tree; later ones reuse it until the next
    /// explicit refresh.
    fn loaded(&self) -> Arc<Hierarchy> {
        if self.context.generation() == 0 {
            self.context.refresh();
        }
        self.context.snapshot()
    }

    pub fn picker_rows(&self) -> Result<CmdResult> {
        let hierarchy = self.loaded();
        let rows = picker::rows(&hierarchy);
        Ok(CmdResult::default()
            .with_rows(rows)
            .with_hierarchy(hierarchy))
    }

    /// Resolves a picker selector and loads the chosen note.
    pub fn choose_note(&self, selector: &str) -> Result<CmdResult> {
        let hierarchy = self.loaded();
        let rows = picker::rows(&hierarchy);
        let selection = picker::select(&rows, selector)?;
        let view = note::load(
            self.context.source(),
            &self.paths.resource_dir(),
            &selection.note_id,
        )?;
        Ok(CmdResult::default()
            .with_selection(selection)
            .with_note(view))
    }

    pub fn load_note(&self, note_id: &str) -> Result<CmdResult> {
        let view = note::load(self.context.source(), &self.paths.resource_dir(), note_id)?;
        Ok(CmdResult::default().with_note(view))
    }

    pub fn note_info(&self, note_id: &str) -> Result<CmdResult> {
        let details = self.context.source().get_note(note_id)?;
        let info = note::info(&details, &self.loaded());
        Ok(CmdResult::default().with_info(info))
    }

    /// Shows the chosen note in a window, opening a new one when none is given.
    pub fn pick_into_window(&self, selector: &str, window: Option<usize>) -> Result<CmdResult> {
        let mut result = self.choose_note(selector)?;
        let mut settings = Settings::load(&self.paths.data_dir)?;

        let shown = match &result.note {
            Some(view) => {
                let index = match window {
                    Some(index) => index,
                    None => windows::new_window(&mut settings),
                };
                windows::bind_note(&mut settings, index, view)?;
                settings.save(&self.paths.data_dir)?;
                Some(format!("Window {} now shows '{}'.", index, view.title))
            }
            None => None,
        };
        if let Some(message) = shown {
            result.add_message(CmdMessage::success(message));
        }
        Ok(result.with_windows(settings.windows))
    }

    /// Re-renders every window bound to a note. Windows whose note cannot be
    /// fetched keep their cached content.
    pub fn reload_windows(&self) -> Result<CmdResult> {
        let mut settings = Settings::load(&self.paths.data_dir)?;
        let mut result = CmdResult::default();
        let mut reloaded = 0;

        for index in 1..=settings.windows.len() {
            let Some(note_id) = settings.windows[index - 1].note_id.clone() else {
                continue;
            };
            match note::load(self.context.source(), &self.paths.resource_dir(), &note_id) {
                Ok(view) => {
                    windows::bind_note(&mut settings, index, &view)?;
                    reloaded += 1;
                }
                Err(e) => {
                    warn!(note = %note_id, error = %e, "could not reload note");
                    result.add_message(CmdMessage::warning(format!(
                        "Window {} kept its cached content: {}",
                        index, e
                    )));
                }
            }
        }

        settings.save(&self.paths.data_dir)?;
        result.add_message(CmdMessage::success(format!("Reloaded {} windows.", reloaded)));
        Ok(result.with_windows(settings.windows))
    }

    pub fn windows(&self, action: WindowAction) -> Result<CmdResult> {
        windows::run(&self.paths, action)
    }

    pub fn ping(&self) -> Result<CmdResult> {
        self.context.source().ping()?;
        let mut result = CmdResult::default();
        result.add_message(CmdMessage::success("Joplin is running."));
        Ok(result)
    }

    pub fn config(&self, action: ConfigAction) -> Result<CmdResult> {
        commands::config::run(&self.paths, action)
    }
}
