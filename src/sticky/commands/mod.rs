use crate::commands::note::{NoteInfo, NoteView};
use crate::config::StickyConfig;
use crate::model::{Hierarchy, NoteWindow};
use crate::picker::{PickerRow, Selection};
use std::path::PathBuf;
use std::sync::Arc;

pub mod auth;
pub mod config;
pub mod hierarchy;
pub mod note;
pub mod windows;

const RESOURCE_DIR_NAME: &str = "resources";

/// Where joplin-sticky keeps its files.
#[derive(Debug, Clone)]
pub struct StickyPaths {
    pub data_dir: PathBuf,
}

impl StickyPaths {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    /// Downloaded note attachments.
    pub fn resource_dir(&self) -> PathBuf {
        self.data_dir.join(RESOURCE_DIR_NAME)
    }
}

#[derive(Debug, Clone)]
pub enum MessageLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone)]
pub struct CmdMessage {
    pub level: MessageLevel,
    pub content: String,
}

impl CmdMessage {
    pub fn info(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Info,
            content: content.into(),
        }
    }

    pub fn success(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Success,
            content: content.into(),
        }
    }

    pub fn warning(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Warning,
            content: content.into(),
        }
    }

    pub fn error(content: impl Into<String>) -> Self {
        Self {
            level: MessageLevel::Error,
            content: content.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CmdResult {
    pub hierarchy: Option<Arc<Hierarchy>>,
    pub rows: Vec<PickerRow>,
    pub selection: Option<Selection>,
    pub note: Option<NoteView>,
    pub info: Option<NoteInfo>,
    pub windows: Vec<NoteWindow>,
    pub config: Option<StickyConfig>,
    pub messages: Vec<CmdMessage>,
}

impl CmdResult {
    pub fn add_message(&mut self, message: CmdMessage) {
        self.messages.push(message);
    }

    pub fn with_hierarchy(mut self, hierarchy: Arc<Hierarchy>) -> Self {
        self.hierarchy = Some(hierarchy);
        self
    }

    pub fn with_rows(mut self, rows: Vec<PickerRow>) -> Self {
        self.rows = rows;
        self
    }

    pub fn with_selection(mut self, selection: Selection) -> Self {
        self.selection = Some(selection);
        self
    }

    pub fn with_note(mut self, note: NoteView) -> Self {
        self.note = Some(note);
        self
    }

    pub fn with_info(mut self, info: NoteInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub fn with_windows(mut self, windows: Vec<NoteWindow>) -> Self {
        self.windows = windows;
        self
    }

    pub fn with_config(mut self, config: StickyConfig) -> Self {
        self.config = Some(config);
        self
    }
}
