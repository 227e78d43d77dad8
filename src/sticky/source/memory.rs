use super::{AuthCheck, AuthHandshake, AuthStatus, NoteSource};
use crate::error::{Result, StickyError};
use crate::model::{Note, NoteDetails, Notebook, Resource};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// In-memory note source for testing and development.
///
/// Holds a fixed snapshot. Every read counts towards [`InMemorySource::calls`]
/// so tests can check that nothing is cached between builds.
#[derive(Default)]
pub struct InMemorySource {
    notebooks: Vec<Notebook>,
    notes: Vec<Note>,
    details: HashMap<String, NoteDetails>,
    resources: HashMap<String, Vec<Resource>>,
    files: HashMap<String, Vec<u8>>,
    failing_notebooks: HashSet<String>,
    offline: bool,
    auth_script: Mutex<VecDeque<AuthCheck>>,
    calls: AtomicUsize,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notebook(mut self, notebook: Notebook) -> Self {
        self.notebooks.push(notebook);
        self
    }

    pub fn with_note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }

    pub fn with_details(mut self, details: NoteDetails) -> Self {
        self.details.insert(details.id.clone(), details);
        self
    }

    pub fn with_resource(mut self, note_id: &str, resource: Resource, bytes: Vec<u8>) -> Self {
        self.files.insert(resource.id.clone(), bytes);
        self.resources
            .entry(note_id.to_string())
            .or_default()
            .push(resource);
        self
    }

    /// Lists a resource whose file cannot be downloaded.
    pub fn with_missing_resource(mut self, note_id: &str, resource: Resource) -> Self {
        self.resources
            .entry(note_id.to_string())
            .or_default()
            .push(resource);
        self
    }

    /// Note listing for this notebook fails with a transport error.
    pub fn failing_notebook(mut self, notebook_id: &str) -> Self {
        self.failing_notebooks.insert(notebook_id.to_string());
        self
    }

    /// Every call fails as if the service were not running.
    pub fn offline(mut self) -> Self {
        self.offline = true;
        self
    }

    /// Queues the answers `check_auth` gives, one per call.
    pub fn with_auth_script(mut self, checks: Vec<AuthCheck>) -> Self {
        self.auth_script = Mutex::new(checks.into());
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn enter(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline {
            return Err(StickyError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

impl NoteSource for InMemorySource {
    fn list_notebooks(&self) -> Result<Vec<Notebook>> {
        self.enter()?;
        Ok(self.notebooks.clone())
    }

    fn list_notes(&self, notebook_id: &str) -> Result<Vec<Note>> {
        self.enter()?;
        if self.failing_notebooks.contains(notebook_id) {
            return Err(StickyError::Transport(format!(
                "connection reset while listing {}",
                notebook_id
            )));
        }
        Ok(self
            .notes
            .iter()
            .filter(|note| note.parent_id.as_deref() == Some(notebook_id))
            .cloned()
            .collect())
    }

    fn get_note(&self, note_id: &str) -> Result<NoteDetails> {
        self.enter()?;
        if let Some(details) = self.details.get(note_id) {
            return Ok(details.clone());
        }
        self.notes
            .iter()
            .find(|note| note.id == note_id)
            .map(|note| {
                let mut details = NoteDetails::new(&note.id, &note.title, "");
                details.parent_id = note.parent_id.clone();
                details
            })
            .ok_or_else(|| StickyError::NotFound(format!("note {}", note_id)))
    }

    fn list_resources(&self, note_id: &str) -> Result<Vec<Resource>> {
        self.enter()?;
        Ok(self.resources.get(note_id).cloned().unwrap_or_default())
    }

    fn resource_file(&self, resource_id: &str) -> Result<Vec<u8>> {
        self.enter()?;
        self.files
            .get(resource_id)
            .cloned()
            .ok_or_else(|| StickyError::NotFound(format!("resource {}", resource_id)))
    }

    fn ping(&self) -> Result<()> {
        self.enter()
    }
}

impl AuthHandshake for InMemorySource {
    fn request_auth(&self) -> Result<String> {
        self.enter()?;
        Ok("pending-auth-token".to_string())
    }

    fn check_auth(&self, _auth_token: &str) -> Result<AuthCheck> {
        self.enter()?;
        let next = self
            .auth_script
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .pop_front();
        Ok(next.unwrap_or(AuthCheck {
            status: AuthStatus::Waiting,
            token: None,
        }))
    }
}

// --- Test Fixtures ---

#[cfg(any(test, feature = "test_utils"))]
pub mod fixtures {
    use super::*;

    /// The worked example: A > B, C at the top, n1 in A and n2 in B.
    pub fn small_library() -> InMemorySource {
        InMemorySource::new()
            .with_notebook(Notebook::new("A", "Alpha"))
            .with_notebook(Notebook::new("B", "Beta").with_parent("A"))
            .with_notebook(Notebook::new("C", "Gamma"))
            .with_note(Note::new("n1", "First").in_notebook("A"))
            .with_note(Note::new("n2", "Second").in_notebook("B"))
    }

    /// A straight chain `nb0 > nb1 > ... > nb{depth-1}`, one note per level.
    pub fn deep_chain(depth: usize) -> InMemorySource {
        let mut source = InMemorySource::new();
        for level in 0..depth {
            let mut notebook = Notebook::new(format!("nb{}", level), format!("Level {}", level));
            if level > 0 {
                notebook = notebook.with_parent(format!("nb{}", level - 1));
            }
            let note = Note::new(format!("note{}", level), "Note").in_notebook(format!("nb{}", level));
            source = source.with_notebook(notebook).with_note(note);
        }
        source
    }
}
