//! # Note Sources
//!
//! The hierarchy builder and the note loader never talk HTTP directly. They are
//! generic over [`NoteSource`], the read-only capability they need from Joplin:
//!
//! - [`joplin::JoplinClient`]: the production source, speaking to the Joplin web
//!   clipper service over loopback HTTP.
//! - [`memory::InMemorySource`]: a fixed snapshot for tests, with switches to
//!   simulate an unreachable service or failing per-notebook fetches.
//!
//! The token handshake is a separate trait, [`AuthHandshake`], because it runs
//! before any token exists and only the HTTP client (and test doubles) need it.

use crate::error::Result;
use crate::model::{Note, NoteDetails, Notebook, Resource};

pub mod joplin;
pub mod memory;

/// Read access to a note-taking service.
pub trait NoteSource {
    /// The complete flat list of notebooks.
    fn list_notebooks(&self) -> Result<Vec<Notebook>>;

    /// Notes directly inside one notebook.
    fn list_notes(&self, notebook_id: &str) -> Result<Vec<Note>>;

    /// A single note including its markdown body.
    fn get_note(&self, note_id: &str) -> Result<NoteDetails>;

    /// Resources attached to a note.
    fn list_resources(&self, note_id: &str) -> Result<Vec<Resource>>;

    /// Raw bytes of a resource file.
    fn resource_file(&self, resource_id: &str) -> Result<Vec<u8>>;

    /// Cheap liveness check.
    fn ping(&self) -> Result<()>;
}

/// Result of polling a pending authorization request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    Waiting,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthCheck {
    pub status: AuthStatus,
    pub token: Option<String>,
}

/// The two steps of Joplin's token exchange.
pub trait AuthHandshake {
    /// Starts an authorization request and returns its pending `auth_token`.
    fn request_auth(&self) -> Result<String>;

    /// Asks whether the user has answered the pending request yet.
    fn check_auth(&self, auth_token: &str) -> Result<AuthCheck>;
}
