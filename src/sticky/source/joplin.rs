use super::{AuthCheck, AuthHandshake, AuthStatus, NoteSource};
use crate::error::{Result, StickyError};
use crate::model::{Note, NoteDetails, Notebook, Resource};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::io::Read;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_URL: &str = "http://localhost:41184";

const PAGE_LIMIT: &str = "100";
// A server that never stops reporting `has_more` must not hang the client.
const MAX_PAGES: usize = 10_000;
const MAX_RESOURCE_BYTES: u64 = 100 * 1024 * 1024;

const NOTEBOOK_FIELDS: &str = "id,title,parent_id";
const NOTE_FIELDS: &str = "id,title,parent_id";
const NOTE_DETAIL_FIELDS: &str = "id,title,body,parent_id,created_time,updated_time,todo_due,is_todo";
const RESOURCE_FIELDS: &str = "id,title";
const PING_REPLY: &str = "JoplinClipperServer";

#[derive(Deserialize)]
struct Page<T> {
    items: Vec<T>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Deserialize)]
struct AuthRequestReply {
    auth_token: String,
}

#[derive(Deserialize)]
struct AuthCheckReply {
    status: String,
    #[serde(default)]
    token: Option<String>,
}

/// HTTP client for the Joplin web clipper service.
pub struct JoplinClient {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
    max_resource_bytes: u64,
}

impl JoplinClient {
    /// `timeout` bounds every single request, not a whole operation.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            agent,
            base_url,
            token: None,
            max_resource_bytes: MAX_RESOURCE_BYTES,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Largest attachment `resource_file` accepts.
    pub fn with_resource_limit(mut self, bytes: u64) -> Self {
        self.max_resource_bytes = bytes;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<ureq::Response> {
        let mut request = self.agent.get(&self.url(path));
        for (key, value) in query {
            request = request.query(key, value);
        }
        if let Some(token) = &self.token {
            request = request.query("token", token);
        }
        debug!(path, "GET");
        Ok(request.call()?)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        let body = self.get(path, query)?.into_string()?;
        parse_json(path, &body)
    }

    /// Follows `page=1, 2, ...` until the service reports no more items.
    fn get_all<T: DeserializeOwned>(&self, path: &str, fields: &str) -> Result<Vec<T>> {
        let mut items = Vec::new();
        for page in 1..=MAX_PAGES {
            let page = page.to_string();
            let batch: Page<T> = self.get_json(
                path,
                &[("fields", fields), ("limit", PAGE_LIMIT), ("page", &page)],
            )?;
            items.extend(batch.items);
            if !batch.has_more {
                return Ok(items);
            }
        }
        Err(StickyError::Malformed(format!(
            "{} still reported more items after {} pages",
            path, MAX_PAGES
        )))
    }
}

fn parse_json<T: DeserializeOwned>(path: &str, body: &str) -> Result<T> {
    serde_json::from_str(body).map_err(|e| StickyError::Malformed(format!("{}: {}", path, e)))
}

impl NoteSource for JoplinClient {
    fn list_notebooks(&self) -> Result<Vec<Notebook>> {
        self.get_all("/folders", NOTEBOOK_FIELDS)
    }

    fn list_notes(&self, notebook_id: &str) -> Result<Vec<Note>> {
        self.get_all(&format!("/folders/{}/notes", notebook_id), NOTE_FIELDS)
    }

    fn get_note(&self, note_id: &str) -> Result<NoteDetails> {
        self.get_json(
            &format!("/notes/{}", note_id),
            &[("fields", NOTE_DETAIL_FIELDS)],
        )
    }

    fn list_resources(&self, note_id: &str) -> Result<Vec<Resource>> {
        self.get_all(&format!("/notes/{}/resources", note_id), RESOURCE_FIELDS)
    }

    fn resource_file(&self, resource_id: &str) -> Result<Vec<u8>> {
        let response = self.get(&format!("/resources/{}/file", resource_id), &[])?;
        let mut bytes = Vec::new();
        response
            .into_reader()
            .take(self.max_resource_bytes.saturating_add(1))
            .read_to_end(&mut bytes)?;
        if bytes.len() as u64 > self.max_resource_bytes {
            return Err(StickyError::Malformed(format!(
                "resource {} is larger than {} bytes",
                resource_id, self.max_resource_bytes
            )));
        }
        Ok(bytes)
    }

    fn ping(&self) -> Result<()> {
        let reply = self.get("/ping", &[])?.into_string()?;
        if reply.trim() == PING_REPLY {
            Ok(())
        } else {
            Err(StickyError::Malformed(format!(
                "unexpected ping reply: {}",
                reply.trim()
            )))
        }
    }
}

impl AuthHandshake for JoplinClient {
    fn request_auth(&self) -> Result<String> {
        debug!("POST /auth");
        let body = self.agent.post(&self.url("/auth")).call()?.into_string()?;
        let reply: AuthRequestReply = parse_json("/auth", &body)?;
        Ok(reply.auth_token)
    }

    fn check_auth(&self, auth_token: &str) -> Result<AuthCheck> {
        let reply: AuthCheckReply = self.get_json("/auth/check", &[("auth_token", auth_token)])?;
        let status = match reply.status.as_str() {
            "accepted" => AuthStatus::Accepted,
            "rejected" => AuthStatus::Rejected,
            _ => AuthStatus::Waiting,
        };
        Ok(AuthCheck {
            status,
            token: reply.token,
        })
    }
}
