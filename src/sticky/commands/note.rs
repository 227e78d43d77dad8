use crate::error::{Result, StickyError};
use crate::model::{Hierarchy, NoteDetails};
use crate::render::{localize_resource_links, markdown_to_html};
use crate::source::NoteSource;
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A note ready to be shown in a sticky window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteView {
    pub id: String,
    pub title: String,
    pub html: String,
    pub details: NoteDetails,
    /// Local copies of the note's attachments.
    pub resources: Vec<PathBuf>,
}

/// Fetches a note, makes its attachments available under `resource_dir` and
/// renders the body with links pointing at the local copies.
///
/// Attachments already on disk are not downloaded again.
pub fn load<S: NoteSource>(source: &S, resource_dir: &Path, note_id: &str) -> Result<NoteView> {
    let details = source.get_note(note_id)?;
    let mut body = details.body.clone();
    let mut resources = Vec::new();

    let attached = source.list_resources(note_id)?;
    if !attached.is_empty() {
        fs::create_dir_all(resource_dir)?;
    }
    for resource in attached {
        let local = resource_path(resource_dir, &resource.id)?;
        if !local.exists() {
            debug!(resource = %resource.id, "downloading resource");
            let bytes = source.resource_file(&resource.id)?;
            let partial = local.with_extension("part");
            fs::write(&partial, bytes)?;
            fs::rename(partial, &local)?;
        }
        body = localize_resource_links(&body, &resource.id, &local);
        resources.push(local);
    }

    Ok(NoteView {
        id: details.id.clone(),
        title: details.title.clone(),
        html: markdown_to_html(&body),
        details,
        resources,
    })
}

/// Resource ids become file names, so only plain alphanumeric ids are used.
fn resource_path(resource_dir: &Path, resource_id: &str) -> Result<PathBuf> {
    if resource_id.is_empty() || !resource_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(StickyError::Malformed(format!(
            "unusable resource id '{}'",
            resource_id
        )));
    }
    Ok(resource_dir.join(resource_id))
}

/// What the "Information" menu of a window lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteInfo {
    pub id: String,
    pub title: String,
    /// Title of the owning notebook, or its id when it is not in the tree.
    pub notebook: Option<String>,
    pub created: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    pub due: Option<DateTime<Utc>>,
    pub is_todo: bool,
}

pub fn info(details: &NoteDetails, hierarchy: &Hierarchy) -> NoteInfo {
    let notebook = details.parent_id.as_deref().map(|parent| {
        hierarchy
            .find_notebook(parent)
            .map(|node| node.notebook.title.clone())
            .unwrap_or_else(|| parent.to_string())
    });

    NoteInfo {
        id: details.id.clone(),
        title: details.title.clone(),
        notebook,
        created: timestamp(details.created_time),
        updated: timestamp(details.updated_time),
        due: timestamp(details.todo_due),
        is_todo: details.is_todo,
    }
}

fn timestamp(millis: i64) -> Option<DateTime<Utc>> {
    if millis <= 0 {
        return None;
    }
    DateTime::from_timestamp_millis(millis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Resource;
    use crate::source::memory::InMemorySource;

    fn source_with_image() -> InMemorySource {
        InMemorySource::new()
            .with_details(NoteDetails::new(
                "n1",
                "Groceries",
                "# List\n![logo](:/res1)\nmilk",
            ))
            .with_resource(
                "n1",
                Resource {
                    id: "res1".into(),
                    title: Some("logo.png".into()),
                },
                vec![1, 2, 3],
            )
    }

    #[test]
    fn downloads_and_links_resources() {
        let dir = tempfile::tempdir().unwrap();
        let view = load(&source_with_image(), dir.path(), "n1").unwrap();

        let local = dir.path().join("res1");
        assert_eq!(fs::read(&local).unwrap(), vec![1, 2, 3]);
        assert_eq!(view.resources, vec![local.clone()]);
        assert!(view.html.contains(&local.to_string_lossy().to_string()));
        assert!(!view.html.contains(":/res1"));
        assert!(view.html.contains("<h1>List</h1>"));
        assert_eq!(view.title, "Groceries");
    }

    #[test]
    fn existing_resources_are_not_refetched() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("res1"), b"cached").unwrap();

        let source = source_with_image();
        load(&source, dir.path(), "n1").unwrap();

        // get_note + list_resources, no resource_file
        assert_eq!(source.calls(), 2);
        assert_eq!(fs::read(dir.path().join("res1")).unwrap(), b"cached");
    }

    #[test]
    fn resource_ids_cannot_leave_the_resource_dir() {
        let dir = tempfile::tempdir().unwrap();
        let resource_dir = dir.path().join("resources");
        let source = InMemorySource::new()
            .with_details(NoteDetails::new("n1", "Sneaky", "![x](:/../settings.json)"))
            .with_resource(
                "n1",
                Resource {
                    id: "../settings.json".into(),
                    title: None,
                },
                b"{}".to_vec(),
            );

        let err = load(&source, &resource_dir, "n1").unwrap_err();
        assert!(matches!(err, StickyError::Malformed(_)));
        assert!(!dir.path().join("settings.json").exists());
    }

    #[test]
    fn failed_download_leaves_nothing_cached() {
        let dir = tempfile::tempdir().unwrap();
        let source = InMemorySource::new()
            .with_details(NoteDetails::new("n1", "Broken", "![x](:/res1)"))
            .with_missing_resource(
                "n1",
                Resource {
                    id: "res1".into(),
                    title: None,
                },
            );

        assert!(load(&source, dir.path(), "n1").is_err());
        assert!(!dir.path().join("res1").exists());

        let view = load(&source_with_image(), dir.path(), "n1").unwrap();
        assert_eq!(fs::read(&view.resources[0]).unwrap(), vec![1, 2, 3]);
        assert!(!dir.path().join("res1.part").exists());
    }

    #[test]
    fn note_without_resources_creates_no_directory() {
        let dir = tempfile::tempdir().unwrap();
        let resource_dir = dir.path().join("resources");
        let source = InMemorySource::new().with_details(NoteDetails::new("n", "T", "plain"));

        let view = load(&source, &resource_dir, "n").unwrap();
        assert!(view.resources.is_empty());
        assert!(!resource_dir.exists());
    }

    #[test]
    fn info_names_the_notebook() {
        let mut details = NoteDetails::new("n1", "First", "");
        details.parent_id = Some("A".into());
        details.created_time = 1_700_000_000_000;
        details.is_todo = true;

        let hierarchy = crate::commands::hierarchy::build_hierarchy(
            &crate::source::memory::fixtures::small_library(),
            crate::commands::hierarchy::FetchStrategy::Sequential,
        );
        let info = info(&details, &hierarchy);

        assert_eq!(info.notebook.as_deref(), Some("Alpha"));
        assert_eq!(info.created.unwrap().timestamp_millis(), 1_700_000_000_000);
        assert_eq!(info.updated, None);
        assert_eq!(info.due, None);
        assert!(info.is_todo);
    }

    #[test]
    fn info_falls_back_to_notebook_id() {
        let mut details = NoteDetails::new("n1", "First", "");
        details.parent_id = Some("elsewhere".into());
        let info = info(&details, &Hierarchy::default());
        assert_eq!(info.notebook.as_deref(), Some("elsewhere"));
    }

    #[test]
    fn missing_note_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&InMemorySource::new(), dir.path(), "nope").unwrap_err();
        assert!(matches!(err, StickyError::NotFound(_)));
    }
}
