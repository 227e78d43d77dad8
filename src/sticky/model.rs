use serde::{Deserialize, Deserializer, Serialize};

/// A Joplin notebook ("folder" in the web clipper API).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    pub id: String,
    pub title: String,
    // Joplin sends "" for top level notebooks
    #[serde(default, deserialize_with = "blank_as_none")]
    pub parent_id: Option<String>,
}

impl Notebook {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            parent_id: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    /// The parent id, with the empty string treated as no parent.
    pub fn parent(&self) -> Option<&str> {
        self.parent_id.as_deref().filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub parent_id: Option<String>,
}

impl Note {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            parent_id: None,
        }
    }

    pub fn in_notebook(mut self, notebook_id: impl Into<String>) -> Self {
        self.parent_id = Some(notebook_id.into());
        self
    }
}

/// Everything a sticky window shows about a single note.
///
/// Timestamps are Joplin's epoch milliseconds; `0` means unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteDetails {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub created_time: i64,
    #[serde(default)]
    pub updated_time: i64,
    #[serde(default)]
    pub todo_due: i64,
    #[serde(default, deserialize_with = "int_as_bool")]
    pub is_todo: bool,
}

impl NoteDetails {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            parent_id: None,
            created_time: 0,
            updated_time: 0,
            todo_due: 0,
            is_todo: false,
        }
    }
}

/// A file attached to a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// One notebook of the constructed tree, with its subnotebooks and its own notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HierarchyNode {
    pub notebook: Notebook,
    pub children: Vec<HierarchyNode>,
    pub notes: Vec<Note>,
}

impl HierarchyNode {
    pub fn new(notebook: Notebook) -> Self {
        Self {
            notebook,
            children: Vec::new(),
            notes: Vec::new(),
        }
    }
}

/// An immutable snapshot of the notebook tree.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Hierarchy {
    pub roots: Vec<HierarchyNode>,
    /// Notebooks whose notes could not be fetched during the build.
    pub incomplete: Vec<String>,
}

impl Hierarchy {
    pub fn new(roots: Vec<HierarchyNode>) -> Self {
        Self {
            roots,
            incomplete: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Depth-first, pre-order walk over every node with its depth.
    pub fn iter(&self) -> HierarchyIter<'_> {
        HierarchyIter {
            stack: self.roots.iter().rev().map(|node| (0, node)).collect(),
        }
    }

    pub fn notebook_count(&self) -> usize {
        self.iter().count()
    }

    pub fn note_count(&self) -> usize {
        self.iter().map(|(_, node)| node.notes.len()).sum()
    }

    pub fn find_notebook(&self, id: &str) -> Option<&HierarchyNode> {
        self.iter()
            .map(|(_, node)| node)
            .find(|node| node.notebook.id == id)
    }

    /// Finds a note and the notebook it is attached to.
    pub fn find_note(&self, id: &str) -> Option<(&Notebook, &Note)> {
        self.iter().find_map(|(_, node)| {
            node.notes
                .iter()
                .find(|note| note.id == id)
                .map(|note| (&node.notebook, note))
        })
    }
}

pub struct HierarchyIter<'a> {
    stack: Vec<(usize, &'a HierarchyNode)>,
}

impl<'a> Iterator for HierarchyIter<'a> {
    type Item = (usize, &'a HierarchyNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (depth + 1, child)));
        Some((depth, node))
    }
}

/// Screen rectangle of a sticky window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            x: 40,
            y: 40,
            width: 400,
            height: 300,
        }
    }
}

impl Geometry {
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..self
        }
    }
}

/// The persisted state of one sticky window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteWindow {
    #[serde(default)]
    pub geometry: Geometry,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default = "default_true")]
    pub body_visible: bool,
    #[serde(default = "default_window_title")]
    pub title: String,
    /// Rendered HTML of the bound note, cached for offline display.
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub note_id: Option<String>,
    /// Height to restore when the body is shown again.
    #[serde(default)]
    pub height_before: u32,
}

impl Default for NoteWindow {
    fn default() -> Self {
        Self {
            geometry: Geometry::default(),
            visible: true,
            body_visible: true,
            title: default_window_title(),
            content: String::new(),
            note_id: None,
            height_before: 0,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_window_title() -> String {
    "New Note".to_string()
}

fn blank_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

fn int_as_bool<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => b,
        Flag::Int(i) => i != 0,
    })
}
