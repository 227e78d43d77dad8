//! Flattens a [`Hierarchy`] into the rows of a note picker and resolves what
//! the user picked.
//!
//! Rows are sorted for display: at every level notebooks are ordered by title,
//! and inside a notebook its subnotebooks come before its own notes. Only notes
//! are selectable; each gets a 1-based number in display order.

use crate::error::{Result, StickyError};
use crate::model::{Hierarchy, HierarchyNode};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowKind {
    Notebook,
    Note { id: String, number: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickerRow {
    pub depth: usize,
    pub title: String,
    pub kind: RowKind,
}

impl PickerRow {
    pub fn note_id(&self) -> Option<&str> {
        match &self.kind {
            RowKind::Note { id, .. } => Some(id),
            RowKind::Notebook => None,
        }
    }
}

/// What the picker hands back to the window that opened it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub note_id: String,
    pub title: String,
}

pub fn rows(hierarchy: &Hierarchy) -> Vec<PickerRow> {
    let mut out = Vec::new();
    let mut number = 0;
    push_level(&hierarchy.roots, 0, &mut number, &mut out);
    out
}

fn push_level(nodes: &[HierarchyNode], depth: usize, number: &mut usize, out: &mut Vec<PickerRow>) {
    let mut sorted: Vec<&HierarchyNode> = nodes.iter().collect();
    sorted.sort_by(|a, b| {
        a.notebook
            .title
            .cmp(&b.notebook.title)
            .then_with(|| a.notebook.id.cmp(&b.notebook.id))
    });

    for node in sorted {
        out.push(PickerRow {
            depth,
            title: node.notebook.title.clone(),
            kind: RowKind::Notebook,
        });
        push_level(&node.children, depth + 1, number, out);

        let mut notes: Vec<_> = node.notes.iter().collect();
        notes.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.id.cmp(&b.id)));
        for note in notes {
            *number += 1;
            out.push(PickerRow {
                depth: depth + 1,
                title: note.title.clone(),
                kind: RowKind::Note {
                    id: note.id.clone(),
                    number: *number,
                },
            });
        }
    }
}

/// Resolves a selector against the picker rows.
///
/// Accepted selectors, tried in order: a note number, an exact note id, a
/// case-insensitive fragment of exactly one note title.
pub fn select(rows: &[PickerRow], selector: &str) -> Result<Selection> {
    let selector = selector.trim();
    if selector.is_empty() {
        return Err(StickyError::Api("no note selected".into()));
    }
    let notes: Vec<(&PickerRow, &str, usize)> = rows
        .iter()
        .filter_map(|row| match &row.kind {
            RowKind::Note { id, number } => Some((row, id.as_str(), *number)),
            RowKind::Notebook => None,
        })
        .collect();

    let to_selection = |row: &PickerRow, id: &str| Selection {
        note_id: id.to_string(),
        title: row.title.clone(),
    };

    if let Ok(wanted) = selector.parse::<usize>() {
        if let Some((row, id, _)) = notes.iter().find(|(_, _, n)| *n == wanted) {
            return Ok(to_selection(row, id));
        }
    }

    if let Some((row, id, _)) = notes.iter().find(|(_, id, _)| *id == selector) {
        return Ok(to_selection(row, id));
    }

    let needle = selector.to_lowercase();
    let matches: Vec<_> = notes
        .iter()
        .filter(|(row, _, _)| row.title.to_lowercase().contains(&needle))
        .collect();

    match matches.as_slice() {
        [(row, id, _)] => Ok(to_selection(row, id)),
        [] => Err(StickyError::NotFound(format!("no note matches '{}'", selector))),
        many => Err(StickyError::Api(format!(
            "'{}' matches {} notes, be more specific",
            selector,
            many.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Note, Notebook};

    fn hierarchy() -> Hierarchy {
        let mut work = HierarchyNode::new(Notebook::new("w", "Work"));
        work.notes.push(Note::new("n3", "Todo"));
        work.notes.push(Note::new("n2", "Meetings"));
        let mut projects = HierarchyNode::new(Notebook::new("p", "Projects").with_parent("w"));
        projects.notes.push(Note::new("n4", "Roadmap"));
        work.children.push(projects);

        let mut home = HierarchyNode::new(Notebook::new("h", "Home"));
        home.notes.push(Note::new("n1", "Groceries"));
        home.notes.push(Note::new("n5", "Grocery budget"));

        Hierarchy::new(vec![work, home])
    }

    fn flat(rows: &[PickerRow]) -> Vec<(usize, &str)> {
        rows.iter().map(|r| (r.depth, r.title.as_str())).collect()
    }

    #[test]
    fn rows_are_sorted_and_nested() {
        let rows = rows(&hierarchy());
        assert_eq!(
            flat(&rows),
            vec![
                (0, "Home"),
                (1, "Groceries"),
                (1, "Grocery budget"),
                (0, "Work"),
                (1, "Projects"),
                (2, "Roadmap"),
                (1, "Meetings"),
                (1, "Todo"),
            ]
        );
    }

    #[test]
    fn only_notes_are_numbered() {
        let rows = rows(&hierarchy());
        let numbers: Vec<_> = rows
            .iter()
            .filter_map(|r| match &r.kind {
                RowKind::Note { number, .. } => Some(*number),
                RowKind::Notebook => None,
            })
            .collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(rows[0].note_id(), None);
        assert_eq!(rows[1].note_id(), Some("n1"));
    }

    #[test]
    fn empty_hierarchy_has_no_rows() {
        assert!(rows(&Hierarchy::default()).is_empty());
    }

    #[test]
    fn select_by_number() {
        let rows = rows(&hierarchy());
        let sel = select(&rows, "3").unwrap();
        assert_eq!(sel.note_id, "n4");
        assert_eq!(sel.title, "Roadmap");
    }

    #[test]
    fn select_by_id() {
        let rows = rows(&hierarchy());
        assert_eq!(select(&rows, "n2").unwrap().title, "Meetings");
    }

    #[test]
    fn select_by_unique_title_fragment() {
        let rows = rows(&hierarchy());
        assert_eq!(select(&rows, "road").unwrap().note_id, "n4");
    }

    #[test]
    fn ambiguous_fragment_is_rejected() {
        let rows = rows(&hierarchy());
        let err = select(&rows, "groc").unwrap_err();
        assert!(matches!(err, StickyError::Api(_)));
    }

    #[test]
    fn blank_selector_is_rejected() {
        let rows = rows(&hierarchy());
        for blank in ["", "   ", "\t"] {
            assert!(matches!(select(&rows, blank), Err(StickyError::Api(_))));
        }
    }

    #[test]
    fn notebooks_are_not_selectable() {
        let rows = rows(&hierarchy());
        let err = select(&rows, "Projects").unwrap_err();
        assert!(matches!(err, StickyError::NotFound(_)));
    }
}
