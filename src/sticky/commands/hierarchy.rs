//! Builds the notebook tree from Joplin's flat, parent-linked notebook list.
//!
//! The build runs in three steps:
//!
//! 1. **Index**: one scan over the flat list records, for every notebook, its
//!    position, its parent's position and the ordered positions of its
//!    children. Notebooks without a parent (or with an unknown one) are roots.
//! 2. **Fetch**: the notes of every notebook are requested, one call per
//!    notebook, either in flat-list order or spread over scoped worker threads.
//!    Results are stored by flat-list position, so completion order never shows
//!    up in the output.
//! 3. **Realize**: nodes are assembled top-down from the roots with an explicit
//!    stack. A visited flag per position makes every notebook appear exactly
//!    once, even when the parent pointers contain cycles.
//!
//! The build never caches anything: each call re-reads the whole library.

use crate::error::Result;
use crate::model::{Hierarchy, HierarchyNode, Note, Notebook};
use crate::source::NoteSource;
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// How per-notebook note listings are issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchStrategy {
    #[default]
    Sequential,
    Parallel { workers: usize },
}

impl FetchStrategy {
    pub fn from_workers(workers: usize) -> Self {
        if workers > 1 {
            FetchStrategy::Parallel { workers }
        } else {
            FetchStrategy::Sequential
        }
    }
}

/// Builds the hierarchy, falling back to an empty one when the notebook list
/// itself cannot be fetched.
pub fn build_hierarchy<S: NoteSource + Sync>(source: &S, strategy: FetchStrategy) -> Hierarchy {
    match try_build_hierarchy(source, strategy) {
        Ok(hierarchy) => hierarchy,
        Err(e) => {
            warn!(error = %e, "could not list notebooks, using an empty hierarchy");
            Hierarchy::default()
        }
    }
}

/// Like [`build_hierarchy`], but reports a failed notebook listing.
///
/// A failed note listing for a single notebook is not an error: that notebook
/// is shown without notes and recorded in [`Hierarchy::incomplete`].
pub fn try_build_hierarchy<S: NoteSource + Sync>(
    source: &S,
    strategy: FetchStrategy,
) -> Result<Hierarchy> {
    let notebooks = unique_notebooks(source.list_notebooks()?);
    debug!(count = notebooks.len(), "listed notebooks");

    let index = ChildIndex::build(&notebooks);
    let fetched = fetch_notes(source, &notebooks, strategy);
    let (notes, incomplete) = collect_notes(&notebooks, fetched);
    let roots = realize(&notebooks, &index, notes);

    Ok(Hierarchy { roots, incomplete })
}

fn unique_notebooks(notebooks: Vec<Notebook>) -> Vec<Notebook> {
    let mut seen = HashSet::new();
    notebooks
        .into_iter()
        .filter(|notebook| {
            let fresh = seen.insert(notebook.id.clone());
            if !fresh {
                warn!(notebook = %notebook.id, "duplicate notebook id, keeping the first one");
            }
            fresh
        })
        .collect()
}

/// Adjacency of the flat list, by position.
struct ChildIndex {
    roots: Vec<usize>,
    parent: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
}

impl ChildIndex {
    fn build(notebooks: &[Notebook]) -> Self {
        let position: HashMap<&str, usize> = notebooks
            .iter()
            .enumerate()
            .map(|(i, notebook)| (notebook.id.as_str(), i))
            .collect();

        let mut roots = Vec::new();
        let mut parent = vec![None; notebooks.len()];
        let mut children = vec![Vec::new(); notebooks.len()];

        for (i, notebook) in notebooks.iter().enumerate() {
            match notebook.parent() {
                None => roots.push(i),
                Some(parent_id) => match position.get(parent_id) {
                    Some(&p) => {
                        parent[i] = Some(p);
                        children[p].push(i);
                    }
                    None => {
                        warn!(
                            notebook = %notebook.id,
                            parent = parent_id,
                            "parent notebook does not exist, showing it at the top level"
                        );
                        roots.push(i);
                    }
                },
            }
        }

        Self {
            roots,
            parent,
            children,
        }
    }

    /// The member of the parent cycle above `start` that comes first in the
    /// flat list. `start` must not be reachable from any root.
    fn cycle_entry(&self, start: usize) -> usize {
        let mut seen = HashSet::new();
        let mut current = start;
        while seen.insert(current) {
            match self.parent[current] {
                Some(p) => current = p,
                None => return current,
            }
        }

        // `current` is on the cycle; walk it once to find its earliest member.
        let mut earliest = current;
        let mut member = current;
        while let Some(p) = self.parent[member] {
            if p == current {
                break;
            }
            earliest = earliest.min(p);
            member = p;
        }
        earliest
    }
}

fn fetch_notes<S: NoteSource + Sync>(
    source: &S,
    notebooks: &[Notebook],
    strategy: FetchStrategy,
) -> Vec<Result<Vec<Note>>> {
    let fetch_part = |part: &[Notebook]| -> Vec<Result<Vec<Note>>> {
        part.iter()
            .map(|notebook| source.list_notes(&notebook.id))
            .collect()
    };

    match strategy {
        FetchStrategy::Parallel { workers } if workers > 1 && notebooks.len() > 1 => {
            let chunk = notebooks.len().div_ceil(workers).max(1);
            std::thread::scope(|scope| {
                let handles: Vec<_> = notebooks
                    .chunks(chunk)
                    .map(|part| scope.spawn(move || fetch_part(part)))
                    .collect();
                handles
                    .into_iter()
                    .flat_map(|handle| match handle.join() {
                        Ok(results) => results,
                        Err(panic) => std::panic::resume_unwind(panic),
                    })
                    .collect()
            })
        }
        _ => fetch_part(notebooks),
    }
}

/// Turns fetch results into per-position note lists. A note id already
/// attached to an earlier notebook is dropped.
fn collect_notes(
    notebooks: &[Notebook],
    fetched: Vec<Result<Vec<Note>>>,
) -> (Vec<Vec<Note>>, Vec<String>) {
    let mut seen = HashSet::new();
    let mut incomplete = Vec::new();
    let mut notes = Vec::with_capacity(notebooks.len());

    for (notebook, result) in notebooks.iter().zip(fetched) {
        match result {
            Ok(listed) => {
                let own: Vec<Note> = listed
                    .into_iter()
                    .filter(|note| {
                        let fresh = seen.insert(note.id.clone());
                        if !fresh {
                            warn!(
                                note = %note.id,
                                notebook = %notebook.id,
                                "note listed twice, keeping the first owner"
                            );
                        }
                        fresh
                    })
                    .collect();
                notes.push(own);
            }
            Err(e) => {
                warn!(
                    notebook = %notebook.id,
                    error = %e,
                    "could not list notes, showing the notebook empty"
                );
                incomplete.push(notebook.id.clone());
                notes.push(Vec::new());
            }
        }
    }

    (notes, incomplete)
}

fn realize(
    notebooks: &[Notebook],
    index: &ChildIndex,
    mut notes: Vec<Vec<Note>>,
) -> Vec<HierarchyNode> {
    let mut visited = vec![false; notebooks.len()];
    let mut roots = Vec::with_capacity(index.roots.len());

    for &root in &index.roots {
        if let Some(node) = realize_subtree(root, notebooks, index, &mut notes, &mut visited) {
            roots.push(node);
        }
    }

    // Whatever is left hangs off a parent cycle.
    for position in 0..notebooks.len() {
        if visited[position] {
            continue;
        }
        let entry = index.cycle_entry(position);
        warn!(
            notebook = %notebooks[entry].id,
            "notebook parents form a cycle, showing it at the top level"
        );
        if let Some(node) = realize_subtree(entry, notebooks, index, &mut notes, &mut visited) {
            roots.push(node);
        }
    }

    roots
}

struct Frame {
    position: usize,
    next_child: usize,
    children: Vec<HierarchyNode>,
}

impl Frame {
    fn new(position: usize) -> Self {
        Self {
            position,
            next_child: 0,
            children: Vec::new(),
        }
    }
}

fn realize_subtree(
    start: usize,
    notebooks: &[Notebook],
    index: &ChildIndex,
    notes: &mut [Vec<Note>],
    visited: &mut [bool],
) -> Option<HierarchyNode> {
    if visited[start] {
        return None;
    }
    visited[start] = true;
    let mut stack = vec![Frame::new(start)];

    loop {
        let top = stack.last_mut()?;
        if let Some(&child) = index.children[top.position].get(top.next_child) {
            top.next_child += 1;
            if !visited[child] {
                visited[child] = true;
                stack.push(Frame::new(child));
            }
            continue;
        }

        let frame = stack.pop()?;
        let node = HierarchyNode {
            notebook: notebooks[frame.position].clone(),
            children: frame.children,
            notes: std::mem::take(&mut notes[frame.position]),
        };
        match stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => return Some(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::memory::fixtures::{deep_chain, small_library};
    use crate::source::memory::InMemorySource;

    fn ids(nodes: &[HierarchyNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.notebook.id.as_str()).collect()
    }

    fn note_ids(node: &HierarchyNode) -> Vec<&str> {
        node.notes.iter().map(|n| n.id.as_str()).collect()
    }

    fn all_ids(hierarchy: &Hierarchy) -> Vec<String> {
        let mut ids: Vec<String> = hierarchy
            .iter()
            .map(|(_, node)| node.notebook.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// 40 notebooks where notebook i hangs under notebook i / 3.
    fn wide_library() -> InMemorySource {
        let mut source = InMemorySource::new();
        for i in 0..40usize {
            let mut notebook = Notebook::new(format!("nb{:02}", i), format!("Book {}", i));
            if i > 0 {
                notebook = notebook.with_parent(format!("nb{:02}", i / 3));
            }
            source = source.with_notebook(notebook);
            for j in 0..(i % 4) {
                source = source.with_note(
                    Note::new(format!("note-{}-{}", i, j), format!("Note {}", j))
                        .in_notebook(format!("nb{:02}", i)),
                );
            }
        }
        source
    }

    #[test]
    fn builds_the_worked_example() {
        let h = build_hierarchy(&small_library(), FetchStrategy::Sequential);

        assert_eq!(ids(&h.roots), vec!["A", "C"]);
        let a = &h.roots[0];
        assert_eq!(ids(&a.children), vec!["B"]);
        assert_eq!(note_ids(a), vec!["n1"]);

        let b = &a.children[0];
        assert!(b.children.is_empty());
        assert_eq!(note_ids(b), vec!["n2"]);

        let c = &h.roots[1];
        assert!(c.children.is_empty());
        assert!(c.notes.is_empty());
        assert!(h.incomplete.is_empty());
    }

    #[test]
    fn every_notebook_appears_exactly_once() {
        let h = build_hierarchy(&wide_library(), FetchStrategy::Sequential);
        let expected: Vec<String> = (0..40).map(|i| format!("nb{:02}", i)).collect();
        assert_eq!(h.notebook_count(), 40);
        assert_eq!(all_ids(&h), expected);
    }

    #[test]
    fn children_sit_directly_under_their_parent() {
        let h = build_hierarchy(&wide_library(), FetchStrategy::Sequential);
        assert_eq!(ids(&h.roots), vec!["nb00"]);
        for (_, node) in h.iter() {
            for child in &node.children {
                assert_eq!(child.notebook.parent(), Some(node.notebook.id.as_str()));
            }
        }
    }

    #[test]
    fn children_keep_flat_list_order() {
        let source = InMemorySource::new()
            .with_notebook(Notebook::new("root", "Root"))
            .with_notebook(Notebook::new("z", "Zed").with_parent("root"))
            .with_notebook(Notebook::new("a", "Ay").with_parent("root"))
            .with_notebook(Notebook::new("m", "Em").with_parent("root"));
        let h = build_hierarchy(&source, FetchStrategy::Sequential);
        assert_eq!(ids(&h.roots[0].children), vec!["z", "a", "m"]);
    }

    #[test]
    fn empty_parent_id_makes_a_root() {
        let mut blank = Notebook::new("blank", "Blank");
        blank.parent_id = Some(String::new());
        let source = InMemorySource::new()
            .with_notebook(Notebook::new("first", "First"))
            .with_notebook(blank);
        let h = build_hierarchy(&source, FetchStrategy::Sequential);
        assert_eq!(ids(&h.roots), vec!["first", "blank"]);
    }

    #[test]
    fn every_note_is_attached_once() {
        let h = build_hierarchy(&wide_library(), FetchStrategy::Sequential);
        assert_eq!(h.note_count(), (0..40).map(|i| i % 4).sum::<usize>());
        for (_, node) in h.iter() {
            for note in &node.notes {
                assert_eq!(note.parent_id.as_deref(), Some(node.notebook.id.as_str()));
            }
        }
    }

    #[test]
    fn rebuilding_an_unchanged_snapshot_is_identical() {
        let source = small_library();
        let first = build_hierarchy(&source, FetchStrategy::Sequential);
        let calls_after_first = source.calls();
        let second = build_hierarchy(&source, FetchStrategy::Sequential);

        assert_eq!(first, second);
        // nothing cached: the second build hits the source just as often
        assert_eq!(source.calls(), calls_after_first * 2);
    }

    #[test]
    fn empty_library_yields_no_roots() {
        let h = build_hierarchy(&InMemorySource::new(), FetchStrategy::Sequential);
        assert!(h.is_empty());
        assert!(h.incomplete.is_empty());
    }

    #[test]
    fn unreachable_service_yields_empty_hierarchy() {
        let source = small_library().offline();
        let h = build_hierarchy(&source, FetchStrategy::Sequential);
        assert!(h.is_empty());
    }

    #[test]
    fn try_build_reports_unreachable_service() {
        let source = small_library().offline();
        let err = try_build_hierarchy(&source, FetchStrategy::Sequential).unwrap_err();
        assert!(err.is_unreachable());
    }

    #[test]
    fn failing_note_fetch_only_empties_that_notebook() {
        let source = small_library().failing_notebook("B");
        let h = build_hierarchy(&source, FetchStrategy::Sequential);

        assert_eq!(h.notebook_count(), 3);
        assert_eq!(ids(&h.roots), vec!["A", "C"]);
        assert_eq!(note_ids(&h.roots[0]), vec!["n1"]);
        assert!(h.roots[0].children[0].notes.is_empty());
        assert_eq!(h.incomplete, vec!["B".to_string()]);
    }

    #[test]
    fn two_notebook_cycle_is_promoted_once() {
        let source = InMemorySource::new()
            .with_notebook(Notebook::new("top", "Top"))
            .with_notebook(Notebook::new("x", "X").with_parent("y"))
            .with_notebook(Notebook::new("y", "Y").with_parent("x"));
        let h = build_hierarchy(&source, FetchStrategy::Sequential);

        assert_eq!(ids(&h.roots), vec!["top", "x"]);
        assert_eq!(ids(&h.roots[1].children), vec!["y"]);
        assert!(h.roots[1].children[0].children.is_empty());
        assert_eq!(h.notebook_count(), 3);
    }

    #[test]
    fn notebook_below_a_cycle_stays_nested() {
        let source = InMemorySource::new()
            .with_notebook(Notebook::new("leaf", "Leaf").with_parent("y"))
            .with_notebook(Notebook::new("x", "X").with_parent("y"))
            .with_notebook(Notebook::new("y", "Y").with_parent("x"));
        let h = build_hierarchy(&source, FetchStrategy::Sequential);

        // x is the earliest cycle member, leaf is not on the cycle
        assert_eq!(ids(&h.roots), vec!["x"]);
        let y = &h.roots[0].children[0];
        assert_eq!(y.notebook.id, "y");
        assert_eq!(ids(&y.children), vec!["leaf"]);
        assert_eq!(h.notebook_count(), 3);
    }

    #[test]
    fn self_parent_is_promoted() {
        let source =
            InMemorySource::new().with_notebook(Notebook::new("loop", "Loop").with_parent("loop"));
        let h = build_hierarchy(&source, FetchStrategy::Sequential);
        assert_eq!(ids(&h.roots), vec!["loop"]);
        assert!(h.roots[0].children.is_empty());
    }

    #[test]
    fn unknown_parent_makes_a_root_in_place() {
        let source = InMemorySource::new()
            .with_notebook(Notebook::new("a", "A"))
            .with_notebook(Notebook::new("orphan", "Orphan").with_parent("gone"))
            .with_notebook(Notebook::new("c", "C"));
        let h = build_hierarchy(&source, FetchStrategy::Sequential);
        assert_eq!(ids(&h.roots), vec!["a", "orphan", "c"]);
    }

    #[test]
    fn duplicate_notebook_ids_are_dropped() {
        let source = InMemorySource::new()
            .with_notebook(Notebook::new("a", "A"))
            .with_notebook(Notebook::new("a", "A again"));
        let h = build_hierarchy(&source, FetchStrategy::Sequential);
        assert_eq!(h.notebook_count(), 1);
        assert_eq!(h.roots[0].notebook.title, "A");
    }

    #[test]
    fn parallel_fetch_matches_sequential() {
        let source = wide_library().failing_notebook("nb07");
        let sequential = build_hierarchy(&source, FetchStrategy::Sequential);
        for workers in [2, 3, 8, 64] {
            let parallel = build_hierarchy(&source, FetchStrategy::Parallel { workers });
            assert_eq!(parallel, sequential, "workers = {}", workers);
        }
    }

    #[test]
    fn deep_nesting_does_not_recurse() {
        let h = build_hierarchy(&deep_chain(2_000), FetchStrategy::Sequential);
        assert_eq!(h.roots.len(), 1);
        assert_eq!(h.notebook_count(), 2_000);
        let (depth, deepest) = h.iter().last().unwrap();
        assert_eq!(depth, 1_999);
        assert_eq!(deepest.notebook.id, "nb1999");
        assert_eq!(note_ids(deepest), vec!["note1999"]);
    }

    #[test]
    fn strategy_from_workers() {
        assert_eq!(FetchStrategy::from_workers(0), FetchStrategy::Sequential);
        assert_eq!(FetchStrategy::from_workers(1), FetchStrategy::Sequential);
        assert_eq!(
            FetchStrategy::from_workers(4),
            FetchStrategy::Parallel { workers: 4 }
        );
    }
}
