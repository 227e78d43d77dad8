//! # Joplin Sticky Architecture
//!
//! joplin-sticky keeps Joplin notes pinned on screen as sticky windows. The
//! library owns everything except the terminal: it talks to Joplin's local
//! Web Clipper service, builds the notebook tree, renders notes and keeps the
//! window board on disk. The `sticky` binary is one client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs, args.rs, print.rs)                           │
//! │  - Parses arguments, prints CmdResult, owns exit codes      │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs) + HierarchyContext (context.rs)               │
//! │  - One facade, one shared notebook tree snapshot            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Commands (commands/*.rs)                                   │
//! │  - Hierarchy building, auth handshake, note loading,        │
//! │    window board, config                                     │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Source (source/)                                           │
//! │  - NoteSource trait                                         │
//! │  - JoplinClient (HTTP), InMemorySource (testing)            │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## No I/O Assumptions in Core
//!
//! From `api.rs` inward, code returns `Result<CmdResult>` and never writes
//! to stdout or stderr. Diagnostics go through `tracing`; the binary decides
//! whether and where they are shown (see [`logging`]).
//!
//! ## The Notebook Tree
//!
//! [`commands::hierarchy::build_hierarchy`] turns Joplin's flat folder list
//! into a forest of [`model::HierarchyNode`]s. Every notebook appears exactly
//! once, children keep the service's order, and bad parent links (unknown
//! parents, cycles) are repaired by promoting notebooks to roots rather than
//! dropping them.
//!
//! ## Module Overview
//!
//! - [`api`]: The facade used by clients
//! - [`context`]: Shared, refreshable hierarchy snapshot
//! - [`commands`]: Business logic
//! - [`source`]: Note source abstraction and implementations
//! - [`model`]: Notebooks, notes, hierarchy, windows
//! - [`picker`]: Flattened tree rows and note selection
//! - [`render`]: Markdown to HTML, resource links
//! - [`config`]: `config.json` handling
//! - [`settings`]: API token and window board persistence
//! - [`logging`]: `tracing` subscriber setup
//! - [`error`]: Error types

pub mod api;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod model;
pub mod picker;
pub mod render;
pub mod settings;
pub mod source;
