use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "sticky")]
#[command(about = "Pin Joplin notes as sticky windows", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Show debug diagnostics on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Connect to Joplin (accept the request in the Joplin app)
    Auth {
        /// Store a token copied from Joplin's web clipper settings instead
        #[arg(long)]
        token: Option<String>,
    },

    /// Check that the Joplin web clipper service is running
    Ping,

    /// Show the notebook tree with numbered notes
    #[command(alias = "ls")]
    Tree,

    /// Show a note in a sticky window
    #[command(alias = "p")]
    Pick {
        /// Note number from `tree`, note id, or part of a title
        selector: String,

        /// Window to reuse (opens a new one if omitted)
        #[arg(short, long)]
        window: Option<usize>,
    },

    /// Show a note's notebook and dates
    Info {
        /// Note id
        note_id: String,
    },

    /// Print the link that opens a window's note in Joplin
    Link {
        /// Window index
        window: usize,
    },

    /// Fetch the current content of every pinned note
    Reload,

    /// Manage sticky windows
    #[command(alias = "w")]
    Windows {
        #[command(subcommand)]
        action: Option<WindowCommands>,
    },

    /// Get or set configuration
    Config {
        /// Configuration key (e.g., api-url)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum WindowCommands {
    /// List windows
    List,
    /// Open a blank window
    New,
    /// Duplicate a window
    Clone { index: usize },
    /// Close a window
    Close { index: usize },
    /// Close every window
    CloseAll,
    /// Collapse or expand a window's body
    Toggle { index: usize },
    /// Hide one window, or all of them
    Hide { index: Option<usize> },
    /// Show one window, or all of them
    Show { index: Option<usize> },
}
