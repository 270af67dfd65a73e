use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use wf_core::models::{PostFont, PostStatus};

#[derive(Parser)]
#[command(name = "wf")]
#[command(about = "Write drafts locally and publish them to a WriteFreely server")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Treat the network as unavailable
    #[arg(long, global = true)]
    pub offline: bool,

    /// Quick draft: wf "my post text"
    #[arg(trailing_var_arg = true)]
    pub text: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in to a WriteFreely server
    Login {
        /// Username on the server
        username: String,
        /// Server address (defaults to the configured server)
        #[arg(long, value_name = "URL")]
        server: Option<String>,
        /// Password (read from WF_PASSWORD or stdin when omitted)
        #[arg(long, value_name = "PASSWORD")]
        password: Option<String>,
    },
    /// Log out and forget the stored access token
    Logout,
    /// Show the current account and draft state
    Status,
    /// Create a new post
    #[command(alias = "add")]
    New {
        /// Collection alias to publish into
        #[arg(short, long, value_name = "ALIAS")]
        collection: Option<String>,
        /// Post text; a first line starting with "# " is the title
        text: Vec<String>,
    },
    /// Edit a post in $EDITOR
    Edit {
        /// Post ID or unique ID prefix
        id: String,
    },
    /// Print a post
    Show {
        /// Post ID or unique ID prefix
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// List local posts
    List {
        /// Number of posts to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Only posts in this collection
        #[arg(short, long, value_name = "ALIAS")]
        collection: Option<String>,
        /// Only posts with this status
        #[arg(long, value_enum)]
        status: Option<StatusFilter>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Publish a post (create or update it on the server)
    Publish {
        /// Post ID or unique ID prefix
        id: String,
    },
    /// Fetch collections and posts from the server
    Sync,
    /// List cached collections
    Collections {
        /// Fetch the list from the server first
        #[arg(long)]
        refresh: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a local post
    Delete {
        /// Post ID or unique ID prefix
        id: String,
    },
    /// Continue editing the last draft
    Resume,
    /// Configure the CLI
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Font used for new posts
    SetFont {
        #[arg(value_enum)]
        font: FontArg,
    },
    /// Default server for `wf login`
    SetServer {
        /// Server address, e.g. write.as
        url: String,
    },
    /// Print the current configuration
    Show,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatusFilter {
    Local,
    Edited,
    Published,
}

impl From<StatusFilter> for PostStatus {
    fn from(filter: StatusFilter) -> Self {
        match filter {
            StatusFilter::Local => Self::Local,
            StatusFilter::Edited => Self::Edited,
            StatusFilter::Published => Self::Published,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum FontArg {
    Serif,
    Sans,
    Wrap,
}

impl From<FontArg> for PostFont {
    fn from(font: FontArg) -> Self {
        match font {
            FontArg::Serif => Self::Serif,
            FontArg::Sans => Self::Sans,
            FontArg::Wrap => Self::Wrap,
        }
    }
}
