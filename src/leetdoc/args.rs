use clap::{Parser, Subcommand};
use leetdoc::model::SectionType;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "leetdoc")]
#[command(about = "Sectioned system-design documents from the command line", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Operate on global documents
    #[arg(short, long, global = true)]
    pub global: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize the store
    Init,

    /// Create a new, empty document
    #[command(alias = "n")]
    New {
        /// Title of the document
        title: String,
    },

    /// List documents, most recently saved first
    #[command(alias = "ls")]
    List,

    /// Show one or more documents
    #[command(alias = "v")]
    Show {
        /// Documents, by list index or id prefix
        #[arg(required = true, num_args = 1..)]
        docs: Vec<String>,
    },

    /// Add a section to a document
    Add {
        /// Document, by list index or id prefix
        doc: String,

        /// Section type: text, drawing, plot, system-description (or dsl)
        section_type: SectionType,

        /// Section title
        #[arg(short, long)]
        title: Option<String>,

        /// Insert before this section (position or id)
        #[arg(long, conflicts_with = "after")]
        before: Option<String>,

        /// Insert after this section (position or id)
        #[arg(long)]
        after: Option<String>,
    },

    /// Edit a section in $EDITOR
    #[command(alias = "e")]
    Edit {
        /// Document, by list index or id prefix
        doc: String,
        /// Section, by position or id
        section: String,
    },

    /// Delete a section
    Rm {
        /// Document, by list index or id prefix
        doc: String,
        /// Section, by position or id
        section: String,
    },

    /// Move a section up
    Up {
        /// Document, by list index or id prefix
        doc: String,
        /// Section, by position or id
        section: String,
    },

    /// Move a section down
    Down {
        /// Document, by list index or id prefix
        doc: String,
        /// Section, by position or id
        section: String,
    },

    /// Rename a section
    Rename {
        /// Document, by list index or id prefix
        doc: String,
        /// Section, by position or id
        section: String,
        /// New title
        title: String,
    },

    /// Change a document's title
    Retitle {
        /// Document, by list index or id prefix
        doc: String,
        /// New title
        title: String,
    },

    /// Delete one or more documents
    Drop {
        /// Documents, by list index or id prefix
        #[arg(required = true, num_args = 1..)]
        docs: Vec<String>,
    },

    /// Print the file path of a document
    Path {
        /// Document, by list index or id prefix
        doc: String,
    },

    /// Export documents to a .tar.gz archive (all when none given)
    Export {
        /// Documents, by list index or id prefix
        docs: Vec<String>,

        /// Directory to write the archive to
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
    },

    /// Import document JSON files or directories of them
    Import {
        #[arg(required = true, num_args = 1..)]
        paths: Vec<PathBuf>,
    },

    /// Get or set configuration
    Config {
        /// Configuration key (e.g. export-markdown, prompt.text.get)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}
