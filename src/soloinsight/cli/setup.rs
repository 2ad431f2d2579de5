use clap::{CommandFactory, Parser, Subcommand};
use soloinsight::model::{Language, Outcome};

/// Returns the version string, including git hash and commit date for non-release builds.
/// Format: "0.3.0" for releases, "0.3.0@abc1234 2024-01-15 14:30" for dev builds
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            VERSION.to_string()
        } else {
            format!("{}@{} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "solo",
    bin_name = "solo",
    version = get_version(),
    disable_help_flag = true,
    disable_help_subcommand = true
)]
#[command(about = "Private habit log with statistics, achievements and sync", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Print machine-readable JSON instead of formatted output
    #[arg(long, global = true, help_heading = "Options")]
    pub json: bool,

    /// Verbose output
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Print help
    #[arg(short, long, global = true)]
    pub help: bool,
}

/// Command group definitions for help output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Entry,
    View,
    Data,
    Account,
    Misc,
}

impl CommandGroup {
    pub fn heading(&self) -> &'static str {
        match self {
            CommandGroup::Entry => "Entry Commands:",
            CommandGroup::View => "Statistics:",
            CommandGroup::Data => "Data Commands:",
            CommandGroup::Account => "Account:",
            CommandGroup::Misc => "Miscellaneous:",
        }
    }

    /// Returns the group for a given command name
    pub fn for_command(name: &str) -> Option<Self> {
        match name {
            "log" | "list" | "edit" | "delete" => Some(CommandGroup::Entry),
            "stats" | "month" | "insights" | "achievements" => Some(CommandGroup::View),
            "tags" | "tag" | "library" | "export" | "import" | "wipe" => Some(CommandGroup::Data),
            "login" | "logout" | "whoami" => Some(CommandGroup::Account),
            "lang" | "unlock" | "config" => Some(CommandGroup::Misc),
            _ => None,
        }
    }

    /// Returns all groups in display order
    pub fn all() -> &'static [CommandGroup] {
        &[
            CommandGroup::Entry,
            CommandGroup::View,
            CommandGroup::Data,
            CommandGroup::Account,
            CommandGroup::Misc,
        ]
    }
}

/// Returns the custom grouped help output as a string
pub fn get_grouped_help() -> String {
    let cmd = Cli::command();
    let version = cmd.get_version().unwrap_or("unknown");

    let mut output = String::new();
    output.push_str(&format!("solo {version}\n"));
    output.push_str("Private habit log with statistics, achievements and sync\n");
    output.push('\n');
    output.push_str("Usage: solo [OPTIONS] [COMMAND]\n");

    let subcommands: Vec<_> = cmd.get_subcommands().collect();
    for group in CommandGroup::all() {
        let group_cmds: Vec<_> = subcommands
            .iter()
            .filter(|sc| {
                !sc.is_hide_set() && CommandGroup::for_command(sc.get_name()) == Some(*group)
            })
            .collect();

        if !group_cmds.is_empty() {
            output.push('\n');
            output.push_str(&format!("{}\n", group.heading()));
            for sc in group_cmds {
                let name = sc.get_name();
                let about = sc.get_about().map(|s| s.to_string()).unwrap_or_default();
                output.push_str(&format!("  {:<14} {}\n", name, about));
            }
        }
    }

    output.push('\n');
    output.push_str("Options:\n");
    output.push_str("      --json       Print machine-readable JSON\n");
    output.push_str("  -v, --verbose    Verbose output\n");
    output.push_str("  -h, --help       Print help\n");
    output.push_str("  -V, --version    Print version\n");

    output
}

pub fn print_grouped_help() {
    print!("{}", get_grouped_help());
}

/// Prints help for a command by name, falling back to the grouped help
pub fn print_help_for_command(name: &str) {
    let mut cmd = Cli::command();
    for subcmd in cmd.get_subcommands_mut() {
        if subcmd.get_name() == name {
            print!("{}", subcmd.render_help());
            return;
        }
    }
    eprintln!("Unknown command: {}", name);
    eprintln!();
    print_grouped_help();
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Entry(EntryCommands),

    #[command(flatten)]
    View(ViewCommands),

    #[command(flatten)]
    Data(DataCommands),

    #[command(flatten)]
    Account(AccountCommands),

    #[command(flatten)]
    Misc(MiscCommands),
}

impl Commands {
    pub fn name(&self) -> &'static str {
        match self {
            Commands::Entry(c) => match c {
                EntryCommands::Log { .. } => "log",
                EntryCommands::List { .. } => "list",
                EntryCommands::Edit { .. } => "edit",
                EntryCommands::Delete { .. } => "delete",
            },
            Commands::View(c) => match c {
                ViewCommands::Stats => "stats",
                ViewCommands::Month { .. } => "month",
                ViewCommands::Insights => "insights",
                ViewCommands::Achievements => "achievements",
            },
            Commands::Data(c) => match c {
                DataCommands::Tags => "tags",
                DataCommands::Tag { .. } => "tag",
                DataCommands::Library(_) => "library",
                DataCommands::Export { .. } => "export",
                DataCommands::Import { .. } => "import",
                DataCommands::Wipe { .. } => "wipe",
            },
            Commands::Account(c) => match c {
                AccountCommands::Login { .. } => "login",
                AccountCommands::Logout => "logout",
                AccountCommands::Whoami => "whoami",
            },
            Commands::Misc(c) => match c {
                MiscCommands::Lang { .. } => "lang",
                MiscCommands::Unlock { .. } => "unlock",
                MiscCommands::Config { .. } => "config",
            },
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum EntryCommands {
    /// Log a session
    #[command(alias = "l", display_order = 1)]
    Log {
        /// Duration in minutes
        #[arg(short, long)]
        duration: u32,

        /// Intensity from 1 to 5
        #[arg(short, long)]
        intensity: u8,

        /// Outcome: yes, no or edging
        #[arg(short, long, default_value = "no")]
        outcome: Outcome,

        /// When it happened ("YYYY-MM-DD HH:MM"), defaults to now
        #[arg(long, value_name = "WHEN")]
        at: Option<String>,

        /// Tag (repeatable)
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Free-text note (capped at 500 characters)
        #[arg(short, long)]
        note: Option<String>,

        /// Link of the content used
        #[arg(long)]
        url: Option<String>,

        /// Performer of the content used
        #[arg(long)]
        actor: Option<String>,

        /// Copy url and actor from a library item (id or prefix)
        #[arg(long, value_name = "ID", conflicts_with_all = ["url", "actor"])]
        from_library: Option<String>,
    },

    /// List logged sessions
    #[command(alias = "ls", display_order = 2)]
    List {
        /// Only sessions with this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Only sessions with this outcome
        #[arg(short, long)]
        outcome: Option<Outcome>,

        /// Only the most recent N sessions
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },

    /// Change fields of a logged session
    #[command(alias = "e", display_order = 3)]
    Edit {
        /// Entry id or prefix
        id: String,

        #[arg(short, long)]
        duration: Option<u32>,

        #[arg(short, long)]
        intensity: Option<u8>,

        #[arg(short, long)]
        outcome: Option<Outcome>,

        /// New time ("YYYY-MM-DD HH:MM")
        #[arg(long, value_name = "WHEN")]
        at: Option<String>,

        /// Replace all tags (repeatable)
        #[arg(short, long = "tag", value_name = "TAG")]
        tags: Vec<String>,

        /// Remove all tags
        #[arg(long, conflicts_with = "tags")]
        clear_tags: bool,

        #[arg(short, long)]
        note: Option<String>,
    },

    /// Delete a logged session
    #[command(alias = "rm", display_order = 4)]
    Delete {
        /// Entry id or prefix
        id: String,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum ViewCommands {
    /// Dashboard: 30/90-day counts, averages, outcome rate, last 7 days
    #[command(alias = "s", display_order = 10)]
    Stats,

    /// Calendar month summary
    #[command(display_order = 11)]
    Month {
        /// Month to show ("YYYY-MM"), defaults to the current one
        month: Option<String>,
    },

    /// Long-view analytics: time of day, tags, streaks, trend
    #[command(display_order = 12)]
    Insights,

    /// Achievement progress
    #[command(display_order = 13)]
    Achievements,
}

#[derive(Subcommand, Debug)]
pub enum DataCommands {
    /// List tags
    #[command(display_order = 20)]
    Tags,

    /// Add a tag
    #[command(display_order = 21)]
    Tag { name: String },

    /// Manage the content library
    #[command(subcommand, display_order = 22)]
    Library(LibraryCommands),

    /// Write a backup file
    #[command(display_order = 23)]
    Export {
        /// Output path ("-" for stdout), defaults to a dated file in the current directory
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Restore a backup file, overwriting current data
    #[command(display_order = 24)]
    Import {
        path: String,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Delete all data stored on this device
    #[command(display_order = 25)]
    Wipe {
        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum LibraryCommands {
    /// Add an item
    Add {
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        actor: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },

    /// List or search items
    #[command(alias = "ls")]
    List {
        /// Case-insensitive search over title, actor and url
        term: Option<String>,

        /// Only starred items
        #[arg(short, long)]
        favorites: bool,
    },

    /// Change an item ("" clears a field)
    Edit {
        id: String,
        #[arg(long)]
        url: Option<String>,
        #[arg(long)]
        actor: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },

    /// Remove an item
    #[command(alias = "rm")]
    Delete {
        id: String,
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Toggle the favorite star
    Star { id: String },

    /// Print the item's url, ready for a browser
    Open { id: String },
}

#[derive(Subcommand, Debug)]
pub enum AccountCommands {
    /// Sign in and merge this device's data into your cloud document
    #[command(display_order = 30)]
    Login { user: String },

    /// Sign out; data goes back to this device's storage
    #[command(display_order = 31)]
    Logout,

    /// Show who is signed in
    #[command(display_order = 32)]
    Whoami,
}

#[derive(Subcommand, Debug)]
pub enum MiscCommands {
    /// Show or set the language (en, zh)
    #[command(display_order = 40)]
    Lang { language: Option<Language> },

    /// Unlock the insights assistant
    #[command(display_order = 41)]
    Unlock { key: String },

    /// Get or set configuration
    #[command(display_order = 42)]
    Config {
        /// Configuration key (data_dir, cloud_dir, time_zone)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}
