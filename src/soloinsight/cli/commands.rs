//! # CLI Layer
//!
//! This module is **one possible UI client** for solo; it is not the application itself.
//!
//! The CLI layer is the **only** place in the codebase that:
//! - Knows about terminal I/O (stdout, stderr, confirmation prompts)
//! - Knows where the data home is on disk
//! - Handles argument parsing
//! - Formats output for human consumption
//!
//! ## Responsibilities
//!
//! 1. **Argument Parsing**: Convert shell arguments into typed commands via clap
//! 2. **Context Setup**: Resolve the home directory, load the config, pick the
//!    store (device-local, or the signed-in user's cloud document)
//! 3. **API Dispatch**: Call the appropriate `InsightApi` method
//! 4. **Output Formatting**: Convert `CmdResult` into terminal output or JSON
//!
//! Errors are returned to `main.rs`, which prints them and exits non-zero.
//!
//! ## Structure
//!
//! - `run()`: Main dispatch logic (called by `main.rs`)
//! - `dispatch()`: Commands that work the same whether signed in or not
//! - `handle_*()`: Per-command handlers that call the API and format output

use super::print::{
    eprint_messages, print_achievements, print_config, print_dashboard, print_entries,
    print_insights, print_json, print_library, print_messages, print_month, print_tags,
};
use super::setup::{
    print_grouped_help, print_help_for_command, AccountCommands, Cli, Commands, DataCommands,
    EntryCommands, LibraryCommands, MiscCommands, ViewCommands,
};
use chrono::{DateTime, Local, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use clap::Parser;
use directories::ProjectDirs;
use serde::Serialize;
use serde_json::json;
use soloinsight::api::{
    preview_backup, CmdResult, ConfigAction, EntryPatch, InsightApi, ItemPatch, ListFilter,
};
use soloinsight::backup;
use soloinsight::commands::helpers::{resolve_id, MIN_ID_PREFIX};
use soloinsight::config::{ActiveSession, InsightConfig, TimeZonePolicy};
use soloinsight::error::{InsightError, Result};
use soloinsight::model::{now_millis, EntryDraft, LinkedContent};
use soloinsight::store::fs::FileBackend;
use soloinsight::store::local::LocalStore;
use soloinsight::store::remote::UserId;
use soloinsight::store::remote_fs::FsDocumentStore;
use soloinsight::store::DataStore;
use soloinsight::sync::MergeReport;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const HOME_ENV: &str = "SOLO_HOME";
const WHEN_FORMAT: &str = "%Y-%m-%d %H:%M";

struct AppContext {
    home: PathBuf,
    config: InsightConfig,
    json: bool,
}

impl AppContext {
    fn local_api(&self) -> Result<InsightApi<LocalStore<FileBackend>>> {
        let dir = self.config.local_dir(&self.home);
        InsightApi::open(LocalStore::new(FileBackend::new(dir)))
    }

    fn cloud(&self) -> FsDocumentStore {
        FsDocumentStore::new(self.config.cloud_dir(&self.home))
    }

    fn tz(&self) -> TimeZonePolicy {
        self.config.time_zone
    }

    /// Print a command's payload: JSON on stdout with messages on stderr, or
    /// the human rendering followed by the messages.
    fn emit<T: Serialize>(&self, result: &CmdResult, payload: &T, human: impl FnOnce()) -> Result<()> {
        if self.json {
            print_json(payload)?;
            eprint_messages(&result.messages);
        } else {
            human();
            print_messages(&result.messages);
        }
        Ok(())
    }

    fn emit_messages(&self, result: &CmdResult) {
        if self.json {
            eprint_messages(&result.messages);
        } else {
            print_messages(&result.messages);
        }
    }
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Top level gets the grouped help, subcommands get clap's own
    if cli.help {
        match &cli.command {
            None => print_grouped_help(),
            Some(cmd) => print_help_for_command(cmd.name()),
        }
        return Ok(());
    }

    init_tracing(cli.verbose);

    let home = resolve_home()?;
    let ctx = AppContext {
        config: InsightConfig::load(&home)?,
        home,
        json: cli.json,
    };
    tracing::debug!("Using home {}", ctx.home.display());

    match cli.command {
        Some(Commands::Misc(MiscCommands::Config { key, value })) => handle_config(&ctx, key, value),
        Some(Commands::Account(cmd)) => match cmd {
            AccountCommands::Login { user } => handle_login(&ctx, user),
            AccountCommands::Logout => handle_logout(&ctx),
            AccountCommands::Whoami => handle_whoami(&ctx),
        },
        Some(Commands::Data(DataCommands::Wipe { yes })) => handle_wipe(&ctx, yes),
        command => {
            let command = command.unwrap_or(Commands::View(ViewCommands::Stats));
            match ActiveSession::load(&ctx.home)? {
                Some(session) => {
                    tracing::debug!("Resuming cloud session for {}", session.user);
                    let api = InsightApi::resume(ctx.cloud(), session.user)?;
                    dispatch(&ctx, api, command)
                }
                None => dispatch(&ctx, ctx.local_api()?, command),
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "soloinsight=debug,solo=debug" } else { "warn" };
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init();
}

fn resolve_home() -> Result<PathBuf> {
    if let Some(home) = std::env::var_os(HOME_ENV).filter(|h| !h.is_empty()) {
        return Ok(PathBuf::from(home));
    }
    ProjectDirs::from("com", "soloinsight", "solo")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            InsightError::Config(format!(
                "Could not determine a data directory; set {}",
                HOME_ENV
            ))
        })
}

fn dispatch<S: DataStore>(ctx: &AppContext, mut api: InsightApi<S>, command: Commands) -> Result<()> {
    match command {
        Commands::Entry(cmd) => match cmd {
            EntryCommands::Log {
                duration,
                intensity,
                outcome,
                at,
                tags,
                note,
                url,
                actor,
                from_library,
            } => {
                let timestamp = match at {
                    Some(when) => parse_when(&when, ctx.tz())?,
                    None => now_millis(),
                };
                let mut draft = EntryDraft::new(timestamp, duration, intensity, outcome)
                    .with_tags(tags)
                    .with_linked_content(LinkedContent { url, actor });
                if let Some(note) = note {
                    draft = draft.with_note(note);
                }
                let result = api.log_entry(draft, from_library.as_deref())?;
                ctx.emit(&result, &result.affected_entries, || {
                    print_entries(&result.affected_entries, ctx.tz())
                })?;
            }
            EntryCommands::List { tag, outcome, limit } => {
                let filter = ListFilter { tag, outcome, limit };
                let result = api.list_entries(&filter)?;
                ctx.emit(&result, &result.listed_entries, || {
                    print_entries(&result.listed_entries, ctx.tz())
                })?;
            }
            EntryCommands::Edit {
                id,
                duration,
                intensity,
                outcome,
                at,
                tags,
                clear_tags,
                note,
            } => {
                let patch = EntryPatch {
                    timestamp: at.map(|when| parse_when(&when, ctx.tz())).transpose()?,
                    duration,
                    intensity,
                    outcome,
                    tags: if clear_tags {
                        Some(Vec::new())
                    } else {
                        (!tags.is_empty()).then_some(tags)
                    },
                    note,
                };
                let id = expand_entry_id(&api, &id)?;
                let result = api.update_entry(&id, patch)?;
                ctx.emit(&result, &result.affected_entries, || {
                    print_entries(&result.affected_entries, ctx.tz())
                })?;
            }
            EntryCommands::Delete { id, yes } => {
                let id = expand_entry_id(&api, &id)?;
                let confirmed = yes || confirm(&format!("Delete entry {}?", id))?;
                let result = api.delete_entry(&id, confirmed)?;
                ctx.emit(&result, &result.affected_entries, || {})?;
            }
        },
        Commands::View(cmd) => handle_view(ctx, &mut api, cmd)?,
        Commands::Data(cmd) => handle_data(ctx, &mut api, cmd)?,
        Commands::Misc(cmd) => match cmd {
            MiscCommands::Lang { language } => {
                let result = api.language(language)?;
                ctx.emit(&result, &json!({ "language": result.language }), || {
                    if let Some(language) = result.language {
                        println!("{}", language);
                    }
                })?;
            }
            MiscCommands::Unlock { key } => {
                let result = api.unlock(&key)?;
                ctx.emit(&result, &result.gate, || {})?;
            }
            // Handled before a store is opened
            MiscCommands::Config { .. } => {}
        },
        Commands::Account(_) => {}
    }

    if api.refresh() {
        tracing::debug!("Applied an update pushed by the store");
    }
    Ok(())
}

fn handle_view<S: DataStore>(ctx: &AppContext, api: &mut InsightApi<S>, cmd: ViewCommands) -> Result<()> {
    match cmd {
        ViewCommands::Stats => {
            let result = match ctx.tz() {
                TimeZonePolicy::Local => api.dashboard(&Local::now())?,
                TimeZonePolicy::Utc => api.dashboard(&Utc::now())?,
            };
            ctx.emit(&result, &result.dashboard, || {
                if let Some(dashboard) = &result.dashboard {
                    print_dashboard(dashboard);
                }
            })
        }
        ViewCommands::Month { month } => {
            let result = match ctx.tz() {
                TimeZonePolicy::Local => api.month(&month_reference(month.as_deref(), &Local)?)?,
                TimeZonePolicy::Utc => api.month(&month_reference(month.as_deref(), &Utc)?)?,
            };
            ctx.emit(&result, &result.month, || {
                if let Some(month) = &result.month {
                    print_month(month, ctx.tz());
                }
            })
        }
        ViewCommands::Insights => {
            let result = match ctx.tz() {
                TimeZonePolicy::Local => api.insights(&Local)?,
                TimeZonePolicy::Utc => api.insights(&Utc)?,
            };
            ctx.emit(&result, &result.insights, || {
                if let Some(insights) = &result.insights {
                    print_insights(insights);
                }
            })
        }
        ViewCommands::Achievements => {
            let result = api.achievements()?;
            ctx.emit(&result, &result.achievements, || {
                print_achievements(&result.achievements)
            })
        }
    }
}

fn handle_data<S: DataStore>(ctx: &AppContext, api: &mut InsightApi<S>, cmd: DataCommands) -> Result<()> {
    match cmd {
        DataCommands::Tags => {
            let result = api.tags()?;
            ctx.emit(&result, &result.tags, || print_tags(&result.tags))
        }
        DataCommands::Tag { name } => {
            let result = api.add_tag(&name)?;
            ctx.emit(&result, &result.tags, || {})
        }
        DataCommands::Library(cmd) => handle_library(ctx, api, cmd),
        DataCommands::Export { output } => {
            let result = api.export_backup()?;
            let Some(json) = &result.backup else {
                ctx.emit_messages(&result);
                return Ok(());
            };
            match output.as_deref() {
                Some("-") => {
                    println!("{}", json);
                    eprint_messages(&result.messages);
                }
                other => {
                    let path = other
                        .map(PathBuf::from)
                        .unwrap_or_else(|| PathBuf::from(backup::file_name(Utc::now())));
                    std::fs::write(&path, json)?;
                    tracing::info!("Wrote backup to {}", path.display());
                    ctx.emit(&result, &json!({ "path": path }), || {
                        println!("{}", path.display())
                    })?;
                }
            }
            Ok(())
        }
        DataCommands::Import { path, yes } => {
            let content = std::fs::read_to_string(&path)?;
            let restore = preview_backup(&content)?;
            let confirmed = yes
                || confirm(&format!(
                    "Replace all current data with {} ({} entries)?",
                    path,
                    restore.entry_count()
                ))?;
            let result = api.import_backup(restore, confirmed)?;
            ctx.emit(&result, &json!({ "entries": result.listed_entries.len() }), || {})
        }
        // Handled before a store is opened
        DataCommands::Wipe { .. } => Ok(()),
    }
}

fn handle_library<S: DataStore>(
    ctx: &AppContext,
    api: &mut InsightApi<S>,
    cmd: LibraryCommands,
) -> Result<()> {
    let result = match cmd {
        LibraryCommands::Add { url, actor, title } => api.add_library_item(url, actor, title)?,
        LibraryCommands::List { term, favorites } => {
            let result = api.search_library(term.as_deref().unwrap_or(""), favorites)?;
            return ctx.emit(&result, &result.library_items, || {
                print_library(&result.library_items)
            });
        }
        LibraryCommands::Edit { id, url, actor, title } => {
            api.update_library_item(&id, ItemPatch { url, actor, title })?
        }
        LibraryCommands::Delete { id, yes } => {
            let confirmed = yes || confirm(&format!("Delete library item {}?", id))?;
            api.delete_library_item(&id, confirmed)?
        }
        LibraryCommands::Star { id } => api.toggle_favorite(&id)?,
        LibraryCommands::Open { id } => api.open_library_item(&id)?,
    };
    ctx.emit(&result, &result.library_items, || print_library(&result.library_items))
}

fn handle_config(ctx: &AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };
    let result = soloinsight::commands::config::run(&ctx.home, action)?;
    ctx.emit(&result, &result.config, || {
        if let Some(config) = &result.config {
            print_config(config);
        }
    })
}

fn handle_login(ctx: &AppContext, user: String) -> Result<()> {
    let user = user.trim();
    if user.is_empty() {
        return Err(InsightError::Validation("User name cannot be empty".to_string()));
    }
    if let Some(active) = ActiveSession::load(&ctx.home)? {
        return Err(InsightError::Validation(format!(
            "Already signed in as {}; run `solo logout` first",
            active.user
        )));
    }

    let user = UserId::new(user);
    let local = ctx.local_api()?;
    let (cloud, report) = local.login(ctx.cloud(), user.clone())?;
    ActiveSession { user: user.clone() }.save(&ctx.home)?;
    tracing::info!("Signed in as {}", user);

    if ctx.json {
        print_json(&json!({
            "user": user,
            "created": report.created,
            "updated": report.updated,
            "entriesAdded": report.entries_added,
            "libraryAdded": report.library_added,
            "tagsAdded": report.tags_added,
        }))?;
    } else {
        println!("{}", describe_merge(&user, &report));
    }
    drop(cloud.logout());
    Ok(())
}

fn describe_merge(user: &UserId, report: &MergeReport) -> String {
    if report.created {
        format!("Signed in as {}. Cloud data created from this device.", user)
    } else if report.updated {
        format!(
            "Signed in as {}. Merged {} entries, {} library items and {} tags from this device.",
            user, report.entries_added, report.library_added, report.tags_added
        )
    } else {
        format!("Signed in as {}. Cloud data already up to date.", user)
    }
}

fn handle_logout(ctx: &AppContext) -> Result<()> {
    let active = ActiveSession::load(&ctx.home)?;
    ActiveSession::clear(&ctx.home)?;
    match active {
        Some(session) => {
            tracing::info!("Signed out {}", session.user);
            println!("Signed out {}. Data now stays on this device.", session.user);
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

fn handle_whoami(ctx: &AppContext) -> Result<()> {
    let active = ActiveSession::load(&ctx.home)?;
    if ctx.json {
        return print_json(&json!({ "user": active.map(|s| s.user) }));
    }
    match active {
        Some(session) => println!("{}", session.user),
        None => println!("Not signed in (data stays on this device)."),
    }
    Ok(())
}

fn handle_wipe(ctx: &AppContext, yes: bool) -> Result<()> {
    let mut api = ctx.local_api()?;
    let confirmed = yes || confirm("Delete ALL data stored on this device? This cannot be undone.")?;
    let result = api.wipe(confirmed)?;
    ctx.emit_messages(&result);
    Ok(())
}

/// Expand a unique id prefix typed on the command line to the full entry id.
/// Anything that is not a usable prefix is passed through unchanged, and the
/// API treats an id it does not know as a no-op.
fn expand_entry_id<S: DataStore>(api: &InsightApi<S>, selector: &str) -> Result<String> {
    let selector = selector.trim();
    if selector.chars().count() < MIN_ID_PREFIX {
        return Ok(selector.to_string());
    }
    let entries = &api.data().entries;
    Ok(match resolve_id(entries, selector)? {
        Some(pos) => entries[pos].id.clone(),
        None => selector.to_string(),
    })
}

/// Ask a yes/no question on stdin. Anything but "y"/"yes" (including EOF)
/// is a no.
fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{} [y/N] ", prompt);
    std::io::stderr().flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Parse "YYYY-MM-DD HH:MM" (or just "YYYY-MM-DD") as a wall-clock time in
/// the configured zone.
fn parse_when(input: &str, tz: TimeZonePolicy) -> Result<i64> {
    let input = input.trim();
    let naive = NaiveDateTime::parse_from_str(input, WHEN_FORMAT)
        .or_else(|_| {
            NaiveDate::parse_from_str(input, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::default()))
        })
        .map_err(|_| {
            InsightError::Validation(format!(
                "Invalid time '{}' (expected YYYY-MM-DD HH:MM)",
                input
            ))
        })?;
    let resolved = match tz {
        TimeZonePolicy::Local => first_valid(Local.from_local_datetime(&naive)),
        TimeZonePolicy::Utc => first_valid(Utc.from_local_datetime(&naive)),
    };
    resolved.ok_or_else(|| {
        InsightError::Validation(format!("{} does not exist in the local time zone", input))
    })
}

fn first_valid<Tz: TimeZone>(result: LocalResult<DateTime<Tz>>) -> Option<i64> {
    result.earliest().map(|dt| dt.timestamp_millis())
}

/// A moment inside the requested "YYYY-MM" month, or now.
fn month_reference<Tz: TimeZone>(month: Option<&str>, tz: &Tz) -> Result<DateTime<Tz>> {
    let Some(month) = month else {
        return Ok(Utc::now().with_timezone(tz));
    };
    let invalid = || InsightError::Validation(format!("Invalid month '{}' (expected YYYY-MM)", month));
    let first = NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
        .map_err(|_| invalid())?;
    let noon = first.and_hms_opt(12, 0, 0).ok_or_else(invalid)?;
    tz.from_local_datetime(&noon).earliest().ok_or_else(invalid)
}
