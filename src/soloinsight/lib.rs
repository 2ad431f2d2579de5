//! # Solo Insight Architecture
//!
//! Solo Insight is a **private habit-tracking library**: an entry log, the
//! statistics derived from it, achievements, and optional cloud sync. The `solo`
//! binary is one client of it.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (cli/, wired by main.rs)                         │
//! │  - Parses arguments, formats output, prompts for confirm    │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade over commands, supplies the clock            │
//! │  - Login turns a local API into a cloud API                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Command Layer (commands/*.rs)                              │
//! │  - Mutates the Workspace, persists slots, re-checks         │
//! │    achievements, reports through CmdResult                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Storage Layer (store/)                                     │
//! │  - DataStore trait over named slots                         │
//! │  - LocalStore (device) and CloudStore (per-user document)   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The [`stats`] and [`achievements`] modules sit beside the commands as pure
//! functions over an entry slice; they never touch storage.
//!
//! ## Local and Cloud
//!
//! Signed out, every mutation is written to device-local slots. Signing in
//! runs a one-time merge ([`sync`]) of the device's data into the user's cloud
//! document, after which the cloud document is the only source of truth. A
//! [`session::Session`] owns the subscription to that document; mutations are
//! applied in memory first, written to the cloud, and whatever the
//! subscription pushes back replaces the in-memory state.
//!
//! ## Failure Model
//!
//! Local storage never fails observably (corrupt or missing slots read as
//! defaults). Cloud write failures become warnings on the command's result
//! while the in-memory change stands. Nothing here is fatal.
//!
//! ## Module Overview
//!
//! - [`api`]: The API facade
//! - [`commands`]: One module per operation
//! - [`workspace`]: In-memory session state over a `DataStore`
//! - [`store`]: Storage abstraction and implementations
//! - [`sync`]: Local to cloud merge
//! - [`session`]: Signed-in session context
//! - [`stats`]: Derived statistics
//! - [`achievements`]: Milestone definitions and evaluation
//! - [`gate`]: Passphrase gate for the insights assistant
//! - [`backup`]: Backup file export and import
//! - [`model`]: Core data types (`Entry`, `ContentItem`, `AppData`)
//! - [`config`]: Configuration and the persisted session file
//! - [`error`]: Error types
//! - `cli`: Argument parsing and printing for the binary (not part of the lib API)

pub mod achievements;
pub mod api;
pub mod backup;
pub mod commands;
pub mod config;
pub mod error;
pub mod gate;
pub mod model;
pub mod session;
pub mod stats;
pub mod store;
pub mod sync;
pub mod workspace;
