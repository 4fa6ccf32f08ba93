//! # Leetdoc Architecture
//!
//! Leetdoc is a library for **sectioned design documents**: a document is an
//! ordered list of typed sections (rich text, drawings, plots, system
//! descriptions), each shown by exactly one view or edit component at a time.
//! The CLI is one client of the library.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI (main.rs + args.rs)                                    │
//! │  - Parses arguments, prints results, owns stdout and exit   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API (api.rs)                                               │
//! │  - Parses selectors, loads scope config, dispatches         │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Commands (commands/*.rs)                                   │
//! │  - Authoring, import/export, interactive edit               │
//! └─────────────────────────────────────────────────────────────┘
//!              │                               │
//!              ▼                               ▼
//! ┌───────────────────────────┐   ┌─────────────────────────────┐
//! │  Session (session.rs)     │   │  Storage (store/)           │
//! │  - One SectionContainer   │──▶│  - DataStore trait          │
//! │    per section            │   │  - FileStore, InMemoryStore │
//! │  - ComponentHost builds   │   │  - StorePersister fulfils   │
//! │    view/edit components   │   │    save requests            │
//! └───────────────────────────┘   └─────────────────────────────┘
//! ```
//!
//! ## Sections and their containers
//!
//! A [`container::SectionContainer`] is a small state machine
//! (viewing, editing, transitioning) that swaps mode components in and out
//! of a [`mode::ComponentHost`]. Saving is asynchronous in shape: the
//! container issues a [`container::SaveRequest`], and the document only
//! changes once the matching outcome comes back as committed. A rejected or
//! cancelled edit never touches the document.
//!
//! ## No I/O in the core
//!
//! From `api.rs` inward nothing writes to stdout or exits the process. The
//! only terminal-aware pieces are [`terminal`] and [`editor`], and both are
//! reached through the `ComponentHost` seam, so tests swap in a recording
//! host.
//!
//! ## Module Overview
//!
//! - [`api`]: Facade, entry point for all operations
//! - [`commands`]: Logic for each command
//! - [`session`]: Single writer for an open document
//! - [`container`]: Per-section mode state machine and save protocol
//! - [`mode`]: Mode component traits and the host seam
//! - [`model`]: Content, sections, documents and their JSON shape
//! - [`store`]: Storage abstraction and implementations
//! - [`index`]: Document and section selectors
//! - [`config`]: Configuration management
//! - [`editor`]: External editor integration
//! - [`terminal`]: Terminal host and text views
//! - [`error`]: Error types

pub mod api;
pub mod commands;
pub mod config;
pub mod container;
pub mod editor;
pub mod error;
pub mod index;
pub mod mode;
pub mod model;
pub mod session;
pub mod store;
pub mod terminal;
