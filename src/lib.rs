//! # Sprints - sprint lifecycle and task migration
//!
//! Sprints moves a sprint from planning through active to completed (or
//! cancelled), and when a sprint closes, decides where its unfinished tasks go:
//! back to the backlog, into an existing sprint, or into a sprint created on the
//! spot. Sprints and tasks are stored as markdown files with TOML or YAML
//! frontmatter.
//!
//! ## Quick Start
//!
//! ```bash
//! sprints init
//! sprints sprint create --start 2026-03-02 --end 2026-03-13
//! sprints task create "Checkout flow" --sprint sp-ab12c
//! sprints sprint start sp-ab12c
//! sprints sprint complete sp-ab12c --select tk-9fz01 --new-auto-name
//! ```
//!
//! ## Library use
//!
//! ```no_run
//! use std::sync::Arc;
//! use sprints::lifecycle::{SprintService, SprintSpec};
//! use sprints::storage::MemoryStore;
//!
//! let service = SprintService::with_store(Arc::new(MemoryStore::new()));
//! let spec = SprintSpec::new(
//!     "web",
//!     chrono::NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
//!     chrono::NaiveDate::from_ymd_opt(2026, 3, 13).unwrap(),
//! );
//! let sprint = service.create_sprint(&spec)?;
//! # Ok::<(), sprints::error::SprintError>(())
//! ```
//!
//! ## Modules
//!
//! - [`cli`]: Command-line interface definitions and handlers
//! - [`config`]: `.sprints.toml` loading and discovery
//! - [`error`]: Error taxonomy and result alias
//! - [`graphql`]: GraphQL schema and HTTP server
//! - [`lifecycle`]: State machine, completion, migration and events
//! - [`logging`]: Tracing subscriber setup
//! - [`model`]: Sprint, Task and status types
//! - [`storage`]: Store traits, in-memory and flat-file stores
//! - [`validation`]: Input validation

/// Command-line interface definitions using clap.
pub mod cli;

/// Configuration loading and management.
///
/// Handles `.sprints.toml` configuration files and project discovery.
pub mod config;

/// Error types and result aliases.
pub mod error;

/// GraphQL schema, resolvers and the axum server.
pub mod graphql;

/// Sprint state machine, completion and task migration.
pub mod lifecycle;

/// Data models for sprints and tasks.
pub mod model;

/// Store traits and their implementations.
pub mod storage;

/// Input validation utilities.
pub mod validation;

/// Tracing subscriber setup for the binary.
pub mod logging;
