//! External system integrations for Census.
//!
//! This module provides the collaborator interfaces the export pipeline
//! consumes and their implementations:
//!
//! - [`traits`] - `ProfileStore`, `RecordSource`, `ExportHistoryStore`
//! - [`memory`] - In-memory implementations (tests, embedding)
//! - [`filesystem`] - JSON data directory and JSON-lines history file
//! - [`http`] - REST client for the school administration API
//! - [`factory`] - Builds the configured set of collaborators
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with in-memory implementations. There is no global client:
//! every collaborator is injected into the export manager at construction.
//!
//! ```rust
//! use census::adapters::memory::{InMemoryHistoryStore, InMemoryProfileStore, InMemoryRecordSource};
//! use census::adapters::factory::Collaborators;
//! use std::sync::Arc;
//!
//! let collaborators = Collaborators {
//!     profiles: Arc::new(InMemoryProfileStore::new()),
//!     records: Arc::new(InMemoryRecordSource::new()),
//!     history: Arc::new(InMemoryHistoryStore::new()),
//! };
//! # let _ = collaborators;
//! ```

pub mod factory;
pub mod filesystem;
pub mod http;
pub mod memory;
pub mod traits;

pub use factory::{create_collaborators, Collaborators};
pub use traits::{ExportHistoryStore, ProfileStore, RecordSource, SourceResult};
