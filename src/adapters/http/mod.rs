//! REST record-store client
//!
//! Live implementation of the profile store and record source against the
//! school administration API. Each `list_*` call is a single GET; timeouts
//! and retries are applied by the fetcher, not here.

pub mod client;

pub use client::HttpRecordSource;
