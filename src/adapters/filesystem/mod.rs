//! Filesystem-backed collaborators
//!
//! Records are read from JSON files laid out per school:
//!
//! ```text
//! <data_dir>/<school_id>/profile.json
//! <data_dir>/<school_id>/students.json
//! <data_dir>/<school_id>/staff.json
//! <data_dir>/<school_id>/classes.json
//! <data_dir>/<school_id>/subjects.json
//! <data_dir>/<school_id>/attendance/<academic_year>_<term>.json
//! <data_dir>/<school_id>/assessments/<academic_year>_<term>.json
//! ```
//!
//! History is appended to a JSON-lines file.

pub mod history;
pub mod source;

pub use history::JsonLinesHistoryStore;
pub use source::FileRecordSource;
