//! Converts a Mercurial repository history into an equivalent Git history.
//!
//! The core of this crate is the conversion engine: a configuration model
//! that maps HG branches and tags into Git refnames via pattern-driven
//! rules with variable substitution and wildcard capture, a per-revision
//! pipeline that turns HG changesets into Git commits while tracking branch
//! head identity and ref collisions, and the username/commit-message
//! normalization needed to produce well-formed Git objects.
//!
//! The actual Mercurial reader and Git object writer are external
//! collaborators ([`source::HgSource`], [`target::GitWriter`]) — this crate
//! only defines the traits plus an in-memory pair of test doubles; wiring a
//! real backend for either is left to the embedding application.
//!
//! ## Quick start
//!
//! ```
//! # fn main() -> hg2git::Result<()> {
//! use hg2git::config;
//! use hg2git::selector;
//!
//! let doc = config::parse_document(
//!     r#"<Projects><Project Name="main"/></Projects>"#,
//! )?;
//! let cfg = config::Config::resolve(&doc, &config::Overrides::default())?;
//! let filters = selector::ProjectFilters::parse(&[])?;
//! let enabled = selector::enabled_projects(&cfg, &filters);
//! assert_eq!(enabled, vec!["main".to_string()]);
//! # Ok(())
//! # }
//! ```

#![allow(dead_code)]
#![deny(missing_docs)]

pub mod cli;
pub mod commit;
pub mod config;
mod error;
pub mod glob;
pub mod logging;
pub mod pipeline;
pub mod refalloc;
pub mod sanitize;
pub mod selector;
pub mod source;
pub mod target;
pub mod vars;

pub use config::Config;
pub use error::Error;
pub use pipeline::Pipeline;

/// `Result` type used throughout `hg2git`.
pub type Result<T> = std::result::Result<T, Error>;
