use thiserror::Error;

/// Error type used throughout `hg2git`.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid configuration: bad XML shape, unknown attribute value,
    /// duplicate project name, unresolved `NeedsProjects`, unsupported
    /// pattern syntax, or a variable reference cycle.
    #[error("configuration error: {0}")]
    Config(String),

    /// A `Refname`/`RevisionRef` template references an undefined variable
    /// or an out-of-range capture.
    #[error("pattern error: {0}")]
    Pattern(String),

    /// The HG reader yielded a malformed changeset, a missing parent, or
    /// corrupt `.hgtags` contents.
    #[error("source error: {0}")]
    Source(String),

    /// The Git writer refused a write: an invalid refname after
    /// sanitization, or an object store failure.
    #[error("target error: {0}")]
    Target(String),

    /// Failure reading the configuration file itself.
    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed configuration XML.
    #[error("malformed configuration XML: {0}")]
    Xml(#[from] roxmltree::Error),
}

/// `Result` type used by `hg2git`.
pub type Result<T> = std::result::Result<T, Error>;
