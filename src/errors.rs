//! Error types for the handler analysis lifecycle and the persisted section
//! format.
//!
//! None of the classification *categories* are errors: `NotApplicable` is
//! the designed outcome for an unusable handler and carries no diagnostic.
//! The errors here are ordering contract violations (closing an unfinished
//! registry, refining twice, emitting before refinement) and section
//! decoding failures. Both fail fast rather than producing a partial or
//! inconsistent report.

use thiserror::Error;

use crate::section::SECTION_VERSION;

/// Lifecycle contract violations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AnalysisError {
    /// `close` was called while the registry still had pending candidates.
    #[error("registry has {pending} unclassified handler(s); run classify_all before closing")]
    UnclassifiedHandlers { pending: usize },

    /// `refine_complex` was invoked a second time.
    #[error("complex handlers were already refined; refinement runs exactly once")]
    AlreadyRefined,

    /// A refined-only operation ran before `refine_complex`.
    #[error("complex handlers have not been refined; run refine_complex first")]
    NotRefined,
}

/// Failures decoding a persisted analysis section.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SectionError {
    /// The stream ended before the expected payload.
    #[error("section truncated: needed {needed} more byte(s)")]
    Truncated { needed: usize },

    /// A begin or end marker did not carry the expected tag.
    #[error("bad section tag: expected {expected:?}")]
    BadTag { expected: &'static str },

    /// The section was written by an incompatible layout revision.
    #[error("unsupported section version {found} (supported: {SECTION_VERSION})")]
    UnsupportedVersion { found: u16 },

    /// The symbol codec could not resolve a persisted handler reference.
    #[error("unknown handler reference {raw:#x}")]
    UnknownHandler { raw: u64 },

    /// The complex subdivision lists do not disjointly partition the complex
    /// list.
    #[error("complex subdivision lists do not partition the complex set")]
    InconsistentPartition,
}
