#![forbid(unsafe_code)]
//! Fallback dispatch handler analysis
//!
//! When a call cannot be resolved to any concrete member, the runtime invokes
//! the receiver's *fallback dispatch handler* (a catch-all hook in the vein
//! of `method_missing` / `__getattr__`). An unconstrained handler forces a
//! whole-program type inferencer to assume any unresolved call site could
//! have been answered by any handler. Most handlers are harmless (baseline
//! defaults, pure super-forwards, trivial throws) and this crate classifies
//! them so the inferencer can exclude them from that conservative treatment.
//!
//! Two components, used in strict sequence:
//!
//! - [`HandlerRegistry`]: accumulates candidates while the host compiler
//!   traverses the program, then classifies every one via a recursive
//!   decision procedure with memoization and a forwarding-cycle guard.
//! - [`HandlerAnalysisReport`]: the immutable snapshot produced by closing a
//!   classified registry; refined once with whole-program inference results,
//!   then used for diagnostics and binary persistence across sessions.
//!
//! The crate never inspects program IR directly: everything it needs arrives
//! through the capability traits in [`capabilities`], so the algorithm is
//! testable with stub collaborators. Classification does not judge handler
//! correctness, does not modify program behavior, and does not run inference.
//!
//! ## Panic Policy
//!
//! Explicit error handling throughout: lifecycle contract violations surface
//! as [`AnalysisError`], persistence failures as [`SectionError`]. No
//! `unwrap`/`expect` outside tests.

pub mod capabilities;
pub mod errors;
pub mod handler;
pub mod registry;
pub mod report;
pub mod section;

pub use capabilities::{
    BaselineOracle, BodyShape, BodySyntax, DivergenceFacts, HandlerCodec, HintKind, HintReporter,
    InvocationShape, StandardConvention,
};
pub use errors::{AnalysisError, SectionError};
pub use handler::{Category, Handler, HandlerId, HandlerSignature, TypeId};
pub use registry::{ClassifierHost, HandlerRegistry};
pub use report::{ComplexCategory, HandlerAnalysisReport};
pub use section::{SECTION_TAG, SECTION_VERSION};
