//! Collaborator capabilities consumed by the analysis.
//!
//! The classifier never inspects AST nodes itself. Everything it needs to
//! know about the program arrives through the small traits in this module,
//! injected by the host compiler (and stubbed out in tests). This keeps the
//! classification algorithm testable in isolation and free of concrete
//! coupling to any particular IR.
//!
//! ## Notes
//!
//! - All traits are object-safe; the registry and report take `&dyn` / `&mut
//!   dyn` references.
//! - [`StandardConvention`] is the canonical [`InvocationShape`]
//!   implementation for the language-defined convention; hosts with unusual
//!   dispatch conventions supply their own.

use crate::handler::{Handler, HandlerId, HandlerSignature};

/// Structural classification of a handler body, as seen by the host's syntax
/// layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyShape {
    /// The body is syntactically *exactly* a call to the nearest reachable
    /// superclass's same-role handler with the same single argument, and
    /// nothing else. Carries the resolved target so classification can
    /// recurse without a separate lookup (the target need not itself be
    /// registered).
    Forward(Handler),
    /// The body is syntactically exactly an unconditional throw statement.
    Throw,
    /// Any other body shape.
    Other,
}

/// Decide whether a signature matches the one-argument fallback-handler
/// convention.
pub trait InvocationShape {
    fn matches_convention(&self, sig: &HandlerSignature) -> bool;
}

/// The language-defined convention: exactly one required positional
/// parameter, no optionals, no named parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardConvention;

impl InvocationShape for StandardConvention {
    fn matches_convention(&self, sig: &HandlerSignature) -> bool {
        sig.required_positional == 1 && sig.optional_positional == 0 && sig.named == 0
    }
}

/// Identify the language-defined baseline handlers (the root-type default and
/// the internal low-level default).
pub trait BaselineOracle {
    fn is_baseline(&self, h: &Handler) -> bool;
}

/// Classify a handler body structurally. Only consulted after the
/// invocation-shape check has passed.
pub trait BodySyntax {
    fn shape_of(&self, h: &Handler) -> BodyShape;
}

/// Whole-program inference results, consumed only to learn whether a handler
/// body is statically known to diverge on every reachable path.
pub trait DivergenceFacts {
    fn always_diverges(&self, h: HandlerId) -> bool;
}

/// Kind of user-visible hint produced by diagnostics emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HintKind {
    /// The handler body is a bare unconditional throw.
    DirectlyThrowing,
    /// Complex handler whose body never returns normally.
    ComplexNonReturning,
    /// Complex handler that can produce a value.
    ComplexReturning,
    /// The handler participates in a cyclic forwarding chain; the whole
    /// cycle was classified `Complex` as the fail-safe outcome.
    ClassificationCycle,
}

/// Record one user-visible hint. Rendering (messages, spans, severities) is
/// the host's concern.
pub trait HintReporter {
    fn report(&mut self, h: HandlerId, kind: HintKind);
}

/// Resolve handler references to and from persisted identifiers for the
/// section format. The codec owns the mapping; this crate never embeds raw
/// handler data in the persisted stream.
pub trait HandlerCodec {
    /// Stable persisted identifier for a handler reference.
    fn persist(&self, h: HandlerId) -> u64;
    /// Resolve a persisted identifier back to a handler, or `None` if the
    /// reference is unknown in the current session.
    fn resolve(&self, raw: u64) -> Option<HandlerId>;
}
