//! Data model for fallback dispatch handler analysis.
//!
//! A *fallback dispatch handler* is a method the runtime invokes when a call
//! cannot be resolved to any concrete member. The host compiler discovers
//! these while visiting the program and registers each one with the
//! [`HandlerRegistry`](crate::registry::HandlerRegistry); everything here is
//! the read-only view of a handler that classification needs.
//!
//! ## Notes
//!
//! - Handlers are compared by **identity** ([`HandlerId`]), never by
//!   structural equality. Two handlers with identical signatures on different
//!   types are different handlers.
//! - The enclosing type and parameter signature are supplied by the host
//!   compiler and never mutated by this crate.

use std::hash::{Hash, Hasher};

/// Unique identity for a fallback dispatch handler definition.
///
/// Assigned by the host compiler; opaque to this crate. All set membership,
/// equality, and persistence keys off this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub u32);

/// Opaque reference to the type that declares a handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeId(pub u32);

/// Read-only parameter-shape summary for a handler.
///
/// The invocation-shape capability decides whether this matches the
/// single-argument fallback convention; this struct only carries the counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct HandlerSignature {
    pub required_positional: u8,
    pub optional_positional: u8,
    pub named: u8,
}

impl HandlerSignature {
    /// The conventional shape: exactly one required positional parameter.
    pub fn single_argument() -> Self {
        Self {
            required_positional: 1,
            optional_positional: 0,
            named: 0,
        }
    }
}

/// A registered fallback dispatch handler.
///
/// ## Notes
///
/// - `PartialEq`, `Eq`, and `Hash` delegate to `id` only: identity
///   comparison, per the data model. `owner` and `signature` are host-supplied
///   facts carried alongside the identity.
#[derive(Debug, Clone)]
pub struct Handler {
    /// Identity of the handler definition.
    pub id: HandlerId,
    /// The type declaring this handler.
    pub owner: TypeId,
    /// Parameter shape, as declared.
    pub signature: HandlerSignature,
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Handler {}

impl Hash for Handler {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Base classification of a handler.
///
/// Every classified handler lands in exactly one of these. `Complex` is the
/// only category the type inferencer must account for; after inference it is
/// subdivided by [`refine_complex`](crate::report::HandlerAnalysisReport::refine_complex)
/// into non-returning vs returning handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// One of the language-defined baseline implementations, or a forward
    /// that resolves to one (directly or through the not-applicable remap).
    Default,
    /// Body is exactly an unconditional throw, or a forward chain ending in
    /// one.
    Throwing,
    /// Signature does not match the single-argument convention; the handler
    /// can never be invoked as a fallback and is excluded from all further
    /// reasoning. Not an error outcome.
    NotApplicable,
    /// Anything else: the inferencer must assume this handler can produce a
    /// value at any unresolved call site.
    Complex,
}
