//! Build-time classification of fallback dispatch handlers.
//!
//! The host compiler registers every concrete fallback handler it discovers
//! while traversing the program. Once the traversal is done (the host's work
//! queue first drains), [`HandlerRegistry::classify_all`] partitions every
//! candidate into one of the four base categories via a recursive decision
//! procedure. The registry is then consumed by
//! [`HandlerAnalysisReport::close`](crate::report::HandlerAnalysisReport::close)
//! and discarded.
//!
//! ## Notes
//!
//! - **Memoization**: a handler's category is cached on first resolution, so
//!   repeated classification is a cheap lookup and shared forwarding targets
//!   are resolved once.
//! - **Cycle guard**: a cyclic forwarding chain cannot be resolved by
//!   memoization alone (a handler is only cached on return). Handlers
//!   currently being resolved are tracked in an in-progress set; re-entry
//!   classifies the cycle `Complex` as the fail-safe outcome and records it
//!   for later diagnostics.
//! - **Exclusive ownership**: the registry is owned by the compiling session
//!   and passed by explicit reference; there is no ambient/static instance.
//!   `classify_all` takes `&mut self`, so no registration can interleave with
//!   classification.

use std::collections::{BTreeSet, HashSet};

use crate::capabilities::{BaselineOracle, BodyShape, BodySyntax, InvocationShape};
use crate::handler::{Category, Handler, HandlerId};

/// The capabilities classification consults, bundled so the recursive
/// procedure threads one reference.
pub struct ClassifierHost<'a> {
    /// One-argument convention check.
    pub shape: &'a dyn InvocationShape,
    /// Language-defined baseline handler identification.
    pub baselines: &'a dyn BaselineOracle,
    /// Structural body classification.
    pub bodies: &'a dyn BodySyntax,
}

/// Accumulates fallback handler candidates and classifies them.
///
/// Created once per compilation unit of work; mutated only during the single
/// classification pass; consumed into a report afterwards.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    /// Pending candidates. Membership only; processing order is irrelevant.
    pending: Vec<Handler>,
    pending_ids: HashSet<HandlerId>,
    // The four base-category sets. Disjoint; together they cover every
    // classified handler.
    pub(crate) defaults: BTreeSet<HandlerId>,
    pub(crate) throwing: BTreeSet<HandlerId>,
    pub(crate) not_applicable: BTreeSet<HandlerId>,
    pub(crate) complex: BTreeSet<HandlerId>,
    /// Orthogonal tag: handlers whose body is a pure super-forward. Always a
    /// subset of `defaults ∪ throwing ∪ complex`.
    pub(crate) forwarding: BTreeSet<HandlerId>,
    /// Handlers whose resolution is on the current recursion path.
    in_progress: HashSet<HandlerId>,
    /// Re-entry points of detected forwarding cycles.
    pub(crate) cycles: BTreeSet<HandlerId>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a concrete fallback handler as a pending candidate.
    ///
    /// Purely accumulation: nothing is classified until
    /// [`classify_all`](Self::classify_all) runs. Re-registering a handler
    /// already pending or already classified is a no-op.
    pub fn register(&mut self, h: Handler) {
        if self.category_of(h.id).is_some() || !self.pending_ids.insert(h.id) {
            return;
        }
        tracing::debug!(handler = h.id.0, "registered fallback handler candidate");
        self.pending.push(h);
    }

    /// Number of candidates not yet classified.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Look up the memoized category for a handler, if it has been resolved.
    pub fn category_of(&self, id: HandlerId) -> Option<Category> {
        if self.defaults.contains(&id) {
            Some(Category::Default)
        } else if self.throwing.contains(&id) {
            Some(Category::Throwing)
        } else if self.not_applicable.contains(&id) {
            Some(Category::NotApplicable)
        } else if self.complex.contains(&id) {
            Some(Category::Complex)
        } else {
            None
        }
    }

    /// Whether a handler was tagged as pure forwarding syntax.
    pub fn is_forwarding(&self, id: HandlerId) -> bool {
        self.forwarding.contains(&id)
    }

    /// Drain and classify every pending candidate.
    ///
    /// Idempotent: once the pending set is empty, re-invocation is a no-op.
    /// The design assumes no new handlers are discovered mid-classification;
    /// classification only resolves relationships among already-known
    /// handlers (forwarding targets need not be registered; their facts
    /// arrive through [`BodyShape::Forward`]).
    #[tracing::instrument(skip_all, fields(pending = self.pending.len()))]
    pub fn classify_all(&mut self, host: &ClassifierHost<'_>) {
        while let Some(h) = self.pending.pop() {
            self.pending_ids.remove(&h.id);
            self.classify(&h, host);
        }
    }

    /// Classify one handler, first match wins:
    ///
    /// 1. memoized category;
    /// 2. signature fails the invocation-shape check → `NotApplicable`
    ///    (the body is never examined);
    /// 3. baseline implementation → `Default`;
    /// 4. pure super-forward → tag forwarding, recurse on the target; the
    ///    result is the target's category, except `NotApplicable` remaps to
    ///    `Default` (the runtime redirects a forward to an uninvocable
    ///    handler to the baseline default);
    /// 5. bare unconditional throw → `Throwing`;
    /// 6. otherwise → `Complex`.
    ///
    /// Re-entry on a handler still being resolved means the forwarding chain
    /// is cyclic; the cycle is classified `Complex`.
    pub fn classify(&mut self, h: &Handler, host: &ClassifierHost<'_>) -> Category {
        if let Some(cat) = self.category_of(h.id) {
            return cat;
        }
        if self.in_progress.contains(&h.id) {
            // Cyclic forwarding chain. Do not persist here: the frame that
            // started resolving `h` persists it on unwind.
            tracing::warn!(handler = h.id.0, "cyclic forwarding chain; classifying cycle as complex");
            self.cycles.insert(h.id);
            return Category::Complex;
        }

        if !host.shape.matches_convention(&h.signature) {
            self.persist(h.id, Category::NotApplicable);
            return Category::NotApplicable;
        }
        if host.baselines.is_baseline(h) {
            self.persist(h.id, Category::Default);
            return Category::Default;
        }

        self.in_progress.insert(h.id);
        let cat = match host.bodies.shape_of(h) {
            BodyShape::Forward(target) => {
                self.forwarding.insert(h.id);
                match self.classify(&target, host) {
                    Category::NotApplicable => Category::Default,
                    super_cat => super_cat,
                }
            }
            BodyShape::Throw => Category::Throwing,
            BodyShape::Other => Category::Complex,
        };
        self.in_progress.remove(&h.id);
        self.persist(h.id, cat);
        cat
    }

    fn persist(&mut self, id: HandlerId, cat: Category) {
        tracing::debug!(handler = id.0, category = ?cat, "classified fallback handler");
        match cat {
            Category::Default => self.defaults.insert(id),
            Category::Throwing => self.throwing.insert(id),
            Category::NotApplicable => self.not_applicable.insert(id),
            Category::Complex => self.complex.insert(id),
        };
    }
}
