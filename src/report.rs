//! Post-build analysis report: refinement, diagnostics, queries.
//!
//! Closing a fully-classified [`HandlerRegistry`] produces an immutable
//! snapshot of the sets the type inferencer and diagnostics care about. After
//! whole-program inference has produced final results, the complex category
//! is subdivided exactly once into non-returning vs returning handlers; only
//! then can diagnostics be emitted.
//!
//! ## Notes
//!
//! - The subdivision is a *typed* state ([`ComplexCategory`]): the refined
//!   sets simply do not exist before [`refine_complex`] runs, so they cannot
//!   be queried early.
//! - Ordering violations (closing an unfinished registry, refining twice,
//!   emitting before refinement) are hard [`AnalysisError`]s, never silently
//!   tolerated partial states.
//!
//! [`refine_complex`]: HandlerAnalysisReport::refine_complex

use std::collections::BTreeSet;

use crate::capabilities::{DivergenceFacts, HintKind, HintReporter};
use crate::errors::AnalysisError;
use crate::handler::HandlerId;
use crate::registry::HandlerRegistry;

/// The complex category, before or after inference-driven refinement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ComplexCategory {
    /// Inference results are not available yet; only overall membership is
    /// known.
    Unrefined(BTreeSet<HandlerId>),
    /// Subdivided by whole-program inference. The two sets are disjoint and
    /// their union is the whole complex category.
    Refined {
        /// Handlers whose body unconditionally diverges.
        no_return: BTreeSet<HandlerId>,
        /// Handlers that can produce a value.
        returning: BTreeSet<HandlerId>,
    },
}

impl ComplexCategory {
    /// Overall complex membership, valid in either state.
    pub fn contains(&self, h: HandlerId) -> bool {
        match self {
            ComplexCategory::Unrefined(all) => all.contains(&h),
            ComplexCategory::Refined { no_return, returning } => {
                no_return.contains(&h) || returning.contains(&h)
            }
        }
    }

    /// Iterate over every complex handler, regardless of refinement state.
    pub fn iter(&self) -> impl Iterator<Item = HandlerId> + '_ {
        let (a, b) = match self {
            ComplexCategory::Unrefined(all) => (all, None),
            ComplexCategory::Refined { no_return, returning } => (no_return, Some(returning)),
        };
        a.iter().chain(b.into_iter().flatten()).copied()
    }

    /// The refined subdivision `(no_return, returning)`, if refinement ran.
    pub fn refined(&self) -> Option<(&BTreeSet<HandlerId>, &BTreeSet<HandlerId>)> {
        match self {
            ComplexCategory::Unrefined(_) => None,
            ComplexCategory::Refined { no_return, returning } => Some((no_return, returning)),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ComplexCategory::Unrefined(all) => all.len(),
            ComplexCategory::Refined { no_return, returning } => no_return.len() + returning.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Immutable snapshot of a fully-classified registry.
///
/// Produced once by [`close`](Self::close), refined at most once, then
/// read-only. May be persisted (see [`serialize`](Self::serialize)) and
/// reconstructed in a later compilation session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerAnalysisReport {
    pub(crate) throwing: BTreeSet<HandlerId>,
    pub(crate) forwarding: BTreeSet<HandlerId>,
    pub(crate) complex: ComplexCategory,
    /// Re-entry points of forwarding cycles detected during classification.
    /// Session-local; not persisted.
    pub(crate) cycles: BTreeSet<HandlerId>,
}

impl HandlerAnalysisReport {
    /// Consume a fully-classified registry into a report.
    ///
    /// ## Returns
    ///
    /// - `Ok(report)` capturing `throwing`, `complex`, and the forwarding tag
    ///   set by value.
    /// - `Err(AnalysisError::UnclassifiedHandlers)` if the registry still has
    ///   pending candidates; a report missing handlers is a contract
    ///   violation, not a tolerated state.
    #[tracing::instrument(skip_all, fields(pending = registry.pending_len()))]
    pub fn close(registry: HandlerRegistry) -> Result<Self, AnalysisError> {
        let pending = registry.pending_len();
        if pending > 0 {
            return Err(AnalysisError::UnclassifiedHandlers { pending });
        }
        Ok(Self {
            throwing: registry.throwing,
            forwarding: registry.forwarding,
            complex: ComplexCategory::Unrefined(registry.complex),
            cycles: registry.cycles,
        })
    }

    /// Subdivide the complex category using whole-program inference results.
    ///
    /// Handlers whose body unconditionally diverges land in `no_return`; all
    /// others in `returning`. Must run exactly once, after inference has
    /// produced final results and before any diagnostics are emitted.
    ///
    /// ## Returns
    ///
    /// - `Err(AnalysisError::AlreadyRefined)` on a second invocation.
    #[tracing::instrument(skip_all, fields(complex = self.complex.len()))]
    pub fn refine_complex(&mut self, inference: &dyn DivergenceFacts) -> Result<(), AnalysisError> {
        let all = match &self.complex {
            ComplexCategory::Refined { .. } => return Err(AnalysisError::AlreadyRefined),
            ComplexCategory::Unrefined(all) => all,
        };
        let mut no_return = BTreeSet::new();
        let mut returning = BTreeSet::new();
        for &h in all {
            if inference.always_diverges(h) {
                no_return.insert(h);
            } else {
                returning.insert(h);
            }
        }
        self.complex = ComplexCategory::Refined { no_return, returning };
        Ok(())
    }

    /// Emit one hint per reportable handler via the external reporter.
    ///
    /// Reportable: members of `throwing`, `no_return`, and `returning` that
    /// are *not* tagged as forwarding syntax; a pure forward is a common
    /// intentional no-op override and never warrants a hint. Handlers on a
    /// detected forwarding cycle additionally get a
    /// [`HintKind::ClassificationCycle`] hint, forwarding-tagged or not.
    ///
    /// ## Returns
    ///
    /// - `Err(AnalysisError::NotRefined)` if [`refine_complex`](Self::refine_complex)
    ///   has not run.
    #[tracing::instrument(skip_all)]
    pub fn emit_diagnostics(&self, reporter: &mut dyn HintReporter) -> Result<(), AnalysisError> {
        let (no_return, returning) = self.complex.refined().ok_or(AnalysisError::NotRefined)?;
        for &h in self.throwing.difference(&self.forwarding) {
            reporter.report(h, HintKind::DirectlyThrowing);
        }
        for &h in no_return.difference(&self.forwarding) {
            reporter.report(h, HintKind::ComplexNonReturning);
        }
        for &h in returning.difference(&self.forwarding) {
            reporter.report(h, HintKind::ComplexReturning);
        }
        for &h in &self.cycles {
            reporter.report(h, HintKind::ClassificationCycle);
        }
        Ok(())
    }

    /// Whether a handler is in the complex category. Ignores the refinement
    /// subdivision; valid before or after refinement.
    pub fn is_complex(&self, h: HandlerId) -> bool {
        self.complex.contains(h)
    }

    /// Directly-throwing handlers.
    pub fn throwing(&self) -> &BTreeSet<HandlerId> {
        &self.throwing
    }

    /// Handlers tagged as pure forwarding syntax.
    pub fn forwarding(&self) -> &BTreeSet<HandlerId> {
        &self.forwarding
    }

    /// The complex category and its refinement state.
    pub fn complex(&self) -> &ComplexCategory {
        &self.complex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::{BaselineOracle, BodyShape, BodySyntax, StandardConvention};
    use crate::handler::{Handler, HandlerSignature, TypeId};
    use crate::registry::ClassifierHost;
    use std::collections::{HashMap, HashSet};

    #[derive(Default)]
    struct StubProgram {
        baselines: HashSet<HandlerId>,
        shapes: HashMap<HandlerId, BodyShape>,
        diverging: HashSet<HandlerId>,
    }

    impl BaselineOracle for StubProgram {
        fn is_baseline(&self, h: &Handler) -> bool {
            self.baselines.contains(&h.id)
        }
    }

    impl BodySyntax for StubProgram {
        fn shape_of(&self, h: &Handler) -> BodyShape {
            self.shapes.get(&h.id).cloned().unwrap_or(BodyShape::Other)
        }
    }

    impl DivergenceFacts for StubProgram {
        fn always_diverges(&self, h: HandlerId) -> bool {
            self.diverging.contains(&h)
        }
    }

    #[derive(Default)]
    struct RecordingReporter {
        hints: Vec<(HandlerId, HintKind)>,
    }

    impl HintReporter for RecordingReporter {
        fn report(&mut self, h: HandlerId, kind: HintKind) {
            self.hints.push((h, kind));
        }
    }

    fn handler(id: u32) -> Handler {
        Handler {
            id: HandlerId(id),
            owner: TypeId(id),
            signature: HandlerSignature::single_argument(),
        }
    }

    fn classified(program: &StubProgram, handlers: &[Handler]) -> HandlerRegistry {
        let mut registry = HandlerRegistry::new();
        for h in handlers {
            registry.register(h.clone());
        }
        let host = ClassifierHost {
            shape: &StandardConvention,
            baselines: program,
            bodies: program,
        };
        registry.classify_all(&host);
        registry
    }

    #[test]
    fn close_rejects_pending_registry() {
        let mut registry = HandlerRegistry::new();
        registry.register(handler(1));
        let err = HandlerAnalysisReport::close(registry).unwrap_err();
        assert_eq!(err, AnalysisError::UnclassifiedHandlers { pending: 1 });
    }

    #[test]
    fn refinement_partitions_complex_exactly() {
        let (h1, h2, h3) = (handler(1), handler(2), handler(3));
        let mut program = StubProgram::default();
        program.diverging.insert(h2.id);
        let registry = classified(&program, &[h1.clone(), h2.clone(), h3.clone()]);
        let mut report = HandlerAnalysisReport::close(registry).unwrap();
        assert!(report.complex().refined().is_none());

        report.refine_complex(&program).unwrap();
        let (no_return, returning) = report.complex().refined().unwrap();
        assert_eq!(no_return.iter().copied().collect::<Vec<_>>(), vec![h2.id]);
        assert_eq!(
            returning.iter().copied().collect::<Vec<_>>(),
            vec![h1.id, h3.id]
        );
        assert!(no_return.is_disjoint(returning));
        assert_eq!(no_return.len() + returning.len(), report.complex().len());
        // Overall membership is unchanged by refinement.
        for h in [&h1, &h2, &h3] {
            assert!(report.is_complex(h.id));
        }
    }

    #[test]
    fn refinement_runs_exactly_once() {
        let program = StubProgram::default();
        let registry = classified(&program, &[handler(1)]);
        let mut report = HandlerAnalysisReport::close(registry).unwrap();
        report.refine_complex(&program).unwrap();
        assert_eq!(
            report.refine_complex(&program).unwrap_err(),
            AnalysisError::AlreadyRefined
        );
    }

    #[test]
    fn diagnostics_require_refinement() {
        let program = StubProgram::default();
        let registry = classified(&program, &[handler(1)]);
        let report = HandlerAnalysisReport::close(registry).unwrap();
        let mut reporter = RecordingReporter::default();
        assert_eq!(
            report.emit_diagnostics(&mut reporter).unwrap_err(),
            AnalysisError::NotRefined
        );
        assert!(reporter.hints.is_empty());
    }

    #[test]
    fn diagnostics_suppress_forwarding_handlers() {
        // h1 throws; h2 forwards to h1. h2 resolves Throwing but is tagged
        // forwarding, so only h1 gets a hint.
        let (h1, h2) = (handler(1), handler(2));
        let mut program = StubProgram::default();
        program.shapes.insert(h1.id, BodyShape::Throw);
        program.shapes.insert(h2.id, BodyShape::Forward(h1.clone()));
        let registry = classified(&program, &[h1.clone(), h2.clone()]);
        let mut report = HandlerAnalysisReport::close(registry).unwrap();
        report.refine_complex(&program).unwrap();

        let mut reporter = RecordingReporter::default();
        report.emit_diagnostics(&mut reporter).unwrap();
        assert_eq!(reporter.hints, vec![(h1.id, HintKind::DirectlyThrowing)]);
    }

    #[test]
    fn diagnostics_cover_complex_kinds() {
        let (h1, h2) = (handler(1), handler(2));
        let mut program = StubProgram::default();
        program.diverging.insert(h1.id);
        let registry = classified(&program, &[h1.clone(), h2.clone()]);
        let mut report = HandlerAnalysisReport::close(registry).unwrap();
        report.refine_complex(&program).unwrap();

        let mut reporter = RecordingReporter::default();
        report.emit_diagnostics(&mut reporter).unwrap();
        assert_eq!(
            reporter.hints,
            vec![
                (h1.id, HintKind::ComplexNonReturning),
                (h2.id, HintKind::ComplexReturning),
            ]
        );
    }

    #[test]
    fn cycle_members_are_reported_even_when_forwarding() {
        let (a, b) = (handler(1), handler(2));
        let mut program = StubProgram::default();
        program.shapes.insert(a.id, BodyShape::Forward(b.clone()));
        program.shapes.insert(b.id, BodyShape::Forward(a.clone()));
        let registry = classified(&program, &[a.clone(), b.clone()]);
        let mut report = HandlerAnalysisReport::close(registry).unwrap();
        report.refine_complex(&program).unwrap();

        let mut reporter = RecordingReporter::default();
        report.emit_diagnostics(&mut reporter).unwrap();
        // Both cycle members are forwarding-tagged, so no category hints;
        // the cycle itself is still surfaced.
        assert!(reporter
            .hints
            .iter()
            .all(|(_, kind)| *kind == HintKind::ClassificationCycle));
        assert!(!reporter.hints.is_empty());
    }
}
