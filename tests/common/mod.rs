//! Shared stub collaborators for integration tests.
//!
//! A `StubProgram` stands in for the host compiler: a set of baseline
//! handler ids, a body shape per handler, and a set of handlers whose bodies
//! are known to diverge. Together with the identity codec this is enough to
//! drive the full registry → report → persistence lifecycle without any real
//! program IR.

// Each test binary uses a subset of these helpers.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};

use fallback_analysis::{
    BaselineOracle, BodyShape, BodySyntax, DivergenceFacts, Handler, HandlerCodec, HandlerId,
    HandlerSignature, HintKind, HintReporter, TypeId,
};

#[derive(Default)]
pub struct StubProgram {
    pub baselines: HashSet<HandlerId>,
    pub shapes: HashMap<HandlerId, BodyShape>,
    pub diverging: HashSet<HandlerId>,
}

impl StubProgram {
    pub fn baseline(&mut self, h: &Handler) {
        self.baselines.insert(h.id);
    }

    pub fn throws(&mut self, h: &Handler) {
        self.shapes.insert(h.id, BodyShape::Throw);
    }

    pub fn forwards(&mut self, h: &Handler, target: &Handler) {
        self.shapes.insert(h.id, BodyShape::Forward(target.clone()));
    }
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
pub struct RecordingReporter {
    pub hints: Vec<(HandlerId, HintKind)>,
}

impl RecordingReporter {
    pub fn reported(&self, h: HandlerId) -> bool {
        self.hints.iter().any(|(id, _)| *id == h)
    }
}

impl HintReporter for RecordingReporter {
    fn report(&mut self, h: HandlerId, kind: HintKind) {
        self.hints.push((h, kind));
    }
}

/// Codec that persists handler ids verbatim.
pub struct IdentityCodec;

impl HandlerCodec for IdentityCodec {
    fn persist(&self, h: HandlerId) -> u64 {
        u64::from(h.0)
    }

    fn resolve(&self, raw: u64) -> Option<HandlerId> {
        u32::try_from(raw).ok().map(HandlerId)
    }
}

pub fn handler(id: u32) -> Handler {
    Handler {
        id: HandlerId(id),
        owner: TypeId(id),
        signature: HandlerSignature::single_argument(),
    }
}

pub fn zero_arg_handler(id: u32) -> Handler {
    Handler {
        id: HandlerId(id),
        owner: TypeId(id),
        signature: HandlerSignature::default(),
    }
}
