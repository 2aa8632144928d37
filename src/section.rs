//! Persisted binary section for analysis reports.
//!
//! A report can be cached across compilation sessions. The layout is a named
//! section framed by matching begin/end tag markers (corruption and
//! misalignment detection when embedded in a larger stream) with an explicit
//! version field, followed by five length-prefixed sequences of handler
//! references in fixed order: `throwing`, `complex`, `forwarding`,
//! `complex_no_return`, `complex_returning`.
//!
//! ```text
//! u32-le len, tag bytes      begin marker
//! u16-le version
//! 5 × (u32-le count, count × u64-le handler ref)
//! u32-le len, tag bytes      end marker
//! ```
//!
//! Handler references are resolved through the injected
//! [`HandlerCodec`], never embedded as raw program data. On read, each
//! sequence collapses to a membership set: duplicates are dropped and
//! element order is not semantically meaningful (and not guaranteed to
//! round-trip).

use std::collections::BTreeSet;

use bytes::{Buf, BufMut, BytesMut};

use crate::capabilities::HandlerCodec;
use crate::errors::SectionError;
use crate::handler::HandlerId;
use crate::report::{ComplexCategory, HandlerAnalysisReport};

/// Stable tag naming this section inside a larger persisted stream.
pub const SECTION_TAG: &str = "fallback-handler-analysis";

/// Current layout revision. Bump when the five-list layout changes so old
/// caches are rejected instead of misread.
pub const SECTION_VERSION: u16 = 1;

impl HandlerAnalysisReport {
    /// Encode this report as a self-contained binary section.
    ///
    /// Works in either refinement state: an unrefined report writes empty
    /// subdivision sequences, and [`deserialize`](Self::deserialize)
    /// reconstructs it as unrefined. Cycle records are session-local and not
    /// persisted.
    #[tracing::instrument(skip_all, fields(complex = self.complex().len()))]
    pub fn serialize(&self, codec: &dyn HandlerCodec) -> Vec<u8> {
        let mut buf = BytesMut::new();
        put_tag(&mut buf);
        buf.put_u16_le(SECTION_VERSION);

        let complex_all: BTreeSet<HandlerId> = self.complex.iter().collect();
        let empty = BTreeSet::new();
        let (no_return, returning) = self.complex.refined().unwrap_or((&empty, &empty));

        for set in [&self.throwing, &complex_all, &self.forwarding, no_return, returning] {
            put_refs(&mut buf, set, codec);
        }
        put_tag(&mut buf);
        buf.to_vec()
    }

    /// Decode a section produced by [`serialize`](Self::serialize).
    ///
    /// ## Returns
    ///
    /// - `Ok(report)` with identical set membership for all five categories.
    ///   The report is refined iff either subdivision sequence is non-empty;
    ///   in that case the subdivision must disjointly partition the complex
    ///   set.
    /// - `Err(SectionError)` on truncation, tag mismatch, unsupported
    ///   version, unresolvable handler references, or an inconsistent
    ///   subdivision.
    #[tracing::instrument(skip_all, fields(len = input.len()))]
    pub fn deserialize(
        input: &[u8],
        codec: &dyn HandlerCodec,
    ) -> Result<HandlerAnalysisReport, SectionError> {
        let mut buf = input;
        expect_tag(&mut buf)?;
        let version = get_u16(&mut buf)?;
        if version != SECTION_VERSION {
            return Err(SectionError::UnsupportedVersion { found: version });
        }

        let throwing = get_refs(&mut buf, codec)?;
        let complex_all = get_refs(&mut buf, codec)?;
        let forwarding = get_refs(&mut buf, codec)?;
        let no_return = get_refs(&mut buf, codec)?;
        let returning = get_refs(&mut buf, codec)?;
        expect_tag(&mut buf)?;

        let complex = if no_return.is_empty() && returning.is_empty() {
            ComplexCategory::Unrefined(complex_all)
        } else {
            if !no_return.is_disjoint(&returning) {
                return Err(SectionError::InconsistentPartition);
            }
            let union: BTreeSet<HandlerId> = no_return.union(&returning).copied().collect();
            if union != complex_all {
                return Err(SectionError::InconsistentPartition);
            }
            ComplexCategory::Refined { no_return, returning }
        };

        Ok(HandlerAnalysisReport {
            throwing,
            forwarding,
            complex,
            cycles: BTreeSet::new(),
        })
    }
}

fn put_tag(buf: &mut BytesMut) {
    buf.put_u32_le(SECTION_TAG.len() as u32);
    buf.put_slice(SECTION_TAG.as_bytes());
}

fn put_refs(buf: &mut BytesMut, set: &BTreeSet<HandlerId>, codec: &dyn HandlerCodec) {
    buf.put_u32_le(set.len() as u32);
    for &h in set {
        buf.put_u64_le(codec.persist(h));
    }
}

fn need(buf: &[u8], n: usize) -> Result<(), SectionError> {
    if buf.len() < n {
        Err(SectionError::Truncated { needed: n - buf.len() })
    } else {
        Ok(())
    }
}

fn get_u16(buf: &mut &[u8]) -> Result<u16, SectionError> {
    need(*buf, 2)?;
    Ok(buf.get_u16_le())
}

fn get_u32(buf: &mut &[u8]) -> Result<u32, SectionError> {
    need(*buf, 4)?;
    Ok(buf.get_u32_le())
}

fn expect_tag(buf: &mut &[u8]) -> Result<(), SectionError> {
    let len = get_u32(buf)? as usize;
    if len != SECTION_TAG.len() {
        return Err(SectionError::BadTag { expected: SECTION_TAG });
    }
    need(*buf, len)?;
    if buf[..len] != *SECTION_TAG.as_bytes() {
        return Err(SectionError::BadTag { expected: SECTION_TAG });
    }
    buf.advance(len);
    Ok(())
}

fn get_refs(
    buf: &mut &[u8],
    codec: &dyn HandlerCodec,
) -> Result<BTreeSet<HandlerId>, SectionError> {
    let count = get_u32(buf)?;
    let mut set = BTreeSet::new();
    for _ in 0..count {
        need(*buf, 8)?;
        let raw = buf.get_u64_le();
        let id = codec
            .resolve(raw)
            .ok_or(SectionError::UnknownHandler { raw })?;
        // Duplicates collapse; order is not semantically meaningful.
        set.insert(id);
    }
    Ok(set)
}
