//! Cross-checking and timing the range evaluators.
//!
//! - [`acceptance`] holds the labelled case matrix every evaluator must reproduce.
//! - [`topology`] enumerates span shapes (one segment, two, all but one; wrapped or not) and
//!   samples descriptors of each shape.
//! - [`differential`] runs the canonical evaluator against the reference evaluators, exhaustively
//!   over boundary TRBs and randomly over sampled topologies.
//! - [`throughput`] times evaluators over identical inputs. The numbers are informational only.
//!
//! Randomized runs use [`rand_chacha::ChaCha8Rng`] so that a seed reproduces a run.

pub mod acceptance;
pub mod differential;
pub mod throughput;
pub mod topology;

pub use acceptance::{
    run_acceptance, run_cases, AcceptanceCase, AcceptanceError, AcceptanceReport, CaseFailure,
    Expect,
};
pub use differential::{Differential, DifferentialReport, Mismatch, Verdict};
pub use throughput::{measure, ThroughputReport};
pub use topology::{SpanKind, Topology};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::reference::{CaseTable, SegmentWalk};
use crate::{Linearized, RangeDescriptor, RangeEvaluator, Result, Ring, RingGeometry, SegmentId};

/// An evaluator taking part in the cross-checks, together with the inputs it is documented to get
/// wrong.
pub trait CrossChecked: RangeEvaluator {
    /// Inputs this evaluator is known to answer with `None` even though `target` is in the span.
    fn is_known_blind_spot(&self, _range: &RangeDescriptor, _target: SegmentId) -> bool {
        false
    }
}

impl CrossChecked for Linearized {}

impl CrossChecked for CaseTable {}

impl CrossChecked for SegmentWalk {
    fn is_known_blind_spot(&self, range: &RangeDescriptor, target: SegmentId) -> bool {
        SegmentWalk::is_blind_spot(range, target)
    }
}

/// DMA base of the first segment in harness-built rings.
pub const HARNESS_BASE: u64 = 0x10_0000;

/// Rings built by the harness leave a gap after every segment so that addresses between segments
/// exist and must be rejected.
pub fn harness_ring(geometry: RingGeometry, segments: usize) -> Result<Ring> {
    let stride = geometry.segment_len_bytes().saturating_mul(2);
    Ring::contiguous(geometry, segments, HARNESS_BASE, stride)
}

pub fn seeded_rng(seed: u64) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(seed)
}

/// An address guaranteed to be outside every segment of `ring`.
pub fn outside_address(ring: &Ring) -> u64 {
    // Segments are half-open and never extend past `u64::MAX`, so the end of the highest one is
    // not inside any segment.
    ring.segment_ids()
        .filter_map(|id| ring.segment(id))
        .map(|seg| seg.base() + seg.len_bytes())
        .max()
        .unwrap_or(0)
}
