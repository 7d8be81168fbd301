//! Independent implementations of the TD span predicate.
//!
//! These exist to cross-check [`crate::Linearized`]; none of them should be used to make real
//! decisions. Each one reasons about segments directly instead of through [`crate::Linearizer`]:
//!
//! - [`SegmentWalk`] walks forward from the start segment comparing raw DMA addresses against each
//!   segment's bounds until it reaches the end segment.
//! - [`CaseTable`] checks the start segment, then the end segment, then the segments in between,
//!   with an explicit branch for each arrangement of start, end and target.
//!
//! Both refuse missing, foreign and out-of-range inputs up front.

mod case_table;
mod segment_walk;

pub use case_table::CaseTable;
pub use segment_walk::SegmentWalk;

use crate::{RangeDescriptor, Ring, SegmentId, TrbRef};

/// Start and end of a span after validation.
#[derive(Clone, Copy, Debug)]
struct Endpoints {
    start: TrbRef,
    end: TrbRef,
}

fn endpoints(ring: &Ring, range: &RangeDescriptor) -> Option<Endpoints> {
    let start = TrbRef::new(range.start_seg?, range.start_idx);
    let end = TrbRef::new(range.end_seg?, range.end_idx);
    // `trb_dma` rejects foreign handles and indices past the segment.
    ring.trb_dma(start)?;
    ring.trb_dma(end)?;
    Some(Endpoints { start, end })
}

fn last_trb(ring: &Ring, seg: SegmentId) -> TrbRef {
    TrbRef::new(seg, ring.geometry().trbs_per_segment() - 1)
}
