use crate::{RangeDescriptor, RangeEvaluator, Ring, SegmentId, TrbRef};

use super::{endpoints, last_trb, Endpoints};

/// Recursive segment-by-segment walk over raw DMA addresses.
///
/// Starting at the TD's first TRB, each step checks whether the address lies between the current
/// lower bound and the last TRB of the segment, then recurses into the next segment with its first
/// TRB as the new lower bound. The end segment terminates the walk.
///
/// Known limitation: when the TD starts and ends in the same segment with `end_idx < start_idx`
/// (so it covers every other segment of the ring), only the shared segment is examined. Targets in
/// any other segment come back as `None`.
#[derive(Clone, Copy, Debug, Default)]
pub struct SegmentWalk;

impl SegmentWalk {
    /// Whether `range` and `target` fall in the limitation above: a same-segment span that wraps
    /// the whole ring, with the target outside the shared segment.
    pub fn is_blind_spot(range: &RangeDescriptor, target: SegmentId) -> bool {
        range.start_seg.is_some()
            && range.start_seg == range.end_seg
            && range.end_idx < range.start_idx
            && range.start_seg != Some(target)
    }
}

impl RangeEvaluator for SegmentWalk {
    fn name(&self) -> &'static str {
        "segment-walk"
    }

    fn evaluate(&self, ring: &Ring, range: &RangeDescriptor, dma: u64) -> Option<SegmentId> {
        let ends = endpoints(ring, range)?;
        let start_dma = ring.trb_dma(ends.start)?;
        walk(ring, &ends, dma, ends.start.seg, start_dma)
    }
}

fn walk(
    ring: &Ring,
    ends: &Endpoints,
    dma: u64,
    cur: SegmentId,
    lower: u64,
) -> Option<SegmentId> {
    let seg_first = ring.segment(cur)?.base();
    let seg_last = ring.trb_dma(last_trb(ring, cur))?;

    if cur == ends.end.seg {
        let end_dma = ring.trb_dma(ends.end)?;
        let hit = if lower <= end_dma {
            (lower..=end_dma).contains(&dma)
        } else {
            // TD wrapped around to the top of this segment.
            (lower..=seg_last).contains(&dma) || (seg_first..=end_dma).contains(&dma)
        };
        return hit.then_some(cur);
    }

    // A link TRB in the middle of a TD can complete with an address anywhere up to segment end.
    if (lower..=seg_last).contains(&dma) {
        return Some(cur);
    }

    let next = ring.next(cur)?;
    if next == ends.start.seg {
        return None;
    }
    let next_first = ring.trb_dma(TrbRef::new(next, 0))?;
    walk(ring, ends, dma, next, next_first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RingGeometry;

    fn ring(n: usize) -> Ring {
        Ring::contiguous(RingGeometry::default(), n, 0x10_000, 0x2000).unwrap()
    }

    fn at(ring: &Ring, seg: u32, index: u32) -> TrbRef {
        TrbRef::new(ring.segment_id(seg).unwrap(), index)
    }

    #[test]
    fn walks_into_following_segments() {
        let r = ring(3);
        let range = RangeDescriptor::new(at(&r, 0, 10), at(&r, 2, 20));
        let dma = r.trb_dma(at(&r, 1, 200)).unwrap();
        assert_eq!(SegmentWalk.evaluate(&r, &range, dma), r.segment_id(1));
        let past_end = r.trb_dma(at(&r, 2, 21)).unwrap();
        assert_eq!(SegmentWalk.evaluate(&r, &range, past_end), None);
    }

    #[test]
    fn same_segment_wrap_misses_other_segments() {
        let r = ring(3);
        let range = RangeDescriptor::new(at(&r, 0, 100), at(&r, 0, 0));
        let dma = r.trb_dma(at(&r, 1, 100)).unwrap();
        assert_eq!(SegmentWalk.evaluate(&r, &range, dma), None);
        assert!(SegmentWalk::is_blind_spot(&range, r.segment_id(1).unwrap()));
        assert!(!SegmentWalk::is_blind_spot(&range, r.segment_id(0).unwrap()));
    }

    #[test]
    fn rejects_invalid_endpoints() {
        let r = ring(2);
        let mut range = RangeDescriptor::new(at(&r, 0, 0), at(&r, 1, 0));
        range.end_seg = None;
        assert_eq!(SegmentWalk.evaluate(&r, &range, 0x10_000), None);
        range.end_seg = r.segment_id(1);
        range.end_idx = 256;
        assert_eq!(SegmentWalk.evaluate(&r, &range, 0x10_000), None);
    }
}
