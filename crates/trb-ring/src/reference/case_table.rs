use crate::{RangeDescriptor, RangeEvaluator, Ring, SegmentId};

use super::endpoints;

/// Branch-per-arrangement evaluator.
///
/// Writing `S` for the start TRB, `E` for the end TRB and `T` for the target, the arrangements
/// handled are (brackets are segments, `->` is "in the span", `-` is "outside"):
///
/// ```text
///  1. [S -> T -> E]      7. [S -> T]         13. [S] -> [E]
///  2. [E - S -> T]       8. [S -> E]         14. [S] -> [T] -> [E]
///  3. [S -> E - T]       9. [E - S]          15. [E] - [T] - [S]
///  4. [T -> E - S]      10. [E - T]
///  5. [E - T - S]       11. [T -> E]
///  6. [T - S -> E]      12. [T - S]
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct CaseTable;

impl RangeEvaluator for CaseTable {
    fn name(&self) -> &'static str {
        "case-table"
    }

    fn evaluate(&self, ring: &Ring, range: &RangeDescriptor, dma: u64) -> Option<SegmentId> {
        let ends = endpoints(ring, range)?;
        let (start_seg, start_idx) = (ends.start.seg, ends.start.index);
        let (end_seg, end_idx) = (ends.end.seg, ends.end.index);

        // Is the target at or after the start TRB in the start segment?
        let mut trb = ring.dma_to_trb(start_seg, dma);
        if let Some(t) = trb.filter(|&t| t >= start_idx) {
            // 1, 2, 3, 7
            if end_seg != start_seg || t <= end_idx {
                return Some(start_seg); // 1, 7
            }
            if end_idx < start_idx {
                return Some(start_seg); // 2
            }
            return None; // 3
        }

        // Is the target at or before the end TRB in the end segment?
        if start_seg != end_seg {
            if trb.is_some() {
                return None; // 12
            }
            trb = ring.dma_to_trb(end_seg, dma);
        } else if start_idx <= end_idx {
            return None; // 6, 8
        }

        // 4, 5, 10, 11
        if let Some(t) = trb {
            return (t <= end_idx).then_some(end_seg);
        }

        // 9, 13, 14, 15: the segments strictly between start and end.
        let mut seg = ring.next(start_seg)?;
        while seg != end_seg && seg != start_seg {
            if ring.segment(seg)?.contains_dma(dma) {
                return Some(seg);
            }
            seg = ring.next(seg)?;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RingGeometry, TrbRef};

    #[test]
    fn same_segment_wrap_reaches_other_segments() {
        let r = Ring::contiguous(RingGeometry::default(), 3, 0x10_000, 0x2000).unwrap();
        let s0 = r.segment_id(0).unwrap();
        let s1 = r.segment_id(1).unwrap();
        let range = RangeDescriptor::new(TrbRef::new(s0, 100), TrbRef::new(s0, 0));
        let dma = r.trb_dma(TrbRef::new(s1, 100)).unwrap();
        assert_eq!(CaseTable.evaluate(&r, &range, dma), Some(s1));
    }

    #[test]
    fn target_before_start_in_start_segment_is_outside() {
        let r = Ring::contiguous(RingGeometry::default(), 3, 0x10_000, 0x2000).unwrap();
        let s0 = r.segment_id(0).unwrap();
        let s2 = r.segment_id(2).unwrap();
        let range = RangeDescriptor::new(TrbRef::new(s0, 100), TrbRef::new(s2, 0));
        let dma = r.trb_dma(TrbRef::new(s0, 0)).unwrap();
        assert_eq!(CaseTable.evaluate(&r, &range, dma), None);
    }
}
