//! Span shapes used to drive the differential runs.

use rand::Rng;

use crate::{RangeDescriptor, Ring, TrbRef};

/// How many segments a span touches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpanKind {
    OneSegment,
    TwoSegments,
    AllButOne,
}

impl SpanKind {
    pub const ALL: [SpanKind; 3] = [
        SpanKind::OneSegment,
        SpanKind::TwoSegments,
        SpanKind::AllButOne,
    ];

    /// Number of segments from start to end inclusive on a ring of `segment_count`.
    pub fn segments(self, segment_count: usize) -> usize {
        match self {
            SpanKind::OneSegment => 1,
            SpanKind::TwoSegments => 2,
            SpanKind::AllButOne => segment_count.saturating_sub(1),
        }
    }
}

/// A span shape: how many segments it touches and whether it crosses the ring's end.
///
/// For a one-segment span, "wrapped" means the end TRB precedes the start TRB, so the span runs
/// all the way around the ring back into its own segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Topology {
    pub span: SpanKind,
    pub wrapped: bool,
}

impl Topology {
    /// Shapes that can be realised on `ring`, skipping kinds that collapse onto an earlier one.
    pub fn all_for(ring: &Ring) -> Vec<Topology> {
        let n = ring.segment_count();
        let tps = ring.geometry().trbs_per_segment();
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for span in SpanKind::ALL {
            let k = span.segments(n);
            if k == 0 || k > n || seen.contains(&k) {
                continue;
            }
            seen.push(k);
            out.push(Topology {
                span,
                wrapped: false,
            });
            // A wrapped one-segment span needs two distinct TRBs.
            if k > 1 || tps > 1 {
                out.push(Topology {
                    span,
                    wrapped: true,
                });
            }
        }
        out
    }

    /// Pick a random descriptor of this shape.
    ///
    /// Returns `None` if the shape cannot be realised on `ring`; shapes from [`Topology::all_for`]
    /// always can.
    pub fn sample<R: Rng + ?Sized>(&self, ring: &Ring, rng: &mut R) -> Option<RangeDescriptor> {
        let n = ring.segment_count();
        let tps = ring.geometry().trbs_per_segment();
        let k = self.span.segments(n);
        if k == 0 || k > n || (k == 1 && self.wrapped && tps < 2) {
            return None;
        }

        let start_ord = if k == 1 {
            rng.gen_range(0..n)
        } else if self.wrapped {
            // Start late enough that the end lands past the last segment.
            rng.gen_range(n + 1 - k..n)
        } else {
            rng.gen_range(0..=n - k)
        };
        let end_ord = (start_ord + k - 1) % n;

        let (start_idx, end_idx) = if k == 1 {
            let a = rng.gen_range(0..tps);
            let b = rng.gen_range(0..tps);
            match (self.wrapped, a.cmp(&b)) {
                (false, _) => (a.min(b), a.max(b)),
                (true, core::cmp::Ordering::Greater) => (a, b),
                (true, core::cmp::Ordering::Less) => (b, a),
                (true, core::cmp::Ordering::Equal) if a == 0 => (1, 0),
                (true, core::cmp::Ordering::Equal) => (a, a - 1),
            }
        } else {
            (rng.gen_range(0..tps), rng.gen_range(0..tps))
        };

        let start = ring.segment_id(start_ord as u32)?;
        let end = ring.segment_id(end_ord as u32)?;
        Some(RangeDescriptor::new(
            TrbRef::new(start, start_idx),
            TrbRef::new(end, end_idx),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{harness_ring, seeded_rng};
    use crate::RingGeometry;

    #[test]
    fn shapes_per_ring_size() {
        let ring1 = harness_ring(RingGeometry::default(), 1).unwrap();
        assert_eq!(Topology::all_for(&ring1).len(), 2);

        // TwoSegments and AllButOne collapse onto the one- and two-segment kinds.
        let ring2 = harness_ring(RingGeometry::default(), 2).unwrap();
        assert_eq!(Topology::all_for(&ring2).len(), 4);

        let ring6 = harness_ring(RingGeometry::default(), 6).unwrap();
        assert_eq!(Topology::all_for(&ring6).len(), 6);
    }

    #[test]
    fn samples_have_the_requested_shape() {
        let ring = harness_ring(RingGeometry::default(), 6).unwrap();
        let mut rng = seeded_rng(7);
        for topo in Topology::all_for(&ring) {
            for _ in 0..200 {
                let range = topo.sample(&ring, &mut rng).unwrap();
                let s = range.start_seg.unwrap().ordinal() as usize;
                let e = range.end_seg.unwrap().ordinal() as usize;
                let k = topo.span.segments(6);
                assert_eq!((s + k - 1) % 6, e, "{topo:?}");
                if k == 1 {
                    assert_eq!(topo.wrapped, range.end_idx < range.start_idx, "{topo:?}");
                } else {
                    assert_eq!(topo.wrapped, e < s, "{topo:?}");
                }
            }
        }
    }
}
