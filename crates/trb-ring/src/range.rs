//! TD span membership: does a completion address fall between a TD's first and last TRB?

use crate::error::LookupError;
use crate::ring::{Ring, SegmentId, TrbRef};

/// The span of TRBs making up one transfer descriptor.
///
/// Both ends are inclusive. The span follows ring order from `start` to `end`, so an `end` that
/// precedes `start` describes a TD that wraps past the last segment. A `None` segment stands for a
/// missing reference and never matches.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RangeDescriptor {
    pub start_seg: Option<SegmentId>,
    pub start_idx: u32,
    pub end_seg: Option<SegmentId>,
    pub end_idx: u32,
}

impl RangeDescriptor {
    pub const fn new(start: TrbRef, end: TrbRef) -> Self {
        Self {
            start_seg: Some(start.seg),
            start_idx: start.index,
            end_seg: Some(end.seg),
            end_idx: end.index,
        }
    }

    /// A span covering exactly one TRB.
    pub const fn single(trb: TrbRef) -> Self {
        Self::new(trb, trb)
    }
}

/// Something that can answer "which segment of this span holds `dma`?".
///
/// The crate's own predicate is [`Linearized`]; the [`crate::reference`] evaluators implement the
/// same contract independently so they can be compared against it.
pub trait RangeEvaluator: Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, ring: &Ring, range: &RangeDescriptor, dma: u64) -> Option<SegmentId>;
}

/// The canonical evaluator: resolve once, then a single comparison on linearized positions.
#[derive(Clone, Copy, Debug, Default)]
pub struct Linearized;

impl RangeEvaluator for Linearized {
    fn name(&self) -> &'static str {
        "linearized"
    }

    #[inline]
    fn evaluate(&self, ring: &Ring, range: &RangeDescriptor, dma: u64) -> Option<SegmentId> {
        ring.dma_in_range(range, dma)
    }
}

/// Free-function form of [`Ring::dma_in_range`].
#[inline]
pub fn dma_in_range(ring: &Ring, range: &RangeDescriptor, dma: u64) -> Option<SegmentId> {
    ring.dma_in_range(range, dma)
}

impl Ring {
    /// Return the segment holding `dma` if it lies within `range`.
    ///
    /// Every invalid input - missing or foreign segment, out-of-range TRB index, address outside
    /// the ring - is reported as `None`, the same as an address that is genuinely outside the span.
    pub fn dma_in_range(&self, range: &RangeDescriptor, dma: u64) -> Option<SegmentId> {
        match self.classify(range, dma) {
            Ok(seg) => Some(seg),
            Err(err) => {
                tracing::trace!(dma, %err, "DMA address not in TD span");
                None
            }
        }
    }

    /// Like [`Ring::dma_in_range`], but says why an address did not match.
    pub fn classify(&self, range: &RangeDescriptor, dma: u64) -> Result<SegmentId, LookupError> {
        let start = self.checked_trb(range.start_seg, range.start_idx)?;
        let end = self.checked_trb(range.end_seg, range.end_idx)?;

        let found = self.resolve(Some(start.seg), dma)?;

        let lin = self.linearizer();
        let span = lin.ring_span();
        let start_pos = lin.linearize(start.seg.ordinal(), start.index);
        let mut end_pos = lin.linearize(end.seg.ordinal(), end.index);
        let mut val_pos = lin.linearize(found.seg.ordinal(), found.index);

        // Unroll a wrapped span onto a second lap so that it becomes a plain interval, then move
        // anything that sits before the start onto that lap too.
        if end_pos < start_pos {
            end_pos = end_pos.add_lap(span);
        }
        if val_pos < start_pos {
            val_pos = val_pos.add_lap(span);
        }

        if start_pos <= val_pos && val_pos <= end_pos {
            Ok(found.seg)
        } else {
            Err(LookupError::OutsideRange)
        }
    }

    fn checked_trb(&self, seg: Option<SegmentId>, index: u32) -> Result<TrbRef, LookupError> {
        let seg = seg.ok_or(LookupError::NullSegment)?;
        if !self.contains(seg) {
            return Err(LookupError::ForeignSegment);
        }
        let trbs_per_segment = self.geometry().trbs_per_segment();
        if index >= trbs_per_segment {
            return Err(LookupError::IndexOutOfRange {
                index,
                trbs_per_segment,
            });
        }
        Ok(TrbRef::new(seg, index))
    }
}
