//! Mapping DMA addresses reported by the controller back to TRB positions.

use crate::error::LookupError;
use crate::ring::{Ring, SegmentId, TrbRef};

impl Ring {
    /// Find the TRB that contains `dma`, searching forward from `entry`.
    ///
    /// Visits each segment at most once. Addresses inside a segment but not on a TRB boundary round
    /// down to the containing TRB; alignment is left for the caller to judge.
    pub fn resolve(&self, entry: Option<SegmentId>, dma: u64) -> Result<TrbRef, LookupError> {
        let entry = entry.ok_or(LookupError::NullSegment)?;
        if !self.contains(entry) {
            return Err(LookupError::ForeignSegment);
        }

        let trb_len = u64::from(self.geometry().trb_len());
        let mut cur = entry;
        for _ in 0..self.segment_count() {
            let Some(seg) = self.segment(cur) else {
                break;
            };
            if seg.contains_dma(dma) {
                let index = (dma - seg.base()) / trb_len;
                return Ok(TrbRef::new(cur, index as u32));
            }
            cur = self.next_unchecked(cur);
        }
        Err(LookupError::Unresolvable { dma })
    }
}
