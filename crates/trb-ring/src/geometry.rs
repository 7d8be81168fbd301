use crate::error::{Result, RingError};

/// Size of a single TRB in bytes.
pub const TRB_LEN: u32 = 16;

/// TRBs per segment used by the Linux xHCI driver (one 4 KiB page).
pub const TRBS_PER_SEGMENT: u32 = 256;

/// Upper bound on TRBs per segment.
///
/// xHCI segments are limited to 64 KiB and, for transfer rings, may not cross a 64 KiB boundary,
/// so no real ring gets anywhere near this.
pub const MAX_TRBS_PER_SEGMENT: u32 = 1 << 16;

/// Shape shared by every segment of a ring.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RingGeometry {
    trbs_per_segment: u32,
    trb_len: u32,
}

impl RingGeometry {
    pub fn new(trbs_per_segment: u32, trb_len: u32) -> Result<Self> {
        if trbs_per_segment == 0 {
            return Err(RingError::ZeroTrbsPerSegment);
        }
        if trb_len == 0 {
            return Err(RingError::ZeroTrbLen);
        }
        if trbs_per_segment > MAX_TRBS_PER_SEGMENT {
            return Err(RingError::TooManyTrbsPerSegment {
                count: trbs_per_segment,
                max: MAX_TRBS_PER_SEGMENT,
            });
        }
        // `u32 * u32` always fits in `u64`, but the byte length is also used as an in-memory
        // allocation size.
        let len = u64::from(trbs_per_segment) * u64::from(trb_len);
        if usize::try_from(len).is_err() {
            return Err(RingError::SegmentLenOverflow {
                trbs_per_segment,
                trb_len,
            });
        }
        Ok(Self {
            trbs_per_segment,
            trb_len,
        })
    }

    #[inline]
    pub const fn trbs_per_segment(&self) -> u32 {
        self.trbs_per_segment
    }

    #[inline]
    pub const fn trb_len(&self) -> u32 {
        self.trb_len
    }

    /// Byte length of one segment's TRB array.
    #[inline]
    pub const fn segment_len_bytes(&self) -> u64 {
        self.trbs_per_segment as u64 * self.trb_len as u64
    }
}

impl Default for RingGeometry {
    fn default() -> Self {
        Self {
            trbs_per_segment: TRBS_PER_SEGMENT,
            trb_len: TRB_LEN,
        }
    }
}
