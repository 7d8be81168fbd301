//! Segment store: builds the circular chain of TRB segments and answers address queries on it.

use core::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Result, RingError};
use crate::geometry::RingGeometry;
use crate::position::Linearizer;

/// Upper bound on segments in one ring.
///
/// Lookups walk at most this many segments, so it also caps the work an untrusted DMA address can
/// cause.
pub const MAX_SEGMENTS: usize = 4096;

static NEXT_RING_ID: AtomicU64 = AtomicU64::new(1);

fn next_ring_id() -> u64 {
    NEXT_RING_ID.fetch_add(1, Ordering::Relaxed)
}

/// Handle to one segment of a specific [`Ring`].
///
/// Handles are only created by the ring they refer to, so a handle can never name a segment that
/// does not exist. A handle presented to a different ring is rejected as foreign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SegmentId {
    ring: u64,
    ordinal: u32,
}

impl SegmentId {
    /// Position of the segment in ring order, starting at 0.
    #[inline]
    pub const fn ordinal(&self) -> u32 {
        self.ordinal
    }
}

/// A TRB position: a segment plus the index of a TRB inside it.
///
/// The index is not validated on construction; consumers check it against the ring geometry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TrbRef {
    pub seg: SegmentId,
    pub index: u32,
}

impl TrbRef {
    pub const fn new(seg: SegmentId, index: u32) -> Self {
        Self { seg, index }
    }
}

/// One fixed-capacity block of TRBs at a known DMA base.
#[derive(Debug)]
pub struct Segment {
    ordinal: u32,
    base: u64,
    trb_len: u32,
    trbs: Box<[u8]>,
}

impl Segment {
    #[inline]
    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    /// DMA address of TRB 0.
    #[inline]
    pub fn base(&self) -> u64 {
        self.base
    }

    #[inline]
    pub fn len_bytes(&self) -> u64 {
        self.trbs.len() as u64
    }

    /// Whether `dma` falls inside `[base, base + len_bytes)`.
    #[inline]
    pub fn contains_dma(&self, dma: u64) -> bool {
        // Unsigned wraparound turns addresses below `base` into huge offsets.
        dma.wrapping_sub(self.base) < self.len_bytes()
    }

    /// Raw bytes of TRB `index`.
    pub fn trb(&self, index: u32) -> Option<&[u8]> {
        let (start, end) = self.trb_bounds(index)?;
        self.trbs.get(start..end)
    }

    fn trb_bounds(&self, index: u32) -> Option<(usize, usize)> {
        let len = self.trb_len as usize;
        let start = (index as usize).checked_mul(len)?;
        let end = start.checked_add(len)?;
        (end <= self.trbs.len()).then_some((start, end))
    }
}

/// Collects segment bases and links them into a [`Ring`].
#[derive(Clone, Debug)]
pub struct RingBuilder {
    geometry: RingGeometry,
    bases: Vec<u64>,
}

impl RingBuilder {
    pub fn new(geometry: RingGeometry) -> Self {
        Self {
            geometry,
            bases: Vec::new(),
        }
    }

    /// Append a segment whose TRB 0 lives at DMA address `base`.
    ///
    /// Segments are linked in the order they are added; the last one links back to the first.
    pub fn segment(mut self, base: u64) -> Self {
        self.bases.push(base);
        self
    }

    pub fn build(self) -> Result<Ring> {
        let RingBuilder { geometry, bases } = self;
        if bases.is_empty() {
            return Err(RingError::NoSegments);
        }
        if bases.len() > MAX_SEGMENTS {
            return Err(RingError::TooManySegments {
                count: bases.len(),
                max: MAX_SEGMENTS,
            });
        }

        let seg_len = geometry.segment_len_bytes();
        let trb_len = geometry.trb_len();
        for (ordinal, &base) in (0u32..).zip(&bases) {
            if base == 0 {
                return Err(RingError::NullBase { ordinal });
            }
            if base % u64::from(trb_len) != 0 {
                return Err(RingError::UnalignedBase {
                    ordinal,
                    base,
                    trb_len,
                });
            }
            // The last TRB ends at `base + seg_len`, which must itself be representable.
            if base.checked_add(seg_len).is_none() {
                return Err(RingError::AddressOverflow { ordinal, base });
            }
        }

        let mut by_base: Vec<(u64, u32)> = (0u32..).zip(&bases).map(|(o, &b)| (b, o)).collect();
        by_base.sort_unstable();
        for pair in by_base.windows(2) {
            let (lo_base, lo_ord) = pair[0];
            let (hi_base, hi_ord) = pair[1];
            if lo_base + seg_len > hi_base {
                return Err(RingError::OverlappingSegments {
                    first: lo_ord.min(hi_ord),
                    second: lo_ord.max(hi_ord),
                });
            }
        }

        // Validated by `RingGeometry::new`.
        let storage_len = seg_len as usize;
        let segments = (0u32..)
            .zip(bases)
            .map(|(ordinal, base)| Segment {
                ordinal,
                base,
                trb_len,
                trbs: vec![0u8; storage_len].into_boxed_slice(),
            })
            .collect::<Vec<_>>();

        let ring = Ring {
            id: next_ring_id(),
            geometry,
            segments,
        };
        tracing::debug!(
            ring = ring.id,
            segments = ring.segments.len(),
            trbs_per_segment = geometry.trbs_per_segment(),
            trb_len,
            "built TRB ring"
        );
        Ok(ring)
    }
}

/// A circular chain of TRB segments.
///
/// Segment `i` links to segment `(i + 1) % segment_count`, so every segment is reachable from every
/// other and the chain has no shorter sub-cycle. The ring is immutable through `&Ring`; any number
/// of lookups may share it across threads.
#[derive(Debug)]
pub struct Ring {
    id: u64,
    geometry: RingGeometry,
    segments: Vec<Segment>,
}

impl Ring {
    pub fn builder(geometry: RingGeometry) -> RingBuilder {
        RingBuilder::new(geometry)
    }

    /// Build `count` segments at `first_base + i * stride`.
    pub fn contiguous(
        geometry: RingGeometry,
        count: usize,
        first_base: u64,
        stride: u64,
    ) -> Result<Self> {
        let segment_len = geometry.segment_len_bytes();
        if stride < segment_len {
            return Err(RingError::StrideTooSmall {
                stride,
                segment_len,
            });
        }
        if count > MAX_SEGMENTS {
            return Err(RingError::TooManySegments {
                count,
                max: MAX_SEGMENTS,
            });
        }
        let mut builder = RingBuilder::new(geometry);
        for i in 0..count as u64 {
            let base = i
                .checked_mul(stride)
                .and_then(|off| first_base.checked_add(off))
                .ok_or(RingError::AddressOverflow {
                    ordinal: i as u32,
                    base: first_base,
                })?;
            builder = builder.segment(base);
        }
        builder.build()
    }

    #[inline]
    pub fn geometry(&self) -> RingGeometry {
        self.geometry
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// The [`Linearizer`] for this ring's shape.
    #[inline]
    pub fn linearizer(&self) -> Linearizer {
        // `build` caps the segment count at `MAX_SEGMENTS`, so it fits in a `u32`.
        Linearizer::for_geometry(self.segments.len() as u32, self.geometry)
    }

    pub fn segment_id(&self, ordinal: u32) -> Option<SegmentId> {
        ((ordinal as usize) < self.segments.len()).then_some(SegmentId {
            ring: self.id,
            ordinal,
        })
    }

    /// Handles for every segment, in ring order.
    pub fn segment_ids(&self) -> impl Iterator<Item = SegmentId> + '_ {
        (0..self.segments.len() as u32).map(move |ordinal| SegmentId {
            ring: self.id,
            ordinal,
        })
    }

    /// Whether `id` was handed out by this ring.
    #[inline]
    pub fn contains(&self, id: SegmentId) -> bool {
        id.ring == self.id && (id.ordinal as usize) < self.segments.len()
    }

    pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
        if id.ring != self.id {
            return None;
        }
        self.segments.get(id.ordinal as usize)
    }

    /// The segment the link at the end of `id` points to.
    pub fn next(&self, id: SegmentId) -> Option<SegmentId> {
        self.contains(id).then(|| self.next_unchecked(id))
    }

    #[inline]
    pub(crate) fn next_unchecked(&self, id: SegmentId) -> SegmentId {
        let next = id.ordinal as usize + 1;
        SegmentId {
            ring: self.id,
            ordinal: if next == self.segments.len() {
                0
            } else {
                next as u32
            },
        }
    }

    /// DMA address of the TRB at `trb`, or `None` if the segment or index is invalid.
    pub fn trb_dma(&self, trb: TrbRef) -> Option<u64> {
        let seg = self.segment(trb.seg)?;
        if trb.index >= self.geometry.trbs_per_segment() {
            return None;
        }
        Some(seg.base + u64::from(trb.index) * u64::from(self.geometry.trb_len()))
    }

    /// Index of the TRB containing `dma` within the single segment `seg`.
    ///
    /// Addresses that are not TRB-aligned round down to the containing TRB.
    pub fn dma_to_trb(&self, seg: SegmentId, dma: u64) -> Option<u32> {
        let seg = self.segment(seg)?;
        let rel = dma.checked_sub(seg.base)?;
        let index = rel / u64::from(self.geometry.trb_len());
        if index >= u64::from(self.geometry.trbs_per_segment()) {
            return None;
        }
        Some(index as u32)
    }

    /// Mutable access to the bytes of one TRB.
    pub fn trb_mut(&mut self, trb: TrbRef) -> Option<&mut [u8]> {
        if trb.seg.ring != self.id {
            return None;
        }
        let seg = self.segments.get_mut(trb.seg.ordinal as usize)?;
        let (start, end) = seg.trb_bounds(trb.index)?;
        seg.trbs.get_mut(start..end)
    }
}
