use thiserror::Error;

pub type Result<T> = std::result::Result<T, RingError>;

/// Errors raised while describing or building a [`crate::Ring`].
///
/// Lookups never produce these; they only come out of [`crate::RingGeometry::new`] and
/// [`crate::RingBuilder::build`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RingError {
    #[error("segments must hold at least one TRB")]
    ZeroTrbsPerSegment,

    #[error("TRB length must be non-zero")]
    ZeroTrbLen,

    #[error("{count} TRBs per segment exceeds the limit of {max}")]
    TooManyTrbsPerSegment { count: u32, max: u32 },

    #[error("segment length overflows: {trbs_per_segment} TRBs of {trb_len} bytes")]
    SegmentLenOverflow { trbs_per_segment: u32, trb_len: u32 },

    #[error("a ring needs at least one segment")]
    NoSegments,

    #[error("{count} segments exceeds the limit of {max}")]
    TooManySegments { count: usize, max: usize },

    #[error("segment {ordinal} has a null DMA base")]
    NullBase { ordinal: u32 },

    #[error("segment {ordinal} base {base:#x} is not aligned to the {trb_len}-byte TRB length")]
    UnalignedBase { ordinal: u32, base: u64, trb_len: u32 },

    #[error("segment {ordinal} at {base:#x} runs past the end of the address space")]
    AddressOverflow { ordinal: u32, base: u64 },

    #[error("segments {first} and {second} overlap")]
    OverlappingSegments { first: u32, second: u32 },

    #[error("segment stride {stride:#x} is smaller than the segment length {segment_len:#x}")]
    StrideTooSmall { stride: u64, segment_len: u64 },
}

/// Why a lookup produced no segment.
///
/// The membership predicate [`crate::Ring::dma_in_range`] folds every variant into `None`; the
/// distinction only matters for diagnostics.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("segment reference is missing")]
    NullSegment,

    #[error("segment handle belongs to a different ring")]
    ForeignSegment,

    #[error("TRB index {index} is outside a {trbs_per_segment}-TRB segment")]
    IndexOutOfRange { index: u32, trbs_per_segment: u32 },

    #[error("DMA address {dma:#x} is not inside any ring segment")]
    Unresolvable { dma: u64 },

    #[error("DMA address is inside the ring but outside the requested span")]
    OutsideRange,
}
