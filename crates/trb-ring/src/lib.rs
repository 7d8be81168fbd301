//! Range membership over segmented xHCI TRB rings.
//!
//! xHCI transfer rings are circular chains of fixed-capacity segments, each holding a contiguous
//! array of 16-byte Transfer Request Blocks. When the controller reports a completion it gives a
//! DMA address, and the driver has to decide whether that address lies inside the span of TRBs
//! belonging to an in-flight transfer descriptor (TD). The span may sit inside one segment, cover
//! several, or wrap past the ring's last segment back to the first.
//!
//! The crate models the ring as an index-addressed list of segments ([`Ring`]) whose successor
//! relation is `(ordinal + 1) % segment_count`, and answers membership with a pure predicate:
//!
//! - [`Ring::resolve`] maps a raw DMA address back to a `(segment, index)` pair.
//! - [`Linearizer`] orders `(segment, index)` pairs on a single total order.
//! - [`Ring::dma_in_range`] combines both into one normalized comparison that handles wrapped
//!   spans without case analysis.
//!
//! DMA addresses come from the device and are untrusted: every invalid input (missing or foreign
//! segment handle, out-of-range TRB index, address outside the ring) yields `None` rather than a
//! panic. [`Ring::classify`] exposes the reason when a caller wants to log it.
//!
//! The [`reference`] evaluators and the `harness` module (feature `harness`) keep independent
//! implementations around to cross-check the canonical predicate and to time it.

#![forbid(unsafe_code)]

mod error;
mod geometry;
mod position;
mod range;
mod resolve;
mod ring;

pub mod reference;

#[cfg(feature = "harness")]
pub mod harness;

pub use error::{LookupError, Result, RingError};
pub use geometry::{RingGeometry, MAX_TRBS_PER_SEGMENT, TRBS_PER_SEGMENT, TRB_LEN};
pub use position::{LinearPos, Linearizer};
pub use range::{dma_in_range, Linearized, RangeDescriptor, RangeEvaluator};
pub use ring::{Ring, RingBuilder, Segment, SegmentId, TrbRef, MAX_SEGMENTS};
