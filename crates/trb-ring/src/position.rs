use crate::geometry::RingGeometry;

/// A TRB position on the ring's total order.
///
/// Only meaningful for comparing positions of the same ring; it is not an address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LinearPos(u128);

impl LinearPos {
    #[inline]
    pub const fn get(self) -> u128 {
        self.0
    }

    /// The same slot, one full lap later.
    #[inline]
    pub(crate) const fn add_lap(self, span: u128) -> Self {
        Self(self.0 + span)
    }
}

/// Maps `(segment ordinal, TRB index)` onto [`LinearPos`].
///
/// Encodes positions as `(ordinal << shift) + index` where `shift` is the smallest width that holds
/// every TRB index. Arithmetic is done in `u128`, so with ordinals and indices bounded by `u32`
/// there is headroom for a full extra lap without overflow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Linearizer {
    shift: u32,
    segment_count: u32,
}

impl Linearizer {
    pub fn for_geometry(segment_count: u32, geometry: RingGeometry) -> Self {
        Self {
            shift: geometry.trbs_per_segment().next_power_of_two().trailing_zeros(),
            segment_count,
        }
    }

    #[inline]
    pub const fn shift(&self) -> u32 {
        self.shift
    }

    #[inline]
    pub const fn linearize(&self, ordinal: u32, index: u32) -> LinearPos {
        LinearPos(((ordinal as u128) << self.shift) + index as u128)
    }

    /// Distance covered by one full trip around the ring.
    #[inline]
    pub const fn ring_span(&self) -> u128 {
        (self.segment_count as u128) << self.shift
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shift_covers_every_index() {
        let lin = |tps| Linearizer::for_geometry(1, RingGeometry::new(tps, 16).unwrap());
        assert_eq!(lin(1).shift(), 0);
        assert_eq!(lin(2).shift(), 1);
        assert_eq!(lin(255).shift(), 8);
        assert_eq!(lin(256).shift(), 8);
        assert_eq!(lin(257).shift(), 9);
    }

    #[test]
    fn positions_increase_with_ordinal_then_index() {
        let lin = Linearizer::for_geometry(6, RingGeometry::default());
        assert!(lin.linearize(0, 255) < lin.linearize(1, 0));
        assert!(lin.linearize(1, 0) < lin.linearize(1, 1));
        assert_eq!(lin.linearize(2, 5).get(), (2 << 8) + 5);
        assert_eq!(lin.ring_span(), 6 << 8);
    }

    #[test]
    fn lap_is_past_every_real_position() {
        let lin = Linearizer::for_geometry(3, RingGeometry::new(200, 16).unwrap());
        let last = lin.linearize(2, 199);
        let first_next_lap = lin.linearize(0, 0).add_lap(lin.ring_span());
        assert!(last < first_next_lap);
    }

    #[test]
    fn extreme_inputs_do_not_overflow() {
        let lin = Linearizer::for_geometry(u32::MAX, RingGeometry::new(1 << 16, 1).unwrap());
        let pos = lin.linearize(u32::MAX, u32::MAX);
        assert!(pos.add_lap(lin.ring_span()) > pos);
    }
}
