//! Aggregate visibility mask

/// Aggregate visibility mask (4 bits)
///
/// Derived purely from the per-peer visibility map and the live roster.
/// With zero live peers the mask is all-zero: none of the four
/// predicates hold.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AggregateMask(pub u8);

impl AggregateMask {
    pub const NONE: AggregateMask = AggregateMask(0);

    // Mask bits
    pub const ALL_VISIBLE: u8 = 0b0000_0001;
    pub const ALL_HIDDEN: u8 = 0b0000_0010;
    pub const ANY_VISIBLE: u8 = 0b0000_0100;
    pub const ANY_HIDDEN: u8 = 0b0000_1000;

    #[inline]
    pub fn new(bits: u8) -> Self {
        AggregateMask(bits)
    }

    /// Derive the mask from visible/total counts over the live roster.
    pub fn compute(visible: usize, total: usize) -> Self {
        if total == 0 {
            return AggregateMask::NONE;
        }

        let mut bits = 0;
        if visible == total {
            bits |= Self::ALL_VISIBLE;
        }
        if visible == 0 {
            bits |= Self::ALL_HIDDEN;
        }
        if visible > 0 {
            bits |= Self::ANY_VISIBLE;
        }
        if visible < total {
            bits |= Self::ANY_HIDDEN;
        }
        AggregateMask(bits)
    }

    /// Bits set in `self` that were clear in `previous`.
    #[inline]
    pub fn rising_edges(self, previous: AggregateMask) -> AggregateMask {
        AggregateMask(self.0 & !previous.0)
    }

    #[inline]
    pub fn has(self, bits: u8) -> bool {
        self.0 & bits != 0
    }

    #[inline]
    pub fn is_all_visible(self) -> bool {
        self.has(Self::ALL_VISIBLE)
    }

    #[inline]
    pub fn is_all_hidden(self) -> bool {
        self.has(Self::ALL_HIDDEN)
    }

    #[inline]
    pub fn is_any_visible(self) -> bool {
        self.has(Self::ANY_VISIBLE)
    }

    #[inline]
    pub fn is_any_hidden(self) -> bool {
        self.has(Self::ANY_HIDDEN)
    }
}

impl From<u8> for AggregateMask {
    fn from(bits: u8) -> Self {
        AggregateMask(bits)
    }
}

impl From<AggregateMask> for u8 {
    fn from(mask: AggregateMask) -> Self {
        mask.0
    }
}

/// The four aggregate predicates, as a plain read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Aggregates {
    pub all_visible: bool,
    pub all_hidden: bool,
    pub any_visible: bool,
    pub any_hidden: bool,
}

impl From<AggregateMask> for Aggregates {
    fn from(mask: AggregateMask) -> Self {
        Aggregates {
            all_visible: mask.is_all_visible(),
            all_hidden: mask.is_all_hidden(),
            any_visible: mask.is_any_visible(),
            any_hidden: mask.is_any_hidden(),
        }
    }
}
