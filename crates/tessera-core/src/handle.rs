//! Generational handles packed into a single integer.
//!
//! A [`Handle`] splits a `W`-bit integer into a low *value* field (the slot
//! index) and a high *version* field (the generation counter). The version
//! is bumped every time the slot is recycled, so a handle that outlived its
//! slot is detected by comparing its version against the one stored for the
//! index. Equality always compares the full bit pattern.
//!
//! ```text
//!  W-1            W-V  W-V-1                0
//! ┌──────────────────┬──────────────────────┐
//! │  version (V bits)│  value (W-V bits)    │
//! └──────────────────┴──────────────────────┘
//! ```
//!
//! A value field with every bit set is the tombstone sentinel and is never
//! handed out as an index.

use std::fmt;
use std::hash::Hash;

use crate::error::HandleError;

/// Backing integer for a [`Handle`].
///
/// Implemented for `u16`, `u32` and `u64`. All field arithmetic is done in
/// `u64` and truncated back to the backing width.
pub trait HandleBits: Copy + Eq + Ord + Hash + fmt::Debug + Send + Sync + 'static {
    /// Width of the integer in bits.
    const BITS: u32;

    /// Widen to `u64`.
    fn to_u64(self) -> u64;

    /// Narrow from `u64`, discarding bits above [`BITS`](Self::BITS).
    fn from_u64(bits: u64) -> Self;
}

macro_rules! impl_handle_bits {
    ($($ty:ty),*) => {
        $(
            impl HandleBits for $ty {
                const BITS: u32 = <$ty>::BITS;

                #[inline]
                fn to_u64(self) -> u64 {
                    self as u64
                }

                #[inline]
                fn from_u64(bits: u64) -> Self {
                    bits as $ty
                }
            }
        )*
    };
}

impl_handle_bits!(u16, u32, u64);

/// A generational index packed into one `R`-sized integer with a
/// `V`-bit version field.
///
/// `V = 0` is legal: every handle to a slot then has version 0 and
/// staleness is never detected. Choosing `V >= R::BITS` is rejected at
/// compile time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Handle<R: HandleBits = u32, const V: u32 = 12> {
    bits: R,
}

/// 32-bit handle with a 12-bit version field.
pub type DefaultHandle = Handle<u32, 12>;

impl<R: HandleBits, const V: u32> Handle<R, V> {
    /// Width of the version field.
    pub const VERSION_BITS: u32 = {
        assert!(V < R::BITS, "version field must leave at least one value bit");
        V
    };

    /// Width of the value (index) field.
    pub const VALUE_BITS: u32 = R::BITS - Self::VERSION_BITS;

    const VALUE_MASK: u64 = u64::MAX >> (64 - Self::VALUE_BITS);

    const VERSION_MASK: u64 = if V == 0 { 0 } else { u64::MAX >> (64 - V) };

    /// Largest version the field can hold before wrapping to zero.
    pub const MAX_VERSION: u64 = Self::VERSION_MASK;

    /// Largest index a live handle may carry. One below the tombstone.
    pub const MAX_INDEX: usize = {
        let max = Self::VALUE_MASK - 1;
        if max > usize::MAX as u64 {
            usize::MAX
        } else {
            max as usize
        }
    };

    /// Pack `index` and `version` into a handle.
    ///
    /// Bits of `index` above the value field and bits of `version` above
    /// the version field are silently discarded.
    pub fn new(index: usize, version: u64) -> Self {
        let value = index as u64 & Self::VALUE_MASK;
        Self::from_bits(value | Self::version_part(version))
    }

    /// Pack `index` and `version`, rejecting indices that would truncate
    /// or alias the tombstone.
    pub fn try_new(index: usize, version: u64) -> Result<Self, HandleError> {
        if index > Self::MAX_INDEX {
            return Err(HandleError::IndexOverflow {
                index,
                max: Self::MAX_INDEX,
            });
        }
        Ok(Self::new(index, version))
    }

    /// The tombstone handle: every value bit set, version zero.
    pub fn tombstone() -> Self {
        Self::from_bits(Self::VALUE_MASK)
    }

    /// Reinterpret a raw integer as a handle.
    pub fn from_raw(raw: R) -> Self {
        Self { bits: raw }
    }

    /// The raw packed integer.
    pub fn to_raw(self) -> R {
        self.bits
    }

    /// The slot index.
    #[inline]
    pub fn index(self) -> usize {
        (self.bits.to_u64() & Self::VALUE_MASK) as usize
    }

    /// The generation counter.
    #[inline]
    pub fn version(self) -> u64 {
        if Self::VERSION_BITS == 0 {
            return 0;
        }
        (self.bits.to_u64() >> Self::VALUE_BITS) & Self::VERSION_MASK
    }

    /// Whether every value bit is set.
    #[inline]
    pub fn is_tombstone(self) -> bool {
        self.bits.to_u64() & Self::VALUE_MASK == Self::VALUE_MASK
    }

    /// The same slot one generation later, wrapping to zero on overflow.
    pub fn increment_version(self) -> Self {
        let value = self.bits.to_u64() & Self::VALUE_MASK;
        Self::from_bits(value | Self::version_part(self.version().wrapping_add(1)))
    }

    /// Whether both handles name the same slot, regardless of generation.
    #[inline]
    pub fn same_slot(self, other: Self) -> bool {
        (self.bits.to_u64() ^ other.bits.to_u64()) & Self::VALUE_MASK == 0
    }

    /// Whether the version fields agree. Used to test a handle against
    /// the authoritative handle stored for its slot.
    #[inline]
    pub fn version_matches(self, stored: Self) -> bool {
        self.version() == stored.version()
    }

    #[inline]
    fn from_bits(bits: u64) -> Self {
        Self {
            bits: R::from_u64(bits),
        }
    }

    #[inline]
    fn version_part(version: u64) -> u64 {
        if Self::VERSION_BITS == 0 {
            0
        } else {
            (version & Self::VERSION_MASK) << Self::VALUE_BITS
        }
    }
}

impl<R: HandleBits, const V: u32> Default for Handle<R, V> {
    fn default() -> Self {
        Self::tombstone()
    }
}

impl<R: HandleBits, const V: u32> fmt::Debug for Handle<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tombstone() {
            return f.write_str("Handle(tombstone)");
        }
        f.debug_struct("Handle")
            .field("index", &self.index())
            .field("version", &self.version())
            .finish()
    }
}

impl<R: HandleBits, const V: u32> fmt::Display for Handle<R, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tombstone() {
            return f.write_str("tombstone");
        }
        write!(f, "{}v{}", self.index(), self.version())
    }
}

/// Operations a storage layer needs from a handle type.
///
/// Allocators are generic over this trait so the integer width and
/// version width are fixed at compile time.
pub trait GenerationalHandle: Copy + Eq + Hash + fmt::Debug + fmt::Display {
    /// Largest index a live handle may carry.
    const MAX_INDEX: usize;

    /// Build a handle from its fields, truncating out-of-range bits.
    fn from_parts(index: usize, version: u64) -> Self;

    /// The slot index.
    fn index(self) -> usize;

    /// The generation counter.
    fn version(self) -> u64;

    /// The same slot one generation later.
    fn next_version(self) -> Self;

    /// The sentinel handle that names no slot.
    fn tombstone() -> Self;
}

impl<R: HandleBits, const V: u32> GenerationalHandle for Handle<R, V> {
    const MAX_INDEX: usize = Handle::<R, V>::MAX_INDEX;

    fn from_parts(index: usize, version: u64) -> Self {
        Handle::new(index, version)
    }

    fn index(self) -> usize {
        Handle::index(self)
    }

    fn version(self) -> u64 {
        Handle::version(self)
    }

    fn next_version(self) -> Self {
        self.increment_version()
    }

    fn tombstone() -> Self {
        Handle::tombstone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Small = Handle<u32, 4>;
    type Unversioned = Handle<u32, 0>;

    #[test]
    fn default_layout_is_20_plus_12() {
        assert_eq!(DefaultHandle::VALUE_BITS, 20);
        assert_eq!(DefaultHandle::VERSION_BITS, 12);
        assert_eq!(DefaultHandle::MAX_INDEX, (1 << 20) - 2);
        assert_eq!(DefaultHandle::MAX_VERSION, (1 << 12) - 1);
    }

    #[test]
    fn fields_round_trip() {
        let h = Small::new(1234, 7);
        assert_eq!(h.index(), 1234);
        assert_eq!(h.version(), 7);
        assert_eq!(h.to_raw(), (7 << 28) | 1234);
    }

    #[test]
    fn new_truncates_oversized_fields() {
        let h = Handle::<u16, 4>::new(0x1_0005, 0x13);
        assert_eq!(h.index(), 5);
        assert_eq!(h.version(), 3);
    }

    #[test]
    fn try_new_rejects_tombstone_index() {
        let max = Small::MAX_INDEX;
        assert!(Small::try_new(max, 0).is_ok());
        assert_eq!(
            Small::try_new(max + 1, 0),
            Err(HandleError::IndexOverflow {
                index: max + 1,
                max
            })
        );
    }

    #[test]
    fn tombstone_has_all_value_bits() {
        let t = Small::tombstone();
        assert!(t.is_tombstone());
        assert_eq!(t.index(), (1 << 28) - 1);
        assert_eq!(t.version(), 0);
        assert!(!Small::new(0, 0).is_tombstone());
        assert_eq!(Small::default(), t);
    }

    #[test]
    fn tombstone_with_version_is_still_tombstone() {
        let t = Small::tombstone().increment_version();
        assert!(t.is_tombstone());
        assert_ne!(t, Small::tombstone());
    }

    #[test]
    fn increment_version_wraps() {
        let h = Small::new(9, Small::MAX_VERSION);
        let next = h.increment_version();
        assert_eq!(next.index(), 9);
        assert_eq!(next.version(), 0);
    }

    #[test]
    fn equality_is_bitwise_but_same_slot_ignores_version() {
        let a = Small::new(3, 0);
        let b = Small::new(3, 1);
        assert_ne!(a, b);
        assert!(a.same_slot(b));
        assert!(!a.version_matches(b));
        assert!(!a.same_slot(Small::new(4, 0)));
    }

    #[test]
    fn zero_version_bits_disable_staleness() {
        let h = Unversioned::new(42, 5);
        assert_eq!(h.version(), 0);
        assert_eq!(h.increment_version(), h);
        assert!(h.version_matches(Unversioned::new(42, 0)));
        assert_eq!(Unversioned::VALUE_BITS, 32);
    }

    #[test]
    fn u64_handle_with_zero_version_bits() {
        let h = Handle::<u64, 0>::new(usize::MAX >> 1, 9);
        assert_eq!(h.version(), 0);
        assert_eq!(h.index(), usize::MAX >> 1);
        assert!(Handle::<u64, 0>::tombstone().is_tombstone());
    }

    #[test]
    fn u16_handle_layout() {
        type H = Handle<u16, 6>;
        assert_eq!(H::VALUE_BITS, 10);
        assert_eq!(H::MAX_INDEX, 1022);
        let h = H::new(1022, 63);
        assert_eq!(h.index(), 1022);
        assert_eq!(h.version(), 63);
    }

    #[test]
    fn display_and_debug() {
        let h = Small::new(12, 3);
        assert_eq!(h.to_string(), "12v3");
        assert_eq!(format!("{h:?}"), "Handle { index: 12, version: 3 }");
        assert_eq!(Small::tombstone().to_string(), "tombstone");
    }

    #[test]
    fn trait_view_matches_inherent() {
        fn via_trait<H: GenerationalHandle>(index: usize, version: u64) -> (usize, u64) {
            let h = H::from_parts(index, version).next_version();
            (h.index(), h.version())
        }
        assert_eq!(via_trait::<Small>(5, 2), (5, 3));
        assert_eq!(<Small as GenerationalHandle>::MAX_INDEX, Small::MAX_INDEX);
    }

    #[cfg(not(miri))]
    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn pack_unpack_round_trip(
                index in 0usize..=DefaultHandle::MAX_INDEX,
                version in 0u64..=DefaultHandle::MAX_VERSION,
            ) {
                let h = DefaultHandle::new(index, version);
                prop_assert_eq!(h.index(), index);
                prop_assert_eq!(h.version(), version);
                prop_assert!(!h.is_tombstone());
            }

            #[test]
            fn increment_preserves_slot(
                index in 0usize..=Small::MAX_INDEX,
                version in 0u64..=Small::MAX_VERSION,
            ) {
                let h = Small::new(index, version);
                let next = h.increment_version();
                prop_assert!(next.same_slot(h));
                prop_assert_eq!(next.version(), (version + 1) % (Small::MAX_VERSION + 1));
            }

            #[test]
            fn raw_round_trip(raw in any::<u32>()) {
                let h = DefaultHandle::from_raw(raw);
                prop_assert_eq!(h.to_raw(), raw);
                prop_assert_eq!(DefaultHandle::new(h.index(), h.version()), h);
            }
        }
    }
}
