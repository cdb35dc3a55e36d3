//! Camera Link baud-rate enumeration.
//!
//! Rates are exchanged with the host as single bits of a bitmask, in the
//! order defined by the Camera Link serial API.

use std::fmt;

use crate::error::{Result, TransportError};

/// One of the fixed Camera Link serial speeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BaudRate {
    B9600,
    B19200,
    B38400,
    B57600,
    B115200,
    B230400,
    B460800,
    B921600,
}

impl BaudRate {
    /// All rates, slowest first.
    pub const ALL: [BaudRate; 8] = [
        BaudRate::B9600,
        BaudRate::B19200,
        BaudRate::B38400,
        BaudRate::B57600,
        BaudRate::B115200,
        BaudRate::B230400,
        BaudRate::B460800,
        BaudRate::B921600,
    ];

    /// Speed a freshly powered Camera Link device listens at.
    pub const DEFAULT: BaudRate = BaudRate::B9600;

    /// The single-bit mask value used on the host ABI.
    pub fn mask(self) -> u32 {
        match self {
            BaudRate::B9600 => 0x01,
            BaudRate::B19200 => 0x02,
            BaudRate::B38400 => 0x04,
            BaudRate::B57600 => 0x08,
            BaudRate::B115200 => 0x10,
            BaudRate::B230400 => 0x20,
            BaudRate::B460800 => 0x40,
            BaudRate::B921600 => 0x80,
        }
    }

    /// Line speed in bits per second.
    pub fn bits_per_second(self) -> u32 {
        match self {
            BaudRate::B9600 => 9_600,
            BaudRate::B19200 => 19_200,
            BaudRate::B38400 => 38_400,
            BaudRate::B57600 => 57_600,
            BaudRate::B115200 => 115_200,
            BaudRate::B230400 => 230_400,
            BaudRate::B460800 => 460_800,
            BaudRate::B921600 => 921_600,
        }
    }

    /// Parse a single-bit mask value.
    pub fn from_mask(mask: u32) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|rate| rate.mask() == mask)
            .ok_or(TransportError::InvalidBaudRate(mask))
    }

    /// Parse a line speed in bits per second.
    pub fn from_bits_per_second(bps: u32) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|rate| rate.bits_per_second() == bps)
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.bits_per_second())
    }
}

/// A set of baud rates, stored as the host bitmask.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct BaudRateSet(u32);

impl BaudRateSet {
    /// Build a set from a raw host bitmask. Unknown bits are dropped.
    pub fn from_mask(mask: u32) -> Self {
        let known = BaudRate::ALL
            .iter()
            .fold(0u32, |acc, rate| acc | rate.mask());
        Self(mask & known)
    }

    /// The raw bitmask.
    pub fn mask(self) -> u32 {
        self.0
    }

    pub fn contains(self, rate: BaudRate) -> bool {
        self.0 & rate.mask() != 0
    }

    pub fn insert(&mut self, rate: BaudRate) {
        self.0 |= rate.mask();
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Rates in the set, slowest first.
    pub fn iter(self) -> impl Iterator<Item = BaudRate> {
        BaudRate::ALL
            .into_iter()
            .filter(move |rate| self.contains(*rate))
    }

    /// Fastest rate in the set.
    pub fn fastest(self) -> Option<BaudRate> {
        self.iter().last()
    }
}

impl FromIterator<BaudRate> for BaudRateSet {
    fn from_iter<I: IntoIterator<Item = BaudRate>>(iter: I) -> Self {
        let mut set = BaudRateSet::default();
        for rate in iter {
            set.insert(rate);
        }
        set
    }
}

impl fmt::Display for BaudRateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rates = self
            .iter()
            .map(|rate| rate.to_string())
            .collect::<Vec<_>>()
            .join(",");
        write!(f, "[{rates}]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_are_distinct_powers_of_two() {
        for (idx, rate) in BaudRate::ALL.iter().enumerate() {
            assert_eq!(rate.mask(), 1 << idx);
        }
    }

    #[test]
    fn from_mask_rejects_multi_bit_and_zero() {
        assert_eq!(BaudRate::from_mask(0x10).unwrap(), BaudRate::B115200);
        assert!(matches!(
            BaudRate::from_mask(0x11),
            Err(TransportError::InvalidBaudRate(0x11))
        ));
        assert!(BaudRate::from_mask(0).is_err());
        assert!(BaudRate::from_mask(0x100).is_err());
    }

    #[test]
    fn set_drops_unknown_bits() {
        let set = BaudRateSet::from_mask(0x0000_0111);
        assert_eq!(set.mask(), 0x11);
        assert!(set.contains(BaudRate::B9600));
        assert!(set.contains(BaudRate::B115200));
        assert!(!set.contains(BaudRate::B19200));
        assert_eq!(set.fastest(), Some(BaudRate::B115200));
    }

    #[test]
    fn set_collects_and_displays() {
        let set: BaudRateSet = [BaudRate::B57600, BaudRate::B9600].into_iter().collect();
        assert_eq!(set.to_string(), "[9600,57600]");
        assert_eq!(
            BaudRate::from_bits_per_second(921_600),
            Some(BaudRate::B921600)
        );
        assert_eq!(BaudRate::from_bits_per_second(1_200), None);
    }
}
