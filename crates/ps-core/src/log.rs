//! Verbosity handed to constructors at load time.

use std::ops::{BitOr, BitOrAssign};

/// Bitmask of what a component may report through `tracing`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct DebugLevel(u8);

impl DebugLevel {
    pub const NONE: Self = Self(0);
    /// Parameter dump after load.
    pub const STANDARD: Self = Self(1);
    /// Construction and destruction of objects.
    pub const INSTANTIATION: Self = Self(2);
    /// Per-tick state changes.
    pub const RUNTIME: Self = Self(4);
    /// Sanity checks on computed values.
    pub const SANITY: Self = Self(16);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn from_bits(bits: u8) -> Self {
        Self(bits)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }
}

impl BitOr for DebugLevel {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for DebugLevel {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Context passed to every configuration-driven constructor.
#[derive(Clone, Debug, Default)]
pub struct LoadContext {
    pub debug: DebugLevel,
}

impl LoadContext {
    pub fn new(debug: DebugLevel) -> Self {
        Self { debug }
    }

    /// True when load-time parameter dumps are requested.
    pub fn verbose(&self) -> bool {
        self.debug.contains(DebugLevel::STANDARD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_operations() {
        let lvl = DebugLevel::STANDARD | DebugLevel::RUNTIME;
        assert!(lvl.contains(DebugLevel::STANDARD));
        assert!(lvl.contains(DebugLevel::RUNTIME));
        assert!(!lvl.contains(DebugLevel::SANITY));
        assert!(!lvl.contains(DebugLevel::NONE));
        assert_eq!(lvl.bits(), 5);
    }

    #[test]
    fn context_verbosity() {
        assert!(!LoadContext::default().verbose());
        assert!(LoadContext::new(DebugLevel::STANDARD).verbose());
    }
}
