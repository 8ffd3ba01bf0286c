use core::fmt;
use core::ops::{BitOr, BitOrAssign};

/// Bitmask of conditions raised during `init` or `evolve`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct SolverStatus(u8);

impl SolverStatus {
    pub const NO_ERROR: Self = Self(0);
    /// A result was NaN or left the range `±1e30`.
    pub const MATH_ERROR: Self = Self(1);
    /// The interval was empty or reversed.
    pub const FAULTY_INIT: Self = Self(2);

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for SolverStatus {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for SolverStatus {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_ok() {
            return write!(f, "ok");
        }
        let mut names = Vec::new();
        if self.contains(Self::MATH_ERROR) {
            names.push("math error");
        }
        if self.contains(Self::FAULTY_INIT) {
            names.push("faulty init");
        }
        write!(f, "{}", names.join(" | "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_accumulate() {
        let mut s = SolverStatus::NO_ERROR;
        assert!(s.is_ok());
        s |= SolverStatus::MATH_ERROR;
        s |= SolverStatus::FAULTY_INIT;
        assert!(s.contains(SolverStatus::MATH_ERROR));
        assert!(s.contains(SolverStatus::FAULTY_INIT));
        assert_eq!(s.to_string(), "math error | faulty init");
    }
}
