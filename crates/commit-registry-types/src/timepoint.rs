use serde::{Deserialize, Serialize};

/// Ordering value assigned to a commitment when it is accepted.
///
/// Totally ordered: tick → seq. `tick` is the host's coarse time hint as seen by
/// the ordering clock; `seq` breaks ties between acceptances within one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timepoint {
    pub tick: u64,
    pub seq: u32,
}

impl Timepoint {
    pub const fn new(tick: u64, seq: u32) -> Self {
        Self { tick, seq }
    }

    /// Pack into a single unsigned integer preserving the ordering.
    pub const fn as_u128(&self) -> u128 {
        ((self.tick as u128) << 32) | self.seq as u128
    }

    /// Inverse of [`Timepoint::as_u128`]. Returns `None` if the value does not fit.
    pub fn from_u128(value: u128) -> Option<Self> {
        let tick = u64::try_from(value >> 32).ok()?;
        Some(Self {
            tick,
            seq: value as u32,
        })
    }
}

impl From<Timepoint> for u128 {
    fn from(tp: Timepoint) -> Self {
        tp.as_u128()
    }
}

impl std::fmt::Display for Timepoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.tick, self.seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_ordering() {
        let a = Timepoint::new(100, 0);
        let b = Timepoint::new(100, 1);
        let c = Timepoint::new(101, 0);
        assert!(a < b);
        assert!(b < c);
        assert!(a.as_u128() < b.as_u128());
        assert!(b.as_u128() < c.as_u128());
    }

    #[test]
    fn packing_is_reversible() {
        let tp = Timepoint::new(u64::MAX, 42);
        assert_eq!(Timepoint::from_u128(tp.as_u128()), Some(tp));
        assert_eq!(Timepoint::from_u128(u128::MAX), None);
    }

    #[test]
    fn display_format() {
        assert_eq!(format!("{}", Timepoint::new(1000, 5)), "1000.5");
    }
}
