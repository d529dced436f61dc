//! Arena positions of joints and links.

use core::fmt;
use core::num::NonZeroU32;

/// Position of a joint or link in the graph's internal order.
///
/// Stored off by one so that `Option<Id>` costs nothing extra.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    pub fn from_index(index: u32) -> Self {
        match NonZeroU32::new(index.wrapping_add(1)) {
            Some(raw) => Self(raw),
            None => Self(NonZeroU32::MAX),
        }
    }

    pub fn from_usize(position: usize) -> Self {
        Self::from_index(u32::try_from(position).unwrap_or(u32::MAX - 1))
    }

    pub fn index(self) -> u32 {
        self.0.get() - 1
    }

    /// Position usable for slice indexing.
    pub fn ix(self) -> usize {
        self.index() as usize
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index())
    }
}

pub type JointId = Id;
pub type LinkId = Id;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positions_survive_the_offset() {
        for pos in [0_usize, 3, 17, 65_535] {
            assert_eq!(Id::from_usize(pos).ix(), pos);
        }
        assert_eq!(Id::from_index(4).to_string(), "4");
    }

    #[test]
    fn ids_sort_by_position() {
        let mut ids = vec![Id::from_usize(2), Id::from_usize(0), Id::from_usize(1)];
        ids.sort();
        assert_eq!(ids.iter().map(|id| id.ix()).collect::<Vec<_>>(), [0, 1, 2]);
        assert_eq!(size_of::<Option<Id>>(), size_of::<Id>());
    }
}
