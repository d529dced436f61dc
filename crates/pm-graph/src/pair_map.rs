//! Sparse joint-pair maps.
//!
//! Values are keyed by the local indices of two joints on the same link,
//! packed as `n * i + j` where `n` is the link's joint count. Symmetric
//! quantities (lengths) are stored once under `i < j`. Directed quantities
//! (signed distance to a slide line) may be stored under either order; a
//! lookup in the missing direction returns the negated reverse entry.

use std::collections::HashMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairMap {
    n: usize,
    values: HashMap<usize, f64>,
}

impl PairMap {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            values: HashMap::new(),
        }
    }

    fn key(&self, i: usize, j: usize) -> usize {
        self.n * i + j
    }

    /// Store under the canonical order (`min`, `max`).
    pub fn insert_symmetric(&mut self, i: usize, j: usize, value: f64) {
        let (a, b) = if i < j { (i, j) } else { (j, i) };
        let key = self.key(a, b);
        self.values.insert(key, value);
    }

    /// Store under exactly the given order.
    pub fn insert_directed(&mut self, i: usize, j: usize, value: f64) {
        let key = self.key(i, j);
        self.values.insert(key, value);
    }

    /// Order-independent lookup for symmetric entries.
    pub fn symmetric(&self, i: usize, j: usize) -> Option<f64> {
        if i == j {
            return Some(0.0);
        }
        let (a, b) = if i < j { (i, j) } else { (j, i) };
        self.values.get(&self.key(a, b)).copied()
    }

    /// Exact-order lookup.
    pub fn directed(&self, i: usize, j: usize) -> Option<f64> {
        if i == j {
            return Some(0.0);
        }
        self.values.get(&self.key(i, j)).copied()
    }

    /// Exact-order lookup, falling back to the negated reverse entry.
    pub fn signed(&self, i: usize, j: usize) -> Option<f64> {
        self.directed(i, j)
            .or_else(|| self.values.get(&self.key(j, i)).map(|v| -v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.values.values().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symmetric_is_order_free() {
        let mut m = PairMap::new(4);
        m.insert_symmetric(3, 1, 2.5);
        assert_eq!(m.symmetric(1, 3), Some(2.5));
        assert_eq!(m.symmetric(3, 1), Some(2.5));
        assert_eq!(m.directed(1, 3), Some(2.5));
        assert_eq!(m.directed(3, 1), None);
        assert_eq!(m.symmetric(2, 2), Some(0.0));
        assert_eq!(m.symmetric(0, 2), None);
    }

    #[test]
    fn signed_flips_on_swap() {
        let mut m = PairMap::new(3);
        m.insert_directed(2, 0, -1.25);
        assert_eq!(m.signed(2, 0), Some(-1.25));
        assert_eq!(m.signed(0, 2), Some(1.25));
        assert_eq!(m.signed(0, 1), None);
    }
}
