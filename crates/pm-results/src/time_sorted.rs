//! Samples kept in ascending time order.
//!
//! The simulator grows the series from time zero in both directions at once:
//! the forward sweep appends near the end and the backward sweep prepends
//! near the beginning, so each insertion only scans a few entries.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::{ResultsError, ResultsResult};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSortedList<T> {
    entries: VecDeque<(f64, T)>,
}

impl<T> Default for TimeSortedList<T> {
    fn default() -> Self {
        Self {
            entries: VecDeque::new(),
        }
    }
}

fn check_time(time: f64) -> ResultsResult<()> {
    if time.is_finite() {
        Ok(())
    } else {
        Err(ResultsError::NonFiniteTime { time })
    }
}

impl<T> TimeSortedList<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert anywhere (binary search).
    pub fn add(&mut self, time: f64, value: T) -> ResultsResult<()> {
        check_time(time)?;
        let at = self.entries.partition_point(|(t, _)| *t < time);
        self.insert_at(at, time, value)
    }

    /// Insert scanning backward from the end; cheap for a growing tail.
    pub fn add_near_end(&mut self, time: f64, value: T) -> ResultsResult<()> {
        check_time(time)?;
        let mut at = self.entries.len();
        while at > 0 && self.entries[at - 1].0 > time {
            at -= 1;
        }
        self.insert_at(at, time, value)
    }

    /// Insert scanning forward from the beginning; cheap for a growing head.
    pub fn add_near_begin(&mut self, time: f64, value: T) -> ResultsResult<()> {
        check_time(time)?;
        let mut at = 0;
        while at < self.entries.len() && self.entries[at].0 < time {
            at += 1;
        }
        self.insert_at(at, time, value)
    }

    fn insert_at(&mut self, at: usize, time: f64, value: T) -> ResultsResult<()> {
        let clash = |i: usize| self.entries.get(i).is_some_and(|(t, _)| *t == time);
        if clash(at) || (at > 0 && clash(at - 1)) {
            return Err(ResultsError::DuplicateTime { time });
        }
        if at == self.entries.len() {
            self.entries.push_back((time, value));
        } else if at == 0 {
            self.entries.push_front((time, value));
        } else {
            self.entries.insert(at, (time, value));
        }
        Ok(())
    }

    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|(t, _)| *t)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (f64, &T)> + '_ {
        self.entries.iter().map(|(t, v)| (*t, v))
    }

    pub fn get(&self, index: usize) -> Option<(f64, &T)> {
        self.entries.get(index).map(|(t, v)| (*t, v))
    }

    pub fn first(&self) -> Option<(f64, &T)> {
        self.get(0)
    }

    pub fn last(&self) -> Option<(f64, &T)> {
        self.entries.back().map(|(t, v)| (*t, v))
    }

    /// Value stored at exactly `time`.
    pub fn at_time(&self, time: f64) -> Option<&T> {
        let i = self.entries.partition_point(|(t, _)| *t < time);
        match self.entries.get(i) {
            Some((t, v)) if *t == time => Some(v),
            _ => None,
        }
    }

    /// Index of the sample closest in time.
    pub fn nearest_index(&self, time: f64) -> Option<usize> {
        if self.entries.is_empty() {
            return None;
        }
        let i = self.entries.partition_point(|(t, _)| *t < time);
        if i == 0 {
            return Some(0);
        }
        if i == self.entries.len() {
            return Some(i - 1);
        }
        let before = time - self.entries[i - 1].0;
        let after = self.entries[i].0 - time;
        Some(if before <= after { i - 1 } else { i })
    }

    /// Time span covered, `(first, last)`.
    pub fn span(&self) -> Option<(f64, f64)> {
        Some((self.first()?.0, self.last()?.0))
    }
}

impl<R> TimeSortedList<Vec<R>> {
    /// Like [`add_near_end`](Self::add_near_end), rejecting a snapshot whose
    /// row count differs from the samples already stored.
    pub fn add_snapshot_near_end(&mut self, time: f64, rows: Vec<R>) -> ResultsResult<()> {
        self.check_shape(time, rows.len())?;
        self.add_near_end(time, rows)
    }

    pub fn add_snapshot_near_begin(&mut self, time: f64, rows: Vec<R>) -> ResultsResult<()> {
        self.check_shape(time, rows.len())?;
        self.add_near_begin(time, rows)
    }

    fn check_shape(&self, time: f64, found: usize) -> ResultsResult<()> {
        match self.entries.front() {
            Some((_, rows)) if rows.len() != found => Err(ResultsError::ShapeMismatch {
                time,
                expected: rows.len(),
                found,
            }),
            _ => Ok(()),
        }
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn any_insertion_mix_stays_sorted(
            ops in prop::collection::vec((-1000i32..1000, 0u8..3), 1..80)
        ) {
            let mut list = TimeSortedList::new();
            let mut accepted = std::collections::BTreeSet::new();
            for (t, how) in ops {
                let time = t as f64 * 0.01;
                let result = match how {
                    0 => list.add(time, t),
                    1 => list.add_near_end(time, t),
                    _ => list.add_near_begin(time, t),
                };
                prop_assert_eq!(result.is_ok(), accepted.insert(t));
            }
            let times: Vec<f64> = list.times().collect();
            prop_assert!(times.windows(2).all(|w| w[0] < w[1]));
            prop_assert_eq!(times.len(), accepted.len());
        }
    }
}
