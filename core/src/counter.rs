//! Odometer-order enumeration of integer coordinates inside a box.

use std::iter::FusedIterator;

/// Iterator over every coordinate vector below `shape`, rightmost dimension
/// varying fastest.
///
/// Created by [`counter`]. Each yielded vector is an independent copy.
#[derive(Debug, Clone)]
pub struct Odometer {
    shape: Vec<usize>,
    current: Vec<usize>,
    started: bool,
    done: bool,
    remaining: Option<usize>,
}

/// Enumerates coordinates inside `shape` (exclusive upper bounds) in
/// odometer order, starting at the all-zero vector.
///
/// Each step increments the rightmost dimension that still has room and
/// resets everything to its right. A shape with a zero-size dimension (or an
/// empty shape) yields the all-zero vector once and stops.
///
/// # Examples
///
/// ```
/// use param_schema_core::counter;
///
/// let coords: Vec<Vec<usize>> = counter(&[2, 3]).collect();
/// assert_eq!(
///     coords,
///     vec![vec![0, 0], vec![0, 1], vec![0, 2], vec![1, 0], vec![1, 1], vec![1, 2]]
/// );
/// assert_eq!(counter(&[2, 0]).count(), 1);
/// ```
pub fn counter(shape: &[usize]) -> Odometer {
    let degenerate = shape.is_empty() || shape.contains(&0);
    let remaining = if degenerate {
        Some(1)
    } else {
        shape.iter().try_fold(1usize, |acc, &dim| acc.checked_mul(dim))
    };
    Odometer {
        shape: shape.to_vec(),
        current: vec![0; shape.len()],
        started: false,
        done: false,
        remaining,
    }
}

impl Odometer {
    /// The bounds being enumerated.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    fn advance(&mut self) -> bool {
        if self.shape.contains(&0) {
            return false;
        }
        let Some(index) = (0..self.shape.len())
            .rev()
            .find(|&i| self.shape[i] - self.current[i] > 1)
        else {
            return false;
        };
        self.current[index] += 1;
        self.current[index + 1..].fill(0);
        true
    }
}

impl Iterator for Odometer {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        if self.started && !self.advance() {
            self.done = true;
            return None;
        }
        self.started = true;
        if let Some(remaining) = self.remaining.as_mut() {
            *remaining = remaining.saturating_sub(1);
        }
        Some(self.current.clone())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            return (0, Some(0));
        }
        match self.remaining {
            Some(remaining) => (remaining, Some(remaining)),
            None => (0, None),
        }
    }
}

impl FusedIterator for Odometer {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_dimensions_do_not_advance() {
        let coords: Vec<Vec<usize>> = counter(&[1, 3, 1]).collect();
        assert_eq!(coords, vec![vec![0, 0, 0], vec![0, 1, 0], vec![0, 2, 0]]);
    }

    #[test]
    fn test_empty_shape_yields_once() {
        let coords: Vec<Vec<usize>> = counter(&[]).collect();
        assert_eq!(coords, vec![Vec::<usize>::new()]);
    }

    #[test]
    fn test_zero_dimension_yields_initial_vector_only() {
        let coords: Vec<Vec<usize>> = counter(&[3, 0, 2]).collect();
        assert_eq!(coords, vec![vec![0, 0, 0]]);
    }

    #[test]
    fn test_restartable() {
        let first: Vec<_> = counter(&[2, 2]).collect();
        let second: Vec<_> = counter(&[2, 2]).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_yielded_vectors_are_independent() {
        let mut odometer = counter(&[2]);
        let mut first = odometer.next().unwrap();
        first[0] = 99;
        assert_eq!(odometer.next(), Some(vec![1]));
    }

    #[test]
    fn test_size_hint_tracks_progress() {
        let mut odometer = counter(&[2, 3]);
        assert_eq!(odometer.size_hint(), (6, Some(6)));
        odometer.next();
        odometer.next();
        assert_eq!(odometer.size_hint(), (4, Some(4)));
        assert_eq!(odometer.by_ref().count(), 4);
        assert_eq!(odometer.next(), None);
    }

    #[test]
    fn test_size_hint_unknown_on_overflow() {
        let odometer = counter(&[usize::MAX, usize::MAX]);
        assert_eq!(odometer.size_hint(), (0, None));
    }
}
