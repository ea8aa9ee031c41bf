//! Fixed-length grids of colour indices.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tilematch_protocol::Colour;

/// A grid of cells, each holding a colour in `0..colour_count`.
///
/// Used for both the shared target and every player's own grid.
/// Serializes as a plain array: `[0, 2, 1, ...]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern(Vec<Colour>);

impl Pattern {
    /// A grid with every cell at colour 0.
    pub fn blank(size: usize) -> Self {
        Self(vec![0; size])
    }

    /// A grid of `size` independent, uniformly drawn colours.
    pub fn random<R: Rng + ?Sized>(size: usize, colours: Colour, rng: &mut R) -> Self {
        Self((0..size).map(|_| rng.random_range(0..colours)).collect())
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The cells in order.
    pub fn cells(&self) -> &[Colour] {
        &self.0
    }

    /// The colour of one cell, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<Colour> {
        self.0.get(index).copied()
    }

    /// Exact cell-by-cell equality.
    pub fn matches(&self, other: &Pattern) -> bool {
        self.0 == other.0
    }

    /// Advance one cell to the next colour, wrapping back to 0 after
    /// `colours - 1`. Returns the new colour, or `None` (and changes
    /// nothing) if `index` is out of range.
    pub(crate) fn cycle(&mut self, index: usize, colours: Colour) -> Option<Colour> {
        let cell = self.0.get_mut(index)?;
        *cell = (*cell + 1) % colours;
        Some(*cell)
    }

    /// The cell indices to click, in order, to turn this grid into
    /// `target`. Each cell appears once per colour step it is behind.
    ///
    /// Only compares the overlapping prefix if the lengths differ.
    pub fn clicks_to(&self, target: &Pattern, colours: Colour) -> Vec<usize> {
        let colours = usize::from(colours);
        self.0
            .iter()
            .zip(&target.0)
            .enumerate()
            .flat_map(|(index, (&have, &want))| {
                let steps = (usize::from(want) + colours - usize::from(have) % colours) % colours;
                std::iter::repeat_n(index, steps)
            })
            .collect()
    }
}

impl From<Vec<Colour>> for Pattern {
    fn from(cells: Vec<Colour>) -> Self {
        Self(cells)
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn test_blank_is_all_zero() {
        let p = Pattern::blank(9);
        assert_eq!(p.len(), 9);
        assert!(p.cells().iter().all(|&c| c == 0));
    }

    #[test]
    fn test_random_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let p = Pattern::random(9, 3, &mut rng);
            assert_eq!(p.len(), 9);
            assert!(p.cells().iter().all(|&c| c < 3));
        }
    }

    #[test]
    fn test_random_is_reproducible_with_seed() {
        let a = Pattern::random(9, 3, &mut StdRng::seed_from_u64(1));
        let b = Pattern::random(9, 3, &mut StdRng::seed_from_u64(1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_cycle_wraps_through_every_colour() {
        let mut p = Pattern::blank(2);
        let seen: Vec<Colour> = (0..4).map(|_| p.cycle(1, 3).unwrap()).collect();
        assert_eq!(seen, vec![1, 2, 0, 1]);
        assert_eq!(p.get(0), Some(0));
    }

    #[test]
    fn test_cycle_out_of_range_changes_nothing() {
        let mut p = Pattern::blank(3);
        assert_eq!(p.cycle(3, 3), None);
        assert_eq!(p, Pattern::blank(3));
    }

    #[test]
    fn test_matches_is_exact() {
        let a = Pattern::from(vec![0, 1, 2]);
        assert!(a.matches(&Pattern::from(vec![0, 1, 2])));
        assert!(!a.matches(&Pattern::from(vec![0, 1, 1])));
    }

    #[test]
    fn test_clicks_to_reaches_target() {
        let start = Pattern::from(vec![2, 0, 1, 1]);
        let target = Pattern::from(vec![0, 2, 1, 0]);
        let clicks = start.clicks_to(&target, 3);
        assert_eq!(clicks, vec![0, 1, 1, 3, 3]);

        let mut p = start;
        for cell in clicks {
            p.cycle(cell, 3);
        }
        assert!(p.matches(&target));
    }

    #[test]
    fn test_serializes_as_plain_array() {
        let json = serde_json::to_string(&Pattern::from(vec![1, 0, 2])).unwrap();
        assert_eq!(json, "[1,0,2]");
    }
}
