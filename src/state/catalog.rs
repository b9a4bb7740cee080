use std::sync::Arc;

use tracing::warn;

use crate::{dao::models::CatalogEntity, state::puzzle::Puzzle};

/// Validated set of playable puzzles, in catalog order.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    puzzles: Vec<Arc<Puzzle>>,
}

impl Catalog {
    /// Build a catalog from already validated puzzles.
    pub fn new(puzzles: Vec<Puzzle>) -> Self {
        Self {
            puzzles: puzzles.into_iter().map(Arc::new).collect(),
        }
    }

    /// Number of playable puzzles.
    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    /// Whether the catalog holds no playable puzzle.
    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    /// Puzzle at `index`, if any.
    pub fn get(&self, index: usize) -> Option<Arc<Puzzle>> {
        self.puzzles.get(index).cloned()
    }

    /// Return the only puzzle published on `date` along with its index.
    ///
    /// Zero matches and ambiguous matches are both reported as `None`.
    pub fn select_for_date(&self, date: &str) -> Option<(usize, Arc<Puzzle>)> {
        let mut matches = self
            .puzzles
            .iter()
            .enumerate()
            .filter(|(_, puzzle)| puzzle.date() == date);

        let (index, puzzle) = matches.next()?;
        if matches.next().is_some() {
            warn!(date, "several puzzles share the same date; none selected");
            return None;
        }
        Some((index, puzzle.clone()))
    }

    /// Index following `index`, wrapping around at the end.
    pub fn next_index(&self, index: usize) -> Option<usize> {
        if self.puzzles.is_empty() {
            return None;
        }
        Some((index + 1) % self.puzzles.len())
    }
}

impl From<CatalogEntity> for Catalog {
    /// Keep every valid puzzle and log the ones that break the board invariants.
    fn from(value: CatalogEntity) -> Self {
        let puzzles = value
            .puzzles
            .into_iter()
            .filter_map(|entity| {
                let id = entity.id.clone();
                match Puzzle::try_from(entity) {
                    Ok(puzzle) => Some(puzzle),
                    Err(err) => {
                        warn!(puzzle_id = %id, error = %err, "skipping invalid puzzle");
                        None
                    }
                }
            })
            .collect();
        Self::new(puzzles)
    }
}
