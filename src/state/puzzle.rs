use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::dao::models::{CategoryEntity, PuzzleEntity, TileEntity};

/// Number of hidden categories in every puzzle.
pub const CATEGORY_COUNT: usize = 4;
/// Number of words making up one category.
pub const WORDS_PER_CATEGORY: usize = 4;
/// Number of tiles on a fresh board.
pub const BOARD_SIZE: usize = CATEGORY_COUNT * WORDS_PER_CATEGORY;

/// Difficulty colour attached to a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Most straightforward group.
    Yellow,
    /// Moderate group.
    Green,
    /// Hard group.
    Blue,
    /// Trickiest group, usually wordplay.
    Purple,
}

/// Themed group of exactly four words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Category {
    /// Theme revealed once the group is found.
    pub name: String,
    /// Words of the group, in catalog order.
    pub words: Vec<String>,
    /// Difficulty colour.
    pub difficulty: Difficulty,
}

impl Category {
    /// Whether `word` belongs to this category, ignoring case.
    pub fn contains(&self, word: &str) -> bool {
        let folded = fold(word);
        self.words.iter().any(|candidate| fold(candidate) == folded)
    }

    /// Exact set match between the category words and `words`, ignoring case.
    pub fn matches(&self, words: &[String]) -> bool {
        let own: HashSet<String> = self.words.iter().map(|w| fold(w)).collect();
        let other: HashSet<String> = words.iter().map(|w| fold(w)).collect();
        own.len() == words.len() && own == other
    }

    /// Count how many of `words` belong to this category.
    pub fn overlap(&self, words: &[String]) -> usize {
        words.iter().filter(|word| self.contains(word)).count()
    }
}

/// Immutable daily puzzle: four categories with sixteen distinct words.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Puzzle {
    id: String,
    date: String,
    categories: Vec<Category>,
}

impl Puzzle {
    /// Catalog identifier.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Publication date formatted `DD.MM.YYYY`.
    pub fn date(&self) -> &str {
        &self.date
    }

    /// The four categories, in catalog order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category owning `word`, ignoring case.
    pub fn category_of(&self, word: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.contains(word))
    }

    /// One tile per word, in catalog order.
    pub fn tiles(&self) -> Vec<WordTile> {
        self.categories
            .iter()
            .flat_map(|category| {
                category.words.iter().map(move |word| WordTile {
                    word: word.clone(),
                    category: category.name.clone(),
                    difficulty: category.difficulty,
                })
            })
            .collect()
    }

    /// Full solution as solved categories, in catalog order.
    pub fn solution(&self) -> Vec<SolvedCategory> {
        self.categories.iter().map(SolvedCategory::from).collect()
    }
}

/// Word still on the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordTile {
    /// Word printed on the tile.
    pub word: String,
    /// Name of the owning category.
    pub category: String,
    /// Difficulty of the owning category.
    pub difficulty: Difficulty,
}

/// Category the player has found (or that was revealed on failure).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolvedCategory {
    /// Theme of the category.
    pub name: String,
    /// The four words.
    pub words: Vec<String>,
    /// Difficulty colour.
    pub difficulty: Difficulty,
}

/// Reasons a catalog entry cannot be turned into a playable [`Puzzle`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PuzzleError {
    /// Identifier is blank.
    #[error("puzzle id must not be empty")]
    EmptyId,
    /// Puzzle does not have exactly four categories.
    #[error("expected {CATEGORY_COUNT} categories, found {count}")]
    CategoryCount {
        /// Number of categories found.
        count: usize,
    },
    /// A category does not have exactly four words.
    #[error("category `{category}` has {count} words, expected {WORDS_PER_CATEGORY}")]
    WordCount {
        /// Offending category name.
        category: String,
        /// Number of words found.
        count: usize,
    },
    /// A word is blank.
    #[error("category `{category}` contains a blank word")]
    BlankWord {
        /// Offending category name.
        category: String,
    },
    /// A word appears more than once across the board.
    #[error("word `{word}` appears more than once")]
    DuplicateWord {
        /// Duplicated word.
        word: String,
    },
}

impl TryFrom<PuzzleEntity> for Puzzle {
    type Error = PuzzleError;

    fn try_from(value: PuzzleEntity) -> Result<Self, Self::Error> {
        if value.id.trim().is_empty() {
            return Err(PuzzleError::EmptyId);
        }

        if value.categories.len() != CATEGORY_COUNT {
            return Err(PuzzleError::CategoryCount {
                count: value.categories.len(),
            });
        }

        let mut seen = HashSet::with_capacity(BOARD_SIZE);
        for category in &value.categories {
            if category.words.len() != WORDS_PER_CATEGORY {
                return Err(PuzzleError::WordCount {
                    category: category.name.clone(),
                    count: category.words.len(),
                });
            }
            for word in &category.words {
                if word.trim().is_empty() {
                    return Err(PuzzleError::BlankWord {
                        category: category.name.clone(),
                    });
                }
                if !seen.insert(fold(word)) {
                    return Err(PuzzleError::DuplicateWord { word: word.clone() });
                }
            }
        }

        Ok(Self {
            id: value.id,
            date: value.date,
            categories: value.categories.into_iter().map(Into::into).collect(),
        })
    }
}

/// Case folding used for every word comparison.
pub fn fold(word: &str) -> String {
    word.to_uppercase()
}

impl From<CategoryEntity> for Category {
    fn from(value: CategoryEntity) -> Self {
        Self {
            name: value.name,
            words: value.words,
            difficulty: value.difficulty,
        }
    }
}

impl From<&Category> for SolvedCategory {
    fn from(value: &Category) -> Self {
        Self {
            name: value.name.clone(),
            words: value.words.clone(),
            difficulty: value.difficulty,
        }
    }
}

impl From<CategoryEntity> for SolvedCategory {
    fn from(value: CategoryEntity) -> Self {
        Self {
            name: value.name,
            words: value.words,
            difficulty: value.difficulty,
        }
    }
}

impl From<SolvedCategory> for CategoryEntity {
    fn from(value: SolvedCategory) -> Self {
        Self {
            name: value.name,
            words: value.words,
            difficulty: value.difficulty,
        }
    }
}

impl From<TileEntity> for WordTile {
    fn from(value: TileEntity) -> Self {
        Self {
            word: value.word,
            category: value.category,
            difficulty: value.difficulty,
        }
    }
}

impl From<WordTile> for TileEntity {
    fn from(value: WordTile) -> Self {
        Self {
            word: value.word,
            category: value.category,
            difficulty: value.difficulty,
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn categories_are_disjoint_and_cover_sixteen_words() {
        let puzzle = kitchen_puzzle();
        let all: HashSet<String> = puzzle
            .categories()
            .iter()
            .flat_map(|c| c.words.iter().map(|w| fold(w)))
            .collect();
        assert_eq!(all.len(), BOARD_SIZE);
        assert_eq!(puzzle.tiles().len(), BOARD_SIZE);
    }

    #[test]
    fn matching_is_exact_and_case_insensitive() {
        let puzzle = kitchen_puzzle();
        let cutlery = &puzzle.categories()[0];

        assert!(cutlery.matches(&words(&["whisk", "Fork", "SPOON", "knife"])));
        assert!(!cutlery.matches(&words(&["FORK", "SPOON", "KNIFE", "RISK"])));
        assert!(!cutlery.matches(&words(&["FORK", "SPOON", "KNIFE"])));
        assert!(!cutlery.matches(&words(&["FORK", "FORK", "SPOON", "KNIFE"])));
    }

    #[test]
    fn overlap_counts_members() {
        let puzzle = kitchen_puzzle();
        let guess = words(&["FORK", "SPOON", "knife", "RISK"]);
        assert_eq!(puzzle.categories()[0].overlap(&guess), 3);
        assert_eq!(puzzle.categories()[1].overlap(&guess), 1);
    }

    #[test]
    fn duplicate_words_are_rejected_ignoring_case() {
        let mut entity = kitchen_entity("1", "05.03.2025");
        entity.categories[3].words[0] = "fork".into();
        assert_eq!(
            Puzzle::try_from(entity).unwrap_err(),
            PuzzleError::DuplicateWord {
                word: "fork".into()
            }
        );
    }

    #[test]
    fn wrong_shapes_are_rejected() {
        let mut entity = kitchen_entity("1", "05.03.2025");
        entity.categories.pop();
        assert_eq!(
            Puzzle::try_from(entity).unwrap_err(),
            PuzzleError::CategoryCount { count: 3 }
        );

        let mut entity = kitchen_entity("1", "05.03.2025");
        entity.categories[1].words.push("SORRY".into());
        assert!(matches!(
            Puzzle::try_from(entity).unwrap_err(),
            PuzzleError::WordCount { count: 5, .. }
        ));
    }
}
