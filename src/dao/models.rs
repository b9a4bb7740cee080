use serde::{Deserialize, Deserializer, Serialize};

use crate::state::puzzle::Difficulty;

/// Catalog document listing every published puzzle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogEntity {
    /// Published puzzles, in catalog order.
    pub puzzles: Vec<PuzzleEntity>,
}

/// Puzzle definition as stored in the catalog document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PuzzleEntity {
    /// Stable identifier of the puzzle (numeric identifiers are accepted too).
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Publication date formatted `DD.MM.YYYY`.
    pub date: String,
    /// The four hidden categories.
    pub categories: Vec<CategoryEntity>,
}

/// Category entry, shared by the catalog and the persisted records.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CategoryEntity {
    /// Theme shown once the category is found.
    pub name: String,
    /// The four words of the category, in catalog order.
    pub words: Vec<String>,
    /// Difficulty colour.
    pub difficulty: Difficulty,
}

/// Unsolved tile as persisted inside a progress snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TileEntity {
    /// Word printed on the tile.
    pub word: String,
    /// Name of the category the word belongs to.
    pub category: String,
    /// Difficulty of that category.
    pub difficulty: Difficulty,
}

/// How a finished puzzle ended.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FinalKind {
    /// Every category was found.
    Solved,
    /// The mistake budget ran out.
    Failed,
}

/// Record written once when a puzzle reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FinalStateEntity {
    /// Terminal outcome.
    #[serde(rename = "type")]
    pub kind: FinalKind,
    /// Categories to display: the player's findings, or the full solution on failure.
    pub solved_categories: Vec<CategoryEntity>,
    /// Mistakes made before the end.
    pub mistakes: u8,
}

/// Snapshot of an unfinished session, rewritten after every state change.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProgressEntity {
    /// Mistakes made so far.
    pub mistakes: u8,
    /// Categories found so far, in discovery order.
    pub solved: Vec<CategoryEntity>,
    /// Tiles still on the board, in display order.
    pub remaining: Vec<TileEntity>,
    /// Words selected when the snapshot was taken.
    #[serde(default)]
    pub selected: Vec<String>,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(text) => text,
        RawId::Number(number) => number.to_string(),
    })
}
