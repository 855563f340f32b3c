//! Static learning content, the level dashboard and the e-book reader.

pub mod data;

use serde::{Deserialize, Serialize};
use tracing::info;

pub use data::{alphabet_card, ebook_chapters, level_content, HIRAGANA, KATAKANA};

/// One JLPT proficiency level card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JlptLevel {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
    pub kanji_count: u32,
    pub vocab_count: u32,
    pub progress: u8,
    pub unlocked: bool,
}

/// A sentence-building target and its Indonesian meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentencePair {
    pub ja: String,
    pub meaning: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct LevelContent {
    pub kanji: Vec<String>,
    pub vocab: Vec<String>,
    pub grammar: Vec<String>,
    pub scenarios: Vec<String>,
    pub sentences: Vec<SentencePair>,
}

/// A block of e-book text. Serialized as `{"type": "h2" | "p" | "example", "text": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "text")]
pub enum EbookItem {
    #[serde(rename = "h2")]
    Heading(String),
    #[serde(rename = "p")]
    Paragraph(String),
    #[serde(rename = "example")]
    Example(String),
}

impl EbookItem {
    pub fn text(&self) -> &str {
        match self {
            Self::Heading(t) | Self::Paragraph(t) | Self::Example(t) => t,
        }
    }

    /// Only example lines get a speaker button.
    pub fn is_speakable(&self) -> bool {
        matches!(self, Self::Example(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EbookChapter {
    pub title: String,
    pub content: Vec<EbookItem>,
}

// ---------------------------------------------------------------------------
// Dashboard
// ---------------------------------------------------------------------------

/// Level list with unlock progression.
#[derive(Debug, Clone)]
pub struct Dashboard {
    levels: Vec<JlptLevel>,
    selected: Option<usize>,
}

impl Dashboard {
    pub fn new(levels: Vec<JlptLevel>) -> Self {
        Self {
            levels,
            selected: None,
        }
    }

    pub fn levels(&self) -> &[JlptLevel] {
        &self.levels
    }

    pub fn selected(&self) -> Option<&JlptLevel> {
        self.selected.and_then(|i| self.levels.get(i))
    }

    /// Select a level by id. Locked or unknown levels are refused.
    pub fn select(&mut self, level_id: &str) -> Option<&JlptLevel> {
        let index = self.levels.iter().position(|l| l.id == level_id)?;
        if !self.levels[index].unlocked {
            info!(level = %level_id, "Refusing to open locked level");
            return None;
        }
        self.selected = Some(index);
        self.levels.get(index)
    }

    /// Mark the selected level complete and open the one after it.
    ///
    /// Returns the newly unlocked level, or `None` when nothing changed
    /// (no selection, last level, or next level already open).
    pub fn unlock_next(&mut self) -> Option<&JlptLevel> {
        let current = self.selected?;
        let next = current + 1;
        if next >= self.levels.len() || self.levels[next].unlocked {
            return None;
        }
        self.levels[next].unlocked = true;
        self.levels[current].progress = 100;
        info!(level = %self.levels[next].id, "Level unlocked");
        self.levels.get(next)
    }
}

impl Default for Dashboard {
    fn default() -> Self {
        Self::new(data::initial_levels())
    }
}

// ---------------------------------------------------------------------------
// E-book reader
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct EbookReader {
    chapters: Vec<EbookChapter>,
    selected: usize,
}

impl EbookReader {
    pub fn for_level(level_id: &str) -> Self {
        Self {
            chapters: ebook_chapters(level_id),
            selected: 0,
        }
    }

    pub fn is_available(&self) -> bool {
        !self.chapters.is_empty()
    }

    pub fn titles(&self) -> Vec<&str> {
        self.chapters.iter().map(|c| c.title.as_str()).collect()
    }

    pub fn current(&self) -> Option<&EbookChapter> {
        self.chapters.get(self.selected)
    }

    pub fn selected_index(&self) -> usize {
        self.selected
    }

    pub fn select_chapter(&mut self, index: usize) -> Option<&EbookChapter> {
        if index >= self.chapters.len() {
            return None;
        }
        self.selected = index;
        self.chapters.get(index)
    }
}
