use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use snafu::ensure;

use crate::error::{InvalidCatalogSnafu, Result};

/// One entry of the practice catalog. Catalog entries never change after startup; all
/// learning progress lives in [`WordState`](crate::WordState), keyed by `term`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct WordDefinition {
    pub term: String,
    pub pinyin: String,
    /// 1 is easiest
    pub difficulty: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meaning: Option<String>,
}

impl WordDefinition {
    pub fn new(term: impl Into<String>, pinyin: impl Into<String>, difficulty: u8) -> Self {
        Self {
            term: term.into(),
            pinyin: pinyin.into(),
            difficulty,
            meaning: None,
        }
    }

    pub fn with_meaning(mut self, meaning: impl Into<String>) -> Self {
        self.meaning = Some(meaning.into());
        self
    }
}

/// Ordered, validated list of words. Order matters: it breaks ties when picking the
/// weakest words for a fallback practice set.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Catalog {
    words: Vec<WordDefinition>,
}

impl Catalog {
    pub fn new(words: Vec<WordDefinition>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(words.len());
        for word in &words {
            ensure!(
                !word.term.trim().is_empty(),
                InvalidCatalogSnafu {
                    reason: "empty term",
                }
            );
            ensure!(
                word.difficulty > 0,
                InvalidCatalogSnafu {
                    reason: format!("difficulty of {} must be positive", word.term),
                }
            );
            ensure!(
                seen.insert(word.term.as_str()),
                InvalidCatalogSnafu {
                    reason: format!("duplicate term {}", word.term),
                }
            );
        }
        Ok(Self { words })
    }

    pub fn words(&self) -> &[WordDefinition] {
        &self.words
    }

    pub fn get(&self, term: &str) -> Option<&WordDefinition> {
        self.words.iter().find(|w| w.term == term)
    }

    pub fn contains(&self, term: &str) -> bool {
        self.get(term).is_some()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WordDefinition> {
        self.words.iter()
    }
}

// (term, pinyin, difficulty, meaning)
const DEFAULT_WORDS: &[(&str, &str, u8, &str)] = &[
    ("人", "rén", 1, "person"),
    ("大", "dà", 1, "big"),
    ("小", "xiǎo", 1, "small"),
    ("山", "shān", 1, "mountain"),
    ("水", "shuǐ", 1, "water"),
    ("火", "huǒ", 1, "fire"),
    ("日", "rì", 1, "sun"),
    ("月", "yuè", 1, "moon"),
    ("口", "kǒu", 1, "mouth"),
    ("中", "zhōng", 1, "middle"),
    ("你好", "nǐ hǎo", 2, "hello"),
    ("学习", "xué xí", 2, "to study"),
    ("朋友", "péng you", 2, "friend"),
    ("老师", "lǎo shī", 2, "teacher"),
    ("学生", "xué sheng", 2, "student"),
    ("中国", "zhōng guó", 2, "China"),
    ("天气", "tiān qì", 2, "weather"),
    ("米饭", "mǐ fàn", 2, "cooked rice"),
    ("汉字", "hàn zì", 3, "Chinese character"),
    ("眼睛", "yǎn jing", 3, "eye"),
    ("电脑", "diàn nǎo", 3, "computer"),
    ("语言", "yǔ yán", 3, "language"),
    ("开心", "kāi xīn", 3, "happy"),
    ("国家", "guó jiā", 3, "country"),
];

/// The built-in word list, ordered from easiest to hardest.
pub fn default_catalog() -> Catalog {
    Catalog {
        words: DEFAULT_WORDS
            .iter()
            .map(|&(term, pinyin, difficulty, meaning)| {
                WordDefinition::new(term, pinyin, difficulty).with_meaning(meaning)
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ReviewError;

    #[test]
    fn default_catalog_is_valid() -> Result<()> {
        let catalog = default_catalog();
        let revalidated = Catalog::new(catalog.words().to_vec())?;
        assert_eq!(revalidated, catalog);
        assert!(catalog.len() >= 6);
        assert!(
            catalog
                .words()
                .windows(2)
                .all(|pair| pair[0].difficulty <= pair[1].difficulty)
        );
        Ok(())
    }

    #[test]
    fn rejects_duplicate_terms() {
        let words = vec![
            WordDefinition::new("水", "shuǐ", 1),
            WordDefinition::new("水", "shui3", 1),
        ];
        assert!(matches!(
            Catalog::new(words),
            Err(ReviewError::InvalidCatalog { .. })
        ));
    }

    #[test]
    fn rejects_empty_term_and_zero_difficulty() {
        assert!(Catalog::new(vec![WordDefinition::new(" ", "x", 1)]).is_err());
        assert!(Catalog::new(vec![WordDefinition::new("山", "shān", 0)]).is_err());
    }

    #[test]
    fn lookup_by_term() {
        let catalog = default_catalog();
        assert_eq!(
            catalog.get("朋友").map(|w| w.pinyin.as_str()),
            Some("péng you")
        );
        assert!(!catalog.contains("猫猫"));
    }
}
