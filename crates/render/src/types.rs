//! Shared data types for the rendering pipeline.

use mdsite_core::ConfigurationError;
use serde::{Deserialize, Serialize};

/// Heading metadata extracted while decorating.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Heading level (1-6).
    pub level: u8,
    /// Visible heading text, entity-decoded and trimmed.
    pub text: String,
    /// Identifier unique within one rendered document.
    pub slug: String,
}

/// Output of one pipeline run.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct RenderedDocument {
    /// Final HTML fragment.
    pub html: String,
    /// Decorated headings in document order.
    pub headings: Vec<Heading>,
    /// Table of contents markup, when the TOC is enabled and headings exist.
    pub toc: Option<String>,
}

impl RenderedDocument {
    /// Returns the slugs of all decorated headings in document order.
    pub fn slugs(&self) -> impl Iterator<Item = &str> {
        self.headings.iter().map(|heading| heading.slug.as_str())
    }
}

/// A set of heading levels, each in `1..=6`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<i64>", into = "Vec<u8>")]
pub struct HeadingLevels {
    mask: u8,
}

pub(crate) const ACCEPTED_LEVELS: &str = "1, 2, 3, 4, 5, 6";

impl HeadingLevels {
    /// Builds a level set, rejecting anything outside `1..=6`.
    pub fn new<I>(levels: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = u8>,
    {
        Self::from_values("levels", levels.into_iter().map(i64::from))
    }

    /// Builds a level set from untyped values, reporting errors against `option`.
    pub(crate) fn from_values<I>(option: &str, levels: I) -> Result<Self, ConfigurationError>
    where
        I: IntoIterator<Item = i64>,
    {
        let mut mask = 0u8;
        for level in levels {
            let bit = u8::try_from(level)
                .ok()
                .filter(|level| (1..=6).contains(level))
                .ok_or_else(|| {
                    ConfigurationError::new(option, level.to_string(), ACCEPTED_LEVELS)
                })?;
            mask |= 1 << (bit - 1);
        }
        Ok(Self { mask })
    }

    /// Every heading level.
    pub const fn all() -> Self {
        Self { mask: 0b11_1111 }
    }

    /// Returns true if `level` is in the set.
    pub fn contains(&self, level: u8) -> bool {
        (1..=6).contains(&level) && self.mask & (1 << (level - 1)) != 0
    }

    /// The levels in ascending order.
    pub fn to_vec(&self) -> Vec<u8> {
        (1..=6u8).filter(|level| self.contains(*level)).collect()
    }
}

impl Default for HeadingLevels {
    /// Levels 1 through 4.
    fn default() -> Self {
        Self { mask: 0b00_1111 }
    }
}

impl TryFrom<Vec<i64>> for HeadingLevels {
    type Error = ConfigurationError;

    fn try_from(levels: Vec<i64>) -> Result<Self, Self::Error> {
        Self::from_values("levels", levels)
    }
}

impl From<HeadingLevels> for Vec<u8> {
    fn from(levels: HeadingLevels) -> Self {
        levels.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_levels_are_one_through_four() {
        let levels = HeadingLevels::default();
        assert_eq!(levels.to_vec(), vec![1, 2, 3, 4]);
        assert!(!levels.contains(5));
        assert!(!levels.contains(0));
    }

    #[test]
    fn out_of_range_level_is_rejected() {
        let err = HeadingLevels::new([2, 7]).unwrap_err();
        assert_eq!(err.option, "levels");
        assert_eq!(err.value, "7");
        assert_eq!(err.accepted, "1, 2, 3, 4, 5, 6");
    }

    #[test]
    fn levels_deserialize_from_a_list() {
        let levels: HeadingLevels = serde_json::from_str("[3, 1, 3]").unwrap();
        assert_eq!(levels.to_vec(), vec![1, 3]);

        let err = serde_json::from_str::<HeadingLevels>("[0]").unwrap_err();
        assert!(err.to_string().contains("option `levels`"), "{err}");
    }

    #[test]
    fn levels_outside_u8_are_range_errors() {
        for (input, value) in [("[300]", "300"), ("[-1]", "-1"), ("[2, 256]", "256")] {
            let err = serde_json::from_str::<HeadingLevels>(input).unwrap_err();
            assert!(
                err.to_string().contains(&format!("invalid value `{value}` for option `levels`")),
                "{input}: {err}"
            );
        }

        let err = HeadingLevels::from_values("toc.includeLevels", [1, 7]).unwrap_err();
        assert_eq!(err.option, "toc.includeLevels");
        assert_eq!(err.value, "7");
    }

    #[test]
    fn rendered_document_lists_slugs_in_order() {
        let doc = RenderedDocument {
            html: String::new(),
            headings: vec![
                Heading {
                    level: 1,
                    text: "Intro".into(),
                    slug: "intro".into(),
                },
                Heading {
                    level: 2,
                    text: "Intro".into(),
                    slug: "intro-1".into(),
                },
            ],
            toc: None,
        };
        assert_eq!(doc.slugs().collect::<Vec<_>>(), vec!["intro", "intro-1"]);
    }
}
