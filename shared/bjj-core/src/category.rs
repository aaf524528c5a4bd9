//! Category kinds a video can be filed under

use crate::{BJJCoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The three independent category axes of a video
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Position,
    Technique,
    Guard,
}

impl CategoryKind {
    pub const ALL: [CategoryKind; 3] = [CategoryKind::Position, CategoryKind::Technique, CategoryKind::Guard];

    /// Lower-case identifier used in routes and config
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Position => "position",
            CategoryKind::Technique => "technique",
            CategoryKind::Guard => "guard",
        }
    }

    /// Top-level folder name in the storage layout
    pub fn folder(&self) -> &'static str {
        match self {
            CategoryKind::Position => "Position",
            CategoryKind::Technique => "Technique",
            CategoryKind::Guard => "Guard",
        }
    }

    /// Table holding categories of this kind
    pub fn table(&self) -> &'static str {
        match self {
            CategoryKind::Position => "positions",
            CategoryKind::Technique => "techniques",
            CategoryKind::Guard => "guards",
        }
    }

    /// Foreign-key column on the videos table
    pub fn video_column(&self) -> &'static str {
        match self {
            CategoryKind::Position => "position_id",
            CategoryKind::Technique => "technique_id",
            CategoryKind::Guard => "guard_id",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryKind {
    type Err = BJJCoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "position" | "positions" => Ok(CategoryKind::Position),
            "technique" | "techniques" => Ok(CategoryKind::Technique),
            "guard" | "guards" => Ok(CategoryKind::Guard),
            other => Err(BJJCoreError::InvalidInput(format!("Unknown category type: {}", other))),
        }
    }
}

/// A stored category row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A category together with its kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CategoryRef {
    Position(Category),
    Technique(Category),
    Guard(Category),
}

impl CategoryRef {
    pub fn new(kind: CategoryKind, category: Category) -> Self {
        match kind {
            CategoryKind::Position => CategoryRef::Position(category),
            CategoryKind::Technique => CategoryRef::Technique(category),
            CategoryKind::Guard => CategoryRef::Guard(category),
        }
    }

    pub fn kind(&self) -> CategoryKind {
        match self {
            CategoryRef::Position(_) => CategoryKind::Position,
            CategoryRef::Technique(_) => CategoryKind::Technique,
            CategoryRef::Guard(_) => CategoryKind::Guard,
        }
    }

    pub fn category(&self) -> &Category {
        match self {
            CategoryRef::Position(c) | CategoryRef::Technique(c) | CategoryRef::Guard(c) => c,
        }
    }

    pub fn id(&self) -> i64 {
        self.category().id
    }

    pub fn name(&self) -> &str {
        &self.category().name
    }

    /// The category that decides a video's storage folder: guard, then
    /// position, then technique.
    pub fn primary<'a>(
        guard: Option<&'a CategoryRef>,
        position: Option<&'a CategoryRef>,
        technique: Option<&'a CategoryRef>,
    ) -> Option<&'a CategoryRef> {
        guard.or(position).or(technique)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kind() {
        assert_eq!("position".parse::<CategoryKind>().unwrap(), CategoryKind::Position);
        assert_eq!("Guards".parse::<CategoryKind>().unwrap(), CategoryKind::Guard);
        assert!("belt".parse::<CategoryKind>().is_err());
    }

    #[test]
    fn test_ref_carries_kind() {
        let guard = CategoryRef::new(
            CategoryKind::Guard,
            Category { id: 3, name: "Closed Guard".to_string() },
        );
        assert_eq!(guard.kind(), CategoryKind::Guard);
        assert_eq!(guard.name(), "Closed Guard");
        assert_eq!(guard.kind().video_column(), "guard_id");
    }

    #[test]
    fn test_primary_prefers_guard() {
        let position = CategoryRef::new(CategoryKind::Position, Category { id: 1, name: "Mount".into() });
        let guard = CategoryRef::new(CategoryKind::Guard, Category { id: 2, name: "Half Guard".into() });

        let primary = CategoryRef::primary(Some(&guard), Some(&position), None).unwrap();
        assert_eq!(primary.kind(), CategoryKind::Guard);

        let primary = CategoryRef::primary(None, Some(&position), None).unwrap();
        assert_eq!(primary.kind(), CategoryKind::Position);

        assert!(CategoryRef::primary(None, None, None).is_none());
    }
}
