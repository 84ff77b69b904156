//! Shared domain enums.
//!
//! These live in the core crate because the asset ledger, the content
//! services and the database layer all need to agree on them.

use serde::{Deserialize, Serialize};

/// The three content entity variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Class,
    Unit,
    Post,
}

impl ContentKind {
    pub const ALL: [ContentKind; 3] = [Self::Class, Self::Unit, Self::Post];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Class => "class",
            Self::Unit => "unit",
            Self::Post => "post",
        }
    }

    /// Object-storage key prefix for assets owned by this kind.
    pub fn key_prefix(&self) -> &'static str {
        match self {
            Self::Class => "classes",
            Self::Unit => "units",
            Self::Post => "posts",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "class" => Some(Self::Class),
            "unit" => Some(Self::Unit),
            "post" => Some(Self::Post),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Discriminant carried by Posts only.
///
/// `Region` is distinguished: it drives the map/region read filter and the
/// background image picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PostKind {
    Science,
    Philosophy,
    Universe,
    Region,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Science => "SCIENCE",
            Self::Philosophy => "PHILOSOPHY",
            Self::Universe => "UNIVERSE",
            Self::Region => "REGION",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SCIENCE" => Some(Self::Science),
            "PHILOSOPHY" => Some(Self::Philosophy),
            "UNIVERSE" => Some(Self::Universe),
            "REGION" => Some(Self::Region),
            _ => None,
        }
    }
}

impl std::fmt::Display for PostKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        for kind in ContentKind::ALL {
            assert_eq!(ContentKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ContentKind::parse("widget"), None);
    }

    #[test]
    fn test_key_prefixes() {
        assert_eq!(ContentKind::Class.key_prefix(), "classes");
        assert_eq!(ContentKind::Unit.key_prefix(), "units");
        assert_eq!(ContentKind::Post.key_prefix(), "posts");
    }

    #[test]
    fn test_post_kind_roundtrip() {
        assert_eq!(PostKind::parse("REGION"), Some(PostKind::Region));
        assert_eq!(PostKind::parse("region"), None);
    }
}
