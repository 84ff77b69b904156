//! Per-kind coordinator configuration.
//!
//! The coordinator algorithm is identical for every content kind; what
//! varies is captured here: which other kinds an entity may link to,
//! whether it carries a user-ownership relation, and whether it carries
//! the post discriminant.

use atlas_core::ContentKind;

/// Static configuration for one content kind.
#[derive(Debug, Clone, Copy)]
pub struct KindConfig {
    pub kind: ContentKind,
    /// Kinds this entity may hold many-to-many links to.
    pub relations: &'static [ContentKind],
    /// Units are owned by users; the creating caller becomes an owner.
    pub owned_by_users: bool,
    /// Posts carry a `PostKind` discriminant.
    pub kinded: bool,
}

impl KindConfig {
    pub const CLASS: KindConfig = KindConfig {
        kind: ContentKind::Class,
        relations: &[ContentKind::Unit],
        owned_by_users: false,
        kinded: false,
    };

    pub const UNIT: KindConfig = KindConfig {
        kind: ContentKind::Unit,
        relations: &[ContentKind::Class],
        owned_by_users: true,
        kinded: false,
    };

    pub const POST: KindConfig = KindConfig {
        kind: ContentKind::Post,
        relations: &[ContentKind::Class, ContentKind::Unit],
        owned_by_users: false,
        kinded: true,
    };

    pub fn for_kind(kind: ContentKind) -> KindConfig {
        match kind {
            ContentKind::Class => Self::CLASS,
            ContentKind::Unit => Self::UNIT,
            ContentKind::Post => Self::POST,
        }
    }

    /// Whether `target` is a permitted relation target for this kind.
    pub fn allows_relation(&self, target: ContentKind) -> bool {
        self.relations.contains(&target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_kind_roundtrip() {
        for kind in ContentKind::ALL {
            assert_eq!(KindConfig::for_kind(kind).kind, kind);
        }
    }

    #[test]
    fn test_relation_targets() {
        assert!(KindConfig::UNIT.allows_relation(ContentKind::Class));
        assert!(!KindConfig::UNIT.allows_relation(ContentKind::Post));
        assert!(KindConfig::POST.allows_relation(ContentKind::Unit));
        assert!(KindConfig::POST.allows_relation(ContentKind::Class));
    }

    #[test]
    fn test_only_units_are_owned() {
        assert!(KindConfig::UNIT.owned_by_users);
        assert!(!KindConfig::CLASS.owned_by_users);
        assert!(!KindConfig::POST.owned_by_users);
    }
}
