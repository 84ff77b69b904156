//! Shared identity types.

/// Primary key type used across all persisted entities.
pub type Id = i64;

/// Authenticated caller identity, supplied by the auth boundary.
///
/// Authorization is enforced ahead of the content services; they only use
/// this for ownership bookkeeping (e.g. Unit authorship), never to
/// re-check permissions.
pub trait CallerContext: Send + Sync {
    fn user_id(&self) -> Id;

    /// Whether the caller sits in the elevated editor/admin tier that may
    /// mutate content.
    fn can_edit_content(&self) -> bool;
}
