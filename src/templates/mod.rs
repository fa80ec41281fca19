//! Profile templates registered per room.
//!
//! A template is a named form meant to be filled in by room members. The help
//! output of a room lists the profile command names each of its templates
//! stands for: `get<name>`, `set<name>` and `edit<name>`.
//!
//! Templates are kept in memory by the [`TemplateCatalog`] and persisted as
//! JSON by its loader after every change.

mod catalog;
mod loader;

pub use crate::templates::catalog::TemplateCatalog;

/// Longest template name accepted
pub const MAX_TEMPLATE_NAME_LEN: usize = 30;

/// Returns `true` if `name` can be used as a template name.
///
/// Names become part of command names, so only ASCII letters, digits and
/// underscores are allowed.
pub fn is_valid_template_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= MAX_TEMPLATE_NAME_LEN
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_template_names() {
        assert!(is_valid_template_name("character"));
        assert!(is_valid_template_name("game_tag2"));
    }

    #[test]
    fn test_invalid_template_names() {
        assert!(!is_valid_template_name(""));
        assert!(!is_valid_template_name("two words"));
        assert!(!is_valid_template_name("émoji"));
        assert!(!is_valid_template_name(&"a".repeat(MAX_TEMPLATE_NAME_LEN + 1)));
    }
}
