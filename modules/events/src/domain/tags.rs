//! Tag name normalization.
//!
//! A tag's identity is its normalized name: trimmed and lowercased. Every
//! lookup and every insert goes through [`normalize_tag_names`] first.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::error::{push_field_error, DomainError, FieldErrors};

/// Matches the `tags.name` column width.
pub const MAX_TAG_NAME_LEN: usize = 50;

/// What to do with entries that are empty after trimming.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyTagPolicy {
    /// Fail validation on the `tags` field.
    #[default]
    Reject,
    /// Skip the entry silently.
    Drop,
}

pub fn normalize_tag_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Normalize, deduplicate and sort raw tag names.
pub fn normalize_tag_names(
    raw: &[String],
    policy: EmptyTagPolicy,
) -> Result<Vec<String>, DomainError> {
    let mut names = BTreeSet::new();
    let mut errors = FieldErrors::new();

    for entry in raw {
        let name = normalize_tag_name(entry);
        if name.is_empty() {
            if policy == EmptyTagPolicy::Reject {
                push_field_error(&mut errors, "tags", "Tag names may not be blank.");
            }
            continue;
        }
        if name.chars().count() > MAX_TAG_NAME_LEN {
            push_field_error(
                &mut errors,
                "tags",
                format!("Tag '{name}' has more than {MAX_TAG_NAME_LEN} characters."),
            );
            continue;
        }
        names.insert(name);
    }

    if errors.is_empty() {
        Ok(names.into_iter().collect())
    } else {
        Err(DomainError::validation(errors))
    }
}
