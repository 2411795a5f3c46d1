//! URL slug derivation.
//!
//! Pure function of the record's name and id; no I/O, never fails. The same
//! input always yields the same slug, and the slug is recomputed on every
//! write rather than cached anywhere.

use crate::types::ArticleRecord;

/// Derives the URL slug for a record.
///
/// Named records get a normalized form of the name: lower-cased, stripped of
/// everything but ASCII word characters, whitespace, and hyphens, with
/// whitespace and hyphen runs collapsed to single hyphens and edge hyphens
/// trimmed. Unnamed records fall back to `article-<id>`, as does a name
/// that normalizes to nothing (for example, one made entirely of
/// punctuation), since an empty slug would only be rejected remotely.
pub fn derive_slug(record: &ArticleRecord) -> String {
    record
        .name
        .as_deref()
        .map(slugify)
        .filter(|slug| !slug.is_empty())
        .unwrap_or_else(|| format!("article-{}", record.id))
}

fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for ch in name.to_lowercase().chars() {
        let keep = if ch.is_ascii_alphanumeric() || ch == '_' {
            Some(ch)
        } else if ch.is_whitespace() || ch == '-' {
            pending_hyphen = true;
            None
        } else {
            // Stripped entirely; does not break a word apart.
            None
        };

        if let Some(ch) = keep {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ArticleId;
    use proptest::prelude::*;

    fn record(name: Option<&str>, id: &str) -> ArticleRecord {
        ArticleRecord {
            id: ArticleId::new(id),
            name: name.map(String::from),
            content: None,
            remote_id: None,
        }
    }

    #[test]
    fn punctuation_is_stripped_and_spaces_become_hyphens() {
        assert_eq!(
            derive_slug(&record(Some("My Article!! Title"), "1")),
            "my-article-title"
        );
    }

    #[test]
    fn absent_name_falls_back_to_article_id() {
        assert_eq!(derive_slug(&record(None, "42")), "article-42");
    }

    #[test]
    fn all_punctuation_name_falls_back_like_an_absent_one() {
        assert_eq!(derive_slug(&record(Some("!!??!!"), "42")), "article-42");
    }

    #[test]
    fn hyphen_runs_collapse_and_edges_trim() {
        assert_eq!(derive_slug(&record(Some("--a -- b--"), "1")), "a-b");
        assert_eq!(derive_slug(&record(Some("  padded  "), "1")), "padded");
    }

    #[test]
    fn underscores_survive_as_word_characters() {
        assert_eq!(derive_slug(&record(Some("snake_case name"), "1")), "snake_case-name");
    }

    proptest! {
        #[test]
        fn derivation_is_deterministic(name in ".{0,60}", id in "[0-9]{1,6}") {
            let r = record(Some(&name), &id);
            prop_assert_eq!(derive_slug(&r), derive_slug(&r));
        }

        #[test]
        fn slugs_are_url_safe(name in ".{0,60}", id in "[0-9]{1,6}") {
            let slug = derive_slug(&record(Some(&name), &id));
            prop_assert!(!slug.is_empty());
            prop_assert!(!slug.starts_with('-') && !slug.ends_with('-'));
            prop_assert!(!slug.contains("--"));
            prop_assert!(slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-'));
        }
    }
}
