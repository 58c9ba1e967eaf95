//! Classifying the identifier segment of a detail URL.

use std::sync::LazyLock;

use regex::Regex;

static IMDB_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^tt[0-9]+$").expect("alias pattern"));
static SLUG_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)box office collection").expect("suffix pattern"));
static NON_SLUG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern"));

pub const SLUG_SUFFIX_TEXT: &str = "-box-office-collection";

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PathId {
    /// A TMDB-native numeric id.
    Native(u64),
    /// An IMDb id that has to be exchanged before TMDB will answer.
    Alias(String),
    /// A human-readable slug that needs a title search.
    Slug(String),
}

impl PathId {
    pub fn classify(raw: &str) -> Self {
        let raw = raw.trim();
        if let Ok(id) = raw.parse::<u64>() {
            return PathId::Native(id);
        }
        if IMDB_ALIAS.is_match(raw) {
            return PathId::Alias(raw.to_string());
        }
        PathId::Slug(raw.to_string())
    }

    /// True when TMDB can be asked about this id without a search first.
    pub fn is_metadata_key(&self) -> bool {
        !matches!(self, PathId::Slug(_))
    }
}

/// Turns `border-2-box-office-collection` into `Border 2`.
pub fn title_from_slug(slug: &str) -> String {
    let spaced = slug.replace('-', " ");
    let stripped = SLUG_SUFFIX.replace_all(&spaced, "");
    stripped
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect::<Vec<String>>()
        .join(" ")
}

/// SEO slug for a title: `Border 2` becomes `border-2-box-office-collection`.
pub fn slug_for_title(title: &str) -> String {
    let lowered = title.to_lowercase();
    let collapsed = NON_SLUG.replace_all(&lowered, "-");
    let trimmed = collapsed.trim_matches('-');
    if trimmed.is_empty() { String::new() } else { format!("{trimmed}{SLUG_SUFFIX_TEXT}") }
}
