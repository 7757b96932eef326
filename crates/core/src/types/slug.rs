//! URL slugs for shops, products and categories.

use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of the random suffix appended when a slug is already taken.
pub const SUFFIX_LEN: usize = 6;

/// Fold Central European diacritics to ASCII. Input is already lowercase.
const fn fold(c: char) -> Option<char> {
    Some(match c {
        'á' | 'ä' | 'à' | 'â' => 'a',
        'č' | 'ç' => 'c',
        'ď' => 'd',
        'é' | 'ě' | 'è' | 'ë' => 'e',
        'í' | 'ì' | 'ï' => 'i',
        'ľ' | 'ĺ' | 'ł' => 'l',
        'ň' | 'ñ' => 'n',
        'ó' | 'ô' | 'ö' | 'ò' | 'ő' => 'o',
        'ř' | 'ŕ' => 'r',
        'š' | 'ś' => 's',
        'ť' => 't',
        'ú' | 'ů' | 'ü' | 'ù' | 'ű' => 'u',
        'ý' => 'y',
        'ž' | 'ź' | 'ż' => 'z',
        _ => return None,
    })
}

/// Build a URL-safe slug from a display name.
///
/// Lowercases, folds diacritics, collapses every run of characters outside
/// `[a-z0-9]` into a single `-`, and trims leading/trailing dashes.
///
/// ```rust
/// # use shopforge_core::slugify;
/// assert_eq!(slugify("Žltý Čaj & Káva"), "zlty-caj-kava");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.to_lowercase().chars() {
        let c = fold(c).unwrap_or(c);
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// `true` if `s` is already a well-formed slug (what [`slugify`] would emit).
#[must_use]
pub fn is_valid_slug(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('-')
        && !s.ends_with('-')
        && !s.contains("--")
        && s.bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// Random lowercase alphanumeric suffix used to de-duplicate slugs.
#[must_use]
pub fn random_suffix() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(SUFFIX_LEN)
        .map(|b| char::from(b).to_ascii_lowercase())
        .collect()
}

/// `slug` with a fresh random suffix, e.g. `my-shop-3kf9a0`.
#[must_use]
pub fn with_random_suffix(slug: &str) -> String {
    format!("{slug}-{}", random_suffix())
}
