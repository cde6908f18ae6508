//! URL-safe store slugs.
//!
//! A slug is derived from the store name and de-duplicated against existing
//! stores that share the same base. The storage layer counts the collisions
//! (see [`Slug::collision_pattern`]); this module only does the arithmetic.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Slug used when a name contains nothing sluggable (e.g. only punctuation).
const FALLBACK_SLUG: &str = "store";

/// Errors that can occur when parsing a [`Slug`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum SlugError {
    /// The input string is empty.
    #[error("slug cannot be empty")]
    Empty,
    /// The input contains characters outside `[a-z0-9-]`.
    #[error("slug may only contain lowercase letters, digits and dashes")]
    InvalidCharacter,
}

/// A URL-safe store identifier such as `the-coffee-shop-2`.
///
/// ## Constraints
///
/// - Non-empty
/// - Only `a-z`, `0-9` and `-`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Parse a slug taken from a URL or the database.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or contains characters that
    /// [`slugify`] would never produce.
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if !s
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(SlugError::InvalidCharacter);
        }
        Ok(Self(s.to_owned()))
    }

    /// Derive the base slug for a store name.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let slug = slugify(name);
        if slug.is_empty() {
            Self(FALLBACK_SLUG.to_owned())
        } else {
            Self(slug)
        }
    }

    /// Apply the collision suffix.
    ///
    /// `existing` is the number of stores whose slug already matches
    /// [`Self::collision_pattern`]. Zero keeps the base; otherwise the slug
    /// becomes `<base>-<existing + 1>`.
    #[must_use]
    pub fn with_collisions(self, existing: i64) -> Self {
        if existing <= 0 {
            return self;
        }
        Self(format!("{}-{}", self.0, existing + 1))
    }

    /// Case-insensitive POSIX pattern matching this base and its numbered
    /// variants (`base`, `base-2`, `base-17`, and the degenerate `base-`).
    ///
    /// Slugs only contain `[a-z0-9-]`, none of which are regex
    /// metacharacters, so the base is embedded without escaping.
    #[must_use]
    pub fn collision_pattern(&self) -> String {
        format!("^({})((-[0-9]*$)?)$", self.0)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Convert arbitrary text into a lowercase, dash-separated slug.
///
/// Latin accents are folded to ASCII; every other non-alphanumeric character
/// acts as a separator. May return an empty string.
///
/// ```
/// use delicious_core::slugify;
///
/// assert_eq!(slugify("The Coffee Shop"), "the-coffee-shop");
/// assert_eq!(slugify("  Café -- Crème!  "), "cafe-creme");
/// ```
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_dash = false;

    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            push(&mut out, ch, &mut pending_dash);
            continue;
        }
        let folded = fold_accent(ch);
        if folded.is_empty() {
            pending_dash = true;
        } else {
            for c in folded.chars() {
                push(&mut out, c, &mut pending_dash);
            }
        }
    }

    out
}

fn push(out: &mut String, c: char, pending_dash: &mut bool) {
    if *pending_dash && !out.is_empty() {
        out.push('-');
    }
    *pending_dash = false;
    out.push(c);
}

/// Fold common Latin-1 / Latin Extended-A letters to ASCII.
///
/// Returns an empty string for anything that should act as a separator.
const fn fold_accent(c: char) -> &'static str {
    match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'æ' => "ae",
        'ç' | 'ć' | 'č' => "c",
        'ď' | 'đ' => "d",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ğ' => "g",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'į' | 'ı' => "i",
        'ł' | 'ľ' => "l",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'œ' => "oe",
        'ř' => "r",
        'ś' | 'š' | 'ş' => "s",
        'ß' => "ss",
        'ť' | 'ţ' => "t",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' | 'ų' => "u",
        'ý' | 'ÿ' => "y",
        'ź' | 'ż' | 'ž' => "z",
        '&' => "and",
        _ => "",
    }
}
