//! Speaker list parsing and role assignment.

use manzai_error::{ValidationError, ValidationErrorKind, ValidationResult};
use serde::{Deserialize, Serialize};

/// Fewest speakers a dialogue can have.
pub const MIN_CHARACTERS: usize = 2;
/// Most speakers the generator supports.
pub const MAX_CHARACTERS: usize = 4;
/// Name used for the primary boke when the caller names nobody.
pub const DEFAULT_BOKE: &str = "ボケ";
/// Name used for the primary tsukkomi when the caller names nobody.
pub const DEFAULT_TSUKKOMI: &str = "ツッコミ";

const DELIMITERS: &[char] = &[',', '、', '，', '/', '／', '\n', '・'];
/// Longest accepted speaker name, in characters.
pub const MAX_NAME_CHARS: usize = 20;

/// Validated, ordered speaker list.
///
/// Position 0 is the primary boke, position 1 the primary tsukkomi; any
/// further names are supporting speakers.
///
/// # Examples
///
/// ```
/// use manzai_core::Characters;
///
/// let cast = Characters::parse("太郎、花子").unwrap();
/// assert_eq!(cast.boke(), "太郎");
/// assert_eq!(cast.tsukkomi(), "花子");
///
/// let default = Characters::parse("  ").unwrap();
/// assert_eq!(default.names(), &["ボケ".to_string(), "ツッコミ".to_string()]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Characters(Vec<String>);

impl Characters {
    /// Parse a delimiter-separated list of names.
    ///
    /// A blank list yields the default pair. Accepted delimiters are ASCII and
    /// full-width commas, the ideographic comma, slashes, the middle dot and
    /// newlines.
    ///
    /// # Errors
    ///
    /// Returns a validation error for one name, more than four names, or a
    /// name that is too long or contains a colon.
    pub fn parse(raw: &str) -> ValidationResult<Self> {
        let names: Vec<String> = raw
            .split(DELIMITERS)
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        if names.is_empty() {
            return Ok(Self::default());
        }
        Self::from_names(names)
    }

    /// Build from already-split names.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Characters::parse`], except that an empty list is
    /// also rejected.
    pub fn from_names(names: Vec<String>) -> ValidationResult<Self> {
        if names.len() < MIN_CHARACTERS {
            return Err(ValidationError::new(ValidationErrorKind::TooFewCharacters {
                min: MIN_CHARACTERS,
                got: names.len(),
            }));
        }
        if names.len() > MAX_CHARACTERS {
            return Err(ValidationError::new(ValidationErrorKind::TooManyCharacters {
                max: MAX_CHARACTERS,
                got: names.len(),
            }));
        }
        for name in &names {
            if name.chars().count() > MAX_NAME_CHARS {
                return Err(ValidationError::new(ValidationErrorKind::InvalidField {
                    field: "characters".to_string(),
                    reason: format!("name '{}' exceeds {} characters", name, MAX_NAME_CHARS),
                }));
            }
            if name.contains([':', '：']) {
                return Err(ValidationError::new(ValidationErrorKind::InvalidField {
                    field: "characters".to_string(),
                    reason: format!("name '{}' must not contain a colon", name),
                }));
            }
        }
        Ok(Self(names))
    }

    /// Primary boke.
    pub fn boke(&self) -> &str {
        &self.0[0]
    }

    /// Primary tsukkomi; also the speaker of the closing line.
    pub fn tsukkomi(&self) -> &str {
        &self.0[1]
    }

    /// Speakers after the primary pair.
    pub fn supporting(&self) -> &[String] {
        &self.0[MIN_CHARACTERS..]
    }

    /// All names in order.
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl Default for Characters {
    fn default() -> Self {
        Self(vec![DEFAULT_BOKE.to_string(), DEFAULT_TSUKKOMI.to_string()])
    }
}
