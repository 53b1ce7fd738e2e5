//! Caller-facing generation request and its validation.

use crate::{Characters, LengthRules, OutOfRange};
use manzai_error::{ValidationError, ValidationErrorKind, ValidationResult};
use serde::{Deserialize, Serialize};

/// Longest accepted theme, in characters.
pub const MAX_THEME_CHARS: usize = 200;
const MAX_GENRE_CHARS: usize = 50;
const MAX_USER_KEY_CHARS: usize = 128;

/// Opaque identifier of a metered user.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(transparent)]
pub struct UserKey(String);

impl UserKey {
    /// Wrap a user identifier, rejecting blank or oversized keys.
    ///
    /// # Examples
    ///
    /// ```
    /// use manzai_core::UserKey;
    ///
    /// assert!(UserKey::new("user-42").is_ok());
    /// assert!(UserKey::new("   ").is_err());
    /// ```
    pub fn new(raw: impl Into<String>) -> ValidationResult<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::new(ValidationErrorKind::InvalidField {
                field: "userKey".to_string(),
                reason: "must not be blank".to_string(),
            }));
        }
        if trimmed.chars().count() > MAX_USER_KEY_CHARS {
            return Err(ValidationError::new(ValidationErrorKind::InvalidField {
                field: "userKey".to_string(),
                reason: format!("exceeds {} characters", MAX_USER_KEY_CHARS),
            }));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Borrow the raw identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The caller's `length`, which may arrive as a number or a string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LengthValue {
    /// JSON number
    Number(f64),
    /// JSON string, parsed leniently
    Text(String),
}

impl LengthValue {
    fn as_f64(&self) -> Option<f64> {
        match self {
            LengthValue::Number(n) => Some(*n),
            LengthValue::Text(s) => s.trim().parse::<f64>().ok(),
        }
    }
}

impl LengthRules {
    /// Resolve the caller's length into a target within `[1, ceiling]`.
    ///
    /// Under [`OutOfRange::Clamp`] a missing, unparseable, non-finite or
    /// non-positive value becomes the default target and anything above the
    /// ceiling is clamped. Under [`OutOfRange::Reject`] only a missing value
    /// defaults; everything else outside the range is an error.
    ///
    /// # Examples
    ///
    /// ```
    /// use manzai_core::{LengthRules, LengthValue};
    ///
    /// let rules = LengthRules::default();
    /// assert_eq!(rules.resolve(Some(&LengthValue::Number(5000.0))).unwrap(), 2000);
    /// assert_eq!(rules.resolve(Some(&LengthValue::Text("abc".into()))).unwrap(), 300);
    /// assert_eq!(rules.resolve(None).unwrap(), 300);
    /// ```
    pub fn resolve(&self, raw: Option<&LengthValue>) -> ValidationResult<u32> {
        let Some(raw) = raw else {
            return Ok(self.default_target.min(self.ceiling));
        };
        let value = raw.as_f64().filter(|v| v.is_finite());

        match self.out_of_range {
            OutOfRange::Clamp => match value {
                Some(v) if v >= 1.0 => Ok((v.floor() as u64).min(self.ceiling as u64) as u32),
                _ => Ok(self.default_target.min(self.ceiling)),
            },
            OutOfRange::Reject => match value {
                Some(v) if v >= 1.0 && v <= self.ceiling as f64 => Ok(v.floor() as u32),
                Some(v) => Err(ValidationError::new(
                    ValidationErrorKind::LengthOutOfRange {
                        requested: v as i64,
                        ceiling: self.ceiling,
                    },
                )),
                None => Err(ValidationError::new(ValidationErrorKind::InvalidField {
                    field: "length".to_string(),
                    reason: "must be a number".to_string(),
                })),
            },
        }
    }
}

/// Technique identifiers chosen by the caller, one set per namespace.
///
/// Identifiers are kept verbatim; unknown ones are dropped later when they
/// are resolved against the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct TechniqueSelections {
    /// Boke techniques
    #[serde(default)]
    pub boke: Vec<String>,
    /// Tsukkomi techniques
    #[serde(default)]
    pub tsukkomi: Vec<String>,
    /// Structural techniques
    #[serde(default)]
    pub general: Vec<String>,
}

impl TechniqueSelections {
    /// True when the caller selected nothing in any namespace.
    pub fn is_empty(&self) -> bool {
        self.boke.is_empty() && self.tsukkomi.is_empty() && self.general.is_empty()
    }
}

/// Inbound request body as sent by clients, before validation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequestInput {
    /// Subject of the routine
    pub theme: Option<String>,
    /// Style or setting
    pub genre: Option<String>,
    /// Delimiter-separated speaker names
    pub characters: Option<String>,
    /// Target length
    pub length: Option<LengthValue>,
    /// Boke technique identifiers
    #[serde(default)]
    pub boke: Vec<String>,
    /// Tsukkomi technique identifiers
    #[serde(default)]
    pub tsukkomi: Vec<String>,
    /// Structural technique identifiers
    #[serde(default)]
    pub general: Vec<String>,
    /// Metered user
    #[serde(default, alias = "user_id")]
    pub user_key: Option<String>,
}

impl GenerationRequestInput {
    /// Validate into a [`GenerationRequest`].
    ///
    /// # Errors
    ///
    /// Returns a validation error for a missing or oversized theme, a missing
    /// genre, a malformed cast, a malformed user key, or (under the reject
    /// policy) an out-of-range length.
    pub fn validate(self, rules: &LengthRules) -> ValidationResult<GenerationRequest> {
        let theme = self
            .theme
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ValidationError::new(ValidationErrorKind::MissingField("theme".into())))?;
        if theme.chars().count() > MAX_THEME_CHARS {
            return Err(ValidationError::new(ValidationErrorKind::InvalidField {
                field: "theme".to_string(),
                reason: format!("exceeds {} characters", MAX_THEME_CHARS),
            }));
        }

        let genre = self
            .genre
            .map(|g| g.trim().to_string())
            .ok_or_else(|| ValidationError::new(ValidationErrorKind::MissingField("genre".into())))?;
        if genre.chars().count() > MAX_GENRE_CHARS {
            return Err(ValidationError::new(ValidationErrorKind::InvalidField {
                field: "genre".to_string(),
                reason: format!("exceeds {} characters", MAX_GENRE_CHARS),
            }));
        }

        let characters = match self.characters.as_deref() {
            Some(raw) => Characters::parse(raw)?,
            None => Characters::default(),
        };
        let target_length = rules.resolve(self.length.as_ref())?;
        let user_key = self.user_key.map(UserKey::new).transpose()?;

        Ok(GenerationRequest {
            theme,
            genre,
            characters,
            target_length,
            techniques: TechniqueSelections {
                boke: self.boke,
                tsukkomi: self.tsukkomi,
                general: self.general,
            },
            user_key,
        })
    }
}

/// A validated generation request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, derive_getters::Getters)]
pub struct GenerationRequest {
    /// Subject of the routine
    theme: String,
    /// Style or setting; may be empty
    genre: String,
    /// Ordered speakers
    characters: Characters,
    /// Requested length within `[1, ceiling]`
    target_length: u32,
    /// Caller technique selections
    techniques: TechniqueSelections,
    /// Metered user, if any
    user_key: Option<UserKey>,
}
