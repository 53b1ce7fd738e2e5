//! Static catalog of comedic techniques.

use manzai_error::ConfigError;
use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

const BUNDLED_CATALOG: &str = include_str!("../techniques.toml");

/// Technique namespaces a caller can select from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter, strum::EnumString,
)]
#[strum(serialize_all = "lowercase")]
pub enum Namespace {
    /// Techniques for the boke
    Boke,
    /// Techniques for the tsukkomi
    Tsukkomi,
    /// Structural techniques for the whole routine
    General,
}

/// One catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, derive_getters::Getters)]
pub struct Technique {
    /// Short human-readable name
    label: String,
    /// Guideline text handed to the model
    definition: String,
}

/// Immutable mapping from identifier to technique, per namespace.
///
/// Loaded once at startup and shared read-only across requests.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TechniqueCatalog {
    #[serde(default)]
    mandatory_structure: Vec<String>,
    #[serde(default)]
    boke: BTreeMap<String, Technique>,
    #[serde(default)]
    tsukkomi: BTreeMap<String, Technique>,
    #[serde(default)]
    general: BTreeMap<String, Technique>,
}

impl TechniqueCatalog {
    /// The catalog shipped with the crate.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled TOML does not parse.
    pub fn bundled() -> Result<Self, ConfigError> {
        Self::from_toml_str(BUNDLED_CATALOG)
    }

    /// Parse a catalog from TOML.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed TOML or entries missing a label or
    /// definition.
    ///
    /// # Examples
    ///
    /// ```
    /// use manzai_prompt::{Namespace, TechniqueCatalog};
    ///
    /// let catalog = TechniqueCatalog::from_toml_str(r#"
    ///     [boke.TENDON]
    ///     label = "天丼"
    ///     definition = "同じボケを繰り返す"
    /// "#).unwrap();
    /// assert_eq!(catalog.get(Namespace::Boke, "TENDON").unwrap().label(), "天丼");
    /// assert!(catalog.get(Namespace::Boke, "UNKNOWN").is_none());
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let catalog: Self = toml::from_str(source)
            .map_err(|e| ConfigError::new(format!("Invalid technique catalog: {}", e)))?;
        debug!(
            boke = catalog.boke.len(),
            tsukkomi = catalog.tsukkomi.len(),
            general = catalog.general.len(),
            "Loaded technique catalog"
        );
        Ok(catalog)
    }

    fn entries(&self, namespace: Namespace) -> &BTreeMap<String, Technique> {
        match namespace {
            Namespace::Boke => &self.boke,
            Namespace::Tsukkomi => &self.tsukkomi,
            Namespace::General => &self.general,
        }
    }

    /// Look up one identifier.
    pub fn get(&self, namespace: Namespace, id: &str) -> Option<&Technique> {
        self.entries(namespace).get(id)
    }

    /// All identifiers in a namespace, in stable order.
    pub fn ids(&self, namespace: Namespace) -> Vec<&str> {
        self.entries(namespace).keys().map(String::as_str).collect()
    }

    /// Structural requirements every routine must include.
    pub fn mandatory_structure(&self) -> &[String] {
        &self.mandatory_structure
    }

    /// Resolve caller identifiers, dropping unknown ones and duplicates.
    ///
    /// Order follows the caller's list.
    pub fn resolve<'a>(&'a self, namespace: Namespace, ids: &[String]) -> Vec<&'a Technique> {
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for id in ids {
            let id = id.trim();
            if seen.contains(&id) {
                continue;
            }
            seen.push(id);
            match self.get(namespace, id) {
                Some(technique) => out.push(technique),
                None => debug!(%namespace, id, "Ignoring unknown technique"),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn test_bundled_catalog_parses() {
        let catalog = TechniqueCatalog::bundled().unwrap();
        for namespace in Namespace::iter() {
            assert!(!catalog.ids(namespace).is_empty(), "{namespace} is empty");
        }
        assert_eq!(catalog.mandatory_structure(), ["伏線回収", "最後のオチ"]);
    }

    #[test]
    fn test_resolve_skips_unknown_and_duplicates() {
        let catalog = TechniqueCatalog::bundled().unwrap();
        let ids = vec![
            "TENDON".to_string(),
            "NOT_A_REAL_ID".to_string(),
            "TENDON".to_string(),
        ];
        let resolved = catalog.resolve(Namespace::Boke, &ids);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].label(), "天丼");
    }

    #[test]
    fn test_namespaces_are_independent() {
        let catalog = TechniqueCatalog::bundled().unwrap();
        assert!(catalog.get(Namespace::Tsukkomi, "TENDON").is_none());
    }

    #[test]
    fn test_malformed_catalog_rejected() {
        assert!(TechniqueCatalog::from_toml_str("[boke.X]\nlabel = 1").is_err());
    }
}
