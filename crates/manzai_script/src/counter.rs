//! Character counting under a configurable policy.

use manzai_core::{CountUnit, CountingPolicy};

/// Measure `text` under `policy`.
///
/// # Examples
///
/// ```
/// use manzai_core::{CountUnit, CountingPolicy};
/// use manzai_script::count;
///
/// let code_points = CountingPolicy { unit: CountUnit::CodePoint, exclude_newlines: false };
/// assert_eq!(count("あ", &code_points), 1);
/// assert_eq!(count("𠮷", &code_points), 1);
///
/// let utf16 = CountingPolicy { unit: CountUnit::Utf16, exclude_newlines: false };
/// assert_eq!(count("𠮷", &utf16), 2);
/// ```
pub fn count(text: &str, policy: &CountingPolicy) -> usize {
    CharacterCounter::new(*policy).count(text)
}

/// Stateless length measurement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CharacterCounter {
    policy: CountingPolicy,
}

impl CharacterCounter {
    /// Create a counter for a policy.
    pub fn new(policy: CountingPolicy) -> Self {
        Self { policy }
    }

    /// The policy in force.
    pub fn policy(&self) -> &CountingPolicy {
        &self.policy
    }

    /// Units contributed by one character.
    pub fn weight(&self, c: char) -> usize {
        if self.policy.exclude_newlines && (c == '\n' || c == '\r') {
            return 0;
        }
        match self.policy.unit {
            CountUnit::CodePoint => 1,
            CountUnit::Utf16 => c.len_utf16(),
        }
    }

    /// Total units in `text`.
    pub fn count(&self, text: &str) -> usize {
        text.chars().map(|c| self.weight(c)).sum()
    }

    /// Largest byte offset whose prefix measures at most `limit` units.
    ///
    /// The offset always falls on a character boundary.
    pub fn prefix_end(&self, text: &str, limit: usize) -> usize {
        let mut total = 0;
        for (idx, c) in text.char_indices() {
            total += self.weight(c);
            if total > limit {
                return idx;
            }
        }
        text.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counter(unit: CountUnit, exclude_newlines: bool) -> CharacterCounter {
        CharacterCounter::new(CountingPolicy {
            unit,
            exclude_newlines,
        })
    }

    #[test]
    fn test_newlines_excluded() {
        let c = counter(CountUnit::CodePoint, true);
        assert_eq!(c.count("あい\r\nう\n"), 3);
    }

    #[test]
    fn test_newlines_included() {
        let c = counter(CountUnit::CodePoint, false);
        assert_eq!(c.count("あい\nう"), 4);
    }

    #[test]
    fn test_astral_counts_once_as_code_point() {
        let c = counter(CountUnit::CodePoint, true);
        assert_eq!(c.count("😀𠮷"), 2);
    }

    #[test]
    fn test_astral_counts_twice_as_utf16() {
        let c = counter(CountUnit::Utf16, true);
        assert_eq!(c.count("😀𠮷"), 4);
        assert_eq!(c.count("あ"), 1);
    }

    #[test]
    fn test_prefix_end_on_char_boundary() {
        let c = counter(CountUnit::CodePoint, true);
        let text = "あいうえお";
        let end = c.prefix_end(text, 2);
        assert_eq!(&text[..end], "あい");
        assert_eq!(c.prefix_end(text, 10), text.len());
        assert_eq!(c.prefix_end(text, 0), 0);
    }

    #[test]
    fn test_prefix_end_skips_newlines_when_excluded() {
        let c = counter(CountUnit::CodePoint, true);
        let text = "あ\nい\nう";
        let end = c.prefix_end(text, 2);
        assert_eq!(&text[..end], "あ\nい\n");
    }

    #[test]
    fn test_prefix_end_does_not_split_surrogate_pair() {
        let c = counter(CountUnit::Utf16, true);
        let text = "あ😀";
        assert_eq!(&text[..c.prefix_end(text, 2)], "あ");
        assert_eq!(&text[..c.prefix_end(text, 3)], "あ😀");
    }
}
