//! Markup stripping and length truncation.

use crate::CharacterCounter;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Marks a truncation may end on.
pub const SENTENCE_FINAL: &[char] = &['。', '！', '？', '!', '?'];

/// Characters a finished script may end on.
const TERMINALS: &[char] = &['。', '！', '？', '!', '?', '…', '」', '』', '）', ')'];

/// Closing brackets kept together with the sentence they close.
const CLOSERS: &[char] = &['」', '』', '）', ')'];

/// Mark appended when text ends mid-sentence.
pub const DEFAULT_TERMINAL: char = '。';

/// Share of the maximum a boundary cut must keep.
pub const DEFAULT_SOFT_CUT_RATIO: f64 = 0.8;

/// True when the last visible character is terminal punctuation.
pub fn ends_with_terminal(text: &str) -> bool {
    text.trim_end()
        .chars()
        .last()
        .is_some_and(|c| TERMINALS.contains(&c))
}

/// Enforcer tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EnforcerConfig {
    /// A sentence or line boundary is used only if the kept prefix reaches
    /// this share of the maximum. Clamped to `0.7..=0.9`.
    #[serde(default = "default_soft_cut_ratio")]
    pub soft_cut_ratio: f64,
}

fn default_soft_cut_ratio() -> f64 {
    DEFAULT_SOFT_CUT_RATIO
}

impl Default for EnforcerConfig {
    fn default() -> Self {
        Self {
            soft_cut_ratio: DEFAULT_SOFT_CUT_RATIO,
        }
    }
}

impl EnforcerConfig {
    /// Ratio forced into its valid range.
    pub fn clamped_ratio(&self) -> f64 {
        if self.soft_cut_ratio.is_nan() {
            DEFAULT_SOFT_CUT_RATIO
        } else {
            self.soft_cut_ratio.clamp(0.7, 0.9)
        }
    }
}

/// Brings text inside a length ceiling without cutting mid-sentence when a
/// reasonable boundary exists.
#[derive(Debug, Clone)]
pub struct LengthEnforcer {
    counter: CharacterCounter,
    soft_cut_ratio: f64,
    fence_regex: Regex,
    rule_regex: Regex,
    heading_regex: Regex,
    footer_regex: Regex,
}

impl LengthEnforcer {
    /// Create an enforcer measuring with `counter`.
    pub fn new(counter: CharacterCounter, config: EnforcerConfig) -> Self {
        Self {
            counter,
            soft_cut_ratio: config.clamped_ratio(),
            fence_regex: Regex::new(r"^\s*(?:```|~~~)").expect("Valid fence regex"),
            rule_regex: Regex::new(r"^\s*(?:-{3,}|\*{3,}|_{3,}|={3,})\s*$")
                .expect("Valid rule regex"),
            heading_regex: Regex::new(r"^\s{0,3}#{1,6}\s*").expect("Valid heading regex"),
            footer_regex: Regex::new(
                r"[（(]\s*(?:文字数|字数)\s*[:：]?\s*約?\s*[0-9０-９,，]+\s*(?:文字|字)?\s*[）)]",
            )
            .expect("Valid footer regex"),
        }
    }

    /// The counter used for every measurement.
    pub fn counter(&self) -> &CharacterCounter {
        &self.counter
    }

    /// Effective soft cut ratio.
    pub fn soft_cut_ratio(&self) -> f64 {
        self.soft_cut_ratio
    }

    /// Remove code fences, horizontal rules, heading and emphasis markup
    /// and character-count footers.
    pub fn strip_decoration(&self, text: &str) -> String {
        let text = text.replace("\r\n", "\n");
        let lines: Vec<String> = text
            .lines()
            .filter(|line| !self.fence_regex.is_match(line) && !self.rule_regex.is_match(line))
            .map(|line| {
                self.heading_regex
                    .replace(line, "")
                    .replace("**", "")
                    .replace("__", "")
            })
            .collect();
        let joined = lines.join("\n");
        self.footer_regex.replace_all(&joined, "").trim().to_string()
    }

    /// Shape `text` to fit at most `max` units.
    ///
    /// With `allow_overflow` only markup is stripped and the ending tidied.
    /// Otherwise text above `max` is cut at the last sentence end, then the
    /// last line break, provided the kept part reaches the soft cut ratio;
    /// failing both it is cut hard at `max`. The result always ends on
    /// terminal punctuation when non-empty and never exceeds `max`.
    /// Text below `min` cannot be padded and is returned tidied.
    #[instrument(skip(self, text), fields(len = text.len()))]
    pub fn enforce(&self, text: &str, min: u32, max: u32, allow_overflow: bool) -> String {
        let cleaned = self.strip_decoration(text);
        if allow_overflow {
            return self.terminate(cleaned, None);
        }

        let max = max as usize;
        let length = self.counter.count(&cleaned);
        let shaped = if length > max {
            debug!(length, max, "Truncating over-length script");
            self.truncate(&cleaned, max).to_string()
        } else {
            if length < min as usize {
                debug!(length, min, "Script below minimum length");
            }
            cleaned
        };
        self.terminate(shaped, Some(max))
    }

    fn truncate<'a>(&self, text: &'a str, max: usize) -> &'a str {
        let hard = self.counter.prefix_end(text, max);
        let window = &text[..hard];
        let threshold = (max as f64 * self.soft_cut_ratio).ceil() as usize;
        let reaches = |end: &usize| self.counter.count(&window[..*end]) >= threshold;

        let sentence = window
            .char_indices()
            .rev()
            .find(|(_, c)| SENTENCE_FINAL.contains(c))
            .map(|(idx, c)| extend_over_closers(window, idx + c.len_utf8()));
        let line = window.rfind('\n');

        let cut = match sentence.filter(reaches) {
            Some(end) => {
                debug!("Cut at sentence boundary");
                end
            }
            None => match line.filter(reaches) {
                Some(end) => {
                    debug!("Cut at line boundary");
                    end
                }
                None => {
                    debug!("Hard cut");
                    hard
                }
            },
        };
        window[..cut].trim_end()
    }

    /// Append terminal punctuation, dropping trailing characters if the
    /// mark would break `limit`.
    fn terminate(&self, text: String, limit: Option<usize>) -> String {
        let mut text = text.trim_end().to_string();
        if text.is_empty() || ends_with_terminal(&text) {
            return text;
        }
        if let Some(limit) = limit {
            let mark = self.counter.weight(DEFAULT_TERMINAL);
            let mut total = self.counter.count(&text);
            while total + mark > limit {
                match text.pop() {
                    Some(c) => total -= self.counter.weight(c),
                    None => break,
                }
            }
            let kept = text.trim_end().len();
            text.truncate(kept);
            if text.is_empty() || ends_with_terminal(&text) {
                return text;
            }
        }
        text.push(DEFAULT_TERMINAL);
        text
    }
}

fn extend_over_closers(window: &str, end: usize) -> usize {
    let tail = &window[end..];
    let extra: usize = tail
        .chars()
        .take_while(|c| CLOSERS.contains(c))
        .map(char::len_utf8)
        .sum();
    end + extra
}
