//! Idempotent text passes over generated scripts.

use manzai_core::{MAX_NAME_CHARS, ScriptDraft};
use manzai_error::ConfigError;
use regex::Regex;
use tracing::{debug, instrument};

/// Line every script must end on, spoken by the closing speaker.
pub const CLOSING_PHRASE: &str = "もうええわ、どうもありがとうございました。";

/// Characters ignored when matching the closing phrase.
const PHRASE_NOISE: &str = "、。，,．.！!？?　 ";

/// Bracket pairs stripped from around a title.
const TITLE_BRACKETS: &[(char, char)] = &[
    ('「', '」'),
    ('『', '』'),
    ('【', '】'),
    ('[', ']'),
    ('《', '》'),
    ('〈', '〉'),
    ('"', '"'),
    ('“', '”'),
    ('（', '）'),
    ('(', ')'),
];

/// Title/body splitting, speaker label cleanup, turn spacing and the
/// closing line.
///
/// Every pass is idempotent: applying it twice gives the same text as
/// applying it once.
///
/// Without a cast, a label is any short name free of spaces and
/// punctuation. [`with_speakers`](Self::with_speakers) adds the exact names
/// of a cast, so names like `田中 一郎` are recognised too.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    closing_phrase: String,
    speaker_regex: Regex,
    cast_regex: Option<Regex>,
    title_label_regex: Regex,
    closing_regex: Regex,
    label_only_regex: Regex,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TextNormalizer {
    /// Normalizer using [`CLOSING_PHRASE`].
    pub fn new() -> Self {
        Self::compile(CLOSING_PHRASE.to_string())
    }

    /// Normalizer with a custom closing phrase.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the phrase has nothing besides
    /// whitespace and punctuation, since such a phrase would match the end
    /// of every line.
    pub fn with_closing_phrase(phrase: impl Into<String>) -> Result<Self, ConfigError> {
        let phrase = phrase.into();
        if phrase_skeleton(&phrase).next().is_none() {
            return Err(ConfigError::new(format!(
                "closing phrase '{}' has no characters besides whitespace and punctuation",
                phrase
            )));
        }
        Ok(Self::compile(phrase))
    }

    fn compile(closing_phrase: String) -> Self {
        let speaker_regex = Regex::new(&format!(
            r"^\s*(?:\*\*)?(?P<name>[^\s:：*「」『』（）()\[\]【】《》/／.,、。！？!?]{{1,{}}})(?:\*\*)?\s*[:：](?:\*\*)?\s*(?P<rest>.*)$",
            MAX_NAME_CHARS
        ))
        .expect("Valid speaker regex");

        let title_label_regex = Regex::new(
            r"(?i)^\s*(?:#+\s*)?(?:\*\*)?\s*(?:タイトル|題名|title)\s*(?:\*\*)?\s*[:：]\s*(?:\*\*)?(?P<title>.*)$",
        )
        .expect("Valid title regex");

        let closing_regex =
            Regex::new(&closing_pattern(&closing_phrase)).expect("Valid closing phrase regex");

        let label_only_regex = Regex::new(&format!(
            r"^\s*(?:\*\*)?[^:：]{{1,{}}}?(?:\*\*)?\s*[:：]\s*$",
            MAX_NAME_CHARS
        ))
        .expect("Valid label regex");

        Self {
            closing_phrase,
            speaker_regex,
            cast_regex: None,
            title_label_regex,
            closing_regex,
            label_only_regex,
        }
    }

    /// Copy that also treats each of `speakers` as a label.
    ///
    /// Names are matched literally, longest first, before the generic
    /// pattern is tried.
    ///
    /// # Examples
    ///
    /// ```
    /// use manzai_script::TextNormalizer;
    ///
    /// let normalizer = TextNormalizer::new().with_speakers(&["田中 一郎", "山田 太郎"]);
    /// assert_eq!(normalizer.speaker_of("山田 太郎：なんでやねん"), Some("山田 太郎"));
    /// assert_eq!(TextNormalizer::new().speaker_of("山田 太郎：なんでやねん"), None);
    /// ```
    pub fn with_speakers<S: AsRef<str>>(&self, speakers: &[S]) -> Self {
        let mut names: Vec<&str> = speakers
            .iter()
            .map(|name| name.as_ref().trim())
            .filter(|name| !name.is_empty())
            .collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then(a.cmp(b)));
        names.dedup();

        let cast_regex = if names.is_empty() {
            None
        } else {
            let alternatives = names
                .iter()
                .map(|name| regex::escape(name))
                .collect::<Vec<_>>()
                .join("|");
            Regex::new(&format!(
                r"^\s*(?:\*\*)?(?P<name>{})(?:\*\*)?\s*[:：](?:\*\*)?\s*(?P<rest>.*)$",
                alternatives
            ))
            .inspect_err(|e| debug!(error = %e, "Cast names not usable as labels"))
            .ok()
        };

        Self {
            cast_regex,
            ..self.clone()
        }
    }

    /// The phrase appended by [`ensure_closing_line`](Self::ensure_closing_line).
    pub fn closing_phrase(&self) -> &str {
        &self.closing_phrase
    }

    /// The full closing line for a speaker.
    pub fn closing_line(&self, speaker: &str) -> String {
        format!("{}: {}", speaker, self.closing_phrase)
    }

    /// Speaker name if `line` is a dialogue turn.
    pub fn speaker_of<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.label_parts(line).map(|(name, _)| name)
    }

    /// Label and remaining text of a dialogue line.
    fn label_parts<'a>(&self, line: &'a str) -> Option<(&'a str, &'a str)> {
        if let Some(caps) = self.cast_regex.as_ref().and_then(|r| r.captures(line)) {
            let name = caps.name("name")?.as_str();
            let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or_default();
            return Some((name, rest));
        }
        let caps = self.speaker_regex.captures(line)?;
        let name = caps.name("name")?.as_str();
        let rest = caps.name("rest").map(|m| m.as_str()).unwrap_or_default();
        // Clock times and URLs look like labels but are not.
        if name.chars().all(|c| c.is_ascii_digit()) || rest.starts_with("//") {
            return None;
        }
        Some((name, rest))
    }

    /// True when `line` starts with a speaker label.
    pub fn is_speaker_line(&self, line: &str) -> bool {
        self.speaker_of(line).is_some()
    }

    /// Separate the title from the dialogue.
    ///
    /// The title is the first block when it is a single non-dialogue line
    /// followed by a blank line, or a line explicitly labelled as a title.
    /// Otherwise the title is empty and the whole text is the body.
    #[instrument(skip_all, fields(len = raw.len()))]
    pub fn split_title_and_body(&self, raw: &str) -> ScriptDraft {
        let text = raw.replace("\r\n", "\n").replace('\r', "\n");
        let lines: Vec<&str> = text.trim().lines().collect();

        let Some(first) = lines.first() else {
            return ScriptDraft::default();
        };

        if let Some(caps) = self.title_label_regex.captures(first) {
            let title = caps.name("title").map(|m| m.as_str()).unwrap_or_default();
            debug!("Found labelled title");
            return ScriptDraft::new(clean_title(title), join_trimmed(&lines[1..]));
        }

        let blank = lines.iter().position(|line| line.trim().is_empty());
        match blank {
            Some(1) if !self.is_speaker_line(first) => {
                debug!("Found title block");
                ScriptDraft::new(clean_title(first), join_trimmed(&lines[2..]))
            }
            _ => ScriptDraft::new("", join_trimmed(&lines)),
        }
    }

    /// Rewrite every speaker label to the canonical `Name: text` form.
    ///
    /// Full-width colons, surrounding bold markers and stray whitespace
    /// around the label are normalized. Trailing whitespace is trimmed from
    /// every line.
    pub fn normalize_speaker_labels(&self, text: &str) -> String {
        text.replace('\r', "")
            .split('\n')
            .map(|line| match self.label_parts(line) {
                Some((name, rest)) => format!("{}: {}", name, rest.trim()).trim_end().to_string(),
                None => line.trim_end().to_string(),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Separate consecutive turns by exactly one blank line.
    ///
    /// Runs of blank lines collapse to one and leading or trailing blank
    /// lines are removed.
    pub fn ensure_blank_line_between_turns(&self, text: &str) -> String {
        let mut out: Vec<&str> = Vec::new();
        let mut pending_blank = false;
        let mut previous_is_speaker = false;

        for line in text.lines().map(str::trim_end) {
            if line.trim().is_empty() {
                pending_blank = !out.is_empty();
                continue;
            }
            let is_speaker = self.is_speaker_line(line);
            if pending_blank || (is_speaker && previous_is_speaker) {
                out.push("");
            }
            pending_blank = false;
            previous_is_speaker = is_speaker;
            out.push(line);
        }

        out.join("\n")
    }

    /// Make the script end on the closing line, exactly once.
    ///
    /// An existing closing phrase at the end is removed first, tolerating
    /// whitespace and punctuation differences, so the result never repeats it.
    ///
    /// # Examples
    ///
    /// ```
    /// use manzai_script::TextNormalizer;
    ///
    /// let normalizer = TextNormalizer::new();
    /// let once = normalizer.ensure_closing_line("ボケ: こんにちは", "ツッコミ");
    /// assert!(once.ends_with("ツッコミ: もうええわ、どうもありがとうございました。"));
    /// assert_eq!(normalizer.ensure_closing_line(&once, "ツッコミ"), once);
    /// ```
    pub fn ensure_closing_line(&self, text: &str, speaker: &str) -> String {
        let stripped = self.strip_closing_line(text);
        let line = self.closing_line(speaker);
        if stripped.is_empty() {
            line
        } else {
            format!("{}\n\n{}", stripped, line)
        }
    }

    /// Remove any trailing closing phrase, along with a label left bare by
    /// the removal.
    pub fn strip_closing_line(&self, text: &str) -> String {
        let mut current = text.trim_end().to_string();
        loop {
            let (head, last) = match current.rfind('\n') {
                Some(idx) => (&current[..idx], &current[idx + 1..]),
                None => ("", current.as_str()),
            };
            let Some(found) = self.closing_regex.find(last) else {
                return current;
            };
            let remainder = last[..found.start()].trim_end();
            let keep_remainder =
                !remainder.is_empty() && !self.label_only_regex.is_match(remainder);
            let next = if keep_remainder {
                format!("{}\n{}", head, remainder)
            } else {
                head.to_string()
            };
            current = next.trim().to_string();
        }
    }

    /// Labels, turn spacing and closing line in one go.
    pub fn normalize(&self, text: &str, closing_speaker: &str) -> String {
        let labelled = self.normalize_speaker_labels(text);
        let spaced = self.ensure_blank_line_between_turns(&labelled);
        self.ensure_closing_line(&spaced, closing_speaker)
    }
}

/// Pattern matching `phrase` at the end of a line, ignoring whitespace and
/// punctuation between its characters.
fn closing_pattern(phrase: &str) -> String {
    let noise = format!("[\\s{}]*", regex::escape(PHRASE_NOISE));
    let skeleton: Vec<String> = phrase_skeleton(phrase)
        .map(|c| regex::escape(&c.to_string()))
        .collect();
    format!("{}{}$", skeleton.join(&noise), noise)
}

/// Characters of `phrase` that must appear for it to match.
fn phrase_skeleton(phrase: &str) -> impl Iterator<Item = char> + '_ {
    phrase
        .chars()
        .filter(|c| !c.is_whitespace() && !PHRASE_NOISE.contains(*c))
}

fn join_trimmed(lines: &[&str]) -> String {
    lines.join("\n").trim().to_string()
}

/// Remove markdown and bracket decoration from a title line.
fn clean_title(raw: &str) -> String {
    let mut title = raw.trim().trim_start_matches('#').replace("**", "");
    loop {
        let trimmed = title.trim();
        let unwrapped = TITLE_BRACKETS.iter().find_map(|(open, close)| {
            trimmed
                .strip_prefix(*open)
                .and_then(|inner| inner.strip_suffix(*close))
        });
        match unwrapped {
            Some(inner) => title = inner.to_string(),
            None => return trimmed.to_string(),
        }
    }
}
