//! # Transcript cleaning
//!
//! Normalises transcript lines of a Thai corpus before alignment:
//!
//! 1. quote characters are dropped together with the whitespace around them
//! 2. remaining punctuation becomes a space
//! 3. whole words are substituted from a [`WordReplacements`] table, and the
//!    substituted text is glued to its neighbours (Thai is written without
//!    spaces between words)
//! 4. the repetition marker "ๆ" is kept, stripped or expanded
//! 5. whitespace runs collapse to one space
//!
//! ```text
//! "ผมใช้ Facebook ทุกวัน" + {"Facebook": "เฟซบุ๊ก"}  ->  "ผมใช้เฟซบุ๊กทุกวัน"
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use log::{debug, info};
use once_cell::sync::Lazy;
use regex::{NoExpand, Regex};
use serde::{Deserialize, Serialize};

use crate::error::{PrepError, Result};

/// Thai repetition marker
pub const MAI_YAMOK: char = 'ๆ';

static CUT_SPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\s*["'‘’“”]\s*"#).expect("valid quote pattern"));
static REPLACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[!"',\-.:;?_|~—‘’“”]"#).expect("valid punctuation pattern"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));
static REPEAT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"([^\sๆ]+)\s*ๆ").expect("valid repeat pattern"));

/// What to do with "ๆ"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaiYamok {
    /// Leave the marker in place
    #[default]
    Keep,
    /// Delete the marker
    Strip,
    /// Repeat the preceding whitespace-delimited token
    Expand,
}

impl fmt::Display for MaiYamok {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Keep => "keep",
            Self::Strip => "strip",
            Self::Expand => "expand",
        })
    }
}

impl FromStr for MaiYamok {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "strip" => Ok(Self::Strip),
            "expand" => Ok(Self::Expand),
            other => Err(PrepError::Config(format!(
                "unknown mai yamok mode '{}', expected keep, strip or expand",
                other
            ))),
        }
    }
}

/// Ordered word substitutions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordReplacements {
    pairs: Vec<(String, String)>,
}

impl WordReplacements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            pairs: pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }

    /// Load a JSON object of `"word": "replacement"` entries, keeping
    /// the file order.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
            .map_err(|e| PrepError::Config(format!("bad replacements in {}: {}", path.display(), e)))
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let map: serde_json::Map<String, serde_json::Value> = serde_json::from_str(content)?;
        let mut pairs = Vec::with_capacity(map.len());
        for (word, value) in map {
            let replacement = value
                .as_str()
                .ok_or_else(|| PrepError::Config(format!("replacement for '{}' is not a string", word)))?;
            pairs.push((word, replacement.to_string()));
        }
        Ok(Self { pairs })
    }

    pub fn push(&mut self, word: impl Into<String>, replacement: impl Into<String>) {
        self.pairs.push((word.into(), replacement.into()));
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(w, r)| (w.as_str(), r.as_str()))
    }
}

/// Compiled cleaner, reusable across lines.
///
/// Words match on Unicode word boundaries, where Thai combining marks
/// count as word characters. A Thai key such as "ดี" therefore does not
/// match inside "ดีมาก"; keys are effectively whole-token matches.
#[derive(Debug, Clone)]
pub struct TextCleaner {
    /// (whole-word pattern, replacement)
    words: Vec<(Regex, String)>,
    /// Strips whitespace around characters of each replacement
    glue: Vec<Regex>,
    mai_yamok: MaiYamok,
}

impl TextCleaner {
    pub fn new(replacements: Option<&WordReplacements>, mai_yamok: MaiYamok) -> Result<Self> {
        let mut words = Vec::new();
        let mut glue = Vec::new();

        if let Some(replacements) = replacements {
            for (word, replacement) in replacements.iter() {
                let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(word)))?;
                words.push((pattern, replacement.to_string()));
            }
            for (_, replacement) in replacements.iter() {
                if replacement.is_empty() {
                    continue;
                }
                let class: String = replacement
                    .chars()
                    .map(|c| regex::escape(c.encode_utf8(&mut [0; 4])))
                    .collect();
                glue.push(Regex::new(&format!(r"\s*([{}])\s*", class))?);
            }
        }

        Ok(Self {
            words,
            glue,
            mai_yamok,
        })
    }

    /// Clean a single line
    pub fn clean(&self, text: &str) -> String {
        let text = CUT_SPACE_RE.replace_all(text, "");
        let mut text = REPLACE_RE.replace_all(&text, " ").into_owned();

        for (pattern, replacement) in &self.words {
            text = pattern.replace_all(&text, NoExpand(replacement)).into_owned();
        }
        for pattern in &self.glue {
            text = pattern.replace_all(&text, "$1").into_owned();
        }

        text = match self.mai_yamok {
            MaiYamok::Keep => text,
            MaiYamok::Strip => text.replace(MAI_YAMOK, " "),
            MaiYamok::Expand => REPEAT_RE.replace_all(&text, "$1$1").replace(MAI_YAMOK, " "),
        };

        WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
    }

    /// Clean every line of `content`; line structure is preserved
    pub fn clean_lines(&self, content: &str) -> String {
        let mut out = String::with_capacity(content.len());
        for line in content.lines() {
            out.push_str(&self.clean(line));
            out.push('\n');
        }
        out
    }
}

/// Clean `text` in one go.
///
/// Builds a [`TextCleaner`] per call; use one directly for many lines.
pub fn clean_text_cv(text: &str, replacements: Option<&WordReplacements>, mai_yamok: MaiYamok) -> Result<String> {
    Ok(TextCleaner::new(replacements, mai_yamok)?.clean(text))
}

/// Clean each line of the UTF-8 file `input` into `output`.
///
/// Returns the number of lines written.
pub fn clean_file<P: AsRef<Path>, Q: AsRef<Path>>(
    input: P,
    output: Q,
    replacements: Option<&WordReplacements>,
    mai_yamok: MaiYamok,
) -> Result<usize> {
    let input = input.as_ref();
    let output = output.as_ref();
    let content = fs::read_to_string(input)?;
    let cleaner = TextCleaner::new(replacements, mai_yamok)?;

    let cleaned = cleaner.clean_lines(&content);
    let lines = content.lines().count();
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(output, cleaned)?;

    debug!("Cleaning used {} word replacements", replacements.map_or(0, |r| r.len()));
    info!("Cleaned {} lines from {} into {}", lines, input.display(), output.display());
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clean(text: &str, pairs: &[(&str, &str)]) -> String {
        let replacements = WordReplacements::from_pairs(pairs.iter().copied());
        clean_text_cv(text, Some(&replacements), MaiYamok::Keep).unwrap()
    }

    #[test]
    fn replacement_is_glued_to_thai_neighbours() {
        assert_eq!(
            clean("ผมใช้ Facebook ทุกวัน", &[("Facebook", "เฟซบุ๊ก")]),
            "ผมใช้เฟซบุ๊กทุกวัน"
        );
    }

    #[test]
    fn glue_applies_to_latin_replacements_too() {
        assert_eq!(clean("Hello, world!", &[("Hello", "Hi")]), "Hiworld");
    }

    #[test]
    fn quotes_take_their_whitespace_with_them() {
        let cleaned = clean_text_cv(r#"เขาพูดว่า "สวัสดี" แล้วก็ไป."#, None, MaiYamok::Keep).unwrap();
        assert_eq!(cleaned, "เขาพูดว่าสวัสดีแล้วก็ไป");
    }

    #[test]
    fn punctuation_becomes_single_spaces() {
        let cleaned = clean_text_cv("it's  a   test ; ok?", None, MaiYamok::Keep).unwrap();
        assert_eq!(cleaned, "its a test ok");
    }

    #[test]
    fn multi_word_replacement_glues_every_character() {
        assert_eq!(
            clean("Mr Lincoln said: hello - world", &[("Mr Lincoln", "มิสเตอร์ ลินคอล์น")]),
            "มิสเตอร์ลินคอล์นsaid hello world"
        );
    }

    #[test]
    fn only_whole_words_are_replaced() {
        assert_eq!(
            clean("Facebooking Facebook", &[("Facebook", "เฟซบุ๊ก")]),
            "Facebookingเฟซบุ๊ก"
        );
    }

    #[test]
    fn thai_key_needs_a_token_boundary() {
        assert_eq!(clean("ดีมาก", &[("ดี", "good")]), "ดีมาก");
        assert_eq!(clean("ดี มาก", &[("ดี", "good")]), "goodมาก");
    }

    #[test]
    fn replacement_text_is_literal() {
        assert_eq!(clean("price", &[("price", "$1")]), "$1");
    }

    #[test]
    fn mai_yamok_modes() {
        let text = "เด็ก ๆ เล่นกันดีๆ";
        assert_eq!(clean_text_cv(text, None, MaiYamok::Keep).unwrap(), "เด็ก ๆ เล่นกันดีๆ");
        assert_eq!(clean_text_cv(text, None, MaiYamok::Strip).unwrap(), "เด็ก เล่นกันดี");
        assert_eq!(
            clean_text_cv(text, None, MaiYamok::Expand).unwrap(),
            "เด็กเด็ก เล่นกันดีเล่นกันดี"
        );
        assert_eq!("EXPAND".parse::<MaiYamok>().unwrap(), MaiYamok::Expand);
        assert!("double".parse::<MaiYamok>().is_err());
    }

    #[test]
    fn replacements_keep_file_order() {
        let replacements = WordReplacements::from_json(r#"{"b": "2", "a": "1", "c": "3"}"#).unwrap();
        let words: Vec<&str> = replacements.iter().map(|(w, _)| w).collect();
        assert_eq!(words, vec!["b", "a", "c"]);

        assert!(matches!(WordReplacements::from_json(r#"{"a": 1}"#), Err(PrepError::Config(_))));
    }

    #[test]
    fn file_is_cleaned_line_by_line() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.txt");
        let output = dir.path().join("out/clean.txt");
        fs::write(&input, "Hello, world!\nit's  fine\n").unwrap();

        let lines = clean_file(&input, &output, None, MaiYamok::Keep).unwrap();

        assert_eq!(lines, 2);
        assert_eq!(fs::read_to_string(&output).unwrap(), "Hello world\nits fine\n");
    }
}
