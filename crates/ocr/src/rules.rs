//! Compiled forms of the rule tables in [`tallyscan_core::rules`].
//!
//! Tables are sorted highest priority first at construction so lookups are a
//! linear `find`. Regex patterns compile once, up front; a bad pattern is a
//! construction error rather than a rule that silently never fires.

use regex::Regex;
use tallyscan_core::{ColumnRole, Direction, DocumentType, HeaderKeyword, LineRule, MatchType, SignRule};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Rule '{name}' has an invalid regex: {source}")]
    InvalidRegex {
        name: String,
        #[source]
        source: regex::Error,
    },
    #[error("Parser configuration could not be serialized: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A pattern plus its compiled regex (when `match_type` is `Regex`).
#[derive(Debug, Clone)]
struct Matcher {
    pattern: String,
    match_type: MatchType,
    regex: Option<Regex>,
}

impl Matcher {
    fn compile(name: &str, pattern: &str, match_type: &MatchType) -> Result<Self, RuleError> {
        let regex = match match_type {
            MatchType::Regex => Some(Regex::new(pattern).map_err(|source| RuleError::InvalidRegex {
                name: name.to_string(),
                source,
            })?),
            _ => None,
        };
        Ok(Self { pattern: pattern.to_lowercase(), match_type: match_type.clone(), regex })
    }

    fn is_match(&self, text: &str) -> bool {
        match self.match_type {
            MatchType::Contains => text.to_lowercase().contains(&self.pattern),
            MatchType::Prefix => text.to_lowercase().starts_with(&self.pattern),
            MatchType::Exact => text.to_lowercase() == self.pattern,
            MatchType::Regex => self.regex.as_ref().is_some_and(|re| re.is_match(text)),
        }
    }
}

// ── Line rules ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LineRuleSet {
    rules: Vec<(LineRule, Matcher)>,
}

impl LineRuleSet {
    pub fn new(rules: &[LineRule]) -> Result<Self, RuleError> {
        let mut compiled = rules
            .iter()
            .map(|r| Ok((r.clone(), Matcher::compile(&r.name, &r.pattern, &r.match_type)?)))
            .collect::<Result<Vec<_>, RuleError>>()?;
        compiled.sort_by(|a, b| b.0.priority.cmp(&a.0.priority));
        Ok(Self { rules: compiled })
    }

    /// First (highest priority) rule matching the whitespace-collapsed line.
    pub fn find(&self, text: &str) -> Option<&LineRule> {
        self.rules.iter().find(|(_, m)| m.is_match(text)).map(|(r, _)| r)
    }
}

// ── Sign rules ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct SignRuleSet {
    rules: Vec<(SignRule, Matcher)>,
}

impl SignRuleSet {
    pub fn new(rules: &[SignRule]) -> Result<Self, RuleError> {
        let mut compiled = rules
            .iter()
            .map(|r| Ok((r.clone(), Matcher::compile(&r.name, &r.pattern, &r.match_type)?)))
            .collect::<Result<Vec<_>, RuleError>>()?;
        compiled.sort_by(|a, b| b.0.priority.cmp(&a.0.priority));
        Ok(Self { rules: compiled })
    }

    pub fn find(&self, description: &str, document_type: DocumentType) -> Option<&SignRule> {
        self.rules
            .iter()
            .find(|(r, m)| r.applies_to(document_type) && m.is_match(description))
            .map(|(r, _)| r)
    }

    pub fn direction(&self, description: &str, document_type: DocumentType) -> Option<Direction> {
        self.find(description, document_type).map(|r| r.direction)
    }
}

// ── Header keywords ───────────────────────────────────────────────────────────

/// How a header word matched a keyword. Full beats abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum KeywordMatch {
    /// `Amt.` against `amt`, or `Withdrawals` against `withdrawal`.
    Abbreviation,
    Full,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeywordHit {
    pub role: ColumnRole,
    pub quality: KeywordMatch,
    pub priority: i32,
}

#[derive(Debug, Clone)]
pub struct HeaderKeywords {
    keywords: Vec<HeaderKeyword>,
}

/// Shortest word accepted as an abbreviation of a keyword.
const MIN_ABBREVIATION: usize = 3;

impl HeaderKeywords {
    pub fn new(keywords: &[HeaderKeyword]) -> Self {
        let mut keywords: Vec<HeaderKeyword> = keywords
            .iter()
            .map(|k| HeaderKeyword { keyword: k.keyword.trim().to_lowercase(), ..k.clone() })
            .filter(|k| !k.keyword.is_empty())
            .collect();
        keywords.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { keywords }
    }

    /// Best keyword for a single word, ranked by match quality then priority.
    pub fn classify_word(&self, word: &str) -> Option<KeywordHit> {
        let w: String = word.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_lowercase();
        if w.is_empty() {
            return None;
        }
        self.keywords
            .iter()
            .filter_map(|k| {
                let quality = if w.starts_with(&k.keyword) {
                    KeywordMatch::Full
                } else if w.chars().count() >= MIN_ABBREVIATION && k.keyword.starts_with(&w) {
                    KeywordMatch::Abbreviation
                } else {
                    return None;
                };
                Some(KeywordHit { role: k.role, quality, priority: k.priority })
            })
            .max_by_key(|h| (h.quality, h.priority))
    }

    /// Best keyword across all words of a header cell.
    pub fn classify<'a>(&self, words: impl IntoIterator<Item = &'a str>) -> Option<KeywordHit> {
        words
            .into_iter()
            .filter_map(|w| self.classify_word(w))
            .max_by_key(|h| (h.quality, h.priority))
    }
}
