//! Term codec: turns obfuscated seed terms into the match set every adapter shares.
//!
//! Seeds are base64 so the literal words do not sit in plain text in binaries or
//! config files. That is obfuscation, not secrecy. A seed that does not decode is
//! skipped with a warning and never fails the whole call.

use crate::core::error::ScrubError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use regex::{Regex, RegexBuilder};
use rustc_hash::FxHashSet;
use tracing::{debug, warn};

/// Seeds compiled into the binary, in the order they are expanded.
pub const BUILTIN_SEEDS: &[&str] = &[
    "YXVnbWVudA==",
    "QXVnbWVudA==",
    "QVVHTUVOQA==",
    "YXVnbWVudHM=",
    "YXVnbWVudGVk",
];

const MATCHER_SIZE_LIMIT: usize = 32 * 1024 * 1024;

/// Ordered, de-duplicated term variants plus a compiled case-insensitive matcher.
#[derive(Debug, Clone)]
pub struct MatchTermSet {
    terms: Vec<String>,
    lowered: Vec<String>,
    matcher: Option<Regex>,
}

impl MatchTermSet {
    /// Build a set from already-decoded terms. Empty terms are dropped since
    /// they would match every haystack.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = FxHashSet::default();
        let mut ordered = Vec::new();
        for term in terms {
            let term = term.into();
            if term.is_empty() || !seen.insert(term.clone()) {
                continue;
            }
            ordered.push(term);
        }

        let lowered: Vec<String> = ordered.iter().map(|t| t.to_lowercase()).collect();
        let matcher = if ordered.is_empty() {
            None
        } else {
            let pattern = ordered
                .iter()
                .map(|t| regex::escape(t))
                .collect::<Vec<_>>()
                .join("|");
            match RegexBuilder::new(&pattern)
                .case_insensitive(true)
                .size_limit(MATCHER_SIZE_LIMIT)
                .build()
            {
                Ok(re) => Some(re),
                Err(e) => {
                    warn!(error = %e, "term matcher did not compile, using substring scan");
                    None
                }
            }
        };

        Self {
            terms: ordered,
            lowered,
            matcher,
        }
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.iter().any(|t| t == term)
    }

    /// True iff `haystack` is non-empty and contains any term, ignoring case.
    pub fn matches(&self, haystack: &str) -> bool {
        if haystack.is_empty() || self.terms.is_empty() {
            return false;
        }
        match &self.matcher {
            Some(re) => re.is_match(haystack),
            None => {
                let hay = haystack.to_lowercase();
                self.lowered.iter().any(|t| hay.contains(t.as_str()))
            }
        }
    }
}

/// Decode one base64 seed into its UTF-8 literal.
pub fn decode_seed(seed: &str) -> Result<String, ScrubError> {
    let bytes = STANDARD
        .decode(seed.trim())
        .map_err(|e| ScrubError::DecodeFailure(format!("{}: {}", seed, e)))?;
    String::from_utf8(bytes).map_err(|e| ScrubError::DecodeFailure(format!("{}: {}", seed, e)))
}

/// Expand encoded seeds into the full variant list.
///
/// Each decoded term contributes itself plus lowercase, uppercase and
/// capitalized forms. Every distinct lowercase form longer than three
/// characters then adds `s`, `ed`, `ing` suffixes and the `<Cap>VIP` and
/// `<UPPER>_` decorations.
pub fn decode<I, S>(seeds: I) -> MatchTermSet
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut terms: Vec<String> = Vec::new();
    for seed in seeds {
        let seed = seed.as_ref();
        match decode_seed(seed) {
            Ok(base) if !base.is_empty() => {
                terms.push(base.clone());
                terms.push(base.to_lowercase());
                terms.push(base.to_uppercase());
                terms.push(capitalize(&base));
            }
            Ok(_) => debug!(seed, "seed decoded to an empty term, skipped"),
            Err(e) => warn!(error = %e, "skipping seed term"),
        }
    }

    let mut bases: Vec<String> = Vec::new();
    for term in &terms {
        let lower = term.to_lowercase();
        if !bases.contains(&lower) {
            bases.push(lower);
        }
    }
    for base in bases.iter().filter(|b| b.chars().count() > 3) {
        terms.push(format!("{}s", base));
        terms.push(format!("{}ed", base));
        terms.push(format!("{}ing", base));
        terms.push(format!("{}VIP", capitalize(base)));
        terms.push(format!("{}_", base.to_uppercase()));
    }

    MatchTermSet::from_terms(terms)
}

/// Free-function form of [`MatchTermSet::matches`].
pub fn matches(haystack: &str, terms: &MatchTermSet) -> bool {
    terms.matches(haystack)
}

/// First character uppercased, the rest lowercased.
fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(|c| c.to_lowercase()))
            .collect(),
        None => String::new(),
    }
}
