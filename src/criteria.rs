//! Search criteria loading
//!
//! A criteria file holds one search phrase per line. Each non-blank line becomes a
//! [`Criterion`]: its whitespace-separated words, percent-encoded and joined with `+`.

use crate::error::{Error, Result};
use serde::{Serialize, Serializer};
use std::path::Path;
use tracing::{debug, info};

/// Separator placed between encoded tokens in a search term
pub const TERM_SEPARATOR: char = '+';

/// Separator used in place of [`TERM_SEPARATOR`] when a criterion names files
pub const FILE_SEPARATOR: char = '_';

/// One search phrase from the criteria file
///
/// Tokens keep their original order and are never empty. The encoded term is the
/// percent-encoded tokens joined by `+`, so a `+` or `&` inside a word can never be
/// mistaken for a separator or a query delimiter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Criterion {
    tokens: Vec<String>,
    encoded: String,
}

impl Criterion {
    /// Parse a single line into a criterion
    ///
    /// Returns `None` when the line holds no words.
    ///
    /// # Examples
    ///
    /// ```
    /// use research_dl::criteria::Criterion;
    ///
    /// let c = Criterion::parse("  diabetes   treatment \n").unwrap();
    /// assert_eq!(c.encoded(), "diabetes+treatment");
    /// assert_eq!(c.file_stem(), "diabetes_treatment");
    /// assert!(Criterion::parse("   ").is_none());
    /// ```
    pub fn parse(line: &str) -> Option<Self> {
        let tokens: Vec<String> = line.split_whitespace().map(str::to_string).collect();
        if tokens.is_empty() {
            return None;
        }

        let encoded = tokens
            .iter()
            .map(|t| urlencoding::encode(t).into_owned())
            .collect::<Vec<_>>()
            .join(TERM_SEPARATOR.to_string().as_str());

        Some(Self { tokens, encoded })
    }

    /// The raw words of the phrase, in order
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// The URL-ready search term (`diabetes+treatment`)
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    /// The search term with separators replaced for use in file names (`diabetes_treatment`)
    pub fn file_stem(&self) -> String {
        self.encoded.replace(TERM_SEPARATOR, &FILE_SEPARATOR.to_string())
    }
}

impl std::fmt::Display for Criterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encoded)
    }
}

impl Serialize for Criterion {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.encoded)
    }
}

/// Parse every non-blank line of `content`, preserving order
pub fn parse_criteria(content: &str) -> Vec<Criterion> {
    content.lines().filter_map(Criterion::parse).collect()
}

/// Load search criteria from a text file
///
/// Blank lines are skipped. Fails with [`Error::Config`] if the file is missing,
/// unreadable, or not valid UTF-8; nothing else is touched.
pub async fn load(path: &Path) -> Result<Vec<Criterion>> {
    debug!(?path, "reading search criteria");

    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        Error::config(
            "criteria_file",
            format!(
                "cannot read search criteria file '{}' ({}). The file must exist, be \
                 readable, and contain one search phrase per line.",
                path.display(),
                e
            ),
        )
    })?;

    let criteria = parse_criteria(&content);
    for criterion in &criteria {
        info!(criterion = %criterion, "adding terms to queue");
    }

    if criteria.is_empty() {
        info!(?path, "criteria file contains no search phrases");
    }

    Ok(criteria)
}
