//! # Lexicon Loading
//!
//! Thin loaders for the tab separated lexicon files the rules are built
//! from. A single word lexicon has `lemma`, optional `pos` and
//! `semantic_tags` columns; an MWE lexicon has `mwe_template` and
//! `semantic_tags`. Sources are either local paths or `http(s)` URLs.
//!
//! The loaders are collaborators of the configuration builder, not a
//! tagging engine: they only read, key and store the entries.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Error, Result};

/// A single word lexicon: lookup key to ordered USAS tag list.
///
/// The key is `lemma|pos` when the collection was loaded with
/// `include_pos`, plain `lemma` otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexiconCollection {
    pub entries: BTreeMap<String, Vec<String>>,
}

impl LexiconCollection {
    /// Loads a lexicon from a TSV source. Fails if the source cannot be
    /// read, the header is missing required columns, or no entries result.
    pub fn from_tsv(source: &str, include_pos: bool) -> Result<Self> {
        let raw = read_source(source)?;
        let mut lines = raw.lines();
        let header = parse_header(source, lines.next(), &["lemma", "semantic_tags"])?;

        let mut entries = BTreeMap::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let lemma = header.field(&fields, "lemma");
            let pos = header.optional_field(&fields, "pos");
            let tags = split_tags(header.field(&fields, "semantic_tags"));
            if lemma.is_empty() || tags.is_empty() {
                continue;
            }
            let key = match (include_pos, pos) {
                (true, Some(pos)) => format!("{lemma}|{pos}"),
                _ => lemma.to_string(),
            };
            entries.insert(key, tags);
        }

        if entries.is_empty() {
            return Err(Error::EmptyLexicon(source.to_string()));
        }
        info!(source, entries = entries.len(), include_pos, "loaded lexicon");
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A multi word expression lexicon: template to ordered USAS tag list.
/// Templates span more than one token, e.g. `ice_noun cream_noun`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MweLexiconCollection {
    pub entries: BTreeMap<String, Vec<String>>,
}

impl MweLexiconCollection {
    /// Loads an MWE lexicon from a TSV source.
    pub fn from_tsv(source: &str) -> Result<Self> {
        let raw = read_source(source)?;
        let mut lines = raw.lines();
        let header = parse_header(source, lines.next(), &["mwe_template", "semantic_tags"])?;

        let mut entries = BTreeMap::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let template = header.field(&fields, "mwe_template");
            let tags = split_tags(header.field(&fields, "semantic_tags"));
            if template.is_empty() || tags.is_empty() {
                continue;
            }
            entries.insert(template.to_string(), tags);
        }

        if entries.is_empty() {
            return Err(Error::EmptyLexicon(source.to_string()));
        }
        info!(source, entries = entries.len(), "loaded MWE lexicon");
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Column name to index lookup for one TSV header line.
struct TsvHeader {
    columns: Vec<String>,
}

impl TsvHeader {
    fn index(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|name| name == column)
    }

    fn field<'a>(&self, fields: &[&'a str], column: &str) -> &'a str {
        self.index(column)
            .and_then(|index| fields.get(index).copied())
            .unwrap_or("")
            .trim()
    }

    fn optional_field<'a>(&self, fields: &[&'a str], column: &str) -> Option<&'a str> {
        let value = self.field(fields, column);
        if value.is_empty() {
            None
        } else {
            Some(value)
        }
    }
}

fn parse_header(source: &str, line: Option<&str>, required: &[&str]) -> Result<TsvHeader> {
    let line = line.ok_or_else(|| Error::Lexicon {
        url: source.to_string(),
        message: "the lexicon file is empty".to_string(),
    })?;
    let header = TsvHeader {
        columns: line.split('\t').map(|name| name.trim().to_string()).collect(),
    };
    for column in required {
        if header.index(column).is_none() {
            return Err(Error::Lexicon {
                url: source.to_string(),
                message: format!("missing required column `{column}` in the header"),
            });
        }
    }
    Ok(header)
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(|tag| tag.to_string()).collect()
}

fn read_source(source: &str) -> Result<String> {
    if source.starts_with("http://") || source.starts_with("https://") {
        let response = reqwest::blocking::get(source)?.error_for_status()?;
        Ok(response.text()?)
    } else {
        fs::read_to_string(Path::new(source)).map_err(|err| Error::Lexicon {
            url: source.to_string(),
            message: err.to_string(),
        })
    }
}
