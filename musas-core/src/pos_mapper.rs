//! # POS Mapping Resolver
//!
//! Translates part of speech labels between a token tagset and the USAS
//! core tagset used by the lexicons. Two mapping families exist:
//!
//! | Family                | Token tagset   | Lexicon tagset |
//! |-----------------------|----------------|----------------|
//! | `upos2usas`           | UPOS           | USAS core      |
//! | `basiccorcencc2usas`  | BasicCorCenCC  | USAS core      |
//!
//! Direction matters and is the most error prone spot in the whole
//! pipeline: a single word rule needs the forward table (token tags into
//! the lexicon tagset), an MWE rule needs the inverse (lexicon tags back
//! into the token tagset). Swapping them type checks and tags wrongly.
//! Only the forward tables are authored; the inverse is always computed
//! from them, so the two directions cannot drift apart.

use std::collections::BTreeMap;

use crate::resource::PosMapperName;

/// A tag to one-or-more-tags translation table.
pub type MappingTable = BTreeMap<String, Vec<String>>;

/// Which of the two fixed tables of a mapping family to resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Single word rules: token tagset into the lexicon tagset.
    Single,
    /// MWE rules: lexicon tagset back into the token tagset.
    Mwe,
}

/// UPOS into USAS core. One entry per UPOS tag.
const UPOS_TO_USAS_CORE: &[(&str, &[&str])] = &[
    ("ADJ", &["adj"]),
    ("ADP", &["prep"]),
    ("ADV", &["adv"]),
    ("AUX", &["verb"]),
    ("CCONJ", &["conj"]),
    ("DET", &["det", "art"]),
    ("INTJ", &["intj"]),
    ("NOUN", &["noun"]),
    ("NUM", &["num"]),
    ("PART", &["part"]),
    ("PRON", &["pron"]),
    ("PROPN", &["pnoun"]),
    ("PUNCT", &["punc"]),
    ("SCONJ", &["conj"]),
    ("SYM", &["code"]),
    ("VERB", &["verb"]),
    ("X", &["fw", "xx"]),
];

/// BasicCorCenCC into USAS core. One entry per BasicCorCenCC tag.
const BASIC_CORCENCC_TO_USAS_CORE: &[(&str, &[&str])] = &[
    ("E", &["noun"]),
    ("YFB", &["art"]),
    ("Ar", &["prep"]),
    ("Cys", &["conj"]),
    ("Rhi", &["num"]),
    ("Ans", &["adj"]),
    ("Adf", &["adv"]),
    ("B", &["verb"]),
    ("Rha", &["pron"]),
    ("U", &["part"]),
    ("Ebych", &["intj"]),
    ("Gw", &["xx"]),
    ("Atd", &["punc"]),
];

/// Resolves a mapping family and direction to its concrete table.
///
/// Exactly four outputs exist (2 families x 2 directions). The MWE table
/// is the pointwise inverse of the authored forward table.
pub fn resolve(name: PosMapperName, direction: Direction) -> MappingTable {
    let forward = match name {
        PosMapperName::Upos2Usas => UPOS_TO_USAS_CORE,
        PosMapperName::BasicCorCenCc2Usas => BASIC_CORCENCC_TO_USAS_CORE,
    };
    match direction {
        Direction::Single => to_table(forward),
        Direction::Mwe => invert(forward),
    }
}

fn to_table(entries: &[(&str, &[&str])]) -> MappingTable {
    entries
        .iter()
        .map(|(from, to)| {
            let targets = to.iter().map(|tag| tag.to_string()).collect();
            (from.to_string(), targets)
        })
        .collect()
}

fn invert(entries: &[(&str, &[&str])]) -> MappingTable {
    let mut inverse = MappingTable::new();
    for (from, to) in entries {
        for tag in *to {
            inverse
                .entry(tag.to_string())
                .or_insert_with(Vec::new)
                .push(from.to_string());
        }
    }
    inverse
}
