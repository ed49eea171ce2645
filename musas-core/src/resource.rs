//! # Language Resource Schema
//!
//! The declarative description of every model to build. One JSON document
//! maps BCP 47 language codes to the lexicons, rule composition and neural
//! model references for that language, e.g.:
//!
//! ```json
//! {
//!     "language_resources": {
//!         "cy": {
//!             "language_data": {
//!                 "description": "Welsh",
//!                 "macrolanguage": "cy",
//!                 "script": "Latn"
//!             },
//!             "models": [
//!                 {
//!                     "model_type": "rule_based_tagger",
//!                     "name": "cy_dual_basiccorcencc2usas_contextual",
//!                     "resources": {
//!                         "ranker": "contextual",
//!                         "rules": [
//!                             {
//!                                 "rule_type": "single",
//!                                 "pos_mapper": "basiccorcencc2usas",
//!                                 "lexicon_url": "...",
//!                                 "with_pos": true
//!                             }
//!                         ]
//!                     }
//!                 }
//!             ]
//!         }
//!     }
//! }
//! ```
//!
//! Validation is all or nothing: a single malformed entry invalidates the
//! whole load, and the error names the offending field path (which embeds
//! the language code).

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Maps each supported language code to the locale the external tagger
/// runtime is initialised with. A resource entry whose key is missing here
/// fails validation.
pub const LANG_TO_LOCALE: &[(&str, &str)] = &[
    ("cmn", "zh"),
    ("cy", "xx"),
    ("da", "da"),
    ("en", "en"),
    ("es", "es"),
    ("fi", "fi"),
    ("fr", "fr"),
    ("id", "id"),
    ("it", "it"),
    ("nl", "nl"),
    ("pt", "pt"),
    ("xx", "xx"),
];

/// Looks up the runtime locale for a language code.
pub fn locale_for(language_code: &str) -> Option<&'static str> {
    LANG_TO_LOCALE
        .iter()
        .find(|(code, _)| *code == language_code)
        .map(|(_, locale)| *locale)
}

/// Free form descriptive fields for a language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageData {
    pub description: String,
    pub macrolanguage: String,
    pub script: String,
}

/// The named POS mapping families. Each family owns one authored forward
/// table (tagset to USAS core); see [`crate::pos_mapper`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PosMapperName {
    #[serde(rename = "upos2usas")]
    Upos2Usas,
    #[serde(rename = "basiccorcencc2usas")]
    BasicCorCenCc2Usas,
}

impl PosMapperName {
    /// The name segment used inside model names, `none` for absent mappers.
    pub fn name_segment(mapper: Option<PosMapperName>) -> &'static str {
        match mapper {
            Some(PosMapperName::Upos2Usas) => "upos2usas",
            Some(PosMapperName::BasicCorCenCc2Usas) => "basiccorcencc2usas",
            None => "none",
        }
    }
}

/// Ranker kinds the configuration layer knows how to set up. `contextual`
/// is the only recognised value; anything else fails schema validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ranker {
    Contextual,
}

/// A lexicon rule, polymorphic over the `rule_type` discriminator.
///
/// The two variants differ in how their POS mapper is oriented: a single
/// word rule maps token tags into the lexicon tagset, an MWE rule maps
/// lexicon tags back into the token tagset. See [`crate::pos_mapper`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule_type")]
pub enum Rule {
    #[serde(rename = "single")]
    Single(SingleRule),
    #[serde(rename = "mwe")]
    Mwe(MweRule),
}

/// Tags single tokens by lexicon lookup. Requires two loads from the same
/// source: one keyed on lemma and POS, one on lemma alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SingleRule {
    pub pos_mapper: Option<PosMapperName>,
    pub lexicon_url: String,
    /// Whether lookups include the POS in the key.
    pub with_pos: bool,
}

/// Tags multi word expressions from a template lexicon.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MweRule {
    pub pos_mapper: Option<PosMapperName>,
    pub lexicon_url: String,
}

/// Ranker kind, ordered rule list and optional default tag lists for a
/// rule based model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleResources {
    pub ranker: Ranker,
    pub rules: Vec<Rule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_punctuation_tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_number_tags: Option<Vec<String>>,
}

/// Attribute name overrides for rule based models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    pub tags_token_attr: String,
    pub mwe_indexes_attr: String,
    pub pos_attribute: String,
    pub lemma_attribute: String,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            tags_token_attr: "usas_tags".to_string(),
            mwe_indexes_attr: "usas_mwe_indexes".to_string(),
            pos_attribute: "pos".to_string(),
            lemma_attribute: "lemma".to_string(),
        }
    }
}

/// Inference settings for neural models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuralConfig {
    pub tags_token_attr: String,
    pub mwe_indexes_attr: String,
    /// How many candidate tags to keep per token.
    pub top_n: usize,
    pub device: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokenizer_options: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Default for NeuralConfig {
    fn default() -> Self {
        Self {
            tags_token_attr: "usas_tags".to_string(),
            mwe_indexes_attr: "usas_mwe_indexes".to_string(),
            top_n: 5,
            device: "cpu".to_string(),
            tokenizer_options: None,
        }
    }
}

/// A rule based model: lexicon rules plus a ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleModel {
    pub name: String,
    pub resources: RuleResources,
    #[serde(default)]
    pub config: RuleConfig,
}

/// A neural model: an opaque pretrained resource locator plus inference
/// settings. The BEM architecture behind the locator is not our concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralModel {
    pub name: String,
    pub pretrained_model_name_or_path: String,
    #[serde(default)]
    pub config: NeuralConfig,
}

/// A model to build, polymorphic over the `model_type` discriminator.
/// Unknown discriminators fail validation, never fall through silently.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "model_type")]
pub enum Model {
    #[serde(rename = "rule_based_tagger")]
    Rule(RuleModel),
    #[serde(rename = "neural_tagger")]
    Neural(NeuralModel),
}

impl Model {
    /// The model name, unique across all produced packages.
    pub fn name(&self) -> &str {
        match self {
            Model::Rule(model) => &model.name,
            Model::Neural(model) => &model.name,
        }
    }
}

/// Everything needed to build the models of one language.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageResource {
    pub language_data: LanguageData,
    pub models: Vec<Model>,
    /// Compatibility range of the external tagger runtime.
    #[serde(default = "default_tagger_version")]
    pub tagger_version: String,
}

fn default_tagger_version() -> String {
    ">=0.3,<0.4".to_string()
}

/// The fully validated language resource document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageResources {
    pub language_resources: BTreeMap<String, LanguageResource>,
}

impl LanguageResources {
    /// Parses and fully validates a serialized resource document. No
    /// partial results: any malformed entry fails the whole load.
    pub fn from_json_str(document: &str) -> Result<Self> {
        let deserializer = &mut serde_json::Deserializer::from_str(document);
        let resources: LanguageResources = serde_path_to_error::deserialize(deserializer)
            .map_err(|err| Error::Schema {
                path: err.path().to_string(),
                message: err.inner().to_string(),
            })?;
        resources.validate()?;
        Ok(resources)
    }

    /// Reads and validates the resource document at `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        let document = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
        Self::from_json_str(&document)
    }

    fn validate(&self) -> Result<()> {
        for (language_code, resource) in &self.language_resources {
            if locale_for(language_code).is_none() {
                return Err(Error::UnknownLanguage(language_code.clone()));
            }
            if resource.models.is_empty() {
                return Err(Error::Schema {
                    path: format!("language_resources.{language_code}.models"),
                    message: "a language resource must declare at least one model".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Model names become package folder names and release tags, so they
    /// must be unique across every language. Checked up front, before any
    /// packaging begins.
    pub fn validate_unique_model_names(&self) -> Result<()> {
        let mut seen = std::collections::BTreeSet::new();
        let mut duplicates = Vec::new();
        for resource in self.language_resources.values() {
            for model in &resource.models {
                if !seen.insert(model.name().to_string()) {
                    duplicates.push(model.name().to_string());
                }
            }
        }
        if duplicates.is_empty() {
            Ok(())
        } else {
            Err(Error::DuplicateModelNames(duplicates))
        }
    }

    /// Iterates over `(language_code, resource, model)` triples in
    /// document order (language codes ascending).
    pub fn iter_models(&self) -> impl Iterator<Item = (&str, &LanguageResource, &Model)> {
        self.language_resources.iter().flat_map(|(code, resource)| {
            resource
                .models
                .iter()
                .map(move |model| (code.as_str(), resource, model))
        })
    }
}
