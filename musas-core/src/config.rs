//! # Tagger Configuration Builder
//!
//! Turns a validated [`Model`] into the immutable configuration value the
//! external tagger initialisation routine consumes. The configuration is
//! constructed in one pass: there is never a partially built configuration
//! to observe.
//!
//! Rule order is preserved exactly as declared in the resource document,
//! because it determines matching precedence inside the external ranker.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::lexicon::{LexiconCollection, MweLexiconCollection};
use crate::pos_mapper::{resolve, Direction, MappingTable};
use crate::resource::{Model, NeuralConfig, NeuralModel, Ranker, Rule, RuleConfig, RuleModel};

/// Ranker configuration for rule based models. `contextual` is the only
/// kind this layer knows how to set up; the match in
/// [`RuleTaggerConfig::build`] is exhaustive, so a new [`Ranker`] variant
/// cannot slip through unhandled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankerConfig {
    Contextual,
}

/// One fully resolved rule, carrying its loaded lexicons and the mapping
/// table oriented for its rule type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule")]
pub enum CompiledRule {
    #[serde(rename = "single")]
    Single {
        pos_mapper: Option<MappingTable>,
        /// POS disambiguated entries, keyed on `lemma|pos`.
        lexicon: LexiconCollection,
        /// Lemma only fallback entries.
        lemma_lexicon: LexiconCollection,
    },
    #[serde(rename = "mwe")]
    Mwe {
        pos_mapper: Option<MappingTable>,
        mwe_lexicon: MweLexiconCollection,
    },
}

/// The resolved configuration of a rule based model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleTaggerConfig {
    /// Ordered by declaration; earlier rules win precedence in the ranker.
    pub rules: Vec<CompiledRule>,
    pub ranker: RankerConfig,
    pub default_punctuation_tags: Option<Vec<String>>,
    pub default_number_tags: Option<Vec<String>>,
    pub attributes: RuleConfig,
}

impl RuleTaggerConfig {
    fn build(model: &RuleModel) -> Result<Self> {
        if model.resources.rules.is_empty() {
            return Err(Error::NoRules(model.name.clone()));
        }
        let ranker = match model.resources.ranker {
            Ranker::Contextual => RankerConfig::Contextual,
        };

        let mut rules = Vec::with_capacity(model.resources.rules.len());
        for rule in &model.resources.rules {
            rules.push(compile_rule(rule)?);
        }

        Ok(Self {
            rules,
            ranker,
            default_punctuation_tags: model.resources.default_punctuation_tags.clone(),
            default_number_tags: model.resources.default_number_tags.clone(),
            attributes: model.config.clone(),
        })
    }
}

fn compile_rule(rule: &Rule) -> Result<CompiledRule> {
    match rule {
        Rule::Single(single) => {
            let pos_mapper = single
                .pos_mapper
                .map(|mapper| resolve(mapper, Direction::Single));
            // Two loads from the same source: POS disambiguated first,
            // lemma only second.
            let lexicon = LexiconCollection::from_tsv(&single.lexicon_url, single.with_pos)?;
            let lemma_lexicon = LexiconCollection::from_tsv(&single.lexicon_url, false)?;
            Ok(CompiledRule::Single {
                pos_mapper,
                lexicon,
                lemma_lexicon,
            })
        }
        Rule::Mwe(mwe) => {
            let pos_mapper = mwe.pos_mapper.map(|mapper| resolve(mapper, Direction::Mwe));
            let mwe_lexicon = MweLexiconCollection::from_tsv(&mwe.lexicon_url)?;
            Ok(CompiledRule::Mwe {
                pos_mapper,
                mwe_lexicon,
            })
        }
    }
}

/// The resolved configuration of a neural model: the opaque pretrained
/// resource locator plus inference settings, passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralTaggerConfig {
    pub pretrained_model_name_or_path: String,
    pub inference: NeuralConfig,
}

impl From<&NeuralModel> for NeuralTaggerConfig {
    fn from(model: &NeuralModel) -> Self {
        Self {
            pretrained_model_name_or_path: model.pretrained_model_name_or_path.clone(),
            inference: model.config.clone(),
        }
    }
}

/// The configuration handed to the external tagger initialisation routine,
/// polymorphic over the model family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tagger")]
pub enum TaggerConfig {
    #[serde(rename = "rule_based")]
    RuleBased(RuleTaggerConfig),
    #[serde(rename = "neural")]
    Neural(NeuralTaggerConfig),
}

impl TaggerConfig {
    /// Builds the configuration for a model. Rule models load their
    /// lexicons here; neural models need no further resolution.
    pub fn build(model: &Model) -> Result<Self> {
        match model {
            Model::Rule(rule_model) => Ok(TaggerConfig::RuleBased(RuleTaggerConfig::build(
                rule_model,
            )?)),
            Model::Neural(neural_model) => {
                Ok(TaggerConfig::Neural(NeuralTaggerConfig::from(neural_model)))
            }
        }
    }
}
