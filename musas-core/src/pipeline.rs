//! # Pipeline Artifact
//!
//! An initialized model pipeline: the resolved tagger configuration plus
//! the default package metadata, ready to be written to disk and handed to
//! the packager. This is the boundary to the external tagger library; the
//! artifact directory layout (`config.json` + `meta.json`) is what that
//! library consumes at install time.

use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};

use crate::config::TaggerConfig;
use crate::error::{Error, Result};
use crate::resource::{locale_for, LanguageResource, Model};

/// Author metadata baked into every package.
const AUTHOR: &str = "UCREL Research Centre";
const EMAIL: &str = "ucrel@lancaster.ac.uk";
const URL: &str = "https://ucrel.lancs.ac.uk/usas/";
const LICENSE: &str = "CC BY-NC-SA 4.0";

/// A configured, initialized pipeline for one model.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPipeline {
    pub language_code: String,
    /// The runtime locale the pipeline is initialised with.
    pub locale: &'static str,
    pub meta: Map<String, Value>,
    pub config: TaggerConfig,
}

impl ModelPipeline {
    /// Builds the configuration and default metadata for `model`. Rule
    /// model lexicons are loaded (and validated non-empty) here.
    pub fn initialize(
        language_code: &str,
        resource: &LanguageResource,
        model: &Model,
    ) -> Result<Self> {
        let locale = locale_for(language_code)
            .ok_or_else(|| Error::UnknownLanguage(language_code.to_string()))?;
        let config = TaggerConfig::build(model)?;

        let mut meta = Map::new();
        meta.insert("lang".to_string(), json!(locale));
        meta.insert("author".to_string(), json!(AUTHOR));
        meta.insert("email".to_string(), json!(EMAIL));
        meta.insert("url".to_string(), json!(URL));
        meta.insert("license".to_string(), json!(LICENSE));
        meta.insert(
            "tagger_version".to_string(),
            json!(resource.tagger_version),
        );
        match model {
            Model::Rule(_) => {
                meta.insert("model_type".to_string(), json!("rule_based_tagger"));
            }
            Model::Neural(neural) => {
                meta.insert("model_type".to_string(), json!("neural_tagger"));
                meta.insert(
                    "pretrained_model_name_or_path".to_string(),
                    json!(neural.pretrained_model_name_or_path),
                );
            }
        }

        Ok(Self {
            language_code: language_code.to_string(),
            locale,
            meta,
            config,
        })
    }

    /// Writes the pipeline artifact (`config.json` and `meta.json`) into
    /// `dir`.
    pub fn to_disk(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|err| Error::io(dir, err))?;

        let config_path = dir.join("config.json");
        let config_json = serde_json::to_string_pretty(&self.config)?;
        fs::write(&config_path, config_json).map_err(|err| Error::io(&config_path, err))?;

        let meta_path = dir.join("meta.json");
        let meta_json = serde_json::to_string_pretty(&self.meta)?;
        fs::write(&meta_path, meta_json).map_err(|err| Error::io(&meta_path, err))?;
        Ok(())
    }

    /// The resolved configuration as pretty printed JSON, used to give
    /// build failures full diagnostic context.
    pub fn config_json(&self) -> String {
        serde_json::to_string_pretty(&self.config)
            .unwrap_or_else(|_| "<configuration could not be serialized>".to_string())
    }
}
