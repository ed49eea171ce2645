//! # Batch Model Builder
//!
//! Drives the whole pipeline for every model in a language resource
//! document, strictly sequentially: initialize, write to a scoped temp
//! directory, package, enrich. One model finishes (or fails the batch)
//! before the next begins, and the temp directory is removed either way.

use std::fs;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::meta::enrich;
use crate::package::package;
use crate::pipeline::ModelPipeline;
use crate::resource::{LanguageResource, LanguageResources, Model};
use crate::TAGGER_VERSION;

/// Composes the full model version: the tagger's `major.minor` plus the
/// model element supplied on the command line.
pub fn full_model_version(model_version: &str) -> String {
    let mut elements: Vec<&str> = TAGGER_VERSION.split('.').take(2).collect();
    elements.push(model_version);
    elements.join(".")
}

/// Builds and packages every model described in `resource_file` into
/// `models_directory`. Fails fast: the first broken model aborts the
/// batch with full diagnostic context.
pub fn create_models(
    models_directory: &Path,
    resource_file: &Path,
    model_version: &str,
) -> Result<()> {
    let resources = LanguageResources::from_path(resource_file)?;
    resources.validate_unique_model_names()?;

    let version = full_model_version(model_version);
    for (language_code, resource, model) in resources.iter_models() {
        info!(language = language_code, model = model.name(), "building model");
        build_model(models_directory, language_code, resource, model, &version)?;
    }
    Ok(())
}

fn build_model(
    models_directory: &Path,
    language_code: &str,
    resource: &LanguageResource,
    model: &Model,
    version: &str,
) -> Result<()> {
    let build_error = |config: String| {
        move |source: Error| Error::Build {
            language: language_code.to_string(),
            model: model.name().to_string(),
            config,
            source: Box::new(source),
        }
    };

    let pipeline = ModelPipeline::initialize(language_code, resource, model)
        .map_err(build_error("<configuration could not be resolved>".to_string()))?;

    let result = (|| {
        // Scoped per model: dropped (and deleted) on success and failure
        // alike, so one broken build cannot leak state into the next.
        let temp_dir = tempfile::tempdir().map_err(|err| Error::io(models_directory, err))?;
        pipeline.to_disk(temp_dir.path())?;

        fs::create_dir_all(models_directory)
            .map_err(|err| Error::io(models_directory, err))?;
        let package_dir = package(temp_dir.path(), models_directory, model.name(), version)?;
        enrich(
            &package_dir,
            &resource.language_data.description,
            &format!("{}-{version}", model.name()),
        )
    })();
    result.map_err(build_error(pipeline.config_json()))
}
