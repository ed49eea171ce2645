//! # Model Overview
//!
//! Renders a Markdown table summarising every packaged model in a models
//! directory. Read only; nothing is mutated.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::readme::{link, table};

const HEADERS: &[&str] = &[
    "Language (BCP 47 language code)",
    "Model Name",
    "MWE",
    "POS Mapper",
    "Ranker",
    "Neural Model",
    "File Size",
];

/// Builds the overview table for every package folder in
/// `models_directory`, one row per model, sorted by (language code, model
/// variant) ascending.
pub fn overview_of_models(models_directory: &Path) -> Result<String> {
    let mut package_dirs: Vec<_> = fs::read_dir(models_directory)
        .map_err(|err| Error::io(models_directory, err))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|err| Error::io(models_directory, err))?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    package_dirs.sort_by_key(|path| {
        let folder = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        let mut segments = folder.split('_');
        (
            segments.next().unwrap_or_default().to_string(),
            segments.next().unwrap_or_default().to_string(),
        )
    });

    let mut rows = Vec::with_capacity(package_dirs.len());
    for package_dir in &package_dirs {
        rows.push(overview_row(package_dir)?);
    }
    Ok(table(&rows, HEADERS))
}

fn overview_row(package_dir: &Path) -> Result<Vec<String>> {
    let meta_path = package_dir.join("meta.json");
    if !meta_path.exists() {
        return Err(Error::MetaFileMissing(meta_path));
    }
    let raw = fs::read_to_string(&meta_path).map_err(|err| Error::io(&meta_path, err))?;
    let meta: Map<String, Value> = serde_json::from_str(&raw)?;

    let name = meta
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let full_language_name = meta
        .get("full_language_name")
        .and_then(Value::as_str)
        .unwrap_or("n/a");
    let bcp_47_code = name.split('_').next().unwrap_or_default();
    let language = format!("{full_language_name} ({bcp_47_code})");
    let file_size = meta
        .get("size")
        .and_then(Value::as_str)
        .unwrap_or("n/a")
        .to_string();

    let is_neural = meta.get("model_type").and_then(Value::as_str) == Some("neural_tagger");
    if is_neural {
        let neural_model = match meta
            .get("pretrained_model_name_or_path")
            .and_then(Value::as_str)
        {
            Some(path) => link(path, &format!("https://huggingface.co/{path}")),
            None => "n/a".to_string(),
        };
        return Ok(vec![
            language,
            name,
            ":x:".to_string(),
            "None".to_string(),
            "n/a".to_string(),
            neural_model,
            file_size,
        ]);
    }

    let mwe = if name.contains("dual") {
        ":heavy_check_mark:"
    } else {
        ":x:"
    };
    let pos_mapper = if name.contains("upos2usas") {
        "UPOS 2 USAS"
    } else if name.contains("basiccorcencc2usas") {
        "Basic CorCenCC 2 USAS"
    } else {
        "None"
    };
    let ranker = capitalize(name.split('_').next_back().unwrap_or_default());

    Ok(vec![
        language,
        name,
        mwe.to_string(),
        pos_mapper.to_string(),
        ranker,
        "n/a".to_string(),
        file_size,
    ])
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
