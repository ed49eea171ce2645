//! # Metadata Enricher
//!
//! Post-processes a packaged model directory: computes SHA-256 checksums
//! over the two distribution files, classifies and sizes them, then
//! synthesises the human readable description and release notes and
//! regenerates the README.
//!
//! The step is idempotent. Every derived field is recomputed from the
//! current on-disk contents, so running it twice changes nothing.

use std::fs;
use std::path::Path;

use serde_json::{json, Map, Value};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::{Error, Result};
use crate::readme::generate_readme;
use crate::{REPO_NAME, REPO_OWNER};

/// Enriches `meta.json` inside `model_dir` and regenerates its README.
///
/// `language_description` is the free text language name from the resource
/// document; `package_name` is the `<name>-<version>` release tag.
pub fn enrich(model_dir: &Path, language_description: &str, package_name: &str) -> Result<()> {
    let meta_path = model_dir.join("meta.json");
    if !meta_path.exists() {
        return Err(Error::MetaFileMissing(meta_path));
    }
    let raw = fs::read_to_string(&meta_path).map_err(|err| Error::io(&meta_path, err))?;
    let mut meta: Map<String, Value> = serde_json::from_str(&raw)?;

    let dist_dir = model_dir.join("dist");
    let mut dist_paths: Vec<_> = fs::read_dir(&dist_dir)
        .map_err(|err| Error::io(&dist_dir, err))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|err| Error::io(&dist_dir, err))?
        .into_iter()
        .map(|entry| entry.path())
        .collect();
    dist_paths.sort();
    if dist_paths.len() != 2 {
        return Err(Error::DistFileCount {
            dir: dist_dir,
            count: dist_paths.len(),
        });
    }

    let mut dist_file_names = Vec::with_capacity(2);
    let mut tar_gz_checksum = String::new();
    let mut wheel_checksum = String::new();
    let mut max_size = 0u64;
    for dist_path in &dist_paths {
        let contents = fs::read(dist_path).map_err(|err| Error::io(dist_path, err))?;
        max_size = max_size.max(contents.len() as u64);
        let checksum = format!("{:x}", Sha256::digest(&contents));

        match dist_path.extension().and_then(|ext| ext.to_str()) {
            Some("whl") => wheel_checksum = checksum,
            Some("gz") => tar_gz_checksum = checksum,
            _ => return Err(Error::UnexpectedDistFile(dist_path.clone())),
        }
        let file_name = dist_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();
        dist_file_names.push(file_name);
    }

    meta.insert("checksum".to_string(), json!(tar_gz_checksum));
    meta.insert("checksum_whl".to_string(), json!(wheel_checksum));
    meta.insert("size".to_string(), json!(format_size_mb(max_size)));
    meta.insert(
        "full_language_name".to_string(),
        json!(language_description),
    );
    meta.insert(
        "description".to_string(),
        json!(create_description(
            language_description,
            package_name,
            &dist_file_names,
            &tar_gz_checksum,
            &wheel_checksum,
        )),
    );
    meta.insert("notes".to_string(), json!(create_notes(package_name)));

    let meta_json = serde_json::to_string_pretty(&meta)?;
    fs::write(&meta_path, meta_json).map_err(|err| Error::io(&meta_path, err))?;

    let readme_path = model_dir.join("README.md");
    fs::write(&readme_path, generate_readme(&meta)).map_err(|err| Error::io(&readme_path, err))?;

    info!(package = package_name, "enriched model metadata");
    Ok(())
}

/// Binary megabytes (base 1024), two decimal places, e.g. `1.23MB`.
fn format_size_mb(bytes: u64) -> String {
    format!("{:.2}MB", bytes as f64 / f64::from(1u32 << 20))
}

/// Install instructions pointing at the predictable wheel download URL.
fn create_notes(package_name: &str) -> String {
    let wheel_url = format!(
        "https://github.com/{REPO_OWNER}/{REPO_NAME}/releases/download/\
         {package_name}/{package_name}-py3-none-any.whl"
    );
    format!("# Installation\n``` bash\npip install {wheel_url}\n```")
}

/// Download badges for both dist files, both checksums, then the language
/// description.
fn create_description(
    language_description: &str,
    package_name: &str,
    dist_file_names: &[String],
    tar_gz_checksum: &str,
    wheel_checksum: &str,
) -> String {
    let shields: Vec<String> = dist_file_names
        .iter()
        .map(|dist_name| download_shield(package_name, dist_name))
        .collect();
    format!(
        "<p>\n{}\n</p>\n\n\
         > **Checksum (SHA256) .tar.gz:** `{tar_gz_checksum}`\n\n\
         > **Checksum (SHA256) .whl:** `{wheel_checksum}`\n\n\
         {language_description} USAS semantic tagger",
        shields.join("\n")
    )
}

fn download_shield(package_name: &str, dist_name: &str) -> String {
    format!(
        "<a href=\"https://github.com/{REPO_OWNER}/{REPO_NAME}/releases/download/\
         {package_name}/{dist_name}\">\
         <img src=\"https://img.shields.io/github/downloads/{REPO_OWNER}/{REPO_NAME}/\
         {package_name}/{dist_name}?label=downloads&style=flat-square\"/></a>"
    )
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn package_dir(name: &str, version: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("meta.json"),
            format!(
                r#"{{"name": "{name}", "version": "{version}",
                     "tagger_version": ">=0.3,<0.4",
                     "author": "UCREL Research Centre",
                     "license": "CC BY-NC-SA 4.0"}}"#
            ),
        )
        .unwrap();
        let dist = dir.path().join("dist");
        fs::create_dir(&dist).unwrap();
        fs::write(
            dist.join(format!("{name}-{version}.tar.gz")),
            b"sdist bytes padded out".as_slice(),
        )
        .unwrap();
        fs::write(
            dist.join(format!("{name}-{version}-py3-none-any.whl")),
            b"wheel bytes".as_slice(),
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_enrich_adds_checksums_size_and_notes() {
        let dir = package_dir("xx_single_none_contextual", "0.3.0");
        enrich(
            dir.path(),
            "Multilingual",
            "xx_single_none_contextual-0.3.0",
        )
        .unwrap();

        let meta: Map<String, Value> =
            serde_json::from_str(&fs::read_to_string(dir.path().join("meta.json")).unwrap())
                .unwrap();
        assert_eq!(meta["checksum"].as_str().unwrap().len(), 64);
        assert_eq!(meta["checksum_whl"].as_str().unwrap().len(), 64);
        assert_ne!(meta["checksum"], meta["checksum_whl"]);
        assert_eq!(meta["size"], "0.00MB");
        assert_eq!(meta["full_language_name"], "Multilingual");
        assert!(meta["notes"].as_str().unwrap().contains(
            "releases/download/xx_single_none_contextual-0.3.0/\
             xx_single_none_contextual-0.3.0-py3-none-any.whl"
        ));
        let description = meta["description"].as_str().unwrap();
        assert!(description.contains("Multilingual USAS semantic tagger"));
        assert!(description.contains("img.shields.io"));

        let readme = fs::read_to_string(dir.path().join("README.md")).unwrap();
        assert!(readme.contains("**Checksum (SHA256) .tar.gz:**"));
        assert!(readme.contains("| **Name** | `xx_single_none_contextual` |"));
    }

    #[test]
    fn test_enrich_is_idempotent() {
        let dir = package_dir("xx_single_none_contextual", "0.3.0");
        enrich(
            dir.path(),
            "Multilingual",
            "xx_single_none_contextual-0.3.0",
        )
        .unwrap();
        let first_meta = fs::read_to_string(dir.path().join("meta.json")).unwrap();
        let first_readme = fs::read_to_string(dir.path().join("README.md")).unwrap();

        enrich(
            dir.path(),
            "Multilingual",
            "xx_single_none_contextual-0.3.0",
        )
        .unwrap();
        let second_meta = fs::read_to_string(dir.path().join("meta.json")).unwrap();
        let second_readme = fs::read_to_string(dir.path().join("README.md")).unwrap();

        assert_eq!(first_meta, second_meta);
        assert_eq!(first_readme, second_readme);
    }

    #[test]
    fn test_missing_meta_file_fails_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = enrich(dir.path(), "Multilingual", "xx-0.3.0").unwrap_err();
        match err {
            Error::MetaFileMissing(path) => {
                assert_eq!(path, dir.path().join("meta.json"));
            }
            other => panic!("expected a missing meta error, got: {other}"),
        }
    }

    #[test]
    fn test_wrong_dist_file_count_fails() {
        let dir = package_dir("xx_model", "0.3.0");
        fs::write(dir.path().join("dist/extra.txt"), b"stray").unwrap();
        let err = enrich(dir.path(), "Multilingual", "xx_model-0.3.0").unwrap_err();
        match err {
            Error::DistFileCount { count, .. } => assert_eq!(count, 3),
            other => panic!("expected a dist file count error, got: {other}"),
        }
    }

    #[test]
    fn test_unexpected_suffix_fails_naming_the_file() {
        let dir = package_dir("xx_model", "0.3.0");
        let whl = dir.path().join("dist/xx_model-0.3.0-py3-none-any.whl");
        let zipped = dir.path().join("dist/xx_model-0.3.0.zip");
        fs::rename(&whl, &zipped).unwrap();
        let err = enrich(dir.path(), "Multilingual", "xx_model-0.3.0").unwrap_err();
        match err {
            Error::UnexpectedDistFile(path) => assert_eq!(path, zipped),
            other => panic!("expected an unexpected dist file error, got: {other}"),
        }
    }
}
