//! # Release Publisher
//!
//! Uploads packaged models as tagged releases and verifies that every
//! local package ended up remote with exactly the two expected assets.
//! This is the only component that talks to the outside world; everything
//! it consumes is the packager's on-disk output.
//!
//! There is no retry logic. A duplicate release or a rate limited request
//! surfaces as an error with a hint and aborts the run.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::error::{Error, Result};
use crate::{REPO_NAME, REPO_OWNER};

const API_BASE: &str = "https://api.github.com";
const UPLOAD_BASE: &str = "https://uploads.github.com";

/// A remote release as returned by the listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    pub tag_name: String,
    pub assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    pub name: String,
}

#[derive(Debug, Deserialize)]
struct CreatedRelease {
    id: u64,
}

/// Publishes packaged model folders as GitHub releases.
pub struct Publisher {
    client: reqwest::blocking::Client,
    token: String,
}

impl Publisher {
    /// Reads the personal access token from a JSON file of the form
    /// `{"PAT": "..."}`. Refuses to start on a missing or empty token.
    pub fn from_token_file(path: &Path) -> Result<Self> {
        let token = read_token(path)?;
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("musas-models/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, token })
    }

    /// Uploads one release per package folder in `models_directory`, then
    /// verifies the remote state. Duplicate tag names fail before any
    /// network call is made.
    pub fn publish(&self, models_directory: &Path) -> Result<()> {
        let package_dirs = package_dirs(models_directory)?;
        let tags: Vec<String> = package_dirs
            .iter()
            .map(|dir| folder_name(dir))
            .collect();

        let duplicates = duplicate_tags(&tags);
        if !duplicates.is_empty() {
            return Err(Error::DuplicateModelNames(duplicates));
        }

        for package_dir in &package_dirs {
            self.publish_one(package_dir)?;
        }

        let releases = self.list_releases()?;
        verify_releases(&tags, &releases)
    }

    fn publish_one(&self, package_dir: &Path) -> Result<()> {
        let tag = folder_name(package_dir);

        let readme_path = package_dir.join("README.md");
        if !readme_path.exists() {
            return Err(Error::ReadmeMissing(readme_path));
        }
        let body = fs::read_to_string(&readme_path).map_err(|err| Error::io(&readme_path, err))?;

        let assets = local_assets(package_dir, &tag)?;

        let url = format!("{API_BASE}/repos/{REPO_OWNER}/{REPO_NAME}/releases");
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&json!({
                "tag_name": tag,
                "target_commitish": "main",
                "name": tag,
                "body": body,
                "draft": false,
                "prerelease": false,
            }))
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Release {
                tag,
                hint: "a release with this tag may already exist, or the API rate limit was hit",
                message: format!("{status}: {}", response.text().unwrap_or_default()),
            });
        }
        let created: CreatedRelease = response.json()?;

        for asset_path in &assets {
            self.upload_asset(&tag, created.id, asset_path)?;
        }
        info!(tag = %tag, "published release");
        Ok(())
    }

    fn upload_asset(&self, tag: &str, release_id: u64, asset_path: &Path) -> Result<()> {
        let asset_name = folder_name(asset_path);
        let contents = fs::read(asset_path).map_err(|err| Error::io(asset_path, err))?;
        let url = format!(
            "{UPLOAD_BASE}/repos/{REPO_OWNER}/{REPO_NAME}/releases/{release_id}/assets"
        );
        let response = self
            .client
            .post(&url)
            .query(&[("name", asset_name.as_str())])
            .bearer_auth(&self.token)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(contents)
            .send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Release {
                tag: tag.to_string(),
                hint: "asset upload was rejected",
                message: format!(
                    "{status} while uploading `{asset_name}`: {}",
                    response.text().unwrap_or_default()
                ),
            });
        }
        Ok(())
    }

    fn list_releases(&self) -> Result<Vec<Release>> {
        let mut releases = Vec::new();
        let url = format!("{API_BASE}/repos/{REPO_OWNER}/{REPO_NAME}/releases");
        for page in 1.. {
            let page_releases: Vec<Release> = self
                .client
                .get(&url)
                .bearer_auth(&self.token)
                .query(&[("per_page", "100"), ("page", &page.to_string())])
                .send()?
                .error_for_status()?
                .json()?;
            if page_releases.is_empty() {
                break;
            }
            releases.extend(page_releases);
        }
        Ok(releases)
    }
}

/// The two asset names every release must carry for its tag.
pub fn expected_assets(tag: &str) -> [String; 2] {
    [format!("{tag}-py3-none-any.whl"), format!("{tag}.tar.gz")]
}

/// Tags that occur more than once, in first-seen order.
pub fn duplicate_tags(tags: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut duplicates = Vec::new();
    for tag in tags {
        if !seen.insert(tag.as_str()) && !duplicates.contains(tag) {
            duplicates.push(tag.clone());
        }
    }
    duplicates
}

/// Post-publish invariant: every local tag has a remote release with
/// exactly the two expected assets. Violations are consolidated into one
/// error listing all missing or incomplete tags.
pub fn verify_releases(local_tags: &[String], releases: &[Release]) -> Result<()> {
    let mut pending: BTreeSet<&str> = local_tags.iter().map(String::as_str).collect();
    for release in releases {
        let mut expected: BTreeSet<String> = expected_assets(&release.tag_name).into();
        for asset in &release.assets {
            expected.remove(&asset.name);
        }
        let complete = expected.is_empty() && release.assets.len() == 2;
        if complete {
            pending.remove(release.tag_name.as_str());
        }
    }
    if pending.is_empty() {
        Ok(())
    } else {
        Err(Error::MissingReleases(
            pending.into_iter().map(String::from).collect(),
        ))
    }
}

fn read_token(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(Error::MissingToken(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
    let parsed: serde_json::Map<String, serde_json::Value> = serde_json::from_str(&raw)?;
    match parsed.get("PAT").and_then(serde_json::Value::as_str) {
        Some(token) if !token.is_empty() => Ok(token.to_string()),
        _ => Err(Error::MissingToken(path.to_path_buf())),
    }
}

fn package_dirs(models_directory: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = fs::read_dir(models_directory)
        .map_err(|err| Error::io(models_directory, err))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|err| Error::io(models_directory, err))?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

fn folder_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Checks that `dist/` holds exactly the two expected assets for `tag`
/// and returns their paths, wheel first.
fn local_assets(package_dir: &Path, tag: &str) -> Result<Vec<PathBuf>> {
    let dist_dir = package_dir.join("dist");
    let mut paths: Vec<PathBuf> = fs::read_dir(&dist_dir)
        .map_err(|err| Error::io(&dist_dir, err))?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(|err| Error::io(&dist_dir, err))?
        .into_iter()
        .map(|entry| entry.path())
        .collect();
    paths.sort();
    if paths.len() != 2 {
        return Err(Error::DistFileCount {
            dir: dist_dir,
            count: paths.len(),
        });
    }
    let expected = expected_assets(tag);
    for path in &paths {
        if !expected.contains(&folder_name(path)) {
            return Err(Error::UnexpectedDistFile(path.clone()));
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use pretty_assertions::assert_eq;

    use super::*;

    fn release(tag: &str, asset_names: &[&str]) -> Release {
        Release {
            tag_name: tag.to_string(),
            assets: asset_names
                .iter()
                .map(|name| ReleaseAsset {
                    name: name.to_string(),
                })
                .collect(),
        }
    }

    #[test]
    fn test_expected_asset_names() {
        assert_eq!(
            expected_assets("xx_single_none_contextual-0.3.0"),
            [
                "xx_single_none_contextual-0.3.0-py3-none-any.whl".to_string(),
                "xx_single_none_contextual-0.3.0.tar.gz".to_string(),
            ]
        );
    }

    #[test]
    fn test_duplicate_tags_found() {
        let tags = vec![
            "a-0.3.0".to_string(),
            "b-0.3.0".to_string(),
            "a-0.3.0".to_string(),
        ];
        assert_eq!(duplicate_tags(&tags), vec!["a-0.3.0".to_string()]);
        assert!(duplicate_tags(&tags[..2]).is_empty());
    }

    #[test]
    fn test_verify_accepts_complete_releases() {
        let tags = vec!["a-0.3.0".to_string()];
        let releases = vec![release(
            "a-0.3.0",
            &["a-0.3.0-py3-none-any.whl", "a-0.3.0.tar.gz"],
        )];
        verify_releases(&tags, &releases).unwrap();
    }

    #[test]
    fn test_verify_collects_all_missing_tags() {
        let tags = vec!["a-0.3.0".to_string(), "b-0.3.0".to_string()];
        // `a` is missing an asset, `b` is missing entirely.
        let releases = vec![release("a-0.3.0", &["a-0.3.0.tar.gz"])];
        let err = verify_releases(&tags, &releases).unwrap_err();
        match err {
            Error::MissingReleases(missing) => {
                assert_eq!(missing, vec!["a-0.3.0".to_string(), "b-0.3.0".to_string()]);
            }
            other => panic!("expected a missing releases error, got: {other}"),
        }
    }

    #[test]
    fn test_verify_rejects_extra_assets() {
        let tags = vec!["a-0.3.0".to_string()];
        let releases = vec![release(
            "a-0.3.0",
            &["a-0.3.0-py3-none-any.whl", "a-0.3.0.tar.gz", "stray.txt"],
        )];
        assert!(verify_releases(&tags, &releases).is_err());
    }

    #[test]
    fn test_token_file_parsing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"PAT": "ghp_sometoken"}"#).unwrap();
        assert_eq!(read_token(file.path()).unwrap(), "ghp_sometoken");
    }

    #[test]
    fn test_empty_token_refused() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"PAT": ""}"#).unwrap();
        let err = read_token(file.path()).unwrap_err();
        assert!(matches!(err, Error::MissingToken(_)), "{err}");
    }

    #[test]
    fn test_missing_token_file_refused() {
        let err = read_token(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, Error::MissingToken(_)), "{err}");
    }

    #[test]
    fn test_local_assets_enforced_before_upload() {
        let package_dir = tempfile::tempdir().unwrap();
        let dist = package_dir.path().join("dist");
        fs::create_dir(&dist).unwrap();
        fs::write(dist.join("a-0.3.0-py3-none-any.whl"), b"wheel").unwrap();
        fs::write(dist.join("a-0.3.0.tar.gz"), b"sdist").unwrap();

        let assets = local_assets(package_dir.path(), "a-0.3.0").unwrap();
        assert_eq!(assets.len(), 2);

        let err = local_assets(package_dir.path(), "b-0.3.0").unwrap_err();
        assert!(matches!(err, Error::UnexpectedDistFile(_)), "{err}");
    }
}
