//! # Model Packager
//!
//! Materialises an initialized pipeline artifact as an installable package:
//! one source archive (`.tar.gz`) and one binary wheel (`.whl`) under
//! `<output>/<name>-<version>/dist/`, plus the package `meta.json` and an
//! initial README. Exactly two dist files must result; anything else is a
//! packaging contract violation.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::error::{Error, Result};
use crate::readme::generate_readme;

/// Packages the artifact in `artifact_dir` as `<name>-<version>` inside
/// `output_dir` and returns the package directory.
pub fn package(
    artifact_dir: &Path,
    output_dir: &Path,
    name: &str,
    version: &str,
) -> Result<PathBuf> {
    let package_name = format!("{name}-{version}");
    let package_dir = output_dir.join(&package_name);
    let dist_dir = package_dir.join("dist");
    fs::create_dir_all(&dist_dir).map_err(|err| Error::io(&dist_dir, err))?;

    // The packaged metadata gains its final name and version here.
    let meta_path = artifact_dir.join("meta.json");
    let mut meta = read_meta(&meta_path)?;
    meta.insert("name".to_string(), json!(name));
    meta.insert("version".to_string(), json!(version));
    let meta_json = serde_json::to_string_pretty(&meta)?;
    fs::write(&meta_path, &meta_json).map_err(|err| Error::io(&meta_path, err))?;

    let package_meta_path = package_dir.join("meta.json");
    fs::write(&package_meta_path, &meta_json).map_err(|err| Error::io(&package_meta_path, err))?;

    let readme_path = package_dir.join("README.md");
    fs::write(&readme_path, generate_readme(&meta)).map_err(|err| Error::io(&readme_path, err))?;

    let files = collect_files(artifact_dir)?;
    let metadata_text = distribution_metadata(name, version, &meta);

    let sdist_path = dist_dir.join(format!("{package_name}.tar.gz"));
    write_sdist(&sdist_path, &package_name, name, &files, &metadata_text)?;

    let wheel_path = dist_dir.join(format!("{name}-{version}-py3-none-any.whl"));
    write_wheel(&wheel_path, &package_name, name, &files, &metadata_text)?;

    let dist_count = fs::read_dir(&dist_dir)
        .map_err(|err| Error::io(&dist_dir, err))?
        .count();
    if dist_count != 2 {
        return Err(Error::DistFileCount {
            dir: dist_dir,
            count: dist_count,
        });
    }

    info!(package = %package_name, "packaged model");
    Ok(package_dir)
}

fn read_meta(path: &Path) -> Result<Map<String, Value>> {
    if !path.exists() {
        return Err(Error::MetaFileMissing(path.to_path_buf()));
    }
    let raw = fs::read_to_string(path).map_err(|err| Error::io(path, err))?;
    Ok(serde_json::from_str(&raw)?)
}

/// Collects `(relative path, contents)` pairs for every file under `dir`,
/// sorted by relative path so archives are built in a stable order.
fn collect_files(dir: &Path) -> Result<Vec<(String, Vec<u8>)>> {
    fn walk(root: &Path, dir: &Path, files: &mut Vec<(String, Vec<u8>)>) -> Result<()> {
        let entries = fs::read_dir(dir).map_err(|err| Error::io(dir, err))?;
        for entry in entries {
            let entry = entry.map_err(|err| Error::io(dir, err))?;
            let path = entry.path();
            if path.is_dir() {
                walk(root, &path, files)?;
            } else {
                let relative = path
                    .strip_prefix(root)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .replace('\\', "/");
                let contents = fs::read(&path).map_err(|err| Error::io(&path, err))?;
                files.push((relative, contents));
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    walk(dir, dir, &mut files)?;
    files.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(files)
}

/// Core metadata text shared by the sdist `PKG-INFO` and the wheel
/// `METADATA` file.
fn distribution_metadata(name: &str, version: &str, meta: &Map<String, Value>) -> String {
    let author = meta.get("author").and_then(Value::as_str).unwrap_or("n/a");
    let license = meta.get("license").and_then(Value::as_str).unwrap_or("n/a");
    format!(
        "Metadata-Version: 2.1\n\
         Name: {name}\n\
         Version: {version}\n\
         Summary: USAS semantic tagger model {name}\n\
         Author: {author}\n\
         License: {license}\n"
    )
}

fn write_sdist(
    path: &Path,
    package_name: &str,
    name: &str,
    files: &[(String, Vec<u8>)],
    metadata_text: &str,
) -> Result<()> {
    let file = File::create(path).map_err(|err| Error::io(path, err))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);

    append_tar_entry(
        &mut builder,
        path,
        &format!("{package_name}/PKG-INFO"),
        metadata_text.as_bytes(),
    )?;
    for (relative, contents) in files {
        append_tar_entry(
            &mut builder,
            path,
            &format!("{package_name}/{name}/{relative}"),
            contents,
        )?;
    }

    let encoder = builder
        .into_inner()
        .map_err(|err| Error::io(path, err))?;
    encoder.finish().map_err(|err| Error::io(path, err))?;
    Ok(())
}

fn append_tar_entry<W: Write>(
    builder: &mut tar::Builder<W>,
    archive_path: &Path,
    entry_path: &str,
    contents: &[u8],
) -> Result<()> {
    let mut header = tar::Header::new_gnu();
    header.set_size(contents.len() as u64);
    header.set_mode(0o644);
    header.set_cksum();
    builder
        .append_data(&mut header, entry_path, contents)
        .map_err(|err| Error::io(archive_path, err))
}

fn write_wheel(
    path: &Path,
    package_name: &str,
    name: &str,
    files: &[(String, Vec<u8>)],
    metadata_text: &str,
) -> Result<()> {
    let file = File::create(path).map_err(|err| Error::io(path, err))?;
    let mut writer = zip::ZipWriter::new(file);
    let options = zip::write::SimpleFileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated)
        .unix_permissions(0o644);

    let mut record_lines = Vec::new();
    for (relative, contents) in files {
        let entry_path = format!("{name}/{relative}");
        writer.start_file(&entry_path, options)?;
        writer
            .write_all(contents)
            .map_err(|err| Error::io(path, err))?;
        record_lines.push(format!("{entry_path},,"));
    }

    let dist_info = format!("{package_name}.dist-info");
    let wheel_text = "Wheel-Version: 1.0\n\
                      Generator: musas-models\n\
                      Root-Is-Purelib: true\n\
                      Tag: py3-none-any\n";
    for (file_name, contents) in [
        ("METADATA", metadata_text),
        ("WHEEL", wheel_text),
        ("top_level.txt", &format!("{name}\n")),
    ] {
        let entry_path = format!("{dist_info}/{file_name}");
        writer.start_file(&entry_path, options)?;
        writer
            .write_all(contents.as_bytes())
            .map_err(|err| Error::io(path, err))?;
        record_lines.push(format!("{entry_path},,"));
    }

    record_lines.push(format!("{dist_info}/RECORD,,"));
    writer.start_file(format!("{dist_info}/RECORD"), options)?;
    writer
        .write_all((record_lines.join("\n") + "\n").as_bytes())
        .map_err(|err| Error::io(path, err))?;

    writer.finish()?;
    Ok(())
}
