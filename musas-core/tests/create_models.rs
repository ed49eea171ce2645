//! End to end build tests: from a language resource document to packaged,
//! enriched model directories on disk.

use std::fs;
use std::path::Path;

use musas_core::builder::create_models;
use musas_core::config::{CompiledRule, TaggerConfig};
use musas_core::overview::overview_of_models;
use musas_core::{Error, LanguageResources, Model};
use pretty_assertions::assert_eq;
use serde_json::Value;

fn write_file(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path.to_str().unwrap().to_string()
}

fn single_lexicon(dir: &Path) -> String {
    write_file(
        dir,
        "single.tsv",
        "lemma\tpos\tsemantic_tags\nsnow\tnoun\tW4\nstorm\tnoun\tW4\n",
    )
}

fn mwe_lexicon(dir: &Path) -> String {
    write_file(
        dir,
        "mwe.tsv",
        "mwe_template\tsemantic_tags\nsnow_noun storm_noun\tW4\n",
    )
}

fn resource_document(entries: &[(&str, &str, &str)]) -> String {
    let languages: Vec<String> = entries
        .iter()
        .map(|(language_code, model_json, description)| {
            format!(
                r#""{language_code}": {{
                    "language_data": {{
                        "description": "{description}",
                        "macrolanguage": "{language_code}",
                        "script": "Latn"
                    }},
                    "models": [{model_json}]
                }}"#
            )
        })
        .collect();
    format!(
        r#"{{"language_resources": {{{}}}}}"#,
        languages.join(",\n")
    )
}

fn single_rule_model(name: &str, lexicon_url: &str) -> String {
    format!(
        r#"{{
            "model_type": "rule_based_tagger",
            "name": "{name}",
            "resources": {{
                "ranker": "contextual",
                "rules": [
                    {{
                        "rule_type": "single",
                        "pos_mapper": null,
                        "lexicon_url": "{lexicon_url}",
                        "with_pos": true
                    }}
                ]
            }}
        }}"#
    )
}

fn dual_rule_model(name: &str, single_url: &str, mwe_url: &str) -> String {
    format!(
        r#"{{
            "model_type": "rule_based_tagger",
            "name": "{name}",
            "resources": {{
                "ranker": "contextual",
                "rules": [
                    {{
                        "rule_type": "single",
                        "pos_mapper": "upos2usas",
                        "lexicon_url": "{single_url}",
                        "with_pos": true
                    }},
                    {{
                        "rule_type": "mwe",
                        "pos_mapper": "upos2usas",
                        "lexicon_url": "{mwe_url}"
                    }}
                ]
            }}
        }}"#
    )
}

#[test]
fn test_single_rule_model_is_packaged_and_enriched() {
    let fixtures = tempfile::tempdir().unwrap();
    let lexicon_url = single_lexicon(fixtures.path());
    let document = resource_document(&[(
        "xx",
        &single_rule_model("xx_single_none_contextual", &lexicon_url),
        "Multilingual",
    )]);
    let resource_file = write_file(fixtures.path(), "language_resources.json", &document);

    let models_dir = tempfile::tempdir().unwrap();
    create_models(models_dir.path(), Path::new(&resource_file), "0").unwrap();

    let package_dirs: Vec<String> = fs::read_dir(models_dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(package_dirs, vec!["xx_single_none_contextual-0.3.0".to_string()]);

    let package_dir = models_dir.path().join("xx_single_none_contextual-0.3.0");
    let mut dist_files: Vec<String> = fs::read_dir(package_dir.join("dist"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    dist_files.sort();
    assert_eq!(
        dist_files,
        vec![
            "xx_single_none_contextual-0.3.0-py3-none-any.whl".to_string(),
            "xx_single_none_contextual-0.3.0.tar.gz".to_string(),
        ]
    );

    let meta: Value =
        serde_json::from_str(&fs::read_to_string(package_dir.join("meta.json")).unwrap()).unwrap();
    for key in ["checksum", "checksum_whl", "size"] {
        assert!(meta.get(key).is_some(), "missing meta key `{key}`");
    }
    assert_eq!(meta["name"], "xx_single_none_contextual");
    assert_eq!(meta["full_language_name"], "Multilingual");
    assert!(package_dir.join("README.md").exists());
}

#[test]
fn test_dual_rule_model_carries_both_rules_in_order() {
    let fixtures = tempfile::tempdir().unwrap();
    let single_url = single_lexicon(fixtures.path());
    let mwe_url = mwe_lexicon(fixtures.path());
    let document = resource_document(&[(
        "en",
        &dual_rule_model("en_dual_upos2usas_contextual", &single_url, &mwe_url),
        "English",
    )]);
    let resource_file = write_file(fixtures.path(), "language_resources.json", &document);

    let models_dir = tempfile::tempdir().unwrap();
    create_models(models_dir.path(), Path::new(&resource_file), "0").unwrap();

    // The packaged wheel and sdist embed `config.json`; read it back out
    // of the sdist to check what the external tagger will be given.
    let package_dir = models_dir.path().join("en_dual_upos2usas_contextual-0.3.0");
    let sdist = fs::File::open(
        package_dir.join("dist/en_dual_upos2usas_contextual-0.3.0.tar.gz"),
    )
    .unwrap();
    let mut archive = tar::Archive::new(flate2::read::GzDecoder::new(sdist));
    let mut config_json = String::new();
    for entry in archive.entries().unwrap() {
        let mut entry = entry.unwrap();
        if entry.path().unwrap().ends_with("config.json") {
            use std::io::Read;
            entry.read_to_string(&mut config_json).unwrap();
        }
    }
    assert!(!config_json.is_empty(), "config.json missing from the sdist");

    let config: TaggerConfig = serde_json::from_str(&config_json).unwrap();
    let TaggerConfig::RuleBased(rule_config) = config else {
        panic!("expected a rule based configuration");
    };
    assert_eq!(rule_config.rules.len(), 2);
    assert!(matches!(rule_config.rules[0], CompiledRule::Single { .. }));
    match &rule_config.rules[1] {
        CompiledRule::Mwe { mwe_lexicon, .. } => {
            // The multi word template spans both constituent tokens and
            // carries the one shared tag set the tagger will apply.
            assert_eq!(mwe_lexicon.entries["snow_noun storm_noun"], vec!["W4"]);
        }
        CompiledRule::Single { .. } => panic!("expected an MWE rule second"),
    }
}

#[test]
fn test_overview_of_two_packages() {
    let fixtures = tempfile::tempdir().unwrap();
    let lexicon_url = single_lexicon(fixtures.path());
    let document = resource_document(&[
        (
            "xx",
            &single_rule_model("xx_single_none_contextual", &lexicon_url),
            "Multilingual",
        ),
        (
            "en",
            &single_rule_model("en_single_none_contextual", &lexicon_url),
            "English",
        ),
    ]);
    let resource_file = write_file(fixtures.path(), "language_resources.json", &document);

    let models_dir = tempfile::tempdir().unwrap();
    create_models(models_dir.path(), Path::new(&resource_file), "0").unwrap();

    let rendered = overview_of_models(models_dir.path()).unwrap();
    let lines: Vec<&str> = rendered.lines().collect();
    assert_eq!(lines.len(), 4, "expected header, separator and two rows");
    assert!(lines[2].contains("English (en)"));
    assert!(lines[3].contains("Multilingual (xx)"));
}

#[test]
fn test_duplicate_model_names_abort_before_building() {
    let fixtures = tempfile::tempdir().unwrap();
    let lexicon_url = single_lexicon(fixtures.path());
    let document = resource_document(&[
        (
            "xx",
            &single_rule_model("shared_single_none_contextual", &lexicon_url),
            "Multilingual",
        ),
        (
            "en",
            &single_rule_model("shared_single_none_contextual", &lexicon_url),
            "English",
        ),
    ]);
    let resource_file = write_file(fixtures.path(), "language_resources.json", &document);

    let models_dir = tempfile::tempdir().unwrap();
    let err = create_models(models_dir.path(), Path::new(&resource_file), "0").unwrap_err();
    assert!(matches!(err, Error::DuplicateModelNames(_)), "{err}");
    // Nothing was packaged.
    assert_eq!(fs::read_dir(models_dir.path()).unwrap().count(), 0);
}

#[test]
fn test_shipped_resource_document_language_overrides() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../language_resources.json");
    let resources = LanguageResources::from_path(&path).unwrap();
    resources.validate_unique_model_names().unwrap();

    let rule_model = |language_code: &str| {
        resources
            .iter_models()
            .find_map(|(code, _, model)| match model {
                Model::Rule(rule_model) if code == language_code => Some(rule_model),
                _ => None,
            })
            .unwrap()
    };

    // Welsh and Indonesian taggers read the POS from a different token
    // attribute than the rest of the languages.
    assert_eq!(rule_model("cy").config.pos_attribute, "tag_");
    assert_eq!(rule_model("id").config.pos_attribute, "tag_");
    assert_eq!(rule_model("en").config.pos_attribute, "pos");

    // Indonesian also overrides the fallback tags for punctuation and
    // numbers.
    let id_resources = &rule_model("id").resources;
    assert_eq!(
        id_resources.default_punctuation_tags,
        Some(vec!["Z".to_string()])
    );
    assert_eq!(id_resources.default_number_tags, Some(vec!["CD".to_string()]));
    assert_eq!(rule_model("en").resources.default_punctuation_tags, None);
}

#[test]
fn test_broken_lexicon_reports_language_and_model() {
    let fixtures = tempfile::tempdir().unwrap();
    let document = resource_document(&[(
        "xx",
        &single_rule_model("xx_single_none_contextual", "/missing/lexicon.tsv"),
        "Multilingual",
    )]);
    let resource_file = write_file(fixtures.path(), "language_resources.json", &document);

    let models_dir = tempfile::tempdir().unwrap();
    let err = create_models(models_dir.path(), Path::new(&resource_file), "0").unwrap_err();
    match err {
        Error::Build {
            language, model, ..
        } => {
            assert_eq!(language, "xx");
            assert_eq!(model, "xx_single_none_contextual");
        }
        other => panic!("expected a build error, got: {other}"),
    }
}
