//! # README Generation
//!
//! Renders a packaged model's `meta.json` as the Markdown document used
//! both as the package `README.md` and as the release notes body. Label
//! scheme and accuracy sections only appear when the metadata carries
//! them.

use serde_json::{Map, Value};

/// Generates the full Markdown README text from a model's metadata.
pub fn generate_readme(meta: &Map<String, Value>) -> String {
    let name = string_field(meta, "name").unwrap_or("n/a");
    let version = string_field(meta, "version").unwrap_or("n/a");
    let tagger_version = string_field(meta, "tagger_version").unwrap_or("n/a");
    let license = string_field(meta, "license");
    let author = string_field(meta, "author").unwrap_or("n/a");
    let model_size = string_field(meta, "size").unwrap_or("n/a");

    let author_cell = match string_field(meta, "url") {
        Some(url) => link(author, url),
        None => author.to_string(),
    };
    let license_cell = match license {
        Some(license) => code(license),
        None => "n/a".to_string(),
    };

    let feature_rows = vec![
        vec![bold("Name"), code(name)],
        vec![bold("Version"), code(version)],
        vec![bold("Tagger"), code(tagger_version)],
        vec![bold("Author"), author_cell],
        vec![bold("License"), license_cell],
        vec![bold("Model size"), model_size.to_string()],
    ];

    let mut sections = Vec::new();
    if let Some(description) = string_field(meta, "description") {
        sections.push(description.to_string());
    }
    sections.push(table(&feature_rows, &["Feature", "Description"]));
    if let Some(label_scheme) = format_label_scheme(meta.get("labels")) {
        sections.push(title(3, "Label Scheme"));
        sections.push(label_scheme);
    }
    if let Some(accuracy) = format_accuracy(meta.get("performance")) {
        sections.push(title(3, "Accuracy"));
        sections.push(accuracy);
    }
    if let Some(notes) = string_field(meta, "notes") {
        sections.push(notes.to_string());
    }
    sections.join("\n\n") + "\n"
}

fn string_field<'a>(meta: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    meta.get(key).and_then(Value::as_str)
}

pub fn bold(text: &str) -> String {
    format!("**{text}**")
}

pub fn code(text: &str) -> String {
    format!("`{text}`")
}

pub fn link(text: &str, url: &str) -> String {
    format!("[{text}]({url})")
}

pub fn title(level: usize, text: &str) -> String {
    format!("{} {text}", "#".repeat(level))
}

/// A pipe delimited Markdown table.
pub fn table(rows: &[Vec<String>], headers: &[&str]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 2);
    lines.push(format!("| {} |", headers.join(" | ")));
    lines.push(format!("| {} |", vec!["---"; headers.len()].join(" | ")));
    for row in rows {
        lines.push(format!("| {} |", row.join(" | ")));
    }
    lines.join("\n")
}

/// Renders the label scheme as a collapsed details section, one row per
/// pipeline component. Absent or empty label data renders nothing.
fn format_label_scheme(labels: Option<&Value>) -> Option<String> {
    let labels = labels?.as_object()?;
    let mut rows = Vec::new();
    let mut label_count = 0;
    for (component, component_labels) in labels {
        let Some(component_labels) = component_labels.as_array() else {
            continue;
        };
        if component_labels.is_empty() {
            continue;
        }
        let cells: Vec<String> = component_labels
            .iter()
            .filter_map(Value::as_str)
            .map(|label| code(&label.replace('|', "\\|")))
            .collect();
        label_count += cells.len();
        rows.push(vec![bold(&code(component)), cells.join(", ")]);
    }
    if rows.is_empty() {
        return None;
    }
    let summary = format!(
        "View label scheme ({label_count} labels for {} components)",
        rows.len()
    );
    Some(format!(
        "<details>\n<summary>{summary}</summary>\n\n{}\n\n</details>",
        table(&rows, &["Component", "Labels"])
    ))
}

/// Renders scalar accuracy scores as a table, scaled to percentages.
/// Timing entries are excluded.
fn format_accuracy(performance: Option<&Value>) -> Option<String> {
    let performance = performance?.as_object()?;
    let rows: Vec<Vec<String>> = performance
        .iter()
        .filter(|(metric, _)| metric.as_str() != "speed")
        .filter_map(|(metric, score)| {
            let score = score.as_f64()?;
            Some(vec![
                code(&metric.to_uppercase()),
                format!("{:.2}", score * 100.0),
            ])
        })
        .collect();
    if rows.is_empty() {
        return None;
    }
    Some(table(&rows, &["Type", "Score"]))
}
