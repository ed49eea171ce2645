//! # Error Taxonomy
//!
//! Every failure in the model build pipeline is represented here. The
//! taxonomy follows four groups: schema validation, missing resources,
//! invariant violations and external service failures. Nothing is ever
//! downgraded to a warning; a failed model aborts the whole batch.

use std::path::PathBuf;

use thiserror::Error;

/// Crate wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The language resource document failed structural validation. The
    /// field path includes the language code and the offending field, e.g.
    /// `language_resources.cy.models[0].model_type`.
    #[error("invalid language resource document at `{path}`: {message}")]
    Schema { path: String, message: String },

    /// A language code in the resource document has no entry in the static
    /// language to runtime locale table.
    #[error("unknown language code `{0}`: no runtime locale is registered for it")]
    UnknownLanguage(String),

    /// Two or more models across the resource document share a name. Model
    /// names become release tags, so they must be globally unique.
    #[error("duplicate model names across the language resource document: {0:?}")]
    DuplicateModelNames(Vec<String>),

    /// A lexicon source could not be read or parsed.
    #[error("could not load the lexicon from `{url}`: {message}")]
    Lexicon { url: String, message: String },

    /// A lexicon loaded without error but produced zero entries.
    #[error("the lexicon loaded from `{0}` is empty")]
    EmptyLexicon(String),

    /// A rule based model declared an empty rule list.
    #[error("no rules found for model `{0}`: a rule based model requires at least one rule")]
    NoRules(String),

    /// The model meta file is missing from a packaged model directory.
    #[error("could not find the model meta file `{}`", .0.display())]
    MetaFileMissing(PathBuf),

    /// The packaged model directory is missing its README.
    #[error("could not find the model README file `{}`", .0.display())]
    ReadmeMissing(PathBuf),

    /// The `dist/` folder must contain exactly one `.tar.gz` and one
    /// `.whl`; any other file count signals a packaging contract violation.
    #[error(
        "the dist folder `{}` contains {count} files, expected exactly 2 \
         (one `.tar.gz` and one `.whl`)",
        .dir.display()
    )]
    DistFileCount { dir: PathBuf, count: usize },

    /// A file in `dist/` has a suffix other than `.whl` or `.gz`.
    #[error(
        "unexpected file `{}` in the dist folder: every dist file must end \
         in `.whl` or `.tar.gz`",
        .0.display()
    )]
    UnexpectedDistFile(PathBuf),

    /// The release publisher refuses to start without a token.
    #[error(
        "cannot find a personal access token: expected a non-empty `PAT` \
         value in `{}`",
        .0.display()
    )]
    MissingToken(PathBuf),

    /// The remote release API rejected a request. The hint points at the
    /// most likely cause (an already existing release, or rate limiting).
    #[error("release upload failed for tag `{tag}` ({hint}): {message}")]
    Release {
        tag: String,
        hint: &'static str,
        message: String,
    },

    /// Post-publish verification found local packages without a matching
    /// remote release, or releases with unexpected assets.
    #[error("not all models were released, missing or incomplete tags: {0:?}")]
    MissingReleases(Vec<String>),

    /// A model build failed. Carries the language code, model name and the
    /// resolved configuration so the failure can be diagnosed offline.
    #[error(
        "model build failed for language `{language}`, model `{model}`\n\
         resolved configuration:\n{config}"
    )]
    Build {
        language: String,
        model: String,
        config: String,
        #[source]
        source: Box<Error>,
    },

    #[error("i/o error on `{}`: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("archive error: {0}")]
    Archive(#[from] zip::result::ZipError),
}

impl Error {
    /// Attaches a path to a raw i/o error, so every resource error names
    /// the file it failed on.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
