//! # musas-core — USAS Tagger Model Build Pipeline
//!
//! This crate turns a declarative language resource document into
//! installable USAS semantic tagger model packages. It is a build and
//! release tool, not a tagger: rule matching and neural inference live in
//! the external tagger library the packages are built for.
//!
//! ## Pipeline
//!
//! The data flows linearly, one model at a time:
//!
//! 1. **Schema** ([`resource`]): the resource document is parsed and fully
//!    validated (languages, lexicon URLs, rule composition, neural model
//!    references).
//! 2. **POS mapping** ([`pos_mapper`]): named mapping families are
//!    resolved to concrete, direction sensitive translation tables.
//! 3. **Configuration** ([`config`]): each model becomes an immutable
//!    tagger configuration, loading its lexicons ([`lexicon`]) on the way.
//! 4. **Packaging** ([`pipeline`], [`package`]): the initialized pipeline
//!    artifact is materialised as a source archive plus a wheel.
//! 5. **Enrichment** ([`meta`], [`readme`]): checksums, size and release
//!    notes are derived and the README regenerated.
//! 6. **Release** ([`release`]): packages are uploaded as tagged releases
//!    and the remote state verified.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use musas_core::builder::create_models;
//! use musas_core::overview::overview_of_models;
//!
//! create_models(
//!     Path::new("models"),
//!     Path::new("language_resources.json"),
//!     "0",
//! )?;
//! println!("{}", overview_of_models(Path::new("models"))?);
//! # Ok::<(), musas_core::Error>(())
//! ```

pub mod builder;
pub mod config;
pub mod error;
pub mod lexicon;
pub mod meta;
pub mod overview;
pub mod package;
pub mod pipeline;
pub mod pos_mapper;
pub mod readme;
pub mod release;
pub mod resource;

pub use error::{Error, Result};
pub use resource::{LanguageResources, Model};

/// Version of the external tagger library the models are built against.
/// The packaged model version is `<major>.<minor>` of this, plus the model
/// element given on the command line.
pub const TAGGER_VERSION: &str = "0.3.3";

/// Repository the releases are published to; also the host of the
/// predictable asset download URLs.
pub const REPO_OWNER: &str = "UCREL";
pub const REPO_NAME: &str = "musas-models";
