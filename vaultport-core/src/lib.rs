//! # vaultport-core
//!
//! Core library for converting an Obsidian-style markdown vault into a
//! Hugo site: front-matter handling, wikilink resolution, math and tag
//! transforms, and site-archive assembly.

pub mod archive;
pub mod config;
pub mod diff;
pub mod frontmatter;
pub mod markdown;
pub mod models;
pub mod pipeline;
pub mod resolver;
pub mod site;
pub mod slug;

pub use archive::{assemble_posts, assemble_site, SiteArchive, SiteMeta};
pub use config::{ConfigError, ConvertConfig};
pub use diff::{line_diff, LineMark};
pub use frontmatter::{FrontMatter, Value};
pub use models::{
    BatchOutput, DocumentReport, SourceDocument, TransformResult, Warning, WarningLevel,
};
pub use pipeline::{transform_batch, transform_document};
pub use resolver::ResolverIndex;
pub use slug::slugify;
