// ABOUTME: Schema inspector building a schema model from a live database
// ABOUTME: Probes the DSN, fetches a tbls description, and parses it

pub mod document;
pub mod parse;
pub mod tbls;

pub use parse::{parse_document, ParseOptions};
pub use tbls::TblsSource;

use crate::error::DriftResult;
use crate::schema::Schema;
use crate::{postgres, utils};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// Produces the raw structured description of a database.
///
/// The inspector only depends on this seam, so the introspection tool can be
/// swapped out or replaced by a fixture in tests.
#[async_trait]
pub trait DescriptionSource: Send + Sync {
    /// Return the tbls-format JSON document describing the database at `dsn`.
    async fn raw_description_for(&self, dsn: &str) -> DriftResult<String>;
}

#[derive(Debug, Clone)]
pub struct InspectorOptions {
    /// Open a connection before running the tool, so unreachable databases
    /// surface as connection errors instead of tool failures.
    pub preflight: bool,
    pub connect_timeout: Duration,
    pub parse: ParseOptions,
}

impl Default for InspectorOptions {
    fn default() -> Self {
        Self {
            preflight: true,
            connect_timeout: Duration::from_secs(10),
            parse: ParseOptions::default(),
        }
    }
}

pub struct Inspector<S> {
    source: S,
    options: InspectorOptions,
}

impl<S: DescriptionSource> Inspector<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            options: InspectorOptions::default(),
        }
    }

    pub fn with_options(mut self, options: InspectorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &InspectorOptions {
        &self.options
    }

    /// Build a schema model of the database at `dsn`
    ///
    /// Nothing is returned unless the description was fully fetched and
    /// parsed; a partial schema never escapes.
    ///
    /// # Errors
    ///
    /// - [`DriftError::Connection`](crate::error::DriftError::Connection) if the
    ///   DSN is malformed or the pre-flight connection fails
    /// - [`DriftError::InspectionFailed`](crate::error::DriftError::InspectionFailed)
    ///   if the source fails or its output cannot be parsed
    pub async fn inspect(&self, dsn: &str) -> DriftResult<Schema> {
        utils::validate_connection_string(dsn)?;

        if self.options.preflight {
            tracing::info!("Checking database connectivity...");
            postgres::probe(dsn, self.options.connect_timeout).await?;
            tracing::info!("✓ Connected");
        }

        let raw = self.source.raw_description_for(dsn).await?;
        let schema = parse_document(&raw, &self.options.parse)?;

        tracing::info!("✓ Inspected {} tables", schema.len());
        Ok(schema)
    }
}

/// Load a saved tbls JSON document from disk
pub fn load_document(path: impl AsRef<Path>, options: &ParseOptions) -> DriftResult<Schema> {
    let path = path.as_ref();
    tracing::info!("Loading schema document from {}", path.display());
    let text = std::fs::read_to_string(path)?;
    parse_document(&text, options)
}
