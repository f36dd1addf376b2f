// ABOUTME: Inspect command implementation - dump a database's normalized schema
// ABOUTME: Prints the schema model as pretty JSON on stdout

use crate::config::Config;
use crate::inspect::Inspector;
use crate::utils;
use anyhow::{Context, Result};

pub async fn inspect(target: &str, config: &Config) -> Result<()> {
    utils::check_required_tool(&config.inspector.tbls)?;

    let inspector = Inspector::new(config.tbls_source()).with_options(config.inspector_options());
    let schema = inspector
        .inspect(target)
        .await
        .context("Failed to inspect target database")?;

    let json = serde_json::to_string_pretty(&schema).context("Failed to serialize schema")?;
    println!("{}", json);
    Ok(())
}
