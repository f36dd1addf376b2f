// ABOUTME: Wrapper for the tbls command to describe a live database
// ABOUTME: Runs `tbls out --sort -t json` with a timeout and captures its JSON output

use super::DescriptionSource;
use crate::error::{DriftError, DriftResult};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

/// Describes databases by shelling out to tbls
#[derive(Debug, Clone)]
pub struct TblsSource {
    program: String,
    timeout: Duration,
}

impl Default for TblsSource {
    fn default() -> Self {
        Self {
            program: "tbls".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

impl TblsSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different executable name or path
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Kill the tool if it runs longer than `timeout`
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, dsn: &str) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg("out")
            .arg("--sort")
            .arg("-t")
            .arg("json")
            .arg(dsn)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }
}

#[async_trait]
impl DescriptionSource for TblsSource {
    async fn raw_description_for(&self, dsn: &str) -> DriftResult<String> {
        tracing::info!("Describing database schema with {}", self.program);

        let output = match tokio::time::timeout(self.timeout, self.command(dsn).output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(DriftError::inspection(format!(
                    "Failed to execute {}. Is tbls installed?",
                    self.program
                )))
            }
            Ok(Err(e)) => {
                return Err(DriftError::inspection(format!(
                    "Failed to execute {}: {}",
                    self.program, e
                )))
            }
            Err(_) => {
                return Err(DriftError::inspection(format!(
                    "{} did not finish within {:?}",
                    self.program, self.timeout
                )))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(
                format!("{} failed ({})", self.program, output.status),
                &stderr,
            ));
        }

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| {
                DriftError::inspection(format!("{} produced non-UTF-8 output", self.program))
            })?;

        tracing::info!("✓ Schema description received ({} bytes)", stdout.len());
        Ok(stdout)
    }
}

/// Markers tbls (via the Go driver) prints when the database itself could
/// not be reached or rejected the login.
const CONNECTION_FAILURES: &[&str] = &[
    "dial tcp",
    "connection refused",
    "no such host",
    "password authentication failed",
    "no pg_hba.conf entry",
    "i/o timeout",
];

/// A non-zero exit is a connection error when stderr says the database was
/// unreachable, otherwise an inspection failure carrying stderr.
fn classify_failure(message: String, stderr: &str) -> DriftError {
    let lowered = stderr.to_lowercase();
    if CONNECTION_FAILURES.iter().any(|marker| lowered.contains(marker)) {
        return DriftError::connection(format!("{}: {}", message, stderr.trim()));
    }
    DriftError::inspection_with_diagnostic(message, stderr)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_program_is_inspection_failure() {
        let source = TblsSource::new().program("tbls-does-not-exist-9c1e");
        let err = source
            .raw_description_for("postgres://u@h/d")
            .await
            .unwrap_err();
        assert!(err.is_inspection());
        assert!(err.to_string().contains("Is tbls installed?"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_command_arguments() {
        // echo stands in for tbls and prints the arguments it received
        let source = TblsSource::new().program("echo");
        let out = source
            .raw_description_for("postgres://u@h/d")
            .await
            .unwrap();
        assert_eq!(out.trim_end(), "out --sort -t json postgres://u@h/d");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_nonzero_exit_is_inspection_failure() {
        let source = TblsSource::new().program("false");
        let err = source
            .raw_description_for("postgres://u@h/d")
            .await
            .unwrap_err();
        match err {
            DriftError::InspectionFailed { message, diagnostic } => {
                assert!(message.starts_with("false failed"));
                assert!(diagnostic.is_some());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unreachable_database_in_stderr_is_connection_error() {
        let stderr = "failed to connect to `host=127.0.0.1 user=app database=app`: \
                      dial error (dial tcp 127.0.0.1:1: connect: connection refused)\n";
        let err = classify_failure("tbls failed (exit status: 1)".to_string(), stderr);
        assert!(err.is_connection(), "unexpected error: {:?}", err);

        let err = classify_failure(
            "tbls failed (exit status: 1)".to_string(),
            "FATAL: password authentication failed for user \"app\"",
        );
        assert!(err.is_connection());
    }

    #[test]
    fn test_other_tool_failure_is_inspection_error() {
        let err = classify_failure(
            "tbls failed (exit status: 1)".to_string(),
            "unsupported driver: mysql2",
        );
        assert!(err.is_inspection());
        assert!(err.to_string().contains("unsupported driver"));
    }

    // NOTE: This test requires tbls and a real PostgreSQL instance
    #[tokio::test]
    #[ignore]
    async fn test_describe_live_database() {
        let url = std::env::var("TEST_DATABASE_URL")
            .expect("TEST_DATABASE_URL must be set for integration tests");

        let out = TblsSource::new().raw_description_for(&url).await.unwrap();
        assert!(out.contains("\"tables\""));
    }
}
