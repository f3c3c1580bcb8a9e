//! HTML to PDF conversion through an external converter
//!
//! Runs `converter <html> <pdf>` directly (argv, no shell) under a timeout.

use crate::errors::{FolioError, Result};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, info};

/// Convert `html` to `pdf` with `converter`
pub async fn convert_to_pdf(
    converter: &str,
    html: &Path,
    pdf: &Path,
    timeout_secs: u64,
) -> Result<PathBuf> {
    if converter.trim().is_empty() {
        return Err(FolioError::PdfError("converter command is empty".to_string()));
    }

    let start = Instant::now();
    let mut cmd = Command::new(converter);
    cmd.arg(html).arg(pdf).kill_on_drop(true);

    debug!(converter, html = %html.display(), "converting report to PDF");

    match timeout(Duration::from_secs(timeout_secs), cmd.output()).await {
        Ok(Ok(output)) if output.status.success() => {
            info!(
                pdf = %pdf.display(),
                duration_ms = start.elapsed().as_millis() as u64,
                "PDF written"
            );
            Ok(pdf.to_path_buf())
        }
        Ok(Ok(output)) => {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(FolioError::PdfError(format!(
                "{} exited with {}: {}",
                converter,
                output.status.code().unwrap_or(-1),
                stderr.trim().chars().take(300).collect::<String>()
            )))
        }
        Ok(Err(e)) => Err(FolioError::PdfError(format!(
            "failed to run {}: {}",
            converter, e
        ))),
        Err(_) => Err(FolioError::PdfError(format!(
            "{} timed out after {}s",
            converter, timeout_secs
        ))),
    }
}
