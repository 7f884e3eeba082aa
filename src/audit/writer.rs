//! Saving reports to disk

use std::path::{Path, PathBuf};

use log::info;
use tokio::fs;

use crate::audit::report::Report;
use crate::config::Variant;
use crate::error::{AuditResult, IoContext};

/// File name of a report for the given engine version
pub fn report_file_name(variant: Variant, unity_version: &str) -> String {
    match variant {
        Variant::Apis => format!("Unity_{}_Undocumented_APIs.md", unity_version.replace(' ', "_")),
        Variant::Types => format!("Unity {} Undocumented Types.md", unity_version),
    }
}

/// Write `report` into `output_dir`, replacing an earlier report of the same version
pub async fn write_report(report: &Report, output_dir: &Path, unity_version: &str) -> AuditResult<PathBuf> {
    fs::create_dir_all(output_dir)
        .await
        .with_io_context(&format!("Failed to create output directory {}", output_dir.display()))?;

    let file_path = output_dir.join(report_file_name(report.variant, unity_version));
    if fs::try_exists(&file_path).await.unwrap_or(false) {
        fs::remove_file(&file_path)
            .await
            .with_io_context(&format!("Failed to delete old report {}", file_path.display()))?;
    }

    fs::write(&file_path, report.text.as_bytes())
        .await
        .with_io_context(&format!("Failed to write report {}", file_path.display()))?;

    let subject = match report.variant {
        Variant::Apis => "APIs",
        Variant::Types => "types",
    };
    info!("Save undocumented {} list to file {}.", subject, file_path.display());

    Ok(file_path)
}
