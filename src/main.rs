use std::process;

use anyhow::Context;
use clap::Parser;
use log::{error, info};

use unity_doc_audit::audit::Auditor;
use unity_doc_audit::cli::Cli;
use unity_doc_audit::config::AuditConfig;
use unity_doc_audit::logging;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init_logger(cli.verbose) {
        eprintln!("Failed to initialize logger: {}", e);
        process::exit(1);
    }

    info!("Unity Doc Audit starting");

    if let Err(e) = run(&cli).await {
        error!("{:#}", e);
        process::exit(1);
    }
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    let file_config = match &cli.config {
        Some(path) => AuditConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))?,
        None => AuditConfig::default(),
    };
    let config = file_config.merge(cli.overrides());

    let auditor = Auditor::from_config(&config).context("Failed to resolve the Unity installation")?;
    info!(
        "Unity {} at {}",
        auditor.install().version,
        auditor.install().root.display()
    );

    let outcome = auditor.run().await.context("Audit failed")?;
    let summary = &outcome.summary;
    if summary.documentation_missing {
        println!("Local documentation not found, see {}", outcome.report_path.display());
    } else {
        println!(
            "{} assemblies, {} types, {} members undocumented, see {}",
            summary.assemblies,
            summary.types,
            summary.members,
            outcome.report_path.display()
        );
    }
    Ok(())
}
