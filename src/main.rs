use clap::Parser;
use tracing::info;
use untl2zotero::{ConvertArgs, Converter};

/// Convert UNTL metadata into Zotero RDF
///
/// Pulls collection metadata in UNTL format from the UNT Digital Library,
/// converts each item to Zotero RDF and writes it to a file for import
/// into Zotero.
#[derive(Debug, Parser)]
#[command(name = "untl2zotero")]
#[command(about = "Convert UNTL metadata into Zotero RDF")]
struct Cli {
    #[command(flatten)]
    convert: ConvertArgs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env first, then .env.local can override
    let _ = dotenvy::from_filename_override(".env");
    let _ = dotenvy::from_filename_override(".env.local");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();
    let converter = Converter::new(args.convert.into_config()?)?;
    let summary = converter.run().await?;

    info!(
        "Converted {} of {} harvested record(s)",
        summary.written, summary.harvested
    );
    Ok(())
}
