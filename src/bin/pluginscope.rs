use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use pluginscope_core::export::{format_size, to_json};
use pluginscope_core::{write_csv, CancelToken, PluginFormat, ScanConfig, ScanReport, Scanner};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pluginscope")]
#[command(about = "Inventory of installed audio plugins", long_about = None)]
struct Cli {
    /// Log scan progress at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan the plugin folders and list what was found
    Scan {
        /// Print records as JSON
        #[arg(long)]
        json: bool,
        /// Only list plugins of this format
        #[arg(short, long, value_enum)]
        format: Option<FormatArg>,
    },
    /// Scan and write the result as CSV
    Export {
        /// Output file (".csv" is appended when missing)
        file: PathBuf,
    },
    /// Show the folders a scan would visit
    Roots,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Au,
    Vst,
    Aax,
}

impl From<FormatArg> for PluginFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Au => PluginFormat::AudioUnit,
            FormatArg::Vst => PluginFormat::Vst,
            FormatArg::Aax => PluginFormat::Aax,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging; stdout is reserved for results
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ScanConfig::load().context("Failed to load configuration")?;
    let scanner = Scanner::from_config(&config);

    match cli.command {
        Commands::Scan { json, format } => {
            let report = run_scan(&scanner)?;
            let records: Vec<_> = match format {
                Some(f) => report.by_format(f.into()).cloned().collect(),
                None => report.records.clone(),
            };
            if json {
                println!("{}", to_json(&records)?);
            } else {
                for record in &records {
                    println!(
                        "{:<32} {:<24} {:<12} {:<10} {:>9}  {}",
                        record.name(),
                        record.manufacturer(),
                        record.version(),
                        record.format().display_name(),
                        format_size(record.size_bytes()),
                        record.path().display()
                    );
                }
                print_summary(&report);
            }
        }
        Commands::Export { file } => {
            let report = run_scan(&scanner)?;
            let written = write_csv(&report.records, &file)
                .with_context(|| format!("Failed to export to {}", file.display()))?;
            println!("Exported {} plugins to {}", report.len(), written.display());
        }
        Commands::Roots => {
            for root in scanner.catalog().roots() {
                let state = if root.path.is_dir() { "" } else { "  (missing)" };
                println!("{:<6} {}{}", root.family.label(), root.path.display(), state);
            }
        }
    }

    Ok(())
}

fn run_scan(scanner: &Scanner) -> anyhow::Result<ScanReport> {
    scanner
        .scan(&CancelToken::new())
        .context("Plugin scan failed")
}

fn print_summary(report: &ScanReport) {
    let counts: Vec<String> = PluginFormat::ALL
        .iter()
        .map(|f| format!("{}: {}", f.display_name(), report.count(*f)))
        .collect();
    println!(
        "\n{} plugins ({}) from {} folders in {} ms",
        report.len(),
        counts.join(", "),
        report.roots_scanned,
        report.elapsed.as_millis()
    );
}
