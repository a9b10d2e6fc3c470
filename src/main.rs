use asset_press::config::{self, ConfigError, PipelineConfig};
use asset_press::imaging::RustBackend;
use asset_press::output;
use asset_press::pipeline::{self, CompressEvent};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};

/// Shared flags for commands that may change files.
#[derive(clap::Args, Clone)]
struct PassArgs {
    /// Report what would change without touching any file
    #[arg(long)]
    dry_run: bool,
}

/// Overrides for the compress pass.
#[derive(clap::Args, Clone)]
struct EncodeArgs {
    /// Longest allowed side in pixels (overrides compress.max_dimension)
    #[arg(long)]
    max_dimension: Option<u32>,
}

#[derive(Parser)]
#[command(name = "asset-press")]
#[command(about = "Deduplicate and recompress the image assets of a static site, in place")]
#[command(long_about = "\
Deduplicate and recompress the image assets of a static site, in place

Pass 1 (dedup) hashes every image under the portfolio root and deletes
byte-identical repeats; the first file in sorted order survives.

Pass 2 (compress) re-encodes every image under the target roots: EXIF
orientation is applied, anything larger than the bound is shrunk to fit,
and the result replaces the original only if it is at least 2% smaller.

Both passes are idempotent. Settings are read from asset-press.toml in the
project root; run 'asset-press gen-config' for a documented template.")]
#[command(version)]
struct Cli {
    /// Project root; the config file and relative paths resolve against it
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Log progress to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Remove duplicate images from the portfolio root
    Dedup(PassArgs),
    /// Recompress images under the target roots
    Compress {
        #[command(flatten)]
        pass: PassArgs,
        #[command(flatten)]
        encode: EncodeArgs,
        /// Compress these files or directories instead of the configured targets
        /// (relative paths resolve against --root)
        paths: Vec<PathBuf>,
    },
    /// Run both passes: dedup, then compress
    Run {
        #[command(flatten)]
        pass: PassArgs,
        #[command(flatten)]
        encode: EncodeArgs,
        /// Also write the run statistics to this file as JSON
        #[arg(long)]
        report: Option<PathBuf>,
    },
    /// Print a stock asset-press.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    asset_press::init_tracing(cli.verbose);
    let base = std::fs::canonicalize(&cli.root).unwrap_or_else(|_| cli.root.clone());

    match cli.command {
        Command::Dedup(pass) => {
            let config = config::load_config(&cli.root)?;
            init_thread_pool(&config.processing);
            let summary = pipeline::dedup_pass(
                &[config.portfolio_root(&cli.root)],
                &config.dedup_filter(),
                pass.dry_run,
            )?;
            output::print_dedup_summary(&summary, &base, pass.dry_run);
            print_dry_run_notice(pass.dry_run);
        }
        Command::Compress {
            pass,
            encode,
            paths,
        } => {
            let config = load_with_overrides(&cli.root, &encode)?;
            init_thread_pool(&config.processing);
            let roots = config.compress_roots(&cli.root, &paths);
            let summary = with_event_printer(&base, |events| {
                pipeline::compress_pass(
                    &RustBackend::new(),
                    &roots,
                    &config.compress_filter(),
                    &config.compression_policy(),
                    pass.dry_run,
                    Some(events),
                )
            })?;
            output::print_compress_summary(&summary);
            print_dry_run_notice(pass.dry_run);
        }
        Command::Run {
            pass,
            encode,
            report,
        } => {
            let config = load_with_overrides(&cli.root, &encode)?;
            init_thread_pool(&config.processing);
            let run_report = with_event_printer(&base, |events| {
                pipeline::run(
                    &RustBackend::new(),
                    &config,
                    &cli.root,
                    pass.dry_run,
                    Some(events),
                )
            })?;
            output::print_dedup_summary(&run_report.dedup, &base, pass.dry_run);
            output::print_compress_summary(&run_report.compress);
            if let Some(path) = report {
                run_report.write_json(&path)?;
                println!("Report written to {}", path.display());
            }
            print_dry_run_notice(pass.dry_run);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Load the config and apply per-run CLI overrides, re-validating after.
fn load_with_overrides(root: &Path, encode: &EncodeArgs) -> Result<PipelineConfig, ConfigError> {
    let mut config = config::load_config(root)?;
    if let Some(max) = encode.max_dimension {
        config.compress.max_dimension = max;
    }
    config.validate()?;
    Ok(config)
}

/// Run `work` while a printer thread writes its compress events to stdout.
///
/// Returns once `work` has finished and every event has been printed.
fn with_event_printer<T>(base: &Path, work: impl FnOnce(Sender<CompressEvent>) -> T) -> T {
    let (tx, rx) = mpsc::channel();
    let base = base.to_path_buf();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_compress_event(&event, &base) {
                println!("{}", line);
            }
        }
    });
    let result = work(tx);
    if printer.join().is_err() {
        tracing::error!("progress printer panicked");
    }
    result
}

fn print_dry_run_notice(dry_run: bool) {
    if dry_run {
        println!("Dry run: no files were changed.");
    }
}

/// Initialize the rayon thread pool based on processing config.
///
/// Never more threads than CPU cores: the config can only lower the count.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
