//! CLI entry point for the tmpl template pre-compiler.
//!
//! This binary discovers templates under an application root, translates
//! them, and writes a JSON catalog plus one generated Rust source file.
//!
//! # Usage
//!
//! ```bash
//! tmplc [OPTIONS] <COMMAND>
//!
//! # Build the catalog into target/tmpl
//! tmplc build --root ./app --parallel
//!
//! # Print the catalog without writing anything
//! tmplc list --format json
//!
//! # Check a previous build against the tree
//! tmplc check --catalog target/tmpl/catalog.json
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{eyre, WrapErr};
use tmpl_compiler::{
    check_staleness, emit, BuildOutput, PhysicalFileTree, StalenessReport, StatsSnapshot,
    TemplateCatalogBuilder, TemplateWalker,
};
use tmpl_core::{Config, OutputConfig, TemplateCatalog};
use tmpl_parser::MarkupParser;
use tracing::{debug, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Configuration file picked up from the working directory when
/// `--config` is not given.
const DEFAULT_CONFIG_FILE: &str = "tmpl.json";

/// Number of hex characters shown for content hashes in tables.
const SHORT_HASH_LEN: usize = 12;

// =============================================================================
// CLI ARGUMENT TYPES
// =============================================================================

/// Template pre-compiler.
///
/// Walks a tree of template files, translates each into a generated Rust
/// unit and records a catalog of compiled templates.
#[derive(Parser)]
#[command(name = "tmplc", version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Command to execute.
    #[command(subcommand)]
    command: Commands,

    /// JSON configuration file.
    ///
    /// Defaults to `./tmpl.json` when that file exists.
    #[arg(short, long, global = true, env = "TMPL_CONFIG")]
    config: Option<Utf8PathBuf>,

    /// Application root that templates are discovered under.
    #[arg(short, long, global = true, env = "TMPL_ROOT")]
    root: Option<Utf8PathBuf>,

    /// Template file extension (leading dot optional).
    #[arg(short, long, global = true, env = "TMPL_EXT")]
    ext: Option<String>,

    /// Enable verbose logging (debug level).
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    no_color: bool,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Build the catalog and write it to the output directory.
    Build {
        /// Translate templates on a thread pool.
        #[arg(long, env = "TMPL_PARALLEL")]
        parallel: bool,

        /// Maximum number of worker threads in parallel mode.
        #[arg(short, long, env = "TMPL_JOBS")]
        jobs: Option<usize>,

        /// Directory the catalog and generated source are written to.
        #[arg(short, long, env = "TMPL_OUT_DIR")]
        out_dir: Option<Utf8PathBuf>,

        /// Fail when any template reports an error.
        #[arg(long)]
        deny_errors: bool,
    },

    /// Build the catalog and print it.
    List {
        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Compare a previously written catalog against the tree.
    Check {
        /// Catalog manifest to check.
        ///
        /// Defaults to the configured output catalog path.
        #[arg(long)]
        catalog: Option<Utf8PathBuf>,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
}

/// Output format for listings and reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Aligned plain-text table.
    Table,
    /// Pretty-printed JSON.
    Json,
}

// =============================================================================
// INITIALIZATION FUNCTIONS
// =============================================================================

/// Initializes the tracing subscriber for logging.
///
/// Respects the `RUST_LOG` environment variable if set. Otherwise, uses
/// `debug` level if `--verbose` is set, or `info` level by default.
fn init_tracing(verbose: bool, no_color: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = if verbose { "debug" } else { "info" };
        EnvFilter::new(level)
    });

    // Check if colors should be disabled (flag or NO_COLOR env var)
    let use_ansi = !no_color && std::env::var("NO_COLOR").is_err();

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_ansi(use_ansi))
        .with(filter)
        .init();
}

/// Loads the configuration file, if any, and applies global flags.
///
/// # Errors
///
/// Returns an error if the configuration file cannot be read or parsed, or
/// if the resulting build options are invalid.
fn load_config(cli: &Cli) -> color_eyre::Result<Config> {
    let path = cli.config.clone().or_else(|| {
        let fallback = Utf8PathBuf::from(DEFAULT_CONFIG_FILE);
        fallback.is_file().then_some(fallback)
    });

    let mut config = match path {
        Some(path) => {
            debug!(path = %path, "Loading configuration");
            Config::from_file(&path).wrap_err_with(|| format!("Failed to load {path}"))?
        }
        None => Config::default(),
    };

    apply_global_overrides(&mut config, cli);
    config.build.validate()?;

    Ok(config)
}

fn apply_global_overrides(config: &mut Config, cli: &Cli) {
    if let Some(root) = &cli.root {
        config.build.root_path.clone_from(root);
    }
    if let Some(ext) = &cli.ext {
        config.build.file_extension.clone_from(ext);
    }
}

/// Creates the physical tree and a builder from the configuration.
///
/// # Errors
///
/// Returns an error if the root directory does not exist or the ignore
/// rules cannot be compiled.
fn create_builder(
    config: &Config,
) -> color_eyre::Result<(PhysicalFileTree, TemplateCatalogBuilder)> {
    let tree = PhysicalFileTree::from_config(&config.build)?;
    let builder = TemplateCatalogBuilder::from_config(&config.build, MarkupParser::new())?;
    Ok((tree, builder))
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

/// Runs a build and writes its outputs.
///
/// # Errors
///
/// Returns an error if the build fails, an output cannot be written, or
/// `deny_errors` is set and any template reported an error.
fn run_build(config: &Config, deny_errors: bool) -> color_eyre::Result<()> {
    info!(root = %config.build.root_path, parallel = config.build.parallel, "Starting build");

    let (tree, builder) = create_builder(config)?;
    let output = builder.build(&tree)?;

    print_diagnostics(&output);
    write_outputs(&output, &config.output)?;
    print_stats_summary(&output.stats);

    let errors = output.error_count();
    if deny_errors && errors > 0 {
        return Err(eyre!("{errors} template error(s) reported"));
    }

    Ok(())
}

/// Builds the catalog and prints it without writing outputs.
///
/// # Errors
///
/// Returns an error if the build fails.
fn run_list(config: &Config, format: OutputFormat) -> color_eyre::Result<()> {
    info!(root = %config.build.root_path, "Listing templates");

    let (tree, builder) = create_builder(config)?;
    let output = builder.build(&tree)?;

    let content = match format {
        OutputFormat::Table => format_catalog_table(&output.catalog),
        OutputFormat::Json => output.catalog.to_json_pretty()?,
    };

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write!(handle, "{content}")?;
    if format == OutputFormat::Json {
        writeln!(handle)?;
    }

    Ok(())
}

/// Compares a written catalog against the current tree.
///
/// # Errors
///
/// Returns an error if the catalog cannot be read, or if any template is
/// stale.
fn run_check(
    config: &Config,
    catalog_path: Option<&Utf8Path>,
    format: OutputFormat,
) -> color_eyre::Result<()> {
    let catalog_path = catalog_path.map_or_else(|| config.output.catalog_path(), Utf8Path::to_owned);
    info!(catalog = %catalog_path, root = %config.build.root_path, "Checking catalog");

    let catalog = read_catalog(&catalog_path)?;
    let tree = PhysicalFileTree::from_config(&config.build)?;
    let walker = TemplateWalker::new(&config.build.file_extension);
    let report = check_staleness(&catalog, &tree, &walker);

    let content = match format {
        OutputFormat::Table => format_staleness_table(&report),
        OutputFormat::Json => serde_json::to_string_pretty(&report)? + "\n",
    };

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    write!(handle, "{content}")?;

    let stale = report.stale().count();
    if stale > 0 {
        return Err(eyre!("{stale} template(s) out of date with {catalog_path}"));
    }

    Ok(())
}

fn read_catalog(path: &Utf8Path) -> color_eyre::Result<TemplateCatalog> {
    let json = fs::read_to_string(path).wrap_err_with(|| format!("Failed to read {path}"))?;
    TemplateCatalog::from_json(&json).wrap_err_with(|| format!("Invalid catalog {path}"))
}

/// Writes the catalog manifest and generated source.
///
/// # Errors
///
/// Returns an error if the output directory or a file cannot be written.
fn write_outputs(output: &BuildOutput, config: &OutputConfig) -> color_eyre::Result<()> {
    fs::create_dir_all(&config.out_dir)
        .wrap_err_with(|| format!("Failed to create {}", config.out_dir))?;

    let catalog_path = config.catalog_path();
    fs::write(&catalog_path, output.catalog.to_json_pretty()? + "\n")
        .wrap_err_with(|| format!("Failed to write {catalog_path}"))?;
    info!(path = %catalog_path, templates = output.catalog.len(), "Catalog written");

    let source_path = config.source_path();
    fs::write(&source_path, emit::render_source(&output.catalog, &output.context))
        .wrap_err_with(|| format!("Failed to write {source_path}"))?;
    info!(path = %source_path, units = output.context.len(), "Generated source written");

    Ok(())
}

// =============================================================================
// OUTPUT HELPERS
// =============================================================================

/// Prints diagnostics to stderr.
fn print_diagnostics(output: &BuildOutput) {
    if output.diagnostics.is_empty() {
        return;
    }

    let stderr = std::io::stderr();
    let mut handle = stderr.lock();
    for diagnostic in &output.diagnostics {
        let _ = writeln!(handle, "{diagnostic}");
    }
}

/// Prints a summary of build statistics.
fn print_stats_summary(stats: &StatsSnapshot) {
    let stdout = std::io::stdout();
    let mut handle = stdout.lock();

    let _ = writeln!(handle);
    let _ = writeln!(handle, "Build Summary");
    let _ = writeln!(handle, "=============");
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Templates discovered: {}", stats.discovered);
    let _ = writeln!(handle, "  Compiled:          {}", stats.compiled);
    let _ = writeln!(handle, "  Excluded:          {} (no type)", stats.excluded);
    let _ = writeln!(handle, "  Routed:            {}", stats.routed);
    let _ = writeln!(handle, "Diagnostics:          {}", stats.diagnostics);
    let _ = writeln!(handle);
    let _ = writeln!(handle, "Compiled: {:.1}%", stats.compiled_percent());
}

/// Renders the catalog as an aligned table.
fn format_catalog_table(catalog: &TemplateCatalog) -> String {
    use std::fmt::Write;

    let rows: Vec<[String; 4]> = catalog
        .iter()
        .map(|descriptor| {
            let hash = descriptor.content_hash.to_hex();
            [
                descriptor.relative_path.clone(),
                descriptor.full_type_name.clone(),
                descriptor.route().unwrap_or("-").to_owned(),
                hash.get(..SHORT_HASH_LEN).unwrap_or(hash.as_str()).to_owned(),
            ]
        })
        .collect();

    let header = ["PATH", "TYPE", "ROUTE", "HASH"];
    let widths: Vec<usize> = (0..header.len())
        .map(|column| {
            rows.iter()
                .map(|row| row[column].len())
                .chain([header[column].len()])
                .max()
                .unwrap_or(0)
        })
        .collect();

    let mut output = String::new();
    for row in std::iter::once(header.map(str::to_owned)).chain(rows) {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| format!("{cell:<width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        let _ = writeln!(output, "{}", line.trim_end());
    }
    let _ = writeln!(output, "\n{} template(s)", catalog.len());

    output
}

/// Renders a staleness report, listing only templates that need attention.
fn format_staleness_table(report: &StalenessReport) -> String {
    use std::fmt::Write;

    let mut output = String::new();
    for entry in report.stale() {
        let _ = writeln!(output, "{:<10}  {}", entry.status.label(), entry.relative_path);
    }

    let stale = report.stale().count();
    if stale == 0 {
        let _ = writeln!(output, "Catalog is up to date ({} template(s))", report.entries.len());
    } else {
        let _ = writeln!(output, "\n{stale} of {} template(s) stale", report.entries.len());
    }

    output
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Application entry point.
fn main() -> color_eyre::Result<()> {
    // 1. Install color-eyre FIRST (before any potential panics)
    color_eyre::install()?;

    // 2. Parse CLI arguments
    let cli = Cli::parse();

    // 3. Initialize tracing (handles --no-color for log output)
    init_tracing(cli.verbose, cli.no_color);

    // 4. Load configuration and route to the command
    let mut config = load_config(&cli)?;
    match &cli.command {
        Commands::Build {
            parallel,
            jobs,
            out_dir,
            deny_errors,
        } => {
            config.build.parallel |= *parallel;
            if jobs.is_some() {
                config.build.max_parallel_jobs = *jobs;
            }
            if let Some(out_dir) = out_dir {
                config.output.out_dir.clone_from(out_dir);
            }
            config.build.validate()?;
            run_build(&config, *deny_errors)
        }
        Commands::List { format } => run_list(&config, *format),
        Commands::Check { catalog, format } => run_check(&config, catalog.as_deref(), *format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use tmpl_compiler::MemoryFileTree;

    fn utf8_dir(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap()
    }

    fn config_for(root: &Utf8Path, out_dir: &Utf8Path) -> Config {
        let mut config = Config::default();
        config.build.root_path = root.to_owned();
        config.output.out_dir = out_dir.to_owned();
        config
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_override_config() {
        let cli = Cli::try_parse_from([
            "tmplc", "--root", "site", "--ext", "html", "list", "--format", "json",
        ])
        .unwrap();

        let mut config = Config::default();
        apply_global_overrides(&mut config, &cli);
        assert_eq!(config.build.root_path, "site");
        assert_eq!(config.build.normalized_extension(), "html");
        assert!(matches!(
            cli.command,
            Commands::List {
                format: OutputFormat::Json
            }
        ));
    }

    #[test]
    fn test_build_flags_parse() {
        let cli = Cli::try_parse_from([
            "tmplc",
            "build",
            "--parallel",
            "--jobs",
            "2",
            "--out-dir",
            "out",
            "--deny-errors",
        ])
        .unwrap();

        let Commands::Build {
            parallel,
            jobs,
            out_dir,
            deny_errors,
        } = cli.command
        else {
            panic!("expected build command");
        };
        assert!(parallel);
        assert_eq!(jobs, Some(2));
        assert_eq!(out_dir.as_deref(), Some(Utf8Path::new("out")));
        assert!(deny_errors);
    }

    #[test]
    fn test_build_writes_outputs_and_check_passes() {
        let root = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let root_path = utf8_dir(&root);
        let out_path = utf8_dir(&out);

        fs::create_dir_all(root_path.join("views")).unwrap();
        fs::write(root_path.join("views/index.tmpl"), "@route index\n<h1>Hi</h1>").unwrap();
        fs::write(root_path.join("notes.txt"), "ignored").unwrap();

        let config = config_for(&root_path, &out_path);
        run_build(&config, true).unwrap();

        let catalog = read_catalog(&config.output.catalog_path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(
            catalog.get("views/index.tmpl").unwrap().route(),
            Some("index")
        );

        let source = fs::read_to_string(config.output.source_path()).unwrap();
        assert!(source.contains("template_catalog"));

        run_check(&config, None, OutputFormat::Table).unwrap();

        fs::write(root_path.join("views/index.tmpl"), "<h1>Changed</h1>").unwrap();
        assert!(run_check(&config, None, OutputFormat::Json).is_err());
    }

    #[test]
    fn test_deny_errors_fails_build() {
        let root = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let root_path = utf8_dir(&root);
        fs::write(root_path.join("broken.tmpl"), "<nav>@{ oops</nav>").unwrap();

        let config = config_for(&root_path, &utf8_dir(&out));
        assert!(run_build(&config, true).is_err());
        assert!(run_build(&config, false).is_ok());
    }

    #[test]
    fn test_catalog_table_lists_every_template() {
        let tree = MemoryFileTree::new()
            .with_file("views/home/index.tmpl", "@route index\n<h1>Hi</h1>")
            .with_file("views/about.tmpl", "<p>About</p>");
        let output = TemplateCatalogBuilder::default().build(&tree).unwrap();

        let table = format_catalog_table(&output.catalog);
        let lines: Vec<&str> = table.lines().collect();
        assert!(lines[0].starts_with("PATH"));
        assert!(table.contains("views/home/index.tmpl"));
        assert!(table.contains("index"));
        assert!(table.ends_with("2 template(s)\n"));
    }

    #[test]
    fn test_staleness_table_reports_up_to_date() {
        let report = StalenessReport::default();
        assert_eq!(
            format_staleness_table(&report),
            "Catalog is up to date (0 template(s))\n"
        );
    }
}
