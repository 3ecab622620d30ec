/*!
# Platform Compatibility Analyzer CLI

Command-line interface of the platform-compatibility guard analyzer.
Compilations are read as JSON (symbol table plus operation trees).
*/

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info};
use walkdir::WalkDir;

use platform_compat_analyzer::cli_common::{
    self, ConfigArgs, OutputArgs, OutputFormat, OutputWriter,
};
use platform_compat_analyzer::{
    AnalyzerConfig, Compilation, PlatformCompatibilityAnalyzer, BUILTIN_PLATFORMS,
};

#[derive(Parser)]
#[command(
    name = "platform-compat",
    version = env!("CARGO_PKG_VERSION"),
    about = "Checks that calls to platform-specific APIs are guarded by platform checks"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a compilation file or every *.json compilation under a directory
    Analyze {
        /// Compilation JSON file or directory
        #[arg(short, long)]
        path: PathBuf,

        #[command(flatten)]
        config: ConfigArgs,

        #[command(flatten)]
        output: OutputArgs,

        /// Number of parallel workers
        #[arg(short, long)]
        threads: Option<usize>,
    },

    /// Manage the analyzer configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// List known platform names and their version arity
    Platforms {
        #[command(flatten)]
        config: ConfigArgs,

        /// Output format (text, json)
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write the default configuration template
    Generate {
        /// Destination file
        #[arg(short, long, default_value = "platform-compat.toml")]
        output: PathBuf,
    },

    /// Check a configuration file and print its warnings
    Validate {
        /// Configuration file to check
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let quiet = matches!(&cli.command, Commands::Analyze { output, .. } if output.quiet);
    if quiet && !cli.verbose {
        cli_common::init_minimal_logging()?;
    } else {
        cli_common::init_logging(cli.verbose)?;
    }

    match cli.command {
        Commands::Analyze { path, config, output, threads } => {
            let has_errors = analyze_command(&path, config.config.as_deref(), &output, threads)?;
            if has_errors {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Config { command } => match command {
            ConfigCommands::Generate { output } => generate_config_command(&output),
            ConfigCommands::Validate { config } => validate_config_command(&config),
        },
        Commands::Platforms { config, format } => platforms_command(config.config.as_deref(), format),
    }
}

fn load_config(path: Option<&Path>) -> Result<AnalyzerConfig> {
    let Some(path) = path else {
        return Ok(AnalyzerConfig::default());
    };
    let config = AnalyzerConfig::load_from_file(path)?;
    for warning in config.validate() {
        cli_common::print_warning(&warning);
    }
    Ok(config)
}

/// One file, or every `*.json` under a directory in path order.
fn collect_compilation_files(path: &Path) -> Result<Vec<PathBuf>> {
    cli_common::validate_path(path, "Input path")?;
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to walk directory {}", path.display()))?;
        let is_json = entry.path().extension().and_then(|e| e.to_str()) == Some("json");
        if entry.file_type().is_file() && is_json {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

fn analyze_command(
    path: &Path,
    config_path: Option<&Path>,
    output: &OutputArgs,
    threads: Option<usize>,
) -> Result<bool> {
    let start = Instant::now();
    let mut config = load_config(config_path)?;
    if threads.is_some() {
        config.threads = threads;
    }

    let files = collect_compilation_files(path)?;
    if files.is_empty() {
        cli_common::print_warning(&format!("No compilation files found in {}", path.display()));
        return Ok(false);
    }
    info!("Analyzing {} compilation file(s)", files.len());

    let mut compilations = Vec::with_capacity(files.len());
    for file in &files {
        debug!("Loading {}", file.display());
        let compilation = Compilation::load(file)
            .with_context(|| format!("Failed to load compilation from {}", file.display()))?;
        compilations.push(compilation);
    }

    let analyzer = PlatformCompatibilityAnalyzer::new(config);
    let report = analyzer.analyze_all(&compilations);

    let mut writer = match &output.output {
        Some(file) => OutputWriter::file(file, output.format)?,
        None => OutputWriter::stdout(output.format),
    };
    writer.write_report(&report)?;
    writer.flush()?;

    if !output.quiet {
        cli_common::print_info(&format!(
            "Analysis finished in {}",
            cli_common::format_duration(start.elapsed())
        ));
    }
    Ok(report.has_errors())
}

fn generate_config_command(output: &Path) -> Result<()> {
    std::fs::write(output, AnalyzerConfig::generate_default_config())
        .with_context(|| format!("Failed to write configuration to {}", output.display()))?;
    cli_common::print_success(&format!("Configuration template written to {}", output.display()));
    Ok(())
}

fn validate_config_command(path: &Path) -> Result<()> {
    let config = AnalyzerConfig::load_from_file(path)?;
    let warnings = config.validate();
    if warnings.is_empty() {
        cli_common::print_success(&format!("{} is valid", path.display()));
        return Ok(());
    }
    for warning in &warnings {
        cli_common::print_warning(warning);
    }
    anyhow::bail!("{} has {} problem(s)", path.display(), warnings.len())
}

fn platforms_command(config_path: Option<&Path>, format: OutputFormat) -> Result<()> {
    let config = load_config(config_path)?;
    let vocabulary = config.vocabulary();

    let mut rows: Vec<Vec<String>> = BUILTIN_PLATFORMS
        .iter()
        .map(|p| {
            let versions = match p.max_version_parts {
                0 => "none".to_string(),
                n => format!("up to {}", n),
            };
            vec![p.name.to_string(), format!("Is{}", p.guard_name), versions, "built-in".to_string()]
        })
        .collect();
    rows.extend(
        vocabulary
            .custom_platforms()
            .map(|name| vec![name.to_string(), "-".to_string(), "any".to_string(), "custom".to_string()]),
    );

    let mut writer = OutputWriter::stdout(format);
    writer.write_table(&["Platform", "Guard", "Version parts", "Source"], rows)?;
    writer.flush()
}
