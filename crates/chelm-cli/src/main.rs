mod commands;

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::values::OutputFormat;
use commands::{EXIT_CASE_NOT_FOUND, EXIT_FAILURE, EXIT_META_ERROR};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "chelm",
    version,
    about = "Deterministic test values for charts that reference container images"
)]
struct Cli {
    /// Path to a config file (default: ~/.config/chelm/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Generate merged test values for one test case.
    Values {
        /// Path to chart metadata (TOML or JSON).
        #[arg(default_value = "cg.toml")]
        meta: PathBuf,
        /// Name of the test case.
        #[arg(short, long)]
        case: String,
        /// Test registry host (overrides config and CHELM_TEST_REGISTRY).
        #[arg(long)]
        registry: Option<String>,
        /// Extra values file (TOML or JSON), applied in order above the case values.
        #[arg(short = 'f', long = "values")]
        values_files: Vec<PathBuf>,
        /// Set a single value, e.g. `api.replicas=3`. Applied after --values.
        #[arg(long = "set")]
        set: Vec<String>,
        /// Fail when a map and a non-map meet at the same key.
        #[arg(long, default_value_t = false)]
        strict: bool,
        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// List the test cases declared in chart metadata.
    Cases {
        /// Path to chart metadata (TOML or JSON).
        #[arg(default_value = "cg.toml")]
        meta: PathBuf,
    },
    /// Print the deterministic test digest for an image identifier.
    Digest {
        /// Image identifier.
        image_id: String,
    },
    /// Resolve a single templated reference string for an image.
    Resolve {
        /// Image identifier.
        image_id: String,
        /// Template, e.g. '${registry_repo}:${tag}'.
        template: String,
        /// Test registry host (overrides config and CHELM_TEST_REGISTRY).
        #[arg(long)]
        registry: Option<String>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("CHELM_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json;
    let config_path = cli.config.as_deref();

    let result = match cli.command {
        Commands::Values {
            meta,
            case,
            registry,
            values_files,
            set,
            strict,
            format,
        } => commands::values::run(
            config_path,
            &meta,
            &case,
            &commands::values::ValuesOptions {
                registry,
                values_files,
                set,
                strict,
                format: if json_output {
                    OutputFormat::Json
                } else {
                    format
                },
            },
        ),
        Commands::Cases { meta } => commands::cases::run(&meta, json_output),
        Commands::Digest { image_id } => commands::digest::run(&image_id, json_output),
        Commands::Resolve {
            image_id,
            template,
            registry,
        } => commands::resolve::run(
            config_path,
            &image_id,
            &template,
            registry.as_deref(),
            json_output,
        ),
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("test case '") {
                EXIT_CASE_NOT_FOUND
            } else if msg.starts_with("metadata error:")
                || msg.starts_with("failed to parse chart metadata")
                || msg.starts_with("failed to read chart metadata")
                || msg.starts_with("unsupported chart metadata format")
            {
                EXIT_META_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
