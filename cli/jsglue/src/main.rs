//! jsglue CLI: checks layout mirrors and generates the C++ side of the engine glue.

mod commands;
mod logging;
mod manifest;

use std::process;

use clap::{Parser, Subcommand, ValueEnum};

use manifest::Project;

#[derive(Parser)]
#[command(name = "jsglue", version, about = "JavaScript engine binding glue")]
struct Cli {
    /// More log output (repeatable)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Inspect and check layout mirrors
    Mirrors {
        #[command(subcommand)]
        action: MirrorsAction,
    },
    /// Inspect the re-exported symbols
    Exports {
        #[command(subcommand)]
        action: ExportsAction,
    },
    /// Generate C++ sources
    Generate {
        #[command(subcommand)]
        action: GenerateAction,
    },
    /// Binding-generator configuration
    Bindings {
        #[command(subcommand)]
        action: BindingsAction,
    },
}

#[derive(Subcommand)]
enum MirrorsAction {
    /// List mirrors and their fields per build variant
    List,
    /// Compare computed layouts with the recorded expectations
    Check {
        /// Word size to check (default: 32 and 64)
        #[arg(long, value_parser = parse_word_bits)]
        word_bits: Option<u32>,
        /// Report format
        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        format: OutputFormat,
    },
    /// Print replacement classes or Rust mirror structs
    Emit {
        #[arg(long, value_enum)]
        lang: Lang,
        /// Build variant (for --lang rust)
        #[arg(long)]
        variant: Option<String>,
        /// Word size (for --lang rust, default: host)
        #[arg(long, value_parser = parse_word_bits)]
        word_bits: Option<u32>,
        /// Mirror name or the C++ type it replaces (default: all)
        #[arg(long)]
        mirror: Option<String>,
    },
    /// Print field-list fingerprints and whether they match the pinned values
    Fingerprint,
}

#[derive(Subcommand)]
enum ExportsAction {
    /// List exports with their forwarding kind and preconditions
    List,
    /// Validate the export manifest
    Check,
}

#[derive(Subcommand)]
enum GenerateAction {
    /// The binding generator's input header
    Header {
        #[arg(long)]
        output: Option<String>,
    },
    /// The C++ glue translation unit
    Glue {
        #[arg(long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
enum BindingsAction {
    /// Print clang arguments for a build variant, one per line
    Args {
        #[arg(long)]
        variant: Option<String>,
        /// Include MSVC compatibility flags
        #[arg(long)]
        msvc: bool,
    },
    /// Print the full bindgen command line, one argument per line
    Command {
        #[arg(long)]
        variant: Option<String>,
        /// Include MSVC compatibility flags
        #[arg(long)]
        msvc: bool,
    },
    /// Validate the binding configuration against mirrors and exports
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Lang {
    Cpp,
    Rust,
}

fn parse_word_bits(s: &str) -> Result<u32, String> {
    match s {
        "32" => Ok(32),
        "64" => Ok(64),
        _ => Err(format!("word size must be 32 or 64, got '{s}'")),
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let result = run(cli);
    if let Err(e) = result {
        eprintln!("error: {e:#}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let project = Project::discover(&cwd)?;
    match &project.manifest.project {
        Some(p) => tracing::debug!(name = %p.name, dir = %project.dir.display(), "project resolved"),
        None => tracing::debug!(dir = %project.dir.display(), "no jsglue.toml, using built-in sources"),
    }

    match cli.command {
        Commands::Mirrors { action } => match action {
            MirrorsAction::List => commands::mirrors::list(&project),
            MirrorsAction::Check { word_bits, format } => commands::mirrors::check(&project, word_bits, format),
            MirrorsAction::Emit {
                lang,
                variant,
                word_bits,
                mirror,
            } => commands::mirrors::emit(&project, lang, variant.as_deref(), word_bits, mirror.as_deref()),
            MirrorsAction::Fingerprint => commands::mirrors::fingerprints(&project),
        },

        Commands::Exports { action } => match action {
            ExportsAction::List => commands::exports::list(&project),
            ExportsAction::Check => commands::exports::check(&project),
        },

        Commands::Generate { action } => match action {
            GenerateAction::Header { output } => commands::generate::header(&project, output.as_deref()),
            GenerateAction::Glue { output } => commands::generate::glue(&project, output.as_deref()),
        },

        Commands::Bindings { action } => match action {
            BindingsAction::Args { variant, msvc } => commands::bindings::args(&project, variant.as_deref(), msvc),
            BindingsAction::Command { variant, msvc } => {
                commands::bindings::command(&project, variant.as_deref(), msvc)
            }
            BindingsAction::Check => commands::bindings::check(&project),
        },
    }
}

#[cfg(test)]
mod integration_tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["jsglue", "mirrors", "check", "--word-bits", "32", "-vv"]).unwrap();
        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Mirrors {
                action: MirrorsAction::Check { word_bits, format },
            } => {
                assert_eq!(word_bits, Some(32));
                assert_eq!(format, OutputFormat::Human);
            }
            _ => panic!("parsed the wrong command"),
        }
    }

    #[test]
    fn parses_bindings_command() {
        let cli = Cli::try_parse_from(["jsglue", "bindings", "command", "--variant", "debug", "--msvc"]).unwrap();
        match cli.command {
            Commands::Bindings {
                action: BindingsAction::Command { variant, msvc },
            } => {
                assert_eq!(variant.as_deref(), Some("debug"));
                assert!(msvc);
            }
            _ => panic!("parsed the wrong command"),
        }
    }

    #[test]
    fn rejects_odd_word_sizes() {
        assert!(Cli::try_parse_from(["jsglue", "mirrors", "check", "--word-bits", "16"]).is_err());
        assert!(Cli::try_parse_from(["jsglue", "mirrors", "emit", "--lang", "java"]).is_err());
    }

    /// Full workflow in a fresh project: check → generate header and glue → validate bindings.
    #[test]
    fn check_generate_workflow() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(manifest::MANIFEST_FILE),
            "[project]\nname = \"workflow\"\n\n[generate]\nvariant = \"debug\"\n",
        )
        .unwrap();
        let nested = dir.path().join("src");
        std::fs::create_dir_all(&nested).unwrap();
        let project = Project::discover(&nested).unwrap();

        commands::mirrors::check(&project, None, OutputFormat::Json).unwrap();
        commands::exports::check(&project).unwrap();
        commands::generate::header(&project, Some("etc/wrapper.hpp")).unwrap();
        commands::generate::glue(&project, Some("etc/jsglue.cpp")).unwrap();
        commands::bindings::check(&project).unwrap();

        assert!(dir.path().join("etc/wrapper.hpp").is_file());
        assert!(dir.path().join("etc/jsglue.cpp").is_file());
    }

    #[test]
    fn drifted_mirror_fails_check() {
        let dir = tempfile::tempdir().unwrap();
        let mirrors = jsglue_layout::BUILTIN_MIRRORS.replacen("size = 12", "size = 16", 1);
        assert_ne!(mirrors, jsglue_layout::BUILTIN_MIRRORS);
        std::fs::write(dir.path().join("mirrors.toml"), mirrors).unwrap();
        std::fs::write(
            dir.path().join(manifest::MANIFEST_FILE),
            "[sources]\nmirrors = \"mirrors.toml\"\n",
        )
        .unwrap();
        let project = Project::discover(dir.path()).unwrap();

        assert!(commands::mirrors::check(&project, Some(64), OutputFormat::Human).is_ok());
        let err = commands::mirrors::check(&project, Some(32), OutputFormat::Human).unwrap_err();
        assert!(err.to_string().contains("1 mirror layout(s)"));
    }
}
