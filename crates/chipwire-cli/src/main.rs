//! `chipwire` — CLI principal de chipwire
//!
//! Ici on fait uniquement : parsing d'arguments, initialisation (logger,
//! couleur), et délégation à `chipwire_cli` (lib).

#![forbid(unsafe_code)]

use std::{path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

use chipwire_cli as cli;

// ──────────────────────────── CLI (clap) ────────────────────────────

#[derive(Debug, Parser)]
#[command(name = "chipwire", version, about = "chipwire — exécuter des puces IN/OUT et évaluer leur câblage", long_about = None)]
struct Opt {
    /// Augmente la verbosité (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Mode silencieux (casse la verbosité)
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,

    /// Force la couleur (si la feature `color` est compilée)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,

    /// Sous-commandes
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Exécuter un programme de puce isolé
    Run {
        /// Programme (ou - pour stdin)
        program: Option<PathBuf>,
        /// Programme inline (exclusif avec PROGRAM)
        #[arg(long)]
        code: Option<String>,
        /// Valeur d'un port d'entrée (répétable, dans l'ordre des ports)
        #[arg(short = 'i', long = "input")]
        inputs: Vec<String>,
        /// Nombre de ports
        #[arg(long, default_value_t = 3)]
        ports: usize,
        /// Sortie JSON
        #[arg(long)]
        json: bool,
        /// Afficher le temps d'exécution
        #[arg(long)]
        time: bool,
    },

    /// Évaluer un snapshot JSON de workspace
    Eval {
        /// Snapshot (ou - pour stdin)
        snapshot: Option<PathBuf>,
        /// Sortie JSON
        #[arg(long)]
        json: bool,
        /// Refuser les références en avant, auto-références et cycles
        #[arg(long)]
        strict: bool,
        /// Afficher le temps d'exécution
        #[arg(long)]
        time: bool,
    },

    /// Linter un programme de puce
    Check {
        /// Programme (ou - pour stdin)
        program: Option<PathBuf>,
        /// Programme inline (exclusif avec PROGRAM)
        #[arg(long)]
        code: Option<String>,
        /// Nombre de ports
        #[arg(long, default_value_t = 3)]
        ports: usize,
        /// Afficher le listing assemblé
        #[arg(long)]
        listing: bool,
    },

    /// Lister les connexions et problèmes de câblage d'un snapshot
    Wiring {
        /// Snapshot (ou - pour stdin)
        snapshot: Option<PathBuf>,
        /// Sortie JSON
        #[arg(long)]
        json: bool,
    },
}

fn format_from(json: bool) -> cli::Format {
    if json {
        cli::Format::Json
    } else {
        cli::Format::Table
    }
}

// ──────────────────────────── Initialisation ────────────────────────────

fn init_telemetry(verbose: u8, quiet: bool) {
    #[cfg(feature = "trace")]
    {
        let level = if quiet {
            "error"
        } else {
            match verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        };
        std::env::set_var(
            "RUST_LOG",
            std::env::var("RUST_LOG").unwrap_or_else(|_| level.to_string()),
        );
        cli::init_logger();
    }
    #[cfg(not(feature = "trace"))]
    let _ = (verbose, quiet);
}

fn init_color(choice: ColorChoice) {
    // `owo-colors` détecte le TTY ; on ne force que sur demande.
    match choice {
        ColorChoice::Auto => {},
        ColorChoice::Always => {
            std::env::set_var("CLICOLOR_FORCE", "1");
            std::env::remove_var("NO_COLOR");
        },
        ColorChoice::Never => {
            std::env::set_var("NO_COLOR", "1");
            std::env::remove_var("CLICOLOR_FORCE");
        },
    }
}

// ──────────────────────────── main ────────────────────────────

fn main() -> ExitCode {
    match real_main() {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(1)
        },
    }
}

fn real_main() -> Result<u8> {
    let opt = Opt::parse();

    init_color(opt.color);
    init_telemetry(opt.verbose, opt.quiet);

    use cli::{CheckTask, Command as C, EvalTask, RunTask, WiringTask};

    let command = match opt.cmd {
        Command::Run { program, code, inputs, ports, json, time } => C::Run(RunTask {
            program: cli::program_input(program, code)?,
            inputs,
            ports,
            format: format_from(json),
            time,
        }),
        Command::Eval { snapshot, json, strict, time } => C::Eval(EvalTask {
            snapshot: cli::input_from_path(snapshot),
            format: format_from(json),
            strict,
            time,
        }),
        Command::Check { program, code, ports, listing } => {
            C::Check(CheckTask { program: cli::program_input(program, code)?, ports, listing })
        },
        Command::Wiring { snapshot, json } => C::Wiring(WiringTask {
            snapshot: cli::input_from_path(snapshot),
            format: format_from(json),
        }),
    };

    let code = cli::execute(command).context("échec d'exécution de la commande")?;
    Ok(u8::try_from(code).unwrap_or(1))
}
