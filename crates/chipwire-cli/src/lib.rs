//! chipwire-cli — bibliothèque interne du binaire `chipwire`
//!
//! But : fournir une API **propre et testable** pour le CLI sans mélanger la
//! logique d'E/S et le parsing d'arguments (laissé à `main.rs`).
//!
//! Points clés :
//! - `run`    : exécute un programme de puce isolé sur des entrées données (bouton « Run »)
//! - `eval`   : évalue un snapshot JSON de workspace (toutes les puces + sorties)
//! - `check`  : lint d'un programme (+ listing optionnel)
//! - `wiring` : liste des connexions et problèmes de câblage
//! - Traces (`feature = "trace"`) et couleurs (`feature = "color"`) optionnelles

#![deny(unused_must_use)]
#![forbid(unsafe_code)]

use std::{
    fs::File,
    io::{self, BufReader, BufWriter, Read, Write},
    path::PathBuf,
    time::Instant,
};

use anyhow::{anyhow, Context, Result};
use chipwire_core::{
    check_wiring, evaluate, evaluate_strict, listing, parse_program, CoreError, Evaluation,
    PortCount, Severity, Value, Workspace,
};

#[cfg(feature = "color")]
use owo_colors::OwoColorize;

// ───────────────────────────── Types publics ─────────────────────────────

/// Représente une commande haut-niveau (sans parsing CLI — réservé à main.rs).
#[derive(Clone, Debug)]
pub enum Command {
    /// Exécute une puce isolée.
    Run(RunTask),
    /// Évalue un workspace complet.
    Eval(EvalTask),
    /// Lint d'un programme.
    Check(CheckTask),
    /// Inspecte le câblage d'un workspace.
    Wiring(WiringTask),
}

#[derive(Clone, Debug)]
pub struct RunTask {
    pub program: Input,      // fichier, stdin ou --code
    pub inputs: Vec<String>, // valeurs des ports d'entrée, dans l'ordre
    pub ports: usize,        // N
    pub format: Format,
    pub time: bool,          // afficher le timing
}

impl Default for RunTask {
    fn default() -> Self {
        Self {
            program: Input::default(),
            inputs: Vec::new(),
            ports: PortCount::REFERENCE.get(),
            format: Format::default(),
            time: false,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct EvalTask {
    pub snapshot: Input,
    pub format: Format,
    pub strict: bool, // refuse les références en avant / cycles
    pub time: bool,
}

#[derive(Clone, Debug)]
pub struct CheckTask {
    pub program: Input,
    pub ports: usize,
    pub listing: bool,
}

impl Default for CheckTask {
    fn default() -> Self {
        Self { program: Input::default(), ports: PortCount::REFERENCE.get(), listing: false }
    }
}

#[derive(Clone, Debug, Default)]
pub struct WiringTask {
    pub snapshot: Input,
    pub format: Format,
}

/// Entrée texte : fichier, `-` (=stdin) ou texte inline.
#[derive(Clone, Debug, Default)]
pub enum Input {
    Path(PathBuf),
    #[default]
    Stdin,
    Text(String),
}

/// Format de sortie.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Table,
    Json,
}

// ───────────────────────────── Initialisation ─────────────────────────────

/// Initialise le logger selon la feature `trace`.
pub fn init_logger() {
    #[cfg(feature = "trace")]
    {
        let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
            .format_timestamp_secs()
            .try_init();
    }
}

// ───────────────────────────── Exécution ─────────────────────────────

/// Exécute une commande, sortie sur stdout. Retourne un code de sortie.
pub fn execute(cmd: Command) -> Result<i32> {
    let mut w = BufWriter::new(io::stdout().lock());
    let code = execute_to(cmd, &mut w)?;
    w.flush()?;
    Ok(code)
}

/// Exécute une commande en écrivant le résultat dans `out`.
pub fn execute_to(cmd: Command, out: &mut dyn Write) -> Result<i32> {
    match cmd {
        Command::Run(t) => run_entry(t, out),
        Command::Eval(t) => eval_entry(t, out),
        Command::Check(t) => check_entry(t, out),
        Command::Wiring(t) => wiring_entry(t, out),
    }
}

fn run_entry(task: RunTask, out: &mut dyn Write) -> Result<i32> {
    let ports = PortCount::new(task.ports).context("configuration des ports")?;
    let src = read_source(&task.program).context("lecture du programme")?;

    if task.inputs.len() > ports.get() {
        anyhow::bail!("{} entrées fournies pour {} ports", task.inputs.len(), ports);
    }
    let mut inputs = task.inputs;
    inputs.resize(ports.get(), Value::new());

    let start = Instant::now();
    let outputs = chipwire_core::execute(&src, &inputs, ports);
    let elapsed = start.elapsed();
    log::debug!("run: {inputs:?} -> {outputs:?}");

    match task.format {
        Format::Table => {
            for (port, value) in outputs.iter().enumerate() {
                writeln!(out, "OUT {} {value:?}", port + 1)?;
            }
        },
        Format::Json => {
            let payload = serde_json::json!({ "outputs": outputs });
            writeln!(out, "{}", serde_json::to_string_pretty(&payload)?)?;
        },
    }

    if task.time {
        status_info("TIME", &format!("run: {} µs", elapsed.as_micros()));
    }
    Ok(0)
}

fn eval_entry(task: EvalTask, out: &mut dyn Write) -> Result<i32> {
    let ws = load_snapshot(&task.snapshot)?;

    let start = Instant::now();
    let result = if task.strict {
        match evaluate_strict(&ws) {
            Ok(result) => result,
            Err(CoreError::Wiring(issues)) => {
                for issue in &issues {
                    status_warn("WIRING", &issue.to_string());
                }
                status_error("EVAL", "câblage refusé en mode --strict");
                return Ok(1);
            },
            Err(other) => return Err(other.into()),
        }
    } else {
        evaluate(&ws)
    };
    let elapsed = start.elapsed();

    match task.format {
        Format::Table => out.write_all(render_evaluation(&result).as_bytes())?,
        Format::Json => writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?,
    }

    if task.time {
        status_info("TIME", &format!("eval: {} µs", elapsed.as_micros()));
    }
    Ok(0)
}

fn check_entry(task: CheckTask, out: &mut dyn Write) -> Result<i32> {
    let ports = PortCount::new(task.ports).context("configuration des ports")?;
    let src = read_source(&task.program).context("lecture du programme")?;

    let diagnostics = chipwire_core::lint(&src, ports);
    for d in &diagnostics {
        writeln!(out, "{d}")?;
    }
    if task.listing {
        if !diagnostics.is_empty() {
            writeln!(out)?;
        }
        out.write_all(listing(&parse_program(&src, ports), "program").as_bytes())?;
    }

    let errors = diagnostics.iter().filter(|d| d.severity == Severity::Error).count();
    if errors > 0 {
        status_error("CHECK", &format!("{errors} ligne(s) ignorée(s)"));
        return Ok(1);
    }
    status_ok("CHECK", &format!("ok ({} avertissement(s))", diagnostics.len()));
    Ok(0)
}

fn wiring_entry(task: WiringTask, out: &mut dyn Write) -> Result<i32> {
    let ws = load_snapshot(&task.snapshot)?;
    let connections = ws.connections();
    let issues = check_wiring(&ws);

    match task.format {
        Format::Table => {
            for c in &connections {
                writeln!(out, "{c}")?;
            }
            for issue in &issues {
                writeln!(out, "! {issue}")?;
            }
        },
        Format::Json => {
            let payload = serde_json::json!({
                "connections": connections,
                "issues": issues.iter().map(ToString::to_string).collect::<Vec<_>>(),
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&payload)?)?;
        },
    }

    if issues.is_empty() {
        status_ok("WIRING", &format!("{} connexion(s)", connections.len()));
        Ok(0)
    } else {
        status_warn("WIRING", &format!("{} problème(s)", issues.len()));
        Ok(1)
    }
}

// ───────────────────────────── Rendu ─────────────────────────────

/// Tableau texte : une ligne par puce puis la ligne des sorties du workspace.
pub fn render_evaluation(result: &Evaluation) -> String {
    let mut rows: Vec<(String, &[Value])> = result
        .chips
        .iter()
        .map(|(id, values)| (format!("chip {id}"), values.as_slice()))
        .collect();
    rows.push(("outputs".to_owned(), result.outputs.as_slice()));

    let width = rows.iter().map(|(label, _)| label.len()).max().unwrap_or(0);
    let mut text = String::new();
    for (label, values) in rows {
        let cells: Vec<String> = values.iter().map(|v| format!("{v:?}")).collect();
        text.push_str(&format!("{label:<width$} | {}\n", cells.join(" | ")));
    }
    text
}

// ───────────────────────────── Utilitaires E/S ─────────────────────────────

fn load_snapshot(input: &Input) -> Result<Workspace> {
    let text = read_source(input).context("lecture du snapshot")?;
    let ws: Workspace = serde_json::from_str(&text).context("snapshot JSON invalide")?;
    log::debug!("snapshot: {} puce(s), {} ports", ws.chips.len(), ws.ports);
    Ok(ws)
}

fn read_source(input: &Input) -> Result<String> {
    match input {
        Input::Stdin => {
            let mut s = String::new();
            io::stdin().read_to_string(&mut s)?;
            Ok(s)
        },
        Input::Path(p) => {
            let f = File::open(p).with_context(|| format!("ouverture: {}", p.display()))?;
            let mut r = BufReader::new(f);
            let mut s = String::new();
            r.read_to_string(&mut s)?;
            Ok(s)
        },
        Input::Text(s) => Ok(s.clone()),
    }
}

/// Chemin `-` → stdin, sinon fichier ; absent → stdin.
pub fn input_from_path(p: Option<PathBuf>) -> Input {
    match p {
        Some(path) if path.as_os_str() == "-" => Input::Stdin,
        Some(path) => Input::Path(path),
        None => Input::Stdin,
    }
}

/// `--code` gagne sur le chemin.
pub fn program_input(path: Option<PathBuf>, code: Option<String>) -> Result<Input> {
    match (path, code) {
        (Some(_), Some(_)) => Err(anyhow!("PROGRAM et --code sont exclusifs")),
        (None, Some(code)) => Ok(Input::Text(code)),
        (path, None) => Ok(input_from_path(path)),
    }
}

// ───────────────────────────── Sorties jolies ─────────────────────────────

fn status_ok(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.green().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{} {}", tag, msg);
    }
}

fn status_info(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.blue().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{} {}", tag, msg);
    }
}

fn status_warn(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.yellow().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{} {}", tag, msg);
    }
}

fn status_error(tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        eprintln!("{} {}", tag.red().bold(), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        eprintln!("{} {}", tag, msg);
    }
}

// ───────────────────────────── Tests ─────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const SNAPSHOT: &str = r#"{
        "ports": 3,
        "inputs": ["a", "", ""],
        "chips": [
            { "id": 0, "code": "IN 1\nOUT 1", "input_sources": ["w:0", "", ""] },
            { "id": 1, "code": "IN 1\nOUT 2", "input_sources": ["c:0:0", "", ""] }
        ],
        "output_sources": ["", "c:1:1", ""]
    }"#;

    fn run_to_string(cmd: Command) -> (i32, String) {
        let mut buf = Vec::new();
        let code = execute_to(cmd, &mut buf).unwrap();
        (code, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn run_single_chip() {
        let task = RunTask {
            program: Input::Text("IN 2\nOUT 1\nOUT 3".into()),
            inputs: vec![String::new(), "y".into()],
            ..RunTask::default()
        };
        let (code, text) = run_to_string(Command::Run(task));
        assert_eq!(code, 0);
        assert_eq!(text, "OUT 1 \"y\"\nOUT 2 \"\"\nOUT 3 \"y\"\n");
    }

    #[test]
    fn run_rejects_extra_inputs_and_bad_ports() {
        let mut buf = Vec::new();
        let task = RunTask {
            program: Input::Text("IN 1".into()),
            inputs: vec!["a".into(); 4],
            ..RunTask::default()
        };
        assert!(execute_to(Command::Run(task), &mut buf).is_err());

        let task = RunTask { program: Input::Text(String::new()), ports: 0, ..RunTask::default() };
        assert!(execute_to(Command::Run(task), &mut buf).is_err());
    }

    #[test]
    fn eval_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ws.json");
        std::fs::write(&path, SNAPSHOT).unwrap();

        let task = EvalTask { snapshot: Input::Path(path), ..EvalTask::default() };
        let (code, text) = run_to_string(Command::Eval(task));
        assert_eq!(code, 0);
        assert_eq!(
            text,
            "chip 0  | \"a\" | \"\" | \"\"\n\
             chip 1  | \"\" | \"a\" | \"\"\n\
             outputs | \"\" | \"a\" | \"\"\n"
        );
    }

    #[test]
    fn eval_json_output() {
        let task = EvalTask {
            snapshot: Input::Text(SNAPSHOT.into()),
            format: Format::Json,
            ..EvalTask::default()
        };
        let (_, text) = run_to_string(Command::Eval(task));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["outputs"], serde_json::json!(["", "a", ""]));
        assert_eq!(value["chips"]["0"], serde_json::json!(["a", "", ""]));
    }

    #[test]
    fn strict_eval_rejects_self_reference() {
        let snapshot = r#"{ "chips": [{ "id": 0, "code": "IN 1\nOUT 1", "input_sources": ["c:0:0"] }] }"#;
        let task = EvalTask {
            snapshot: Input::Text(snapshot.into()),
            strict: true,
            ..EvalTask::default()
        };
        let (code, text) = run_to_string(Command::Eval(task));
        assert_eq!(code, 1);
        assert!(text.is_empty());
    }

    #[test]
    fn invalid_snapshot_is_an_error() {
        let mut buf = Vec::new();
        let task = EvalTask { snapshot: Input::Text("{\"ports\": 0}".into()), ..EvalTask::default() };
        let err = execute_to(Command::Eval(task), &mut buf).unwrap_err();
        assert!(format!("{err:#}").contains("snapshot JSON invalide"));
    }

    #[test]
    fn check_reports_and_fails_on_errors() {
        let task = CheckTask { program: Input::Text("IN 1\nJMP 2".into()), ..CheckTask::default() };
        let (code, text) = run_to_string(Command::Check(task));
        assert_eq!(code, 1);
        assert_eq!(text, "line 2: error: unknown mnemonic `JMP` (line ignored)\n");

        let task = CheckTask {
            program: Input::Text("IN 1\nOUT 2".into()),
            listing: true,
            ..CheckTask::default()
        };
        let (code, text) = run_to_string(Command::Check(task));
        assert_eq!(code, 0);
        assert!(text.contains("0001 |    2 | OUT 2"));
    }

    #[test]
    fn wiring_lists_connections() {
        let task = WiringTask { snapshot: Input::Text(SNAPSHOT.into()), format: Format::Table };
        let (code, text) = run_to_string(Command::Wiring(task));
        assert_eq!(code, 0);
        assert_eq!(text, "w:0 -> ci:0:0\nc:0:0 -> ci:1:0\nc:1:1 -> wo:1\n");
    }

    #[test]
    fn program_input_rules() {
        assert!(matches!(program_input(None, None), Ok(Input::Stdin)));
        assert!(matches!(program_input(Some("-".into()), None), Ok(Input::Stdin)));
        assert!(matches!(program_input(None, Some("IN 1".into())), Ok(Input::Text(_))));
        assert!(program_input(Some("a.chip".into()), Some("IN 1".into())).is_err());
    }
}
