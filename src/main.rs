//! Purpose: `jsongate` CLI entry point and command dispatch bootstrap.
//! Role: Binary crate root; parses args, runs checks, reports rejections on stderr.
//! Invariants: Accepted payloads pass through to stdout byte for byte.
//! Invariants: Non-interactive failures are emitted as single-line JSON on stderr.
//! Invariants: Rejection exit codes are derived from `api::to_exit_code`.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::ffi::OsString;
use std::fs;
use std::io::{self, IsTerminal, Read, Write};
use std::path::{Path, PathBuf};

use clap::{
    Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;

use jsongate::api::{Limits, Rejection, ViolationKind, to_exit_code};

/// Exit code for bad invocations (sysexits EX_USAGE). Rejections own 1..=6.
const USAGE_EXIT_CODE: i32 = 64;
/// Exit code for host I/O failures (sysexits EX_IOERR).
const IO_EXIT_CODE: i32 = 74;

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

#[derive(Debug)]
enum CliError {
    Usage { message: String, hint: String },
    Io { message: String, source: io::Error },
    Rejected { kind: ViolationKind, rejection: Rejection },
}

impl CliError {
    fn usage(message: impl Into<String>, hint: impl Into<String>) -> Self {
        Self::Usage {
            message: message.into(),
            hint: hint.into(),
        }
    }

    fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage { .. } => USAGE_EXIT_CODE,
            CliError::Io { .. } => IO_EXIT_CODE,
            CliError::Rejected { kind, .. } => to_exit_code(*kind),
        }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            err.exit_code()
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (CliError, ColorMode)> {
    init_tracing();
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        CliError::io("failed to write help", io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    USAGE_EXIT_CODE
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    CliError::Usage {
                        message: clap_error_summary(&err),
                        hint: clap_error_hint(&err),
                    },
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    command_dispatch::dispatch_command(cli.command).map_err(|err| (err, color_mode))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let replacement = arg.to_str().and_then(|value| match value {
                "---help" => Some("--help"),
                "---version" => Some("--version"),
                _ => None,
            });
            replacement.map(OsString::from).unwrap_or_else(|| arg)
        })
        .collect()
}

#[derive(Parser)]
#[command(
    name = "jsongate",
    version,
    about = "Structural limit checks for untrusted JSON",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"Scans JSON in a single pass and rejects payloads that exceed structural
limits before they reach a parser.

Mental model:
  - `check` reads a payload, enforces the limits, and echoes it on success
  - rejections land on stderr with a stable reason code and context
  - the exit code names the violated limit
"#,
    after_help = r#"EXAMPLES
  $ echo '{"user": "alice"}' | jsongate check --max-depth 8
  $ jsongate check --limits limits.json payload.json > checked.json
  # stderr on rejection: {"rejection":{"code":"MAX_DEPTH_EXCEEDED",...}}

LEARN MORE
  Limit flags take a count; a negative count disables that limit:
    jsongate check --max-depth 20 --max-entries 200
    jsongate check --max-name-length 64 --max-value-length 4096
    jsongate check --max-array-size 100

  $ jsongate <command> --help
  https://github.com/sandover/jsongate"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Check a JSON payload against structural limits",
        long_about = r#"Read a JSON payload, enforce the configured limits, and echo the payload
to stdout when it passes.

The scan is a single pass over the raw bytes. The first violation wins: the
payload is rejected with one reason code and the rest of the input is never
examined."#,
        after_help = r#"EXAMPLES
  $ jsongate check payload.json
  $ cat payload.json | jsongate check --max-depth 8 --max-entries 100
  $ jsongate check --limits limits.json --quiet payload.json && echo accepted

NOTES
  - With no FILE (or with -), the payload is read from stdin.
  - On success the payload is echoed to stdout unless --quiet is given.
  - On rejection stderr carries the reason and the exit code names the limit."#
    )]
    Check(CheckArgs),
    #[command(
        about = "Print version info as JSON",
        long_about = r#"Emit version info as JSON (stable, machine-readable)."#,
        after_help = r#"EXAMPLES
  $ jsongate version"#
    )]
    Version,
    #[command(
        arg_required_else_help = true,
        about = "Generate shell completions",
        long_about = r#"Generate shell completion scripts.

Prints a completion script for the given shell to stdout.
Install the generated file in your shell's completion directory (or source it)
to enable tab completion."#,
        after_help = r#"EXAMPLES
  $ jsongate completion bash > ~/.local/share/bash-completion/completions/jsongate
  $ source ~/.bashrc
  $ jsongate completion zsh > ~/.zfunc/_jsongate
  $ autoload -U compinit && compinit
  $ jsongate completion fish > ~/.config/fish/completions/jsongate.fish"#
    )]
    Completion {
        #[arg(help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Args)]
struct CheckArgs {
    #[arg(
        help = "Payload file to check (default: stdin; - also means stdin)",
        value_hint = ValueHint::FilePath
    )]
    file: Option<PathBuf>,
    #[arg(
        long,
        value_name = "PATH",
        help = "Read limits from a JSON file; flags below override its values",
        value_hint = ValueHint::FilePath
    )]
    limits: Option<PathBuf>,
    #[arg(long, value_name = "N", help = "Maximum object nesting depth")]
    max_depth: Option<i64>,
    #[arg(
        long,
        value_name = "N",
        help = "Maximum field count across the whole document"
    )]
    max_entries: Option<i64>,
    #[arg(
        long,
        value_name = "N",
        help = "Maximum element count for any single array"
    )]
    max_array_size: Option<i64>,
    #[arg(
        long,
        value_name = "N",
        help = "Maximum field name length in characters"
    )]
    max_name_length: Option<i64>,
    #[arg(
        long,
        value_name = "N",
        help = "Maximum string value length in characters"
    )]
    max_value_length: Option<i64>,
    #[arg(long, help = "Suppress the payload echo on success")]
    quiet: bool,
    #[arg(
        long,
        value_name = "N",
        default_value_t = 200,
        help = "Longest offending-text excerpt included in rejections (characters)"
    )]
    max_snippet: usize,
}

fn resolve_limits(args: &CheckArgs) -> Result<Limits, CliError> {
    let mut limits = match args.limits.as_deref() {
        Some(path) => load_limits_file(path)?,
        None => Limits::unbounded(),
    };
    if let Some(bound) = args.max_depth {
        limits = limits.with_max_depth(bound);
    }
    if let Some(bound) = args.max_entries {
        limits = limits.with_max_entries(bound);
    }
    if let Some(bound) = args.max_array_size {
        limits = limits.with_max_array_size(bound);
    }
    if let Some(bound) = args.max_name_length {
        limits = limits.with_max_name_length(bound);
    }
    if let Some(bound) = args.max_value_length {
        limits = limits.with_max_value_length(bound);
    }
    Ok(limits)
}

fn load_limits_file(path: &Path) -> Result<Limits, CliError> {
    let text = fs::read_to_string(path).map_err(|err| {
        CliError::io(format!("failed to read limits file {}", path.display()), err)
    })?;
    serde_json::from_str(&text).map_err(|err| {
        CliError::usage(
            format!("invalid limits file {}: {err}", path.display()),
            "Expected JSON like {\"max_depth\": 20, \"max_entries\": 200}.",
        )
    })
}

fn read_payload(file: Option<&Path>) -> Result<Vec<u8>, CliError> {
    match file {
        Some(path) if path.as_os_str() != "-" => fs::read(path)
            .map_err(|err| CliError::io(format!("failed to read {}", path.display()), err)),
        _ => {
            let mut payload = Vec::new();
            io::stdin()
                .lock()
                .read_to_end(&mut payload)
                .map_err(|err| CliError::io("failed to read stdin", err))?;
            Ok(payload)
        }
    }
}

fn write_payload(payload: &[u8]) -> Result<(), CliError> {
    let mut stdout = io::stdout().lock();
    stdout
        .write_all(payload)
        .and_then(|()| stdout.flush())
        .map_err(|err| CliError::io("failed to write payload", err))
}

fn emit_version_output() {
    if io::stdout().is_terminal() {
        println!("jsongate {}", env!("CARGO_PKG_VERSION"));
    } else {
        let value = json!({
            "name": "jsongate",
            "version": env!("CARGO_PKG_VERSION"),
        });
        let json = serde_json::to_string(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
        println!("{json}");
    }
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &CliError, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Io\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_causes(source: &io::Error) -> Vec<String> {
    let mut causes = vec![source.to_string()];
    let mut cur = source.source();
    while let Some(next) = cur {
        causes.push(next.to_string());
        cur = next.source();
    }
    causes
}

fn error_json(err: &CliError) -> Value {
    let mut outer = Map::new();
    match err {
        CliError::Rejected { rejection, .. } => {
            outer.insert("rejection".to_string(), json!(rejection));
        }
        CliError::Usage { message, hint } => {
            let mut inner = Map::new();
            inner.insert("kind".to_string(), json!("Usage"));
            inner.insert("message".to_string(), json!(message));
            inner.insert("hint".to_string(), json!(hint));
            outer.insert("error".to_string(), Value::Object(inner));
        }
        CliError::Io { message, source } => {
            let mut inner = Map::new();
            inner.insert("kind".to_string(), json!("Io"));
            inner.insert("message".to_string(), json!(message));
            inner.insert("causes".to_string(), json!(error_causes(source)));
            outer.insert("error".to_string(), Value::Object(inner));
        }
    }
    Value::Object(outer)
}

fn error_text(err: &CliError, use_color: bool) -> String {
    let mut lines = Vec::new();
    match err {
        CliError::Rejected { rejection, .. } => {
            lines.push(format!(
                "{} {}",
                colorize_label("rejected:", use_color, AnsiColor::Red),
                rejection.message
            ));
            lines.push(format!(
                "{} {}",
                colorize_label("code:", use_color, AnsiColor::Yellow),
                rejection.code
            ));
            if let Some(limit) = rejection.limit {
                lines.push(format!(
                    "{} {limit}",
                    colorize_label("limit:", use_color, AnsiColor::Yellow)
                ));
            }
            if let Some(offset) = rejection.offset {
                lines.push(format!(
                    "{} {offset}",
                    colorize_label("offset:", use_color, AnsiColor::Yellow)
                ));
            }
            if let Some(offending) = &rejection.offending {
                lines.push(format!(
                    "{} {offending}",
                    colorize_label("offending:", use_color, AnsiColor::Yellow)
                ));
            }
        }
        CliError::Usage { message, hint } => {
            lines.push(format!(
                "{} {message}",
                colorize_label("error:", use_color, AnsiColor::Red)
            ));
            lines.push(format!(
                "{} {hint}",
                colorize_label("hint:", use_color, AnsiColor::Yellow)
            ));
        }
        CliError::Io { message, source } => {
            lines.push(format!(
                "{} {message}",
                colorize_label("error:", use_color, AnsiColor::Red)
            ));
            lines.push(format!(
                "{} {source}",
                colorize_label("caused by:", use_color, AnsiColor::Yellow)
            ));
        }
    }
    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);

    let Some(usage) = usage else {
        return "Try `jsongate --help`.".to_string();
    };

    let tokens: Vec<&str> = usage.split_whitespace().collect();
    let Some(pos) = tokens.iter().position(|t| *t == "jsongate") else {
        return "Try `jsongate --help`.".to_string();
    };

    let mut parts = Vec::new();
    for token in tokens.iter().skip(pos + 1) {
        if token.starts_with('-') || token.starts_with('<') || token.starts_with('[') {
            break;
        }
        parts.push(*token);
    }

    if parts.is_empty() {
        return "Try `jsongate --help`.".to_string();
    }

    format!("Try `jsongate {} --help`.", parts.join(" "))
}
