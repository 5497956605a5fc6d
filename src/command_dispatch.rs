//! Purpose: Hold the top-level CLI command dispatch for `jsongate`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and emission helpers.
//! Invariants: Stdout carries only the payload echo, version info, or completions.
//! Invariants: Failures leave stdout untouched and surface as `CliError`.

use super::*;
use jsongate::api::Gate;
use tracing::debug;

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, CliError> {
    match command {
        Command::Check(args) => run_check(args),
        Command::Version => {
            emit_version_output();
            Ok(RunOutcome::ok())
        }
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "jsongate", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
    }
}

fn run_check(args: CheckArgs) -> Result<RunOutcome, CliError> {
    let limits = resolve_limits(&args)?;
    let payload = read_payload(args.file.as_deref())?;
    debug!(bytes = payload.len(), "checking payload");

    let gate = Gate::new(limits);
    match gate.check_bytes(&payload) {
        Ok(()) => {
            if !args.quiet {
                write_payload(&payload)?;
            }
            Ok(RunOutcome::ok())
        }
        Err(violation) => {
            debug!(code = violation.kind().code(), "payload rejected");
            Err(CliError::Rejected {
                kind: violation.kind(),
                rejection: Rejection::from_violation(&violation, args.max_snippet),
            })
        }
    }
}
