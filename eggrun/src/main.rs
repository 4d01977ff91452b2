mod args;
mod extension_traits;
mod logging;
mod run;

use std::io::IsTerminal;
use std::process::ExitCode;

use args::Cli;
use extension_traits::CommandExitStatusError;
use run::run;

use clap::Parser;

/// Exit with emapper.py's own status when it failed, 1 for everything else.
fn exit_code(err: &anyhow::Error) -> ExitCode {
    err.downcast_ref::<CommandExitStatusError>()
        .and_then(|status| status.code)
        .and_then(|code| u8::try_from(code).ok())
        .filter(|&code| code != 0)
        .map_or(ExitCode::FAILURE, ExitCode::from)
}

fn main() -> ExitCode {
    color_backtrace::install();

    let cli = Cli::parse();
    logging::init(cli.common_args.verbose);

    if !std::io::stdout().is_terminal() {
        colored::control::set_override(false);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            exit_code(&err)
        }
    }
}
