use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Context;
use mini_shell::Interpreter;
use mini_shell::config::{Args, Config};
use mini_shell::error::ShellError;
use mini_shell::lifecycle::Controller;
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    let args: Args = argh::from_env();
    if let Err(err) = init_logging(args.verbose) {
        eprintln!("mini-shell: {err:#}");
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<ShellError>() {
                Some(fatal @ ShellError::ResourceExhaustion(source)) => {
                    tracing::error!("{source}");
                    println!("{fatal}");
                }
                _ => eprintln!("mini-shell: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_env("MINI_SHELL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let filter = if verbose {
        filter.add_directive("mini_shell=debug".parse()?)
    } else {
        filter
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

fn run(args: &Args) -> anyhow::Result<()> {
    let mut sh = Interpreter::new(Config::from(args));
    let _controller = Controller::install(sh.session(), sh.config().idle_timeout)
        .context("cannot install signal handlers")?;

    let termination = sh.repl()?;
    if let Some(farewell) = termination.farewell() {
        let mut stdout = io::stdout().lock();
        stdout.write_all(farewell.as_bytes())?;
        stdout.flush()?;
    }
    tracing::debug!(?termination, "session ended");
    Ok(())
}
