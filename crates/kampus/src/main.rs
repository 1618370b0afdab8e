mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use kampus_core::CoreError;

use crate::cli::{Cli, Command, GlobalOpts};
use crate::commands::Session;
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    // stdout carries command output; diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands don't need a service connection
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "kampus", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let conn = config::resolve_connection(&cli.global)?;
            tracing::debug!(command = ?cmd, profile = %conn.profile_name, "dispatching command");

            let session = Session::open(conn)?;
            let result = run_scoped(cmd, &session, &cli.global).await;
            session.close().await;
            result
        }
    }
}

/// Run one command inside a view scope that Ctrl-C cancels.
async fn run_scoped(cmd: Command, session: &Session, global: &GlobalOpts) -> Result<(), CliError> {
    let ctx = session.context();
    let scope = ctx.scope("cli")?;

    tokio::select! {
        out = scope.run(commands::dispatch(cmd, &ctx, session.storage(), global)) => match out {
            Ok(result) => result,
            Err(CoreError::Cancelled) => Err(CliError::Interrupted),
            Err(other) => Err(other.into()),
        },
        _ = tokio::signal::ctrl_c() => {
            scope.cancel();
            Err(CliError::Interrupted)
        }
    }
}
