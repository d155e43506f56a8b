mod args;
mod logging;
mod report;

use std::io;
use std::process::ExitCode;

use clap::Parser;
use mysql_scoped::{ConnectionFactory, MysqlScopedError};

use crate::args::Args;
use crate::logging::LogWriter;

fn main() -> ExitCode {
    let args = Args::parse();
    let writer = LogWriter::new(args.log.clone()).unwrap_or_else(|err| {
        eprintln!("failed to open log file: {err}");
        std::process::exit(1);
    });

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_target(false)
        .with_max_level(args.log_level)
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "demo failed");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), MysqlScopedError> {
    let params = args.connection_parameters()?;
    tracing::info!(host = %params.host, schema = %params.schema, "connecting");

    // The factory lives for the whole run and is handed to whatever needs it.
    let factory = ConnectionFactory::mysql();
    let conn = factory.connect_exclusive(&params)?;

    report::select_by_id(&conn, args.id, &mut io::stdout().lock())?;

    if !args.skip_insert {
        report::insert_name(&conn, &args.name)?;
    }
    Ok(())
}
