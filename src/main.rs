use std::process::ExitCode;

use laurel::{StorageConfig, Table, executor::session::Session};
use rustyline::{DefaultEditor, error::ReadlineError};
use tracing::error;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const PROMPT: &str = "db > ";

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("laurel=warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = StorageConfig::from_env()?;
    let table = Table::open_with_config(path, config)?;
    let mut session = Session::new(table);
    let mut rl = DefaultEditor::new()?;

    loop {
        match rl.readline(PROMPT) {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = rl.add_history_entry(line.as_str());
                }
                let result = session.handle_line(&line)?;
                for message in &result.output {
                    println!("{message}");
                }
                if result.exit {
                    break;
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(err) => {
                session.close()?;
                return Err(err.into());
            }
        }
    }

    session.close()?;
    Ok(())
}

fn main() -> ExitCode {
    init_tracing();

    let Some(path) = std::env::args().nth(1) else {
        println!("Must supply a database filename.");
        return ExitCode::FAILURE;
    };

    match run(&path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "database session failed");
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
