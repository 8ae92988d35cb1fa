use clap::Parser;
use farmer_ledger::args::{Args, Command};
use farmer_ledger::{commands, Config, Ledger, Mode, Result};
use std::process::ExitCode;
use tracing::{debug, error, trace};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let log_level = args.common().log_level();
    init_logger(log_level);
    debug!("Log level set to {}", log_level.to_string().to_lowercase());

    match main_inner(args).await {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Exiting with error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

pub async fn main_inner(args: Args) -> Result<()> {
    trace!("{args:?}");
    let home = args.common().ledger_home().path();

    // This allows for running the program without a SQLite file or a signed-in user. When
    // LEDGER_IN_TEST_MODE is set and non-zero in length, then the mode will be Mode::Test,
    // otherwise it will be Mode::Live.
    let mode = Mode::from_env();

    if let Command::Init = args.command() {
        commands::init(home).await?.print();
        return Ok(());
    }

    let config = Config::load(home).await?;
    let ledger = Ledger::open(config, mode).await?;

    let _: () = match args.command() {
        Command::Init => {}
        Command::Login(login_args) => commands::login(&ledger, login_args).await?.print(),
        Command::Logout => commands::logout(&ledger).await?.print(),
        Command::Profile => commands::profile(&ledger).await?.print(),
        Command::Home => commands::home(&ledger).await?.print(),
        Command::Records(records_args) => {
            commands::records(&ledger, records_args).await?.print()
        }
        Command::Add(add_args) => commands::add(&ledger, add_args).await?.print(),
        Command::Learn => commands::learn(&ledger).await?.print(),
        Command::Lesson(lesson_args) => commands::lesson(&ledger, lesson_args).await?.print(),
        Command::Seed => commands::seed(&ledger).await?.print(),
    };
    Ok(())
}

/// Initializes the tracing subscriber.
pub fn init_logger(level: LevelFilter) {
    let filter = match std::env::var("RUST_LOG").ok() {
        Some(_) => {
            // RUST_LOG exists; use it.
            EnvFilter::from_default_env()
        }
        None => {
            // RUST_LOG does not exist; use default log level for this crate only.
            EnvFilter::new(format!(
                "farmer_ledger={},{}={}",
                level,
                env!("CARGO_BIN_NAME"),
                level
            ))
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
