//! These structs provide the CLI interface for the ledger CLI.

use crate::model::{RecordFilter, RecordType};
use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::error;
use tracing_subscriber::filter::LevelFilter;

/// ledger: A farm income and expense tracker.
///
/// Record what your farm earns and spends, see your balance at a glance, and read short lessons
/// on budgeting, saving and managing risk.
///
/// Start with `ledger init`, then `ledger login --email you@example.com`.
#[derive(Debug, Parser, Clone)]
pub struct Args {
    #[clap(flatten)]
    common: Common,

    #[command(subcommand)]
    command: Command,
}

impl Args {
    pub fn new(common: Common, command: Command) -> Self {
        Self { common, command }
    }

    pub fn common(&self) -> &Common {
        &self.common
    }

    pub fn command(&self) -> &Command {
        &self.command
    }
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create the data directory, the configuration file and an empty store.
    ///
    /// By default the data directory is $HOME/ledger. Pass --ledger-home to put it somewhere else.
    Init,
    /// Sign in. The identity is remembered until you log out.
    Login(LoginArgs),
    /// Sign out.
    Logout,
    /// Show who is signed in.
    Profile,
    /// Show your balance, total income and expenses, and your most recent records.
    Home,
    /// List your records, newest first.
    Records(RecordsArgs),
    /// Add an income or expense record.
    Add(AddArgs),
    /// List the lessons.
    Learn,
    /// Read a lesson.
    Lesson(LessonArgs),
    /// Add any missing lessons to the store.
    Seed,
}

/// Arguments common to all subcommands.
#[derive(Debug, Parser, Clone)]
pub struct Common {
    /// The logging verbosity. One of, from least to most verbose:
    /// off, error, warn, info, debug, trace
    ///
    /// This can be overridden by RUST_LOG.
    #[arg(long, default_value_t = LevelFilter::INFO)]
    log_level: LevelFilter,

    /// The directory where ledger data and configuration is held. Defaults to ~/ledger
    #[arg(long, env = "LEDGER_HOME", default_value_t = default_ledger_home())]
    ledger_home: DisplayPath,
}

impl Common {
    pub fn new(log_level: LevelFilter, ledger_home: PathBuf) -> Self {
        Self {
            log_level,
            ledger_home: ledger_home.into(),
        }
    }

    pub fn log_level(&self) -> LevelFilter {
        self.log_level
    }

    pub fn ledger_home(&self) -> &DisplayPath {
        &self.ledger_home
    }
}

/// (Not shown): Args for the `ledger login` command.
#[derive(Debug, Parser, Clone)]
pub struct LoginArgs {
    /// Your email address.
    #[arg(long)]
    email: String,

    /// Your user id. Defaults to your email address in lowercase.
    #[arg(long)]
    uid: Option<String>,

    /// The name shown on your profile.
    #[arg(long)]
    display_name: Option<String>,

    /// A link to your profile picture.
    #[arg(long)]
    photo_url: Option<String>,
}

impl LoginArgs {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            uid: None,
            display_name: None,
            photo_url: None,
        }
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn uid(&self) -> String {
        self.uid
            .clone()
            .unwrap_or_else(|| self.email.trim().to_lowercase())
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }
}

/// How `ledger records` prints the records.
#[derive(
    Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// A JSON array of records.
    Json,
    /// A markdown table.
    #[default]
    Table,
    /// CSV with a header row.
    Csv,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

/// (Not shown): Args for the `ledger records` command.
#[derive(Debug, Parser, Clone)]
pub struct RecordsArgs {
    /// Which records to show.
    #[arg(long, default_value_t = RecordFilter::All)]
    filter: RecordFilter,

    /// The output format.
    #[arg(long, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

impl RecordsArgs {
    pub fn new(filter: RecordFilter, format: OutputFormat) -> Self {
        Self { filter, format }
    }

    pub fn filter(&self) -> RecordFilter {
        self.filter
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

/// (Not shown): Args for the `ledger add` command.
#[derive(Debug, Parser, Clone)]
pub struct AddArgs {
    /// Whether money came in or went out.
    #[arg(long = "type", default_value_t = RecordType::Expense)]
    record_type: RecordType,

    /// The amount, e.g. 1500 or "KES 1,500.00". Must be greater than zero.
    #[arg(long)]
    amount: String,

    /// The category. Income: Harvest Sales, Livestock Sales, Services, Other. Expense: Seeds,
    /// Fertilizer, Labor, Equipment, Feed, Other.
    #[arg(long)]
    category: String,

    /// The date as YYYY-MM-DD. Defaults to today.
    #[arg(long)]
    date: Option<String>,

    /// An optional note.
    #[arg(long)]
    description: Option<String>,
}

impl AddArgs {
    pub fn new(record_type: RecordType, amount: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            record_type,
            amount: amount.into(),
            category: category.into(),
            date: None,
            description: None,
        }
    }

    pub fn record_type(&self) -> RecordType {
        self.record_type
    }

    pub fn amount(&self) -> &str {
        &self.amount
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn date(&self) -> Option<&str> {
        self.date.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// (Not shown): Args for the `ledger lesson` command.
#[derive(Debug, Parser, Clone)]
pub struct LessonArgs {
    /// The id of the lesson, as shown by `ledger learn`.
    id: String,

    /// Mark the lesson as done and go back to the lesson list.
    #[arg(long)]
    done: bool,
}

impl LessonArgs {
    pub fn new(id: impl Into<String>, done: bool) -> Self {
        Self {
            id: id.into(),
            done,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn done(&self) -> bool {
        self.done
    }
}

fn default_ledger_home() -> DisplayPath {
    DisplayPath(match dirs::home_dir() {
        Some(home) => home.join("ledger"),
        None => {
            error!(
                "There was an error when trying to get your home directory. You can get around \
                this by providing --ledger-home or LEDGER_HOME instead of relying on the default \
                ledger home directory. If you continue using the program right now, you may have \
                problems!",
            );
            PathBuf::from("ledger")
        }
    })
}

#[derive(Debug, Default, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct DisplayPath(PathBuf);

impl From<PathBuf> for DisplayPath {
    fn from(value: PathBuf) -> Self {
        DisplayPath(value)
    }
}

impl Deref for DisplayPath {
    type Target = Path;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<Path> for DisplayPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl Display for DisplayPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_string_lossy())
    }
}

impl FromStr for DisplayPath {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(PathBuf::from(s)))
    }
}

impl DisplayPath {
    pub fn path(&self) -> &Path {
        &self.0
    }
}
