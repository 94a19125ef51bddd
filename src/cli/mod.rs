use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub mod delete;
pub mod display;
pub mod import;
pub mod list;
pub mod show;
pub mod update;

pub use delete::run_delete;
pub use import::run_import;
pub use list::run_list;
pub use show::run_show;
pub use update::run_update;

#[derive(Parser)]
#[command(name = "contactdesk")]
#[command(about = "Contact list with paged listing and CSV import")]
#[command(version)]
pub struct Cli {
    /// SQLite database file (overrides CONTACTDESK_DB)
    #[arg(long, global = true, value_name = "PATH")]
    pub db: Option<PathBuf>,

    /// Keep contacts in memory for this run only
    #[arg(long, global = true, conflicts_with = "db")]
    pub memory: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List contacts one page at a time
    List(ListArgs),
    /// Show a single contact
    Show(ShowArgs),
    /// Change a contact's fields
    Update(UpdateArgs),
    /// Delete a contact
    Delete(DeleteArgs),
    /// Import contacts from a CSV file
    Import(ImportArgs),
}

#[derive(Args)]
pub struct ListArgs {
    /// Number of rows to skip
    #[arg(long, default_value = "0")]
    pub start: i64,
    /// Page size (0 or less uses the default of 10)
    #[arg(short, long, default_value = "10")]
    pub length: i64,
    /// Only contacts whose name or phone contains this text
    #[arg(short, long)]
    pub search: Option<String>,
    /// Sort column: name, dateOfBirth, married, phone or salary
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(short, long, default_value = "asc")]
    pub order: String,
    /// Token echoed back in JSON output
    #[arg(long, default_value = "1")]
    pub draw: i64,
    /// Read a raw list request (JSON) from this file instead of the flags above
    #[arg(long, value_name = "FILE")]
    pub request: Option<PathBuf>,
    /// Print the response as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Contact UUID
    pub id: String,
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Contact UUID
    pub id: String,
    #[arg(short, long)]
    pub name: Option<String>,
    /// Date of birth (YYYY-MM-DD, DD.MM.YYYY or MM/DD/YYYY)
    #[arg(short, long)]
    pub dob: Option<String>,
    /// true/false, yes/no or 1/0
    #[arg(short, long)]
    pub married: Option<String>,
    #[arg(short, long)]
    pub phone: Option<String>,
    #[arg(short, long)]
    pub salary: Option<String>,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Contact UUID
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// CSV file to import
    pub file: PathBuf,
    /// Parse and report without saving anything
    #[arg(long)]
    pub dry_run: bool,
    /// Print the outcome as JSON
    #[arg(long)]
    pub json: bool,
}
