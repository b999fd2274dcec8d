use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "wardbook", about = "Local patient and staff records", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// TOML config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite file; overrides config and environment. Required unless set there.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a record from a JSON object
    Create(CreateArgs),
    /// Show one record
    Get(RecordArgs),
    /// List records of a collection
    List(ListArgs),
    /// Merge a JSON object into an existing record
    Update(UpdateArgs),
    /// Delete one record
    Delete(RecordArgs),
    /// Print dashboard totals
    Stats,
    /// Manage collection namespaces
    #[command(subcommand)]
    Collections(CollectionsCommand),
}

impl Command {
    /// Subcommand name used in log lines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Get(_) => "get",
            Self::List(_) => "list",
            Self::Update(_) => "update",
            Self::Delete(_) => "delete",
            Self::Stats => "stats",
            Self::Collections(_) => "collections",
        }
    }
}

#[derive(Args)]
pub struct CreateArgs {
    pub collection: String,
    pub json: String,
}

#[derive(Args)]
pub struct RecordArgs {
    pub collection: String,
    pub id: String,
}

#[derive(Args)]
pub struct ListArgs {
    pub collection: String,
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long)]
    pub newest_first: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub collection: String,
    pub id: String,
    pub json: String,
}

#[derive(Subcommand)]
pub enum CollectionsCommand {
    /// List registered collections
    List,
    /// Register a collection
    Add { name: String },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_list_with_limit() {
        let cli = Cli::parse_from(["wardbook", "--db", "/tmp/w.db", "list", "doctor", "--limit", "2"]);
        match &cli.command {
            Command::List(args) => {
                assert_eq!(args.collection, "doctor");
                assert_eq!(args.limit, Some(2));
                assert!(!args.newest_first);
            }
            _ => panic!("expected list command"),
        }
        assert!(cli.db.is_some());
        assert_eq!(cli.command.name(), "list");
    }

    #[test]
    fn update_requires_json_argument() {
        assert!(Cli::try_parse_from(["wardbook", "update", "patient", "id-only"]).is_err());
    }
}
