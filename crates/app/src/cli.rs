use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use engine::{RecordKind, UserId};

#[derive(Parser, Debug)]
#[command(name = "tally")]
#[command(about = "Deposit/withdrawal totals and profit/loss per user")]
pub struct Cli {
    /// Settings file (TOML), without extension is fine.
    #[arg(long, env = "TALLY_CONFIG")]
    pub config: Option<String>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Store a CSV as the user's deposit or withdrawal file.
    Upload(UploadArgs),
    /// Per-currency value of one file.
    Aggregate(AggregateArgs),
    /// Total deposits, withdrawals and profit/loss.
    Total(UserArgs),
    /// Deposits, withdrawals and profit/loss per currency.
    Breakdown(UserArgs),
    /// Delete the user's deposit and withdrawal files.
    Clear(UserArgs),
    /// List every registered file.
    List,
}

#[derive(Args, Debug)]
pub struct UserArgs {
    #[arg(long)]
    pub user: UserId,
}

#[derive(Args, Debug)]
pub struct AggregateArgs {
    #[arg(long)]
    pub user: UserId,
    #[arg(long)]
    pub kind: RecordKind,
}

#[derive(Args, Debug)]
pub struct UploadArgs {
    #[arg(long)]
    pub user: UserId,
    #[arg(long)]
    pub kind: RecordKind,
    #[arg(long)]
    pub file: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_upload() {
        let cli = Cli::parse_from([
            "tally", "upload", "--user", "42", "--kind", "Deposit", "--file", "d.csv",
        ]);
        match cli.command {
            Command::Upload(args) => {
                assert_eq!(args.user, 42);
                assert_eq!(args.kind, RecordKind::Deposit);
                assert_eq!(args.file, PathBuf::from("d.csv"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn rejects_unknown_kind() {
        assert!(
            Cli::try_parse_from(["tally", "aggregate", "--user", "1", "--kind", "refund"])
                .is_err()
        );
    }

    #[test]
    fn json_flag_is_global() {
        let cli = Cli::parse_from(["tally", "total", "--user", "1", "--json"]);
        assert!(cli.json);
    }
}
