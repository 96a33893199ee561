// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use hopeless_coin::config::DEFAULT_DATA_FILE;
use hopeless_coin::snapshot::write_history_csv;
use hopeless_coin::{
    BackendConfig, CatalogKind, Config, ItemId, LedgerError, Persistence, RewardItem, Session,
    SortDirection, SortKey, TransactionKind, parse_amount,
};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process;
use thiserror::Error;

/// Hopeless Coin - earn coins for good habits, spend them on rewards
///
/// Keeps a running coin balance with a full history, plus two price lists
/// ("earn" and "spend") for things you do often.
#[derive(Parser, Debug)]
#[command(name = "hopeless-coin")]
#[command(about = "Track a personal coin balance with earn/spend price lists", long_about = None)]
struct Args {
    /// Where data is kept
    #[arg(long, value_enum, env = "HOPELESS_BACKEND", default_value_t = BackendKind::File, global = true)]
    backend: BackendKind,

    /// Data file for the file backend
    #[arg(long, value_name = "FILE", env = "HOPELESS_DATA_FILE", default_value = DEFAULT_DATA_FILE, global = true)]
    data_file: PathBuf,

    /// Base URL of the remote table store
    #[arg(long, value_name = "URL", env = "HOPELESS_REMOTE_URL", global = true)]
    remote_url: Option<String>,

    /// API key for the remote table store
    #[arg(long, value_name = "KEY", env = "HOPELESS_REMOTE_KEY", hide_env_values = true, global = true)]
    remote_key: Option<String>,

    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    File,
    Remote,
    Memory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CatalogArg {
    Earn,
    Spend,
}

impl From<CatalogArg> for CatalogKind {
    fn from(arg: CatalogArg) -> Self {
        match arg {
            CatalogArg::Earn => CatalogKind::Earn,
            CatalogArg::Spend => CatalogKind::Spend,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SortArg {
    Description,
    Amount,
}

impl From<SortArg> for SortKey {
    fn from(arg: SortArg) -> Self {
        match arg {
            SortArg::Description => SortKey::Description,
            SortArg::Amount => SortKey::Amount,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the current balance
    Balance,
    /// Show transactions, newest first
    History {
        /// Write CSV instead of a table
        #[arg(long)]
        csv: bool,
        /// Only show the newest N entries
        #[arg(long, value_name = "N")]
        limit: Option<usize>,
    },
    /// Earn coins
    Earn {
        description: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
    /// Spend coins (fails when the balance is too low)
    Spend {
        description: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
    /// List a price list
    Items {
        #[arg(value_enum)]
        catalog: CatalogArg,
        /// Only items whose description contains this text (any case)
        #[arg(long, default_value = "")]
        search: String,
        /// Order by this column instead of insertion order
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
        /// Reverse the sort order
        #[arg(long, requires = "sort")]
        descending: bool,
    },
    /// Add an entry to a price list
    AddItem {
        #[arg(value_enum)]
        catalog: CatalogArg,
        description: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
    /// Change an entry of a price list
    EditItem {
        #[arg(value_enum)]
        catalog: CatalogArg,
        id: String,
        description: String,
        #[arg(allow_hyphen_values = true)]
        amount: String,
    },
    /// Remove an entry from a price list
    DeleteItem {
        #[arg(value_enum)]
        catalog: CatalogArg,
        id: String,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Earn or spend the amount of a price list entry
    Quick {
        #[arg(value_enum)]
        catalog: CatalogArg,
        id: String,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Write a backup file
    Export {
        /// Directory to write hopeless-coin-backup-<date>.json into
        #[arg(long, default_value = ".")]
        dir: PathBuf,
    },
    /// Replace ALL data with a backup file
    Import {
        file: PathBuf,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("{0}")]
    Config(String),

    #[error("output failed: {0}")]
    Io(#[from] io::Error),

    #[error("csv output failed: {0}")]
    Csv(#[from] csv::Error),
}

impl Args {
    fn config(&self) -> Result<Config, CliError> {
        let backend = match self.backend {
            BackendKind::File => BackendConfig::File {
                path: self.data_file.clone(),
            },
            BackendKind::Remote => {
                let (Some(url), Some(api_key)) = (&self.remote_url, &self.remote_key) else {
                    return Err(CliError::Config(
                        "the remote backend needs --remote-url and --remote-key".to_string(),
                    ));
                };
                BackendConfig::Remote {
                    url: url.clone(),
                    api_key: api_key.clone(),
                }
            }
            BackendKind::Memory => BackendConfig::Memory,
        };
        Ok(Config { backend })
    }
}

fn main() {
    let args = Args::parse();
    hopeless_coin::logging::init(args.verbose);

    let config = match args.config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(2);
        }
    };

    let store = match config.open_store() {
        Ok(store) => store,
        Err(e) => {
            eprintln!("Error opening storage: {e}");
            process::exit(1);
        }
    };

    let mut session = match Session::open(store) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error loading data: {e}");
            process::exit(1);
        }
    };

    let stdin = io::stdin();
    let mut confirm = |prompt: &str| -> io::Result<bool> {
        eprint!("{prompt} [y/N] ");
        io::stderr().flush()?;
        let mut line = String::new();
        stdin.lock().read_line(&mut line)?;
        Ok(matches!(line.trim(), "y" | "Y" | "yes"))
    };

    if let Err(e) = run(&mut session, args.command, &mut io::stdout(), &mut confirm) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

/// Executes one command against the session, writing results to `out`.
///
/// `confirm` is asked before destructive or spending actions unless the
/// command carries `--yes`.
fn run<S, W, C>(
    session: &mut Session<S>,
    command: Command,
    out: &mut W,
    confirm: &mut C,
) -> Result<(), CliError>
where
    S: Persistence,
    W: Write,
    C: FnMut(&str) -> io::Result<bool>,
{
    match command {
        Command::Balance => {
            let totals = session.ledger().totals();
            writeln!(out, "Balance: {} coins", session.balance())?;
            writeln!(out, "Earned: {}  Spent: {}", totals.earned, totals.spent)?;
        }
        Command::History { csv, limit } => {
            let limit = limit.unwrap_or(usize::MAX);
            if csv {
                write_history_csv(session.history().take(limit), &mut *out)?;
            } else if session.ledger().is_empty() {
                writeln!(out, "No transactions yet.")?;
            } else {
                for tx in session.history().take(limit) {
                    let amount = match tx.kind() {
                        TransactionKind::Earn => format!("+{}", tx.amount()),
                        TransactionKind::Spend => tx.amount().to_string(),
                    };
                    writeln!(
                        out,
                        "{}  {:>10}  {}",
                        tx.date().format("%Y-%m-%d %H:%M"),
                        amount,
                        tx.description()
                    )?;
                }
            }
        }
        Command::Earn {
            description,
            amount,
        } => {
            let tx = session.apply_transaction(
                &description,
                parse_amount(&amount)?,
                TransactionKind::Earn,
            )?;
            writeln!(
                out,
                "Earned {} coins for \"{}\". Balance: {}",
                tx.magnitude(),
                tx.description(),
                session.balance()
            )?;
        }
        Command::Spend {
            description,
            amount,
        } => {
            let tx = session.apply_transaction(
                &description,
                parse_amount(&amount)?,
                TransactionKind::Spend,
            )?;
            writeln!(
                out,
                "Spent {} coins on \"{}\". Balance: {}",
                tx.magnitude(),
                tx.description(),
                session.balance()
            )?;
        }
        Command::Items {
            catalog,
            search,
            sort,
            descending,
        } => {
            let catalog = CatalogKind::from(catalog);
            let items: Vec<&RewardItem> = match sort {
                Some(key) => {
                    let direction = if descending {
                        SortDirection::Descending
                    } else {
                        SortDirection::Ascending
                    };
                    session.list_items(catalog, &search, key.into(), direction)
                }
                None => session.search(catalog, &search).collect(),
            };
            if items.is_empty() {
                writeln!(out, "No {catalog} items.")?;
            }
            for item in items {
                writeln!(out, "{}  {:>10}  {}", item.id(), item.amount(), item.description())?;
            }
        }
        Command::AddItem {
            catalog,
            description,
            amount,
        } => {
            let item = session.add_item(catalog.into(), &description, parse_amount(&amount)?)?;
            writeln!(out, "Added {}", item.id())?;
        }
        Command::EditItem {
            catalog,
            id,
            description,
            amount,
        } => {
            let item = session.update_item(
                catalog.into(),
                &ItemId(id),
                &description,
                parse_amount(&amount)?,
            )?;
            writeln!(out, "Updated {}: {} ({})", item.id(), item.description(), item.amount())?;
        }
        Command::DeleteItem { catalog, id, yes } => {
            let id = ItemId(id);
            let catalog = CatalogKind::from(catalog);
            let Some(item) = session.catalog(catalog).get(&id) else {
                return Err(LedgerError::NotFound(id.to_string()).into());
            };
            let prompt = format!("Delete \"{}\" from the {catalog} list?", item.description());
            if !yes && !confirm(&prompt)? {
                writeln!(out, "Cancelled.")?;
                return Ok(());
            }
            let item = session.delete_item(catalog, &id)?;
            writeln!(out, "Deleted {}", item.id())?;
        }
        Command::Quick { catalog, id, yes } => {
            let id = ItemId(id);
            let catalog = CatalogKind::from(catalog);
            let Some(item) = session.catalog(catalog).get(&id) else {
                return Err(LedgerError::NotFound(id.to_string()).into());
            };
            let prompt = format!(
                "{} {} coins for \"{}\"?",
                match catalog {
                    CatalogKind::Earn => "Earn",
                    CatalogKind::Spend => "Spend",
                },
                item.amount(),
                item.description()
            );
            if !yes && !confirm(&prompt)? {
                writeln!(out, "Cancelled.")?;
                return Ok(());
            }
            let tx = session.quick_add_by_id(catalog, &id)?;
            writeln!(
                out,
                "{} {}. Balance: {}",
                tx.kind(),
                tx.magnitude(),
                session.balance()
            )?;
        }
        Command::Export { dir } => {
            let path = session.export_backup(&dir)?;
            writeln!(out, "Backup written to {}", path.display())?;
        }
        Command::Import { file, yes } => {
            if !yes && !confirm("Importing replaces ALL current data. Continue?")? {
                writeln!(out, "Cancelled.")?;
                return Ok(());
            }
            session.import_backup_file(&file)?;
            writeln!(
                out,
                "Imported {} transactions. Balance: {}",
                session.history().len(),
                session.balance()
            )?;
        }
    }
    Ok(())
}
