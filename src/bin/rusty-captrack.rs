//! rusty-captrack CLI - Command-line interface for portfolio tracking
//!
//! Portfolios are stored as JSON files in the data directory, one file per
//! portfolio. Every command that changes a portfolio writes it back.
//!
//! ## Example Usage
//!
//! ```bash
//! # Create a portfolio and add a security
//! rusty-captrack new Simon
//! rusty-captrack add-security -p Simon BNS
//!
//! # Record a buy and a sell
//! rusty-captrack add -p Simon -t BNS -d 2019-11-20 --value 1089.18 --shares 10 --commission 4.99
//! rusty-captrack add -p Simon -t BNS -d 2020-06-05 --sell --value 420.20 --shares 5 --commission 4.99
//!
//! # Foreign currency trade
//! rusty-captrack add -p Simon -t GOOG -d 2020-03-02 --value 6543.21 --shares 90 --fx-rate 1.3356
//!
//! # Reports
//! rusty-captrack summary -p Simon
//! rusty-captrack tax-year -p Simon 2020
//!
//! # Import an adjustedcostbase.ca export
//! rusty-captrack import -p Simon export.csv
//! ```

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use colored::Colorize;
use rusty_captrack::currency::TradeCurrency;
use rusty_captrack::finance::{Portfolio, TransactionRecord, TransactionSide};
use rusty_captrack::persistence::{
    list_names, portfolio_path, read_portfolio, write_portfolio, CsvImporter,
    PORTFOLIO_EXTENSION,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// rusty-captrack: Adjusted cost base and capital gains tracking
#[derive(Parser)]
#[command(name = "rusty-captrack")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = "Robert Fall")]
#[command(about = "Adjusted cost base and capital gains tracking", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty portfolio
    New {
        /// Portfolio name
        #[arg(value_name = "NAME")]
        name: String,
    },

    /// List saved portfolios
    List,

    /// Start tracking a security
    AddSecurity {
        /// Portfolio name
        #[arg(short, long)]
        portfolio: String,

        /// Ticker symbol
        #[arg(value_name = "TICKER")]
        ticker: String,
    },

    /// Stop tracking a security, dropping its transactions
    RemoveSecurity {
        /// Portfolio name
        #[arg(short, long)]
        portfolio: String,

        /// Ticker symbol
        #[arg(value_name = "TICKER")]
        ticker: String,
    },

    /// Record a buy or sell
    Add {
        /// Portfolio name
        #[arg(short, long)]
        portfolio: String,

        /// Ticker symbol
        #[arg(short, long)]
        ticker: String,

        /// Trade date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,

        /// Record a sell instead of a buy
        #[arg(long)]
        sell: bool,

        /// Gross value of the trade in its own currency
        #[arg(long)]
        value: f64,

        /// Number of shares
        #[arg(long)]
        shares: u64,

        /// Commission in the trade's currency
        #[arg(long, default_value = "0.0")]
        commission: f64,

        /// Exchange rate into the reporting currency (marks a foreign trade)
        #[arg(long)]
        fx_rate: Option<f64>,
    },

    /// Remove a transaction by its position in the security's history
    Remove {
        /// Portfolio name
        #[arg(short, long)]
        portfolio: String,

        /// Ticker symbol
        #[arg(short, long)]
        ticker: String,

        /// Zero-based position as shown by `search`
        #[arg(value_name = "INDEX")]
        index: usize,
    },

    /// Show the current position of every holding
    Summary {
        /// Portfolio name
        #[arg(short, long)]
        portfolio: String,
    },

    /// Show the full history of one security
    Search {
        /// Portfolio name
        #[arg(short, long)]
        portfolio: String,

        /// Ticker symbol
        #[arg(value_name = "TICKER")]
        ticker: String,
    },

    /// Show every sell in a tax year with its realized gain
    TaxYear {
        /// Portfolio name
        #[arg(short, long)]
        portfolio: String,

        /// Calendar year
        #[arg(value_name = "YEAR")]
        year: i32,
    },

    /// Import an adjustedcostbase.ca CSV export
    Import {
        /// Portfolio name (created if it does not exist)
        #[arg(short, long)]
        portfolio: String,

        /// CSV export file
        #[arg(value_name = "CSV_FILE")]
        csv_file: PathBuf,
    },
}

// Configuration structures

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Config {
    #[serde(default = "default_data_dir")]
    data_dir: PathBuf,
    #[serde(default = "default_reporting_currency")]
    reporting_currency: String,
    #[serde(default = "default_foreign_currency")]
    foreign_currency: String,
}

fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".rusty-captrack")
        .join("portfolios")
}

fn default_reporting_currency() -> String {
    "CAD".to_string()
}

fn default_foreign_currency() -> String {
    "USD".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            reporting_currency: default_reporting_currency(),
            foreign_currency: default_foreign_currency(),
        }
    }
}

impl Config {
    fn load(path: Option<&Path>) -> Self {
        let config_path = match path {
            Some(path) => path.to_path_buf(),
            None => match dirs::home_dir() {
                Some(home) => home.join(".rusty-captrack").join("config.toml"),
                None => return Config::default(),
            },
        };
        if !config_path.exists() {
            return Config::default();
        }

        match fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("{} Failed to parse config: {}", "Warning:".yellow(), e);
                    Config::default()
                }
            },
            Err(e) => {
                eprintln!("{} Failed to read config: {}", "Warning:".yellow(), e);
                Config::default()
            }
        }
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.data_dir)
    }

    fn currency_label(&self, currency: TradeCurrency) -> &str {
        match currency {
            TradeCurrency::Reporting => &self.reporting_currency,
            TradeCurrency::Foreign => &self.foreign_currency,
        }
    }

    fn load_portfolio(&self, name: &str) -> anyhow::Result<Portfolio> {
        let path = portfolio_path(&self.data_dir, name);
        if !path.exists() {
            bail!("No portfolio named {} in {}", name, self.data_dir.display());
        }
        read_portfolio(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    fn save_portfolio(&self, portfolio: &Portfolio) -> anyhow::Result<()> {
        let path = portfolio_path(&self.data_dir, portfolio.name());
        write_portfolio(&path, portfolio)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

struct AddConfig {
    portfolio: String,
    ticker: String,
    date: String,
    sell: bool,
    value: f64,
    shares: u64,
    commission: f64,
    fx_rate: Option<f64>,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref());
    if let Err(e) = config.ensure_dirs() {
        eprintln!(
            "{} Failed to create directories: {}",
            "Error:".red().bold(),
            e
        );
        process::exit(1);
    }

    if cli.verbose {
        println!(
            "{} v{}",
            "rusty-captrack".cyan().bold(),
            env!("CARGO_PKG_VERSION")
        );
        println!(
            "Data dir: {}",
            config.data_dir.display().to_string().dimmed()
        );
    }

    let result = match cli.command {
        Commands::New { name } => new_portfolio(&config, &name),
        Commands::List => list_portfolios(&config),
        Commands::AddSecurity { portfolio, ticker } => add_security(&config, &portfolio, &ticker),
        Commands::RemoveSecurity { portfolio, ticker } => {
            remove_security(&config, &portfolio, &ticker)
        }
        Commands::Add {
            portfolio,
            ticker,
            date,
            sell,
            value,
            shares,
            commission,
            fx_rate,
        } => add_transaction(
            &config,
            AddConfig {
                portfolio,
                ticker,
                date,
                sell,
                value,
                shares,
                commission,
                fx_rate,
            },
        ),
        Commands::Remove {
            portfolio,
            ticker,
            index,
        } => remove_transaction(&config, &portfolio, &ticker, index),
        Commands::Summary { portfolio } => show_summary(&config, &portfolio),
        Commands::Search { portfolio, ticker } => search(&config, &portfolio, &ticker),
        Commands::TaxYear { portfolio, year } => tax_year(&config, &portfolio, year),
        Commands::Import {
            portfolio,
            csv_file,
        } => import_csv(&config, &portfolio, &csv_file, cli.verbose),
    };

    if let Err(e) = result {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

fn new_portfolio(config: &Config, name: &str) -> anyhow::Result<()> {
    if portfolio_path(&config.data_dir, name).exists() {
        bail!("Portfolio {} already exists", name);
    }
    config.save_portfolio(&Portfolio::new(name))?;
    println!("{} {}", "Created portfolio".green(), name.bold());
    Ok(())
}

fn list_portfolios(config: &Config) -> anyhow::Result<()> {
    let names = list_names(&config.data_dir, PORTFOLIO_EXTENSION)?;
    println!("{}", "Saved Portfolios".cyan().bold());
    println!("{}", "================".cyan());
    if names.is_empty() {
        println!("  {}", "(none)".dimmed());
    }
    for name in names {
        println!("  - {}", name);
    }
    Ok(())
}

fn add_security(config: &Config, name: &str, ticker: &str) -> anyhow::Result<()> {
    let mut portfolio = config.load_portfolio(name)?;
    if !portfolio.add_security(ticker) {
        println!("{} {} is already tracked", "Note:".yellow(), ticker);
        return Ok(());
    }
    config.save_portfolio(&portfolio)?;
    println!("{} {}", "Added security".green(), ticker.bold());
    Ok(())
}

fn remove_security(config: &Config, name: &str, ticker: &str) -> anyhow::Result<()> {
    let mut portfolio = config.load_portfolio(name)?;
    if !portfolio.remove_security(ticker) {
        bail!("No security found that matches {}", ticker);
    }
    config.save_portfolio(&portfolio)?;
    println!("{} {}", "Removed security".green(), ticker.bold());
    Ok(())
}

fn add_transaction(config: &Config, cfg: AddConfig) -> anyhow::Result<()> {
    let mut portfolio = config.load_portfolio(&cfg.portfolio)?;
    let date = NaiveDate::parse_from_str(&cfg.date, DATE_FORMAT)
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", cfg.date))?;

    let mut record = TransactionRecord::new(
        cfg.ticker,
        date,
        TransactionSide::from_sell_flag(cfg.sell),
        cfg.value,
        cfg.shares,
        cfg.commission,
    )?;
    if let Some(rate) = cfg.fx_rate {
        record = record.in_foreign_currency(rate)?;
    }

    let ticker = record.ticker().to_string();
    let index = portfolio.add_transaction(record)?;
    config.save_portfolio(&portfolio)?;

    if let Some(added) = portfolio
        .search_transactions(&ticker)
        .ok()
        .and_then(|history| history.get(index))
    {
        println!("{}", "Transaction recorded".green().bold());
        print_record(config, added);
    }
    Ok(())
}

fn remove_transaction(
    config: &Config,
    name: &str,
    ticker: &str,
    index: usize,
) -> anyhow::Result<()> {
    let mut portfolio = config.load_portfolio(name)?;
    let removed = portfolio.remove_transaction(ticker, index)?;
    config.save_portfolio(&portfolio)?;
    println!("{}", "Transaction removed".green().bold());
    print_record(config, &removed);
    Ok(())
}

fn show_summary(config: &Config, name: &str) -> anyhow::Result<()> {
    let portfolio = config.load_portfolio(name)?;
    println!("{}", format!("Portfolio: {}", portfolio.name()).cyan().bold());
    println!("{}", "========================================".cyan());
    println!("{}", "Stock || Shares  ||    ACB      ||Txns".bold());
    for row in portfolio.summary() {
        println!("{}", row);
    }
    Ok(())
}

fn search(config: &Config, name: &str, ticker: &str) -> anyhow::Result<()> {
    let portfolio = config.load_portfolio(name)?;
    let history = portfolio.search_transactions(ticker)?;
    println!("{}", format!("History: {}", ticker).cyan().bold());
    println!("{}", "========================================".cyan());
    if history.is_empty() {
        println!("  {}", "(no transactions)".dimmed());
    }
    for (index, record) in history.iter().enumerate() {
        println!("{}", format!("[{}]", index).bold());
        print_record(config, record);
    }
    Ok(())
}

fn tax_year(config: &Config, name: &str, year: i32) -> anyhow::Result<()> {
    let portfolio = config.load_portfolio(name)?;
    let sells = portfolio.tax_year_transactions(year);
    println!("{}", format!("Tax Year {}", year).cyan().bold());
    println!("{}", "========================================".cyan());

    let mut total = 0.0;
    for record in &sells {
        print_record(config, record);
        total += record.realized_gain();
    }
    let total_str = format!("${:.2} {}", total, config.reporting_currency);
    let total_str = if total < 0.0 {
        total_str.red()
    } else {
        total_str.green()
    };
    println!(
        "  {} {} sells, net gain {}",
        "Total:".bold(),
        sells.len(),
        total_str
    );
    Ok(())
}

fn import_csv(config: &Config, name: &str, csv_file: &Path, verbose: bool) -> anyhow::Result<()> {
    let mut portfolio = if portfolio_path(&config.data_dir, name).exists() {
        config.load_portfolio(name)?
    } else {
        Portfolio::new(name)
    };

    let batch = CsvImporter::new(csv_file)
        .parse()
        .with_context(|| format!("Failed to import {}", csv_file.display()))?;
    if verbose {
        println!(
            "  {} {} securities, {} transactions",
            "Parsed:".bold(),
            batch.security_names().len(),
            batch.transactions().len()
        );
    }

    let summary = batch.add_to_portfolio(&mut portfolio)?;
    config.save_portfolio(&portfolio)?;

    println!("{}", "Import complete".green().bold());
    println!("  {} {}", "New securities:".bold(), summary.securities_added);
    println!(
        "  {} {}",
        "Existing securities:".bold(),
        summary.securities_existing
    );
    println!(
        "  {} {}",
        "Transactions:".bold(),
        summary.transactions_imported
    );
    Ok(())
}

fn print_record(config: &Config, record: &TransactionRecord) {
    let currency = config.currency_label(record.currency());
    println!(
        "  {} {} {} {} shares of {}",
        record.date().format("%Y-%b-%d"),
        record.side(),
        "-".dimmed(),
        record.shares(),
        record.ticker().bold()
    );
    println!(
        "    Value: ${:.2} {}  Commission: ${:.2} {}",
        record.gross_value(),
        currency,
        record.commission(),
        currency
    );
    if record.currency().is_foreign() {
        println!("    Exchange rate: {}", record.fx_rate());
    }
    if record.is_sell() {
        println!(
            "    Gain: ${:.2} {}",
            record.realized_gain(),
            config.reporting_currency
        );
    }
    println!(
        "    Shares: {}  ACB: ${:.2} {}",
        record.resulting_shares(),
        record.resulting_cost_base(),
        config.reporting_currency
    );
}
