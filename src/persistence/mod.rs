//! Persistence - JSON portfolio files, CSV import, saved file discovery

pub mod csv_import;
pub mod file_finder;
pub mod import;
pub mod json;

pub use csv_import::CsvImporter;
pub use file_finder::list_names;
pub use import::{ImportBatch, ImportSummary};
pub use json::{
    portfolio_path, read_names, read_portfolio, write_names, write_portfolio, PortfolioFile,
    PORTFOLIO_EXTENSION,
};
