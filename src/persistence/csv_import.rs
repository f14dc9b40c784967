//! CSV import of adjustedcostbase.ca exports
//!
//! An export holds a securities section, one quoted line per ticker, that
//! starts after the line containing `"ACB/Share"` and ends at the first blank
//! line. A transactions section follows, starting after the header line
//! containing `"Security","Date"`. Transaction fields are positional:
//!
//! | index | field                                  |
//! |-------|----------------------------------------|
//! | 0     | ticker                                 |
//! | 1     | date, `YYYY-Mon-DD`                    |
//! | 2     | `Buy` or `Sell`                        |
//! | 3     | value in reporting currency            |
//! | 4     | shares                                 |
//! | 6     | commission (empty for none)            |
//! | 14    | exchange rate, foreign trades only     |
//! | 15    | value in the foreign currency          |

use crate::currency::TradeCurrency;
use crate::error::{CapTrackError, Result};
use crate::finance::{TransactionRecord, TransactionSide};
use crate::persistence::import::ImportBatch;
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use std::fs;
use std::path::{Path, PathBuf};

const SECURITIES_MARKER: &str = "\"ACB/Share\"";
const TRANSACTIONS_MARKER: &str = "\"Security\",\"Date\"";
const DATE_FORMAT: &str = "%Y-%b-%d";

const TICKER_FIELD: usize = 0;
const DATE_FIELD: usize = 1;
const SIDE_FIELD: usize = 2;
const VALUE_FIELD: usize = 3;
const SHARES_FIELD: usize = 4;
const COMMISSION_FIELD: usize = 6;
const FX_RATE_FIELD: usize = 14;
const FOREIGN_VALUE_FIELD: usize = 15;

/// Reader for one export file
#[derive(Debug, Clone)]
pub struct CsvImporter {
    path: PathBuf,
}

impl CsvImporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the file
    pub fn parse(&self) -> Result<ImportBatch> {
        let contents = fs::read_to_string(&self.path)?;
        let batch = Self::parse_str(&contents)?;
        log::info!(
            "Parsed {} securities and {} transactions from {}",
            batch.security_names().len(),
            batch.transactions().len(),
            self.path.display()
        );
        Ok(batch)
    }

    /// Parse export content already in memory
    pub fn parse_str(contents: &str) -> Result<ImportBatch> {
        let mut lines = contents.lines().enumerate();

        let mut security_names = Vec::new();
        for (line_no, line) in section(&mut lines, SECURITIES_MARKER, "securities")? {
            let fields = parse_fields(line_no, line)?;
            let ticker = fields
                .get(TICKER_FIELD)
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .ok_or_else(|| corrupt(line_no, "missing security name"))?;
            security_names.push(ticker.to_string());
        }

        let mut transactions = Vec::new();
        for (line_no, line) in section(&mut lines, TRANSACTIONS_MARKER, "transactions")? {
            let fields = parse_fields(line_no, line)?;
            transactions.push(build_transaction(line_no, &fields)?);
        }

        Ok(ImportBatch::new(security_names, transactions))
    }
}

/// Skip to the line containing `marker` and collect the lines after it up to
/// the first blank line. Line numbers are 1-based.
fn section<'a, I>(lines: &mut I, marker: &str, name: &str) -> Result<Vec<(usize, &'a str)>>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    if !lines.any(|(_, line)| line.contains(marker)) {
        return Err(CapTrackError::CorruptFile(format!(
            "no {} section found (expected a line containing {})",
            name, marker
        )));
    }
    Ok(lines
        .take_while(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| (index + 1, line))
        .collect())
}

fn parse_fields(line_no: usize, line: &str) -> Result<StringRecord> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(line.as_bytes());
    reader
        .records()
        .next()
        .transpose()
        .map_err(|e| corrupt(line_no, &e.to_string()))?
        .ok_or_else(|| corrupt(line_no, "empty record"))
}

fn build_transaction(line_no: usize, fields: &StringRecord) -> Result<TransactionRecord> {
    let field = |index, name| required(fields, index, line_no, name);

    let ticker = field(TICKER_FIELD, "security")?;
    let date_str = field(DATE_FIELD, "date")?;
    let date = NaiveDate::parse_from_str(date_str, DATE_FORMAT)
        .map_err(|_| corrupt(line_no, &format!("unable to parse date '{}'", date_str)))?;
    let side: TransactionSide = field(SIDE_FIELD, "transaction type")?
        .parse()
        .map_err(|e: CapTrackError| corrupt(line_no, &e.to_string()))?;
    let shares_str = field(SHARES_FIELD, "shares")?;
    let shares: u64 = shares_str
        .parse()
        .map_err(|_| corrupt(line_no, &format!("invalid share count '{}'", shares_str)))?;
    let commission = match fields.get(COMMISSION_FIELD).map(str::trim) {
        None | Some("") => 0.0,
        Some(value) => parse_amount(line_no, "commission", value)?,
    };

    let foreign_rate = fields
        .get(FX_RATE_FIELD)
        .map(str::trim)
        .filter(|rate| !rate.is_empty());
    let (value, currency, fx_rate) = match foreign_rate {
        Some(rate) => (
            parse_amount(line_no, "foreign value", field(FOREIGN_VALUE_FIELD, "foreign value")?)?,
            TradeCurrency::Foreign,
            parse_amount(line_no, "exchange rate", rate)?,
        ),
        None => (
            parse_amount(line_no, "value", field(VALUE_FIELD, "value")?)?,
            TradeCurrency::Reporting,
            0.0,
        ),
    };

    TransactionRecord::new(ticker, date, side, value, shares, commission)
        .and_then(|record| record.with_currency(currency, fx_rate))
        .map_err(|e| corrupt(line_no, &e.to_string()))
}

fn required<'a>(fields: &'a StringRecord, index: usize, line_no: usize, name: &str) -> Result<&'a str> {
    fields
        .get(index)
        .map(str::trim)
        .ok_or_else(|| corrupt(line_no, &format!("missing {}", name)))
}

fn parse_amount(line_no: usize, name: &str, value: &str) -> Result<f64> {
    value
        .parse()
        .map_err(|_| corrupt(line_no, &format!("invalid {} '{}'", name, value)))
}

fn corrupt(line_no: usize, reason: &str) -> CapTrackError {
    CapTrackError::CorruptFile(format!("line {}: {}", line_no, reason))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
\"Simon's Portfolio\"

\"Security\",\"Shares\",\"ACB\",\"ACB/Share\"
\"BNS\",\"5\",\"547.09\",\"109.42\"
\"GOOG\",\"2\",\"3454.52\",\"1727.26\"

\"Security\",\"Date\",\"Transaction\",\"Amount\",\"Shares\",\"Amount/Share\",\"Commission\",\"Capital Gain\",\"Share Balance\",\"Change in ACB\",\"New ACB\",\"ACB/Share\",\"Memo\",\"Currency\",\"Exchange Rate\",\"Foreign Amount\"
\"BNS\",\"2018-Nov-20\",\"Buy\",\"1089.18\",\"10\",\"108.92\",\"4.99\",\"\",\"10\",\"1094.17\",\"1094.17\",\"109.42\",\"\",\"CAD\"
\"BNS\",\"2019-Jun-05\",\"Sell\",\"420.20\",\"5\",\"84.04\",\"4.99\",\"-131.88\",\"5\",\"-547.09\",\"547.09\",\"109.42\",\"\",\"CAD\"
\"GOOG\",\"2020-Mar-02\",\"Buy\",\"3446.52\",\"2\",\"1723.26\",\"\",\"\",\"2\",\"3446.52\",\"3446.52\",\"1723.26\",\"\",\"USD\",\"0.77\",\"2582.44\"
";

    #[test]
    fn test_parse_sample() {
        let batch = CsvImporter::parse_str(SAMPLE).unwrap();

        assert_eq!(batch.security_names(), &["BNS".to_string(), "GOOG".to_string()]);
        let txns = batch.transactions();
        assert_eq!(txns.len(), 3);

        assert!(txns[0].is_buy());
        assert_eq!(txns[0].date(), NaiveDate::from_ymd_opt(2018, 11, 20).unwrap());
        assert_eq!(txns[0].shares(), 10);
        assert_eq!(txns[0].commission(), 4.99);
        assert_eq!(txns[0].currency(), TradeCurrency::Reporting);

        assert!(txns[1].is_sell());
        assert_eq!(txns[1].gross_value(), 420.20);

        // Foreign trades take the foreign amount and the exchange rate
        assert_eq!(txns[2].currency(), TradeCurrency::Foreign);
        assert_relative_eq!(txns[2].fx_rate(), 0.77);
        assert_relative_eq!(txns[2].gross_value(), 2582.44);
        assert_eq!(txns[2].commission(), 0.0);
    }

    #[test]
    fn test_parse_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", SAMPLE).unwrap();
        file.flush().unwrap();

        let batch = CsvImporter::new(file.path()).parse().unwrap();
        assert_eq!(batch.transactions().len(), 3);
    }

    #[test]
    fn test_missing_file() {
        let importer = CsvImporter::new("./no/such/export.csv");
        assert!(matches!(importer.parse(), Err(CapTrackError::IoError(_))));
    }

    #[test]
    fn test_missing_marker_is_corrupt() {
        let err = CsvImporter::parse_str("\"BNS\",\"2018-Nov-20\"\n").unwrap_err();
        assert!(matches!(err, CapTrackError::CorruptFile(_)));
    }

    #[test]
    fn test_bad_date_is_corrupt() {
        let contents = SAMPLE.replace("2019-Jun-05", "2019-Jux-05");
        match CsvImporter::parse_str(&contents) {
            Err(CapTrackError::CorruptFile(msg)) => {
                assert!(msg.contains("line 9"), "{msg}");
                assert!(msg.contains("2019-Jux-05"), "{msg}");
            }
            other => panic!("expected corrupt file, got {:?}", other),
        }
    }

    #[test]
    fn test_bad_number_is_corrupt() {
        let contents = SAMPLE.replace("\"1089.18\"", "\"10x9.18\"");
        assert!(matches!(
            CsvImporter::parse_str(&contents),
            Err(CapTrackError::CorruptFile(_))
        ));
    }

    #[test]
    fn test_unknown_keyword_is_corrupt() {
        let contents = SAMPLE.replace("\"Sell\"", "\"Return of Capital\"");
        assert!(matches!(
            CsvImporter::parse_str(&contents),
            Err(CapTrackError::CorruptFile(_))
        ));
    }
}
