//! Wide-format CSV import and export.
//!
//! Layout: `date,<market>...,<risk_free_column>` with ISO dates, close prices
//! per market and the annualized risk-free rate in percent. Empty cells are
//! missing values and are forward-filled during alignment.

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use super::provider::{DataError, DataSource, MarketDataProvider, RawPanel, RawRow};

/// Default header of the risk-free column.
pub const DEFAULT_RISK_FREE_COLUMN: &str = "risk_free_pct";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Reads a wide CSV file from disk.
#[derive(Debug, Clone)]
pub struct CsvProvider {
    path: PathBuf,
    risk_free_column: String,
}

impl CsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            risk_free_column: DEFAULT_RISK_FREE_COLUMN.to_string(),
        }
    }

    pub fn with_risk_free_column(mut self, column: impl Into<String>) -> Self {
        self.risk_free_column = column.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MarketDataProvider for CsvProvider {
    fn name(&self) -> &str {
        "csv"
    }

    fn fetch(
        &self,
        markets: &[String],
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
    ) -> Result<RawPanel, DataError> {
        let file = std::fs::File::open(&self.path)?;
        read_wide_csv(file, markets, &self.risk_free_column, start, end)
    }
}

/// Parse a wide CSV from any reader.
pub fn read_wide_csv<R: Read>(
    reader: R,
    markets: &[String],
    risk_free_column: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<RawPanel, DataError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = rdr.headers()?.clone();

    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let date_idx = column("date").ok_or_else(|| DataError::MissingColumn {
        column: "date".into(),
    })?;
    let market_idx = markets
        .iter()
        .map(|m| {
            column(m).ok_or_else(|| DataError::MissingColumn { column: m.clone() })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let rf_idx = column(risk_free_column);

    let mut rows = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        // Header is line 1.
        let line = i + 2;
        let raw_date = record.get(date_idx).unwrap_or("");
        let date = NaiveDate::parse_from_str(raw_date, DATE_FORMAT).map_err(|e| {
            DataError::Parse {
                line,
                reason: format!("bad date '{raw_date}': {e}"),
            }
        })?;
        if start.is_some_and(|s| date < s) || end.is_some_and(|e| date > e) {
            continue;
        }

        let prices = market_idx
            .iter()
            .map(|&idx| parse_cell(record.get(idx), line))
            .collect::<Result<Vec<_>, _>>()?;
        let risk_free_pct = match rf_idx {
            Some(idx) => parse_cell(record.get(idx), line)?,
            None => None,
        };

        rows.push(RawRow {
            date,
            prices,
            risk_free_pct,
        });
    }

    Ok(RawPanel {
        markets: markets.to_vec(),
        rows,
        has_risk_free: rf_idx.is_some(),
        source: DataSource::CsvImport,
    })
}

fn parse_cell(cell: Option<&str>, line: usize) -> Result<Option<f64>, DataError> {
    match cell {
        None => Ok(None),
        Some(s) if s.is_empty() || s.eq_ignore_ascii_case("nan") => Ok(None),
        Some(s) => s.parse::<f64>().map(Some).map_err(|e| DataError::Parse {
            line,
            reason: format!("bad number '{s}': {e}"),
        }),
    }
}

/// Write a raw panel back out in the same wide layout.
pub fn write_wide_csv<W: Write>(panel: &RawPanel, writer: W) -> Result<(), DataError> {
    let mut wtr = csv::Writer::from_writer(writer);

    let mut header = vec!["date".to_string()];
    header.extend(panel.markets.iter().cloned());
    if panel.has_risk_free {
        header.push(DEFAULT_RISK_FREE_COLUMN.to_string());
    }
    wtr.write_record(&header)?;

    let cell = |v: Option<f64>| v.map(|x| format!("{x:.6}")).unwrap_or_default();
    for row in &panel.rows {
        let mut record = vec![row.date.format(DATE_FORMAT).to_string()];
        record.extend(row.prices.iter().map(|p| cell(*p)));
        if panel.has_risk_free {
            record.push(cell(row.risk_free_pct));
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}
