//! Ticker universe loading.

use csv::{ReaderBuilder, Trim};
use scan_core::error::UniverseError;
use scan_core::types::Ticker;
use std::path::Path;
use tracing::debug;

/// Accepted header names for the ticker column.
const TICKER_COLUMNS: [&str; 4] = ["ticker", "Ticker", "symbol", "Symbol"];

/// Parse an explicit ticker list.
///
/// Entries may themselves be comma-separated. Blank entries are skipped;
/// `entry` in a [`UniverseError::Malformed`] is the 1-based position among
/// the non-blank entries.
pub fn parse_tickers<S: AsRef<str>>(entries: &[S]) -> Result<Vec<Ticker>, UniverseError> {
    let tickers = entries
        .iter()
        .flat_map(|e| e.as_ref().split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, raw)| {
            Ticker::parse(raw).map_err(|source| UniverseError::Malformed { entry: i + 1, source })
        })
        .collect::<Result<Vec<_>, _>>()?;

    if tickers.is_empty() {
        return Err(UniverseError::Empty);
    }
    Ok(tickers)
}

/// Load tickers from a CSV file with a `ticker` or `symbol` column.
///
/// Other columns are ignored. Rows with a blank ticker are skipped; `entry`
/// in a [`UniverseError::Malformed`] is the file line number.
pub fn load_universe(path: &Path) -> Result<Vec<Ticker>, UniverseError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .map_err(csv_error)?;

    let column = reader
        .headers()
        .map_err(csv_error)?
        .iter()
        .position(|h| TICKER_COLUMNS.contains(&h))
        .ok_or(UniverseError::MissingColumn)?;

    let mut tickers = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_error)?;
        let raw = record.get(column).unwrap_or_default();
        if raw.is_empty() {
            continue;
        }

        let line = record.position().map_or(0, |p| p.line() as usize);
        let ticker = Ticker::parse(raw)
            .map_err(|source| UniverseError::Malformed { entry: line, source })?;
        tickers.push(ticker);
    }

    if tickers.is_empty() {
        return Err(UniverseError::Empty);
    }
    debug!("Loaded {} tickers from {}", tickers.len(), path.display());
    Ok(tickers)
}

fn csv_error(err: csv::Error) -> UniverseError {
    let message = err.to_string();
    match err.into_kind() {
        csv::ErrorKind::Io(e) => UniverseError::Io(e),
        _ => UniverseError::Parse(message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scan_core::error::TickerError;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn symbols(tickers: &[Ticker]) -> Vec<&str> {
        tickers.iter().map(Ticker::as_str).collect()
    }

    #[test]
    fn test_parse_list() {
        let tickers = parse_tickers(&["aapl, msft", " ", "BRK.B"]).unwrap();
        assert_eq!(symbols(&tickers), vec!["AAPL", "MSFT", "BRK.B"]);
    }

    #[test]
    fn test_parse_list_rejects_bad_entry() {
        let err = parse_tickers(&["AAPL", "12AB"]).unwrap_err();
        match err {
            UniverseError::Malformed { entry, source } => {
                assert_eq!(entry, 2);
                assert_eq!(source, TickerError::LeadingNonLetter("12AB".to_string()));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_parse_empty_list() {
        let empty: [&str; 0] = [];
        assert!(matches!(parse_tickers(&empty), Err(UniverseError::Empty)));
        assert!(matches!(parse_tickers(&[" , "]), Err(UniverseError::Empty)));
    }

    #[test]
    fn test_load_csv_with_extra_columns() {
        let file = csv_file("Symbol,Name,Sector\nAAPL,Apple,Tech\n\nmsft,Microsoft,Tech\n");
        let tickers = load_universe(file.path()).unwrap();
        assert_eq!(symbols(&tickers), vec!["AAPL", "MSFT"]);
    }

    #[test]
    fn test_load_csv_keeps_duplicates_and_order() {
        let file = csv_file("ticker\nNVDA\nAAPL\nNVDA\n");
        let tickers = load_universe(file.path()).unwrap();
        assert_eq!(symbols(&tickers), vec!["NVDA", "AAPL", "NVDA"]);
    }

    #[test]
    fn test_load_csv_reports_line() {
        let file = csv_file("ticker\nAAPL\nMSFT\nBAD$\n");
        match load_universe(file.path()).unwrap_err() {
            UniverseError::Malformed { entry, .. } => assert_eq!(entry, 4),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_load_csv_missing_column() {
        let file = csv_file("name,sector\nApple,Tech\n");
        assert!(matches!(
            load_universe(file.path()),
            Err(UniverseError::MissingColumn)
        ));
    }

    #[test]
    fn test_load_csv_only_header() {
        let file = csv_file("ticker\n");
        assert!(matches!(load_universe(file.path()), Err(UniverseError::Empty)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_universe(Path::new("/nonexistent/universe.csv")).unwrap_err();
        assert!(matches!(err, UniverseError::Io(_)));
    }
}
