//! CSV reading with encoding and delimiter auto-detection.
//!
//! Produces a [`RawTable`] of untyped [`PriceObservation`] rows. Typing and
//! cleaning happen in [`crate::transform::clean`]; the only checks here are
//! structural (readable file, header present, expected columns present).

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::{PriceObservation, RawRow};

/// Columns the input header must contain.
pub const REQUIRED_COLUMNS: [&str; 14] = [
    "date",
    "admin1",
    "admin2",
    "market",
    "latitude",
    "longitude",
    "category",
    "commodity",
    "unit",
    "priceflag",
    "pricetype",
    "currency",
    "price",
    "usdprice",
];

/// A parsed input file with metadata
#[derive(Debug, Clone)]
pub struct RawTable {
    pub rows: Vec<RawRow>,
    /// Detected or used encoding
    pub encoding: String,
    /// Detected or used delimiter
    pub delimiter: char,
    pub headers: Vec<String>,
    /// Whether a marker row (hashtags or a repeated header) followed the header
    pub marker_row_skipped: bool,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> CsvResult<String> {
    let decoded = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(e) => {
                return Err(CsvError::EncodingError(format!(
                    "invalid UTF-8 at byte {}",
                    e.valid_up_to()
                )))
            }
        },
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        // Unknown charset: best effort
        _ => String::from_utf8_lossy(bytes).into_owned(),
    };

    Ok(decoded.trim_start_matches('\u{feff}').to_string())
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse a file with auto-detection of encoding and delimiter.
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<RawTable> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

/// Parse bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<RawTable> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    parse_str(&content, delimiter, encoding)
}

/// Parse already-decoded content with an explicit delimiter.
pub fn parse_str(content: &str, delimiter: char, encoding: String) -> CsvResult<RawTable> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let header_record = reader
        .headers()
        .map_err(|e| CsvError::ParseError { line: 1, message: e.to_string() })?
        .clone();

    let headers: Vec<String> = header_record.iter().map(|h| h.to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .filter(|col| !headers.iter().any(|h| h == *col))
        .map(|col| col.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(CsvError::MissingColumns(missing));
    }

    let mut rows = Vec::new();
    let mut marker_row_skipped = false;
    let mut first_data_row = true;

    for result in reader.records() {
        let record = result.map_err(|e| CsvError::ParseError {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);

        if record.iter().all(|field| field.is_empty()) {
            continue;
        }

        if first_data_row {
            first_data_row = false;
            if is_marker_row(&record, &header_record) {
                marker_row_skipped = true;
                continue;
            }
        }

        let observation: PriceObservation = record
            .deserialize(Some(&header_record))
            .map_err(|e| CsvError::ParseError { line, message: e.to_string() })?;

        rows.push(RawRow { line, observation });
    }

    Ok(RawTable {
        rows,
        encoding,
        delimiter,
        headers,
        marker_row_skipped,
    })
}

/// A row of hashtags (`#date,#adm1+name,...`) or a verbatim repeat of the header.
fn is_marker_row(record: &csv::StringRecord, headers: &csv::StringRecord) -> bool {
    let hashtags = record.get(0).is_some_and(|first| first.starts_with('#'));
    let repeated_header = record.len() == headers.len() && record.iter().eq(headers.iter());
    hashtags || repeated_header
}
