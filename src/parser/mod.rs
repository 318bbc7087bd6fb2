//! CSV to [`Table`] parser with encoding and delimiter auto-detection.
//!
//! Converts CSV text into an in-memory record table. All cells come out as
//! text (or null for empty fields); numeric coercion happens later in the
//! loader. No dataset-specific logic here.

use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::table::{Cell, Table};

/// Result of parsing with metadata.
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed record table.
    pub table: Table,
    /// Detected or used encoding.
    pub encoding: String,
    /// Detected or used delimiter.
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
///
/// Unknown encodings and invalid byte sequences fall back to lossy UTF-8,
/// so decoding itself never fails.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).to_string()),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        _ => String::from_utf8_lossy(bytes).to_string(),
    }
}

/// Detect the delimiter by counting occurrences in the first line.
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

/// Parse CSV text into a table with an explicit delimiter.
///
/// Headers are trimmed of surrounding whitespace (a dataset exported as
/// `"BuildingArea "` must still resolve as `BuildingArea`). Empty fields
/// become [`Cell::Null`]; everything else stays text.
///
/// # Example
/// ```ignore
/// use propsum::parse_str;
///
/// let table = parse_str("Suburb,Price\nRichmond,1000000", ',').unwrap();
/// assert_eq!(table.row_count(), 1);
/// assert_eq!(table.headers(), ["Suburb", "Price"]);
/// ```
pub fn parse_str(content: &str, delimiter: char) -> CsvResult<Table> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];

    for record in reader.records() {
        let record = record?;
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }
        for (i, col) in columns.iter_mut().enumerate() {
            let raw = record.get(i).map(str::trim).unwrap_or("");
            col.push(if raw.is_empty() {
                Cell::Null
            } else {
                Cell::Text(raw.to_string())
            });
        }
    }

    Table::from_columns(headers.into_iter().zip(columns).collect())
        .map_err(|e| CsvError::Parse(e.to_string()))
}

/// Parse CSV bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let table = parse_str(&content, delimiter)?;

    Ok(ParseResult {
        table,
        encoding,
        delimiter,
    })
}

/// Parse a CSV file with auto-detection of encoding and delimiter.
///
/// # Example
/// ```ignore
/// let result = parse_file_auto("melb_data.csv")?;
/// println!("Encoding: {}, Delimiter: '{}'", result.encoding, result.delimiter);
/// println!("Rows: {}", result.table.row_count());
/// ```
pub fn parse_file_auto<P: AsRef<Path>>(path: P) -> CsvResult<ParseResult> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_bytes_auto(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_simple_csv() {
        let table = parse_str("Suburb,Price\nRichmond,1000000\nCarlton,750000", ',').unwrap();

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.headers(), ["Suburb", "Price"]);
        assert_eq!(table.column("Suburb").unwrap()[0], "Richmond".into());
        assert_eq!(table.column("Price").unwrap()[1], "750000".into());
    }

    #[test]
    fn test_headers_trimmed() {
        let table = parse_str("Suburb , BuildingArea \nRichmond,120", ',').unwrap();
        assert_eq!(table.headers(), ["Suburb", "BuildingArea"]);
    }

    #[test]
    fn test_quoted_field_with_delimiter() {
        let table = parse_str("Address,Price\n\"25 Bligh St, Richmond\",1000000", ',').unwrap();
        assert_eq!(
            table.column("Address").unwrap()[0],
            "25 Bligh St, Richmond".into()
        );
    }

    #[test]
    fn test_missing_values_become_null() {
        let table = parse_str("a,b,c\n1,,3", ',').unwrap();
        assert_eq!(table.column("a").unwrap()[0], "1".into());
        assert!(table.column("b").unwrap()[0].is_null());
        assert_eq!(table.column("c").unwrap()[0], "3".into());
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = parse_str("a,b\n1,2\n,\n3,4\n", ',').unwrap();
        assert_eq!(table.row_count(), 2);
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_str("", ','), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_str("  \n ", ','), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter_comma() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
    }

    #[test]
    fn test_detect_delimiter_semicolon() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
    }

    #[test]
    fn test_detect_delimiter_tab() {
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto(b"Suburb;Price\nRichmond;1000000").unwrap();
        assert_eq!(result.delimiter, ';');
        assert_eq!(result.table.row_count(), 1);
        assert_eq!(result.table.headers(), ["Suburb", "Price"]);
    }

    #[test]
    fn test_parse_file_auto() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Suburb,Price\nRichmond,1000000\n").unwrap();

        let result = parse_file_auto(file.path()).unwrap();
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.table.row_count(), 1);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = parse_file_auto("/no/such/file.csv");
        assert!(matches!(result, Err(CsvError::Io(_))));
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert!(decoded.contains("Soci"));
    }

    #[test]
    fn test_invalid_utf8_decodes_lossily() {
        let bytes: &[u8] = &[b'a', b',', b'b', b'\n', 0xFF, b',', b'1'];
        let decoded = decode_content(bytes, "utf-8");
        assert!(decoded.starts_with("a,b"));
    }
}
