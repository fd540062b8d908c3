//! Record source: fetch a table and decode it into row records.
//!
//! Converts delimited-text tables into JSON objects, one per row, keyed by
//! column header. Encoding and delimiter are auto-detected; the rime tables
//! circulate in assorted encodings (UTF-8, GB variants, latin exports) and
//! with assorted separators, so nothing here assumes a fixed format.
//!
//! No aggregation logic lives in this module: it only produces the ordered
//! record sequence the engine consumes.

use serde_json::{json, Map, Value};
use std::path::Path;

use crate::error::{SourceError, SourceResult};

/// A decoded table with parsing metadata.
#[derive(Debug, Clone)]
pub struct TableData {
    /// Row records as JSON objects, in table order.
    pub records: Vec<Value>,
    /// Column headers, in table order.
    pub headers: Vec<String>,
    /// Detected or used encoding.
    pub encoding: String,
    /// Detected or used delimiter.
    pub delimiter: char,
}

// =============================================================================
// Record Source Seam
// =============================================================================

/// Anything that can resolve a location to a decoded table.
///
/// The viewer and the tests depend on this seam rather than on the
/// filesystem, so a stale-load scenario can be driven by a fake source.
pub trait RecordSource {
    /// Load and decode the table at `location`.
    fn load(
        &self,
        location: &str,
    ) -> impl std::future::Future<Output = SourceResult<TableData>> + Send;
}

/// Default source: local paths, plus `http(s)://` locations via reqwest.
#[derive(Debug, Clone, Default)]
pub struct AutoSource;

impl RecordSource for AutoSource {
    async fn load(&self, location: &str) -> SourceResult<TableData> {
        let bytes = if location.starts_with("http://") || location.starts_with("https://") {
            fetch_url(location).await?
        } else {
            tokio::fs::read(location).await?
        };
        parse_table_bytes(&bytes)
    }
}

/// Fetch raw table bytes over HTTP.
async fn fetch_url(url: &str) -> SourceResult<Vec<u8>> {
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

// =============================================================================
// Encoding / Delimiter Detection
// =============================================================================

/// Detect the encoding of raw bytes using chardet.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    // Normalize charset names
    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "gb2312" | "gbk" | "gb18030" => "gb18030".to_string(),
        "big5" | "big5-hkscs" => "big5".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to string using the specified encoding.
pub fn decode_content(bytes: &[u8], encoding: &str) -> SourceResult<String> {
    let content = match encoding.to_lowercase().as_str() {
        "utf-8" | "utf8" | "ascii" => String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).to_string()),
        "gb18030" | "gbk" | "gb2312" => encoding_rs::GB18030.decode(bytes).0.to_string(),
        "big5" => encoding_rs::BIG5.decode(bytes).0.to_string(),
        "iso-8859-1" | "latin-1" | "latin1" => {
            encoding_rs::ISO_8859_15.decode(bytes).0.to_string()
        }
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.to_string(),
        // Fallback: UTF-8 with lossy conversion
        _ => String::from_utf8_lossy(bytes).to_string(),
    };

    // NUL bytes mean a binary format (e.g. a raw spreadsheet), not a
    // delimited text table.
    if content.contains('\0') {
        return Err(SourceError::Decode(
            "binary content is not a delimited table".to_string(),
        ));
    }

    Ok(content)
}

/// Detect the delimiter by counting occurrences in the header line.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [';', ',', '\t', '|'];
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

// =============================================================================
// Parsing
// =============================================================================

/// Parse table bytes with auto-detection of encoding and delimiter.
pub fn parse_table_bytes(bytes: &[u8]) -> SourceResult<TableData> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding)?;
    let delimiter = detect_delimiter(&content);
    parse_table(&content, delimiter, encoding)
}

/// Parse a table file with auto-detection of encoding and delimiter.
pub fn parse_table_file<P: AsRef<Path>>(path: P) -> SourceResult<TableData> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_table_bytes(&bytes)
}

/// Parse decoded table text with an explicit delimiter.
///
/// Each row becomes a JSON object keyed by column header. Cells are kept
/// as strings; blank cells become empty strings and it is the engine's
/// business to treat those as absent.
pub fn parse_table(content: &str, delimiter: char, encoding: String) -> SourceResult<TableData> {
    let mut lines = content.lines();

    let header_line = lines.next().ok_or(SourceError::EmptyTable)?;

    let headers: Vec<String> = header_line
        .split(delimiter)
        .map(|s| s.trim().trim_matches('"').to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(SourceError::NoHeaders);
    }

    let mut records = Vec::new();

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }

        let values: Vec<&str> = line.split(delimiter).collect();
        let mut obj = Map::new();

        for (i, header) in headers.iter().enumerate() {
            let raw_value = values
                .get(i)
                .map(|s| s.trim().trim_matches('"'))
                .unwrap_or("");

            obj.insert(header.clone(), json!(raw_value));
        }

        records.push(Value::Object(obj));
    }

    Ok(TableData {
        records,
        headers,
        encoding,
        delimiter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_simple_table() {
        let table = "韵字,上古韵部,中古韵部\n魚,魚,模\n普,魚,姥";
        let data = parse_table(table, ',', "utf-8".into()).unwrap();

        assert_eq!(data.records.len(), 2);
        assert_eq!(data.headers, vec!["韵字", "上古韵部", "中古韵部"]);
        assert_eq!(data.records[0]["韵字"], "魚");
        assert_eq!(data.records[1]["中古韵部"], "姥");
    }

    #[test]
    fn test_record_order_matches_table_order() {
        let table = "韵字,上古韵部\n甲,之\n乙,幽\n丙,宵";
        let data = parse_table(table, ',', "utf-8".into()).unwrap();

        let chars: Vec<&str> = data
            .records
            .iter()
            .map(|r| r["韵字"].as_str().unwrap())
            .collect();
        assert_eq!(chars, vec!["甲", "乙", "丙"]);
    }

    #[test]
    fn test_missing_cells_become_empty_strings() {
        let table = "韵字,上古韵部,中古韵部\n魚,,模";
        let data = parse_table(table, ',', "utf-8".into()).unwrap();

        assert_eq!(data.records[0]["上古韵部"], "");
        assert_eq!(data.records[0]["中古韵部"], "模");
    }

    #[test]
    fn test_short_rows_padded_with_empty() {
        let table = "a,b,c\n1,2";
        let data = parse_table(table, ',', "utf-8".into()).unwrap();
        assert_eq!(data.records[0]["c"], "");
    }

    #[test]
    fn test_empty_lines_skipped() {
        let table = "a,b\n1,2\n\n3,4\n";
        let data = parse_table(table, ',', "utf-8".into()).unwrap();
        assert_eq!(data.records.len(), 2);
    }

    #[test]
    fn test_quoted_values() {
        let table = "韵字;中古韵部\n\"魚\";\"模\"";
        let data = parse_table(table, ';', "utf-8".into()).unwrap();
        assert_eq!(data.records[0]["韵字"], "魚");
        assert_eq!(data.records[0]["中古韵部"], "模");
    }

    #[test]
    fn test_empty_table_error() {
        assert!(matches!(
            parse_table("", ',', "utf-8".into()),
            Err(SourceError::EmptyTable)
        ));
    }

    #[test]
    fn test_no_headers_error() {
        assert!(matches!(
            parse_table(",,\n1,2,3", ',', "utf-8".into()),
            Err(SourceError::NoHeaders)
        ));
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
    fn test_detect_delimiter_pipe() {
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_auto_parse_utf8() {
        let table = "韵字,上古韵部\n魚,魚";
        let data = parse_table_bytes(table.as_bytes()).unwrap();
        assert_eq!(data.delimiter, ',');
        assert_eq!(data.records.len(), 1);
    }

    #[test]
    fn test_binary_content_rejected() {
        // PK zip magic followed by NULs, i.e. the start of an xlsx file
        let bytes: &[u8] = &[0x50, 0x4B, 0x03, 0x04, 0x00, 0x00, 0x00, 0x00];
        let result = parse_table_bytes(bytes);
        assert!(matches!(result, Err(SourceError::Decode(_))));
    }

    #[test]
    fn test_gb18030_decoding() {
        // "魚" in GB18030
        let bytes: &[u8] = &[0xF6, 0xE3];
        let decoded = decode_content(bytes, "gb18030").unwrap();
        assert_eq!(decoded, "魚");
    }

    #[test]
    fn test_parse_table_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "韵字,上古韵部,中古韵部\n魚,魚,模\n").unwrap();

        let data = parse_table_file(file.path()).unwrap();
        assert_eq!(data.records.len(), 1);
        assert_eq!(data.records[0]["上古韵部"], "魚");
    }

    #[tokio::test]
    async fn test_auto_source_loads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "韵字,上古韵部,中古韵部\n普,魚,姥\n").unwrap();

        let source = AutoSource;
        let data = source.load(file.path().to_str().unwrap()).await.unwrap();
        assert_eq!(data.records.len(), 1);
    }

    #[tokio::test]
    async fn test_auto_source_missing_file() {
        let source = AutoSource;
        let result = source.load("/nonexistent/rime.csv").await;
        assert!(matches!(result, Err(SourceError::Io(_))));
    }
}
