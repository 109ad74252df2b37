//! Read exported CSV documents back into records.
//!
//! The header determines the index selection: index columns are matched
//! to the registry by display name. All rows must share one threshold
//! method and value.
//!
//! ```rust,ignore
//! use vegmask::import::parse_csv;
//!
//! let report = parse_csv(&std::fs::read_to_string("vegetation_analysis_2024-05-01.csv")?)?;
//! for record in &report.records {
//!     println!("{}: {:.2}%", record.filename, record.result.vegetation_coverage);
//! }
//! ```

use std::path::Path;

use crate::error::{Error, Result};
use crate::export::{FIXED_COLUMNS, VEGETATION_SUFFIX, WHOLE_SUFFIX};
use crate::indices::{IndexSelection, lookup_display_name};
use crate::report::{AnalysisResult, BatchRecord, IndexMeans, IndexSummary};
use crate::threshold::ThresholdMethod;

/// Contents of an exported CSV document.
#[derive(Debug, Clone)]
pub struct ImportedReport {
    /// Indices found in the header, in column order.
    pub selection: IndexSelection,
    /// Threshold method shared by the rows; `None` for a header-only file.
    pub method: Option<ThresholdMethod>,
    /// One record per row, in file order.
    pub records: Vec<BatchRecord>,
}

fn header_error(reason: impl Into<String>) -> Error {
    Error::CsvImport {
        line: 1,
        reason: reason.into(),
    }
}

fn parse_header(headers: &csv::StringRecord) -> Result<IndexSelection> {
    if headers.len() < FIXED_COLUMNS.len() {
        return Err(header_error(format!(
            "expected at least {} columns, found {}",
            FIXED_COLUMNS.len(),
            headers.len()
        )));
    }
    for (i, expected) in FIXED_COLUMNS.iter().enumerate() {
        if &headers[i] != *expected {
            return Err(header_error(format!(
                "column {} should be '{expected}', found '{}'",
                i + 1,
                &headers[i]
            )));
        }
    }

    let index_columns: Vec<&str> = headers.iter().skip(FIXED_COLUMNS.len()).collect();
    if index_columns.is_empty() || index_columns.len() % 2 != 0 {
        return Err(header_error("index columns must come in pairs"));
    }
    let (veg_cols, whole_cols) = index_columns.split_at(index_columns.len() / 2);

    let mut keys = Vec::with_capacity(veg_cols.len());
    for (veg, whole) in veg_cols.iter().zip(whole_cols) {
        let Some(name) = veg.strip_suffix(VEGETATION_SUFFIX) else {
            return Err(header_error(format!("'{veg}' is not a vegetation column")));
        };
        if whole.strip_suffix(WHOLE_SUFFIX) != Some(name) {
            return Err(header_error(format!("'{whole}' does not match '{veg}'")));
        }
        let def = lookup_display_name(name)
            .ok_or_else(|| header_error(format!("unknown index '{name}'")))?;
        keys.push(def.key);
    }
    IndexSelection::from_keys(&keys)
        .map_err(|e| header_error(e.to_string()))
}

fn parse_method(code: &str, value: &str) -> Option<ThresholdMethod> {
    match (code, value) {
        ("otsu", "auto") => Some(ThresholdMethod::Auto),
        ("exg", v) => v.parse().ok().and_then(|v| ThresholdMethod::fixed(v).ok()),
        _ => None,
    }
}

fn parse_row(
    row: &csv::StringRecord,
    line: usize,
    selection: &IndexSelection,
) -> Result<(BatchRecord, ThresholdMethod)> {
    let err = |reason: String| Error::CsvImport { line, reason };
    let expected = FIXED_COLUMNS.len() + 2 * selection.len();
    let found = row.len();
    if found != expected {
        return Err(err(format!("expected {expected} fields, found {found}")));
    }

    let int = |i: usize| -> Result<u64> {
        row[i]
            .parse()
            .map_err(|_| err(format!("'{}' is not a pixel count", &row[i])))
    };
    let float = |i: usize| -> Result<f64> {
        row[i]
            .parse()
            .map_err(|_| err(format!("'{}' is not a number", &row[i])))
    };

    let total_pixels = int(1)?;
    let vegetation_pixels = int(2)?;
    if vegetation_pixels > total_pixels {
        return Err(err("vegetation pixels exceed total pixels".to_string()));
    }
    let vegetation_coverage = float(3)?;
    let method = parse_method(&row[4], &row[5])
        .ok_or_else(|| err(format!("bad threshold {} / {}", &row[4], &row[5])))?;

    let n = selection.len();
    let base = FIXED_COLUMNS.len();
    let mut veg = Vec::with_capacity(n);
    let mut whole = Vec::with_capacity(n);
    for (i, key) in selection.keys().enumerate() {
        veg.push((key, float(base + i)?));
        whole.push((key, float(base + n + i)?));
    }

    let record = BatchRecord::new(
        &row[0],
        AnalysisResult {
            total_pixels,
            vegetation_pixels,
            vegetation_coverage,
            indices: IndexSummary {
                vegetation: IndexMeans::from_pairs(veg),
                whole: IndexMeans::from_pairs(whole),
            },
        },
    );
    Ok((record, method))
}

/// Parse an exported CSV document.
pub fn parse_csv(text: &str) -> Result<ImportedReport> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let selection = parse_header(rdr.headers()?)?;
    let mut method: Option<ThresholdMethod> = None;
    let mut records = Vec::new();

    for row in rdr.records() {
        let row = row?;
        let line = row.position().map_or(0, |p| p.line() as usize);
        let (record, row_method) = parse_row(&row, line, &selection)?;
        match method {
            None => method = Some(row_method),
            Some(m) if m != row_method => {
                return Err(Error::CsvImport {
                    line,
                    reason: format!("threshold {row_method} differs from earlier rows ({m})"),
                });
            }
            Some(_) => {}
        }
        records.push(record);
    }

    Ok(ImportedReport {
        selection,
        method,
        records,
    })
}

/// Read and parse an exported CSV file.
pub fn read_csv(path: &Path) -> Result<ImportedReport> {
    let text = std::fs::read_to_string(path)?;
    parse_csv(&text)
}
