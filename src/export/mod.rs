//! CSV export of batch results.
//!
//! Layout, header first:
//!
//! ```text
//! Filename,Total Pixels,Vegetation Pixels,Vegetation Coverage (%),Threshold Method,Threshold Value,<Index> (Vegetation)...,<Index> (Whole)...
//! ```
//!
//! Coverage has 2 decimals, a fixed threshold 3, index means 4. Rows follow
//! the record order and index columns follow the selection order. Fields
//! are only quoted when they contain a delimiter, quote or newline, which
//! never happens for the fixed columns or index names.

use std::path::Path;

use chrono::NaiveDate;

use crate::error::{Error, Result};
use crate::indices::IndexSelection;
use crate::report::BatchRecord;
use crate::threshold::ThresholdMethod;

/// The six leading columns of every export.
pub const FIXED_COLUMNS: [&str; 6] = [
    "Filename",
    "Total Pixels",
    "Vegetation Pixels",
    "Vegetation Coverage (%)",
    "Threshold Method",
    "Threshold Value",
];

/// Suffix of the per-index columns computed over the vegetation mask.
pub const VEGETATION_SUFFIX: &str = " (Vegetation)";

/// Suffix of the per-index columns computed over the whole image.
pub const WHOLE_SUFFIX: &str = " (Whole)";

/// Format a value with fixed decimals; non-finite values become
/// `NaN`, `Infinity` or `-Infinity`.
#[must_use]
pub fn format_value(value: f64, decimals: usize) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "" } else { "-" };
        format!("{sign}Infinity")
    } else {
        format!("{value:.decimals$}")
    }
}

/// Header row for a selection.
#[must_use]
pub fn header(selection: &IndexSelection) -> Vec<String> {
    let mut columns: Vec<String> = FIXED_COLUMNS.iter().map(|c| (*c).to_string()).collect();
    for suffix in [VEGETATION_SUFFIX, WHOLE_SUFFIX] {
        for def in selection.definitions() {
            columns.push(format!("{}{suffix}", def.display_name));
        }
    }
    columns
}

fn row(
    record: &BatchRecord,
    selection: &IndexSelection,
    method: ThresholdMethod,
) -> Result<Vec<String>> {
    let result = &record.result;
    let mut fields = vec![
        record.filename.clone(),
        result.total_pixels.to_string(),
        result.vegetation_pixels.to_string(),
        format_value(result.vegetation_coverage, 2),
        method.code().to_string(),
        method.value_label(),
    ];
    for (population, means) in [
        ("vegetation", &result.indices.vegetation),
        ("whole", &result.indices.whole),
    ] {
        for key in selection.keys() {
            let mean = means.get(key).ok_or_else(|| {
                Error::invalid(format!(
                    "{}: no {population} mean for index {key}",
                    record.filename
                ))
            })?;
            fields.push(format_value(mean, 4));
        }
    }
    Ok(fields)
}

/// Serialize records to a CSV document.
///
/// Every record must carry means for every selected index.
pub fn export_csv(
    records: &[BatchRecord],
    selection: &IndexSelection,
    method: ThresholdMethod,
) -> Result<Vec<u8>> {
    method.validate()?;
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(b',')
        .terminator(csv::Terminator::Any(b'\n'))
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    wtr.write_record(header(selection))?;
    for record in records {
        wtr.write_record(row(record, selection, method)?)?;
    }

    wtr.into_inner().map_err(|e| Error::Io(e.into_error()))
}

/// Export and write to `path`.
///
/// The document is fully built before the file is touched, so a failed
/// export never leaves a partial file behind.
pub fn write_csv(
    path: &Path,
    records: &[BatchRecord],
    selection: &IndexSelection,
    method: ThresholdMethod,
) -> Result<()> {
    let bytes = export_csv(records, selection, method)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)?;
    tracing::info!(
        path = %path.display(),
        rows = records.len(),
        "wrote CSV export"
    );
    Ok(())
}

/// Conventional file name for an export made on `date`.
#[must_use]
pub fn default_export_filename(date: NaiveDate) -> String {
    format!("vegetation_analysis_{}.csv", date.format("%Y-%m-%d"))
}

/// [`default_export_filename`] for the local current date.
#[must_use]
pub fn today_export_filename() -> String {
    default_export_filename(chrono::Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::{AnalysisResult, IndexMeans, IndexSummary};

    fn record(name: &str, total: u64, veg: u64, means: &[(&str, f64, f64)]) -> BatchRecord {
        BatchRecord::new(
            name,
            AnalysisResult {
                total_pixels: total,
                vegetation_pixels: veg,
                vegetation_coverage: 100.0 * veg as f64 / total as f64,
                indices: IndexSummary {
                    vegetation: IndexMeans::from_pairs(means.iter().map(|&(k, v, _)| (k, v))),
                    whole: IndexMeans::from_pairs(means.iter().map(|&(k, _, w)| (k, w))),
                },
            },
        )
    }

    #[test]
    fn test_exact_layout_auto() {
        let sel = IndexSelection::parse("ExG,GLI").unwrap();
        let a = [("ExG", 0.5, 0.123456), ("GLI", 0.25, -0.1)];
        let b = [("ExG", 1.0, 1.0), ("GLI", 0.33333, 0.33333)];
        let records = vec![record("a.jpg", 3, 1, &a), record("b.jpg", 4, 4, &b)];
        let bytes = export_csv(&records, &sel, ThresholdMethod::Auto).unwrap();
        let csv = String::from_utf8(bytes).unwrap();
        let expected = "\
Filename,Total Pixels,Vegetation Pixels,Vegetation Coverage (%),Threshold Method,Threshold Value,Excess Green (Vegetation),Green Leaf Index (Vegetation),Excess Green (Whole),Green Leaf Index (Whole)
a.jpg,3,1,33.33,otsu,auto,0.5000,0.2500,0.1235,-0.1000
b.jpg,4,4,100.00,otsu,auto,1.0000,0.3333,1.0000,0.3333
";
        assert_eq!(csv, expected);
    }

    #[test]
    fn test_fixed_threshold_columns() {
        let sel = IndexSelection::parse("INT").unwrap();
        let records = vec![record("x.png", 2, 0, &[("INT", 0.0, 0.3333)])];
        let method = ThresholdMethod::Fixed(0.05);
        let bytes = export_csv(&records, &sel, method).unwrap();
        let csv = String::from_utf8(bytes).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "x.png,2,0,0.00,exg,0.050,0.0000,0.3333");
    }

    #[test]
    fn test_non_finite_values() {
        assert_eq!(format_value(f64::NAN, 4), "NaN");
        assert_eq!(format_value(f64::INFINITY, 4), "Infinity");
        assert_eq!(format_value(f64::NEG_INFINITY, 2), "-Infinity");
        assert_eq!(format_value(12.345678, 2), "12.35");
    }

    #[test]
    fn test_header_only_for_empty_batch() {
        let sel = IndexSelection::parse("VEG").unwrap();
        let csv = export_csv(&[], &sel, ThresholdMethod::Auto).unwrap();
        assert_eq!(csv.iter().filter(|&&b| b == b'\n').count(), 1);
    }

    #[test]
    fn test_missing_index_is_rejected() {
        let sel = IndexSelection::parse("ExG,VARI").unwrap();
        let records = vec![record("a.jpg", 1, 1, &[("ExG", 1.0, 1.0)])];
        assert!(matches!(
            export_csv(&records, &sel, ThresholdMethod::Auto),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn test_comma_in_filename_is_quoted() {
        let sel = IndexSelection::parse("ExG").unwrap();
        let records = vec![record("plot 1, north.jpg", 1, 1, &[("ExG", 1.0, 1.0)])];
        let bytes = export_csv(&records, &sel, ThresholdMethod::Auto).unwrap();
        let csv = String::from_utf8(bytes).unwrap();
        let row = csv.lines().nth(1).unwrap();
        assert!(row.starts_with("\"plot 1, north.jpg\",1,1,"));
    }

    #[test]
    fn test_output_is_deterministic() {
        let sel = IndexSelection::parse("ExG").unwrap();
        let records = vec![record("a.jpg", 7, 3, &[("ExG", 0.7, 0.2)])];
        let method = ThresholdMethod::Fixed(-0.2);
        let a = export_csv(&records, &sel, method).unwrap();
        let b = export_csv(&records, &sel, method).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_write_csv_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("report.csv");
        let sel = IndexSelection::parse("ExG").unwrap();
        let records = vec![record("a.jpg", 1, 1, &[("ExG", 2.0, 2.0)])];
        let method = ThresholdMethod::Auto;
        write_csv(&path, &records, &sel, method).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with("a.jpg,1,1,100.00,otsu,auto,2.0000,2.0000\n"));
    }

    #[test]
    fn test_failed_export_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.csv");
        let sel = IndexSelection::parse("GLI").unwrap();
        let records = vec![record("a.jpg", 1, 1, &[("ExG", 2.0, 2.0)])];
        let result = write_csv(&path, &records, &sel, ThresholdMethod::Auto);
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_default_filename_is_dated() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let name = default_export_filename(date);
        assert_eq!(name, "vegetation_analysis_2024-03-09.csv");
        assert!(today_export_filename().starts_with("vegetation_analysis_"));
    }
}
