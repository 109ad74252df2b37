//! Batch analysis command.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use vegmask::decode::{discover_images, load_batch};
use vegmask::{AnalysisConfig, Summary, run_batch, today_export_filename, write_csv};

/// Expand directories into their images; files are kept as given.
fn collect_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            let found = discover_images(input)
                .with_context(|| format!("Failed to scan: {}", input.display()))?;
            tracing::debug!(
                dir = %input.display(),
                images = found.len(),
                "scanned directory"
            );
            paths.extend(found);
        } else {
            paths.push(input.clone());
        }
    }
    Ok(paths)
}

pub fn run(
    inputs: &[PathBuf],
    output: Option<PathBuf>,
    config: &AnalysisConfig,
    verbose: bool,
) -> Result<()> {
    let paths = collect_inputs(inputs)?;
    if paths.is_empty() {
        bail!("No images found");
    }
    if verbose {
        eprintln!("Analyzing {} images", paths.len());
    }

    let images = load_batch(&paths).context("Failed to load images")?;
    let records = run_batch(&images, config).context("Batch analysis failed")?;

    let output = output.unwrap_or_else(|| PathBuf::from(today_export_filename()));
    write_csv(&output, &records, &config.indices, config.threshold)
        .with_context(|| format!("Failed to write: {}", output.display()))?;

    println!("Analyzed {} images", records.len());
    if let Some(summary) = Summary::coverage(&records) {
        println!("Vegetation coverage (%):");
        println!("  Mean: {:.2}, Median: {:.2}", summary.mean, summary.median);
        println!("  Min: {:.2}, Max: {:.2}", summary.min, summary.max);
        println!("  StdDev: {:.2}", summary.std_dev);
    }
    println!("Report written to: {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_inputs_keeps_files_and_expands_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let sub = dir.path().join("plots");
        std::fs::create_dir(&sub).unwrap();
        std::fs::write(sub.join("b.jpg"), b"x").unwrap();
        std::fs::write(sub.join("a.png"), b"x").unwrap();
        std::fs::write(sub.join("readme.md"), b"x").unwrap();
        let single = dir.path().join("z.jpg");

        let paths = collect_inputs(&[single.clone(), sub.clone()]).unwrap();
        assert_eq!(paths, vec![single, sub.join("a.png"), sub.join("b.jpg")]);
    }
}
