//! Single-image analysis command.

use std::path::Path;

use anyhow::{Context, Result};
use vegmask::decode::decode_file;
use vegmask::{AnalysisConfig, analyze};

pub fn run(input: &Path, config: &AnalysisConfig, json: bool, verbose: bool) -> Result<()> {
    if verbose {
        eprintln!("Analyzing: {}", input.display());
    }

    let buffer = decode_file(input)
        .with_context(|| format!("Failed to decode: {}", input.display()))?;
    let analysis = analyze(&buffer, config)
        .with_context(|| format!("Failed to analyze: {}", input.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
        return Ok(());
    }

    let result = &analysis.result;
    println!("{}", input.display());
    println!("{:-<60}", "");
    println!("Size: {}x{}", buffer.width(), buffer.height());
    let method = config.threshold;
    println!("Threshold: {method} ({:.4})", analysis.threshold);
    println!(
        "Vegetation: {} / {} pixels ({:.2}%)",
        result.vegetation_pixels, result.total_pixels, result.vegetation_coverage
    );
    println!();
    println!("{:<8} {:>12} {:>12}", "Index", "Vegetation", "Whole");
    for def in config.indices.definitions() {
        let veg = result.indices.vegetation.get(def.key).unwrap_or(f64::NAN);
        let whole = result.indices.whole.get(def.key).unwrap_or(f64::NAN);
        println!("{:<8} {:>12.4} {:>12.4}", def.key, veg, whole);
    }
    Ok(())
}
