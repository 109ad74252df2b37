//! RGB vegetation indices.
//!
//! Every index is a pure function of the chromatic coordinates of a pixel
//! (see [`NormalizedRgb`]). The set is fixed: sixteen definitions held in a
//! static table that is shared read-only by all analyses.
//!
//! | Key | Formula |
//! |-----|---------|
//! | INT | (r + g + b) / 3 |
//! | NRI | r |
//! | NGI | g |
//! | NBI | b |
//! | RGRI | r / g, 0 when g = 0 |
//! | ExR | 1.4r - g |
//! | ExG | 2g - r - b |
//! | ExB | 1.4b - g |
//! | ExGR | ExG - ExR |
//! | GRVI | (g - r) / (g + r), 0 when g + r = 0 |
//! | VARI | (g - r) / (g + r - b), 0 when the denominator is 0 |
//! | GLI | (2g - r - b) / (2g + r + b), 0 when the denominator is 0 |
//! | GLA | same as GLI |
//! | MGRVI | (g² - r²) / (g² + r²) |
//! | RGBVI | (g² - rb) / (g² + rb) |
//! | VEG | g / (r^0.667 · b^0.333) |
//!
//! MGRVI, RGBVI and VEG are deliberately unguarded: degenerate pixels
//! produce NaN or infinity and that propagates into the aggregated means.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::pixels::NormalizedRgb;

/// A named vegetation index formula.
#[derive(Debug, Clone, Copy)]
pub struct IndexDefinition {
    /// Unique short identifier, e.g. `ExG`.
    pub key: &'static str,
    /// Human readable name; never contains a comma.
    pub display_name: &'static str,
    /// The formula over normalized RGB.
    pub formula: fn(NormalizedRgb) -> f64,
}

impl IndexDefinition {
    /// Evaluate the index for one pixel.
    #[inline]
    #[must_use]
    pub fn evaluate(&self, px: NormalizedRgb) -> f64 {
        (self.formula)(px)
    }
}

impl PartialEq for IndexDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for IndexDefinition {}

fn intensity(p: NormalizedRgb) -> f64 {
    (p.r + p.g + p.b) / 3.0
}

fn normalized_red(p: NormalizedRgb) -> f64 {
    p.r
}

fn normalized_green(p: NormalizedRgb) -> f64 {
    p.g
}

fn normalized_blue(p: NormalizedRgb) -> f64 {
    p.b
}

fn red_green_ratio(p: NormalizedRgb) -> f64 {
    if p.g > 0.0 { p.r / p.g } else { 0.0 }
}

fn excess_red(p: NormalizedRgb) -> f64 {
    1.4 * p.r - p.g
}

fn excess_green(p: NormalizedRgb) -> f64 {
    p.excess_green()
}

fn excess_blue(p: NormalizedRgb) -> f64 {
    1.4 * p.b - p.g
}

fn excess_green_minus_red(p: NormalizedRgb) -> f64 {
    excess_green(p) - excess_red(p)
}

fn green_red_vegetation(p: NormalizedRgb) -> f64 {
    let denom = p.g + p.r;
    if denom > 0.0 {
        (p.g - p.r) / denom
    } else {
        0.0
    }
}

fn atmospherically_resistant(p: NormalizedRgb) -> f64 {
    let denom = p.g + p.r - p.b;
    if denom != 0.0 {
        (p.g - p.r) / denom
    } else {
        0.0
    }
}

fn green_leaf(p: NormalizedRgb) -> f64 {
    let denom = 2.0 * p.g + p.r + p.b;
    if denom != 0.0 {
        (2.0 * p.g - p.r - p.b) / denom
    } else {
        0.0
    }
}

fn modified_green_red(p: NormalizedRgb) -> f64 {
    let (g2, r2) = (p.g * p.g, p.r * p.r);
    (g2 - r2) / (g2 + r2)
}

fn red_green_blue_vegetation(p: NormalizedRgb) -> f64 {
    let g2 = p.g * p.g;
    let rb = p.r * p.b;
    (g2 - rb) / (g2 + rb)
}

fn vegetativen(p: NormalizedRgb) -> f64 {
    p.g / (p.r.powf(0.667) * p.b.powf(0.333))
}

const fn entry(
    key: &'static str,
    display_name: &'static str,
    formula: fn(NormalizedRgb) -> f64,
) -> IndexDefinition {
    IndexDefinition {
        key,
        display_name,
        formula,
    }
}

static REGISTRY: [IndexDefinition; 16] = [
    entry("INT", "Intensity", intensity),
    entry("NRI", "Normalized Red Index", normalized_red),
    entry("NGI", "Normalized Green Index", normalized_green),
    entry("NBI", "Normalized Blue Index", normalized_blue),
    entry("RGRI", "Red-Green Ratio Index", red_green_ratio),
    entry("ExR", "Excess Red", excess_red),
    entry("ExG", "Excess Green", excess_green),
    entry("ExB", "Excess Blue", excess_blue),
    entry(
        "ExGR",
        "Excess Green minus Excess Red",
        excess_green_minus_red,
    ),
    entry("GRVI", "Green-Red Vegetation Index", green_red_vegetation),
    entry(
        "VARI",
        "Visible Atmospherically Resistant Index",
        atmospherically_resistant,
    ),
    entry("GLI", "Green Leaf Index", green_leaf),
    entry("GLA", "Green Leaf Algorithm", green_leaf),
    entry(
        "MGRVI",
        "Modified Green-Red Vegetation Index",
        modified_green_red,
    ),
    entry(
        "RGBVI",
        "Red-Green-Blue Vegetation Index",
        red_green_blue_vegetation,
    ),
    entry("VEG", "Vegetativen", vegetativen),
];

/// All index definitions in registry order.
#[must_use]
pub fn registry() -> &'static [IndexDefinition] {
    &REGISTRY
}

/// Find an index by its key (case-sensitive).
#[must_use]
pub fn lookup(key: &str) -> Option<&'static IndexDefinition> {
    REGISTRY.iter().find(|def| def.key == key)
}

/// Find an index by its display name, as written in CSV headers.
#[must_use]
pub fn lookup_display_name(name: &str) -> Option<&'static IndexDefinition> {
    REGISTRY.iter().find(|def| def.display_name == name)
}

/// An ordered, duplicate-free choice of indices to compute.
///
/// Order is significant: results and CSV columns follow it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct IndexSelection(Vec<&'static IndexDefinition>);

impl IndexSelection {
    /// Every registered index, in registry order.
    #[must_use]
    pub fn all() -> Self {
        Self(REGISTRY.iter().collect())
    }

    /// Build a selection from keys, keeping the caller's order.
    pub fn from_keys<S: AsRef<str>>(keys: &[S]) -> Result<Self> {
        if keys.is_empty() {
            return Err(Error::invalid("at least one index must be selected"));
        }
        let mut defs: Vec<&'static IndexDefinition> = Vec::with_capacity(keys.len());
        for key in keys {
            let key = key.as_ref();
            let def = lookup(key)
                .ok_or_else(|| Error::invalid(format!("unknown index key: {key}")))?;
            if defs.contains(&def) {
                return Err(Error::invalid(format!("index {key} selected twice")));
            }
            defs.push(def);
        }
        Ok(Self(defs))
    }

    /// Parse a comma-separated key list such as `"ExG,VARI,GLI"`.
    pub fn parse(list: &str) -> Result<Self> {
        let keys: Vec<&str> = list
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .collect();
        Self::from_keys(&keys)
    }

    /// Selected definitions in order.
    #[must_use]
    pub fn definitions(&self) -> &[&'static IndexDefinition] {
        &self.0
    }

    /// Selected keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.0.iter().map(|def| def.key)
    }

    /// Number of selected indices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false: `from_keys`, `parse` and deserialization all reject an
    /// empty list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for IndexSelection {
    fn default() -> Self {
        Self::all()
    }
}

impl TryFrom<Vec<String>> for IndexSelection {
    type Error = Error;

    fn try_from(keys: Vec<String>) -> Result<Self> {
        Self::from_keys(&keys)
    }
}

impl From<IndexSelection> for Vec<String> {
    fn from(selection: IndexSelection) -> Self {
        selection.keys().map(str::to_string).collect()
    }
}
