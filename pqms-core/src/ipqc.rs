//! In-process quality control calculations.
//!
//! The evaluator is called on every keystroke of a partially filled form, so
//! it never fails: unusable input degrades to a zero-valued result.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IpqcFormula {
    /// Mass / volume style quotients, `s[0] / s[1]`.
    Ratio,
    /// Tapped density / bulk density.
    Hausner,
    /// Compressibility index, `100 × (tapped − bulk) / tapped`.
    Carrs,
    /// Angle of repose from cone height and radius.
    Angle,
    /// Loss on drying, `100 × (initial − final) / initial`.
    Lod,
    Friability,
    #[serde(alias = "avg")]
    Average,
}

impl IpqcFormula {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "ratio" => Some(IpqcFormula::Ratio),
            "hausner" => Some(IpqcFormula::Hausner),
            "carrs" => Some(IpqcFormula::Carrs),
            "angle" => Some(IpqcFormula::Angle),
            "lod" => Some(IpqcFormula::Lod),
            "friability" => Some(IpqcFormula::Friability),
            "avg" | "average" => Some(IpqcFormula::Average),
            _ => None,
        }
    }

    fn zero(&self) -> &'static str {
        match self {
            IpqcFormula::Carrs | IpqcFormula::Lod | IpqcFormula::Friability => "0%",
            IpqcFormula::Angle => "0°",
            IpqcFormula::Ratio | IpqcFormula::Hausner | IpqcFormula::Average => "0",
        }
    }
}

impl fmt::Display for IpqcFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            IpqcFormula::Ratio => "ratio",
            IpqcFormula::Hausner => "hausner",
            IpqcFormula::Carrs => "carrs",
            IpqcFormula::Angle => "angle",
            IpqcFormula::Lod => "lod",
            IpqcFormula::Friability => "friability",
            IpqcFormula::Average => "avg",
        };
        f.write_str(tag)
    }
}

/// Keeps the entries that read as finite numbers, in order.
pub fn parse_samples<S: AsRef<str>>(inputs: &[S]) -> Vec<f64> {
    inputs
        .iter()
        .filter_map(|s| s.as_ref().trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .collect()
}

/// Formats the derived result of `samples` for the given formula.
pub fn evaluate(formula: IpqcFormula, samples: &[f64]) -> String {
    let samples: Vec<f64> = samples.iter().copied().filter(|v| v.is_finite()).collect();
    let zero = formula.zero().to_string();

    if samples.is_empty() {
        return zero;
    }

    let first = samples[0];
    let second = samples.get(1).copied();

    let formatted = match formula {
        IpqcFormula::Ratio => quotient(first, second).map(|q| format!("{:.3}", q)),
        IpqcFormula::Hausner => quotient(first, second).map(|q| format!("{:.2}", q)),
        IpqcFormula::Angle => {
            quotient(first, second).map(|q| format!("{:.1}°", q.atan() * (180.0 / PI)))
        }
        IpqcFormula::Carrs | IpqcFormula::Lod => {
            relative_loss(first, second).map(|pct| format!("{:.2}%", pct))
        }
        IpqcFormula::Friability => relative_loss(first, second).map(|pct| format!("{:.3}%", pct)),
        IpqcFormula::Average => {
            let mean = samples.iter().sum::<f64>() / samples.len() as f64;
            mean.is_finite().then(|| format!("{:.3}", mean))
        }
    };

    formatted.unwrap_or(zero)
}

/// `numerator / denominator`, or `None` when the divisor is missing or zero
/// or the quotient overflows.
fn quotient(numerator: f64, denominator: Option<f64>) -> Option<f64> {
    let q = numerator / nonzero(denominator)?;
    q.is_finite().then_some(q)
}

fn nonzero(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v != 0.0)
}

fn relative_loss(initial: f64, after: Option<f64>) -> Option<f64> {
    if initial == 0.0 {
        return None;
    }
    let pct = 100.0 * (initial - after?) / initial;
    pct.is_finite().then_some(pct)
}

/// An entry of the in-process test catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IpqcTest {
    pub name: &'static str,
    pub category: &'static str,
    pub specification: &'static str,
    pub sample_size: usize,
    pub labels: &'static [&'static str],
    pub formula: IpqcFormula,
    pub forms: &'static [&'static str],
}

const POWDERS: &[&str] = &["Powder", "Granulation", "Tablet", "Capsule"];
const SOLIDS: &[&str] = &["Tablet", "Capsule"];
const TABLET: &[&str] = &["Tablet"];
const LIQUID: &[&str] = &["Liquid"];

pub const IPQC_CATALOG: &[IpqcTest] = &[
    IpqcTest { name: "Bulk Density", category: "Physical", specification: "0.4 - 0.6 g/mL", sample_size: 2, labels: &["Mass (g)", "Bulk Vol (mL)"], formula: IpqcFormula::Ratio, forms: POWDERS },
    IpqcTest { name: "Tapped Density", category: "Physical", specification: "0.5 - 0.7 g/mL", sample_size: 2, labels: &["Mass (g)", "Tapped Vol (mL)"], formula: IpqcFormula::Ratio, forms: POWDERS },
    IpqcTest { name: "Hausner Ratio", category: "Flowability", specification: "1.00 - 1.11", sample_size: 2, labels: &["Tapped Density", "Bulk Density"], formula: IpqcFormula::Hausner, forms: POWDERS },
    IpqcTest { name: "Carr's Index", category: "Flowability", specification: "NMT 15%", sample_size: 2, labels: &["Tapped Density", "Bulk Density"], formula: IpqcFormula::Carrs, forms: POWDERS },
    IpqcTest { name: "Angle of Repose", category: "Flowability", specification: "25° - 35°", sample_size: 2, labels: &["Height (cm)", "Radius (cm)"], formula: IpqcFormula::Angle, forms: POWDERS },
    IpqcTest { name: "Moisture Content (LOD)", category: "Chemical", specification: "NMT 2.0%", sample_size: 2, labels: &["Initial Wt", "Final Wt"], formula: IpqcFormula::Lod, forms: POWDERS },
    IpqcTest { name: "Sieve Analysis", category: "Physical", specification: "Complies with MFR", sample_size: 1, labels: &[], formula: IpqcFormula::Average, forms: &["Granulation", "Tablet", "Capsule"] },
    IpqcTest { name: "Average Weight", category: "Weight Control", specification: "Target ± 5%", sample_size: 20, labels: &[], formula: IpqcFormula::Average, forms: SOLIDS },
    IpqcTest { name: "Weight Variation", category: "Statistical", specification: "Complies BP/USP", sample_size: 20, labels: &[], formula: IpqcFormula::Average, forms: SOLIDS },
    IpqcTest { name: "Hardness", category: "Physical", specification: "5.0 - 15.0 kp", sample_size: 10, labels: &[], formula: IpqcFormula::Average, forms: TABLET },
    IpqcTest { name: "Friability", category: "Physical", specification: "NMT 1.0%", sample_size: 10, labels: &["Initial Wt", "Final Wt"], formula: IpqcFormula::Friability, forms: TABLET },
    IpqcTest { name: "Thickness", category: "Physical", specification: "Target ± 0.2mm", sample_size: 10, labels: &[], formula: IpqcFormula::Average, forms: TABLET },
    IpqcTest { name: "Diameter", category: "Physical", specification: "Target ± 0.1mm", sample_size: 5, labels: &[], formula: IpqcFormula::Average, forms: TABLET },
    IpqcTest { name: "Disintegration Time", category: "Physical", specification: "NMT 15 min", sample_size: 6, labels: &[], formula: IpqcFormula::Average, forms: SOLIDS },
    IpqcTest { name: "Fill Volume", category: "Physical", specification: "Target ± 2%", sample_size: 10, labels: &[], formula: IpqcFormula::Average, forms: LIQUID },
    IpqcTest { name: "Specific Gravity", category: "Physical", specification: "1.0 - 1.2 g/mL", sample_size: 2, labels: &["Liquid Mass", "Water Mass"], formula: IpqcFormula::Ratio, forms: LIQUID },
    IpqcTest { name: "pH Value", category: "Chemical", specification: "As per Monograph", sample_size: 1, labels: &[], formula: IpqcFormula::Average, forms: &["Liquid", "Powder"] },
    IpqcTest { name: "Leak Test", category: "Packaging", specification: "Zero Leakage", sample_size: 10, labels: &[], formula: IpqcFormula::Average, forms: &["Tablet", "Capsule", "Liquid"] },
    IpqcTest { name: "Appearance", category: "Identity", specification: "Standard Texture", sample_size: 1, labels: &[], formula: IpqcFormula::Average, forms: &["Tablet", "Capsule", "Liquid", "Powder"] },
];

/// Catalog lookup, case-insensitive on the test name.
pub fn find_test(name: &str) -> Option<&'static IpqcTest> {
    let wanted = name.trim();
    IPQC_CATALOG.iter().find(|t| t.name.eq_ignore_ascii_case(wanted))
}

/// Tests missing from the catalog are averaged.
pub fn formula_for_test(name: &str) -> IpqcFormula {
    find_test(name).map_or(IpqcFormula::Average, |t| t.formula)
}

pub fn tests_for_form(form: &str) -> Vec<&'static IpqcTest> {
    IPQC_CATALOG
        .iter()
        .filter(|t| t.forms.iter().any(|f| f.eq_ignore_ascii_case(form)))
        .collect()
}

/// Evaluates a named catalog test over raw form inputs.
pub fn evaluate_test<S: AsRef<str>>(test_name: &str, inputs: &[S]) -> String {
    evaluate(formula_for_test(test_name), &parse_samples(inputs))
}
