use std::fs;
use std::path::Path;

use log::{debug, info};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::error::ConstructionError;
use crate::model::variant::{Variant, VariantType};

/// VAF histogram bin width for the peak model.
const BIN_WIDTH: f64 = 0.02;
/// VAFs outside this window are ignored; they are dominated by noise or
/// homozygous germline calls.
const VAF_WINDOW: (f64, f64) = (0.05, 0.95);
/// Below this many usable SNVs the peak model is not attempted.
const MIN_VARIANTS_FOR_PEAK: usize = 10;
/// Confidence assigned to user-supplied purity metadata.
const METADATA_CONFIDENCE: f64 = 0.9;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PuritySource {
    Upstream,
    Metadata,
    VafPeak,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PurityEstimate {
    pub value: f64,
    pub source: PuritySource,
    pub confidence: f64,
}

impl PurityEstimate {
    /// Fallback when nothing usable is available: an agnostic mid-range
    /// purity that the DSC scorer will discount.
    fn agnostic() -> PurityEstimate {
        PurityEstimate {
            value: 0.5,
            source: PuritySource::VafPeak,
            confidence: 0.1,
        }
    }
}

/// Structured purity output from an upstream caller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UpstreamPurity {
    pub purity: f64,
    #[serde(default = "default_upstream_confidence")]
    pub confidence: f64,
}

fn default_upstream_confidence() -> f64 {
    0.95
}

pub fn read_upstream_purity(path: &Path) -> Result<UpstreamPurity, ConstructionError> {
    let raw = fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|source| ConstructionError::PurityParse {
        path: path.to_path_buf(),
        source,
    })
}

/// Derives tumor purity with the fixed priority order: upstream structured
/// output, then user metadata, then the VAF-peak model.
pub fn estimate_purity(
    upstream: Option<UpstreamPurity>,
    metadata_purity: Option<f64>,
    variants: &[Variant],
) -> PurityEstimate {
    if let Some(upstream) = upstream {
        info!("Tumor purity {} taken from upstream output", upstream.purity);
        return PurityEstimate {
            value: upstream.purity.clamp(0.0, 1.0),
            source: PuritySource::Upstream,
            confidence: upstream.confidence.clamp(0.0, 1.0),
        };
    }
    if let Some(purity) = metadata_purity {
        info!("Tumor purity {purity} taken from sample metadata");
        return PurityEstimate {
            value: purity.clamp(0.0, 1.0),
            source: PuritySource::Metadata,
            confidence: METADATA_CONFIDENCE,
        };
    }
    vaf_peak_estimate(variants).unwrap_or_else(PurityEstimate::agnostic)
}

/// The VAF-peak model: histogram high-quality heterozygous SNVs and compare
/// three hypotheses about the dominant peak -- heterozygous diploid (peak at
/// purity/2), LOH (peak at purity), and a subclonal mixture (multiple
/// peaks). The hypothesis with maximal likelihood under a simple Gaussian
/// mixture wins; confidence comes from peak sharpness.
pub fn vaf_peak_estimate(variants: &[Variant]) -> Option<PurityEstimate> {
    let vafs: Vec<f64> = variants
        .iter()
        .filter(|v| v.variant_type == VariantType::Snv)
        .filter(|v| is_heterozygous(&v.genotype))
        .map(|v| v.tumor_vaf)
        .filter(|vaf| (VAF_WINDOW.0..=VAF_WINDOW.1).contains(vaf))
        .collect();
    if vafs.len() < MIN_VARIANTS_FOR_PEAK {
        debug!(
            "VAF-peak model skipped: {} usable SNVs (minimum {MIN_VARIANTS_FOR_PEAK})",
            vafs.len()
        );
        return None;
    }

    let histogram = histogram(&vafs);
    let peaks = find_peaks(&histogram);
    let (primary_bin, _) = *peaks.first()?;
    let peak_vaf = bin_center(primary_bin);

    // Candidate purities per hypothesis.
    let het_diploid = (2.0 * peak_vaf).min(1.0);
    let loh = peak_vaf;
    let subclonal = peaks
        .get(1)
        .map(|&(bin, _)| (2.0 * bin_center(bin).max(peak_vaf)).min(1.0));

    let mut best: Option<(f64, f64, &'static str)> = None;
    let mut candidates = vec![(het_diploid, "het_diploid"), (loh, "loh")];
    if let Some(subclonal) = subclonal {
        candidates.push((subclonal, "subclonal"));
    }
    for (purity, hypothesis) in candidates {
        let likelihood = mixture_likelihood(&vafs, purity);
        if best.is_none_or(|(l, _, _)| likelihood > l) {
            best = Some((likelihood, purity, hypothesis));
        }
    }
    let (_, purity, hypothesis) = best?;

    // Sharpness: mass in the modal bin and its neighbours over total mass.
    let neighbour_mass: usize = (primary_bin.saturating_sub(1)..=primary_bin + 1)
        .map(|bin| histogram.get(bin).copied().unwrap_or(0))
        .sum();
    let confidence = (neighbour_mass as f64 / vafs.len() as f64).clamp(0.0, 1.0);

    debug!(
        "VAF-peak purity {purity:.2} under '{hypothesis}' hypothesis (confidence {confidence:.2})"
    );
    Some(PurityEstimate {
        value: purity.clamp(0.0, 1.0),
        source: PuritySource::VafPeak,
        confidence,
    })
}

fn is_heterozygous(genotype: &str) -> bool {
    matches!(genotype, "0/1" | "0|1" | "1/0" | "1|0")
}

fn histogram(vafs: &[f64]) -> Vec<usize> {
    let bins = (1.0 / BIN_WIDTH).ceil() as usize;
    let mut histogram = vec![0usize; bins];
    for &vaf in vafs {
        let bin = ((vaf / BIN_WIDTH) as usize).min(bins - 1);
        histogram[bin] += 1;
    }
    histogram
}

fn bin_center(bin: usize) -> f64 {
    (bin as f64 + 0.5) * BIN_WIDTH
}

/// Local maxima, sorted by mass descending then bin ascending for
/// determinism.
fn find_peaks(histogram: &[usize]) -> Vec<(usize, usize)> {
    let mut peaks: Vec<(usize, usize)> = histogram
        .iter()
        .enumerate()
        .filter(|&(bin, &mass)| {
            if mass == 0 {
                return false;
            }
            let left = if bin == 0 { 0 } else { histogram[bin - 1] };
            let right = histogram.get(bin + 1).copied().unwrap_or(0);
            mass >= left && mass >= right
        })
        .map(|(bin, &mass)| (bin, mass))
        .collect();
    peaks.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    peaks
}

/// Mean density of the observed VAFs under a two-mode Gaussian mixture with
/// modes at purity/2 and purity.
fn mixture_likelihood(vafs: &[f64], purity: f64) -> f64 {
    const SIGMA: f64 = 0.05;
    let modes = [purity / 2.0, purity];
    let total: f64 = vafs
        .iter()
        .map(|vaf| {
            modes
                .iter()
                .map(|mode| (-((vaf - mode) / SIGMA).powi(2)).exp())
                .fold(0.0f64, f64::max)
        })
        .sum();
    total / vafs.len() as f64
}
