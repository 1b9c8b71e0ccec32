use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::engine_config::DscConfig;
use crate::model::annotation::FunctionalAnnotation;
use crate::model::variant::Variant;
use crate::purity::PurityEstimate;

/// Tolerance above the purity ceiling before a VAF starts looking germline.
const VAF_CEILING_MARGIN: f64 = 0.05;
/// Width of the consistency kernel around each expected VAF mode.
const MODE_SIGMA: f64 = 0.15;

/// Dynamic somatic confidence: the posterior that a variant is truly somatic
/// given VAF/purity consistency, the somatic-vs-germline prior from evidence
/// sources, and genomic context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DscScore {
    pub value: f64,
    pub vaf_purity_component: f64,
    pub prior_component: f64,
    pub context_component: f64,
    pub rationale: String,
}

#[derive(Debug, Clone)]
pub struct DscScorer {
    config: DscConfig,
}

impl DscScorer {
    pub fn new(config: DscConfig) -> DscScorer {
        DscScorer { config }
    }

    pub fn score(
        &self,
        variant: &Variant,
        annotation: &FunctionalAnnotation,
        purity: &PurityEstimate,
        hotspot_count: Option<u32>,
    ) -> DscScore {
        let purity_confident = purity.confidence >= self.config.purity_confidence_floor;
        let vaf_purity = vaf_purity_component(variant.tumor_vaf, purity.value, purity_confident);
        let prior = prior_component(annotation, hotspot_count);
        // The context slot is reserved: it reports neutral and its weight is
        // redistributed over the informative components until a real
        // LOH/signature analysis plugs in.
        let context = 0.5;

        let (w_vaf, w_prior, _w_context) = self.config.normalized_weights();
        let informative_weight = w_vaf + w_prior;
        let value = if informative_weight <= f64::EPSILON {
            0.5
        } else {
            ((w_vaf * vaf_purity + w_prior * prior) / informative_weight).clamp(0.0, 1.0)
        };

        let rationale = format!(
            "vaf_purity={vaf_purity:.2} ({}), prior={prior:.2}, context reserved (neutral)",
            if purity_confident {
                "purity-informed"
            } else {
                "purity discounted"
            }
        );
        debug!("DSC for {}: {value:.3} [{rationale}]", variant.key);

        DscScore {
            value,
            vaf_purity_component: vaf_purity,
            prior_component: prior,
            context_component: context,
            rationale,
        }
    }
}

/// Rewards VAFs compatible with a somatic origin at the estimated purity and
/// penalizes VAFs only a germline allele could reach.
fn vaf_purity_component(tumor_vaf: f64, purity: f64, purity_confident: bool) -> f64 {
    if !purity_confident {
        return 0.5;
    }
    let ceiling = purity + VAF_CEILING_MARGIN;
    if tumor_vaf <= ceiling {
        // Any VAF under the purity ceiling is plausible somatic; proximity to
        // a canonical mode (het-diploid, hemizygous, subclonal) adds reward.
        let modes = [purity / 2.0, purity, purity / 4.0];
        let proximity = modes
            .iter()
            .map(|mode| (-((tumor_vaf - mode) / MODE_SIGMA).powi(2)).exp())
            .fold(0.0f64, f64::max);
        (0.7 + 0.3 * proximity).clamp(0.0, 1.0)
    } else {
        // VAF above what the purity supports: increasingly germline-like.
        let excess = tumor_vaf - ceiling;
        (0.6 - 3.0 * excess).clamp(0.05, 0.6)
    }
}

/// Somatic-vs-germline prior from hotspot recurrence and population
/// frequency.
fn prior_component(annotation: &FunctionalAnnotation, hotspot_count: Option<u32>) -> f64 {
    let mut prior: f64 = 0.5;
    match hotspot_count {
        Some(count) if count >= 50 => prior += 0.45,
        Some(count) if count >= 10 => prior += 0.3,
        Some(_) => prior += 0.15,
        None => {}
    }
    match annotation.max_population_af() {
        None => prior += 0.1,
        Some(af) if af > 0.05 => prior = 0.02,
        Some(af) if af > 0.01 => prior -= 0.35,
        Some(af) if af > 0.001 => prior -= 0.2,
        Some(_) => {}
    }
    prior.clamp(0.0, 1.0)
}
