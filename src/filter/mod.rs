use log::debug;

use crate::config::pathway::{PathwayConfig, PathwayKind};
use crate::kb::store::{KbStore, VariantQuery};
use crate::model::annotation::FunctionalAnnotation;
use crate::model::bundle::FilteredVariant;
use crate::model::variant::Variant;

/// Floor for the normal VAF in the tumor/normal ratio; keeps a clean normal
/// from producing a division by zero.
const NORMAL_VAF_EPSILON: f64 = 1e-4;
/// Variants seen in the panel of normals above this fraction of panel
/// samples are treated as recurrent artifacts or germline.
const PANEL_OF_NORMALS_MAX_FREQUENCY: f64 = 0.02;

#[derive(Debug, Clone, PartialEq)]
pub enum FilterDecision {
    /// The variant survives; hotspot rescue, when it happened, is recorded on
    /// the returned copy.
    Keep(Box<Variant>),
    Drop(FilteredVariant),
}

impl FilterDecision {
    fn drop_with(variant: &Variant, reason: &str) -> FilterDecision {
        FilterDecision::Drop(FilteredVariant {
            key: variant.key.clone(),
            reason: reason.to_string(),
        })
    }
}

/// Removes variants that cannot be somatic driver candidates. Decisions
/// depend only on per-variant fields and the pathway configuration, so input
/// order never matters.
#[derive(Debug)]
pub struct SomaticFilter<'a> {
    pathway: &'a PathwayConfig,
    store: &'a KbStore,
}

impl<'a> SomaticFilter<'a> {
    pub fn new(pathway: &'a PathwayConfig, store: &'a KbStore) -> SomaticFilter<'a> {
        SomaticFilter { pathway, store }
    }

    pub fn apply(
        &self,
        variant: Variant,
        annotation: &FunctionalAnnotation,
    ) -> FilterDecision {
        match self.pathway.kind {
            PathwayKind::TumorNormal => self.apply_tumor_normal(variant),
            PathwayKind::TumorOnly => self.apply_tumor_only(variant, annotation),
        }
    }

    fn apply_tumor_normal(&self, variant: Variant) -> FilterDecision {
        let thresholds = &self.pathway.vaf_thresholds;
        if variant.tumor_vaf < thresholds.min_tumor_vaf {
            return FilterDecision::drop_with(&variant, "low_tumor_vaf");
        }
        let normal_vaf = variant.normal_vaf.unwrap_or(0.0);
        if normal_vaf > thresholds.max_normal_vaf {
            return FilterDecision::drop_with(&variant, "high_normal_vaf");
        }
        let ratio = variant.tumor_vaf / normal_vaf.max(NORMAL_VAF_EPSILON);
        if ratio < thresholds.min_tn_ratio {
            return FilterDecision::drop_with(&variant, "low_tn_ratio");
        }
        FilterDecision::Keep(Box::new(variant))
    }

    fn apply_tumor_only(
        &self,
        variant: Variant,
        annotation: &FunctionalAnnotation,
    ) -> FilterDecision {
        let thresholds = &self.pathway.vaf_thresholds;
        let query = VariantQuery::from_variant(&variant);
        let rescue_available = self.pathway.require_hotspot_rescue
            && variant.tumor_vaf >= thresholds.hotspot_min_vaf
            && self.store.is_hotspot(&query);
        let mut rescued = false;

        if variant.tumor_vaf < thresholds.min_tumor_vaf {
            if !rescue_available {
                return FilterDecision::drop_with(&variant, "low_tumor_vaf");
            }
            rescued = true;
        }

        let max_af = annotation.max_population_af().unwrap_or(0.0);
        if max_af > thresholds.max_population_af {
            if !rescue_available {
                return FilterDecision::drop_with(&variant, "high_population_af");
            }
            rescued = true;
        }

        if let Some(panel_frequency) = self.store.panel_of_normals_frequency(&query)
            && panel_frequency > PANEL_OF_NORMALS_MAX_FREQUENCY
        {
            if !rescue_available {
                return FilterDecision::drop_with(&variant, "panel_of_normals");
            }
            rescued = true;
        }

        if rescued {
            debug!("Hotspot rescue applied to {}", variant.key);
            FilterDecision::Keep(Box::new(variant.with_hotspot_rescue()))
        } else {
            FilterDecision::Keep(Box::new(variant))
        }
    }
}
