use ordermap::OrderMap;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use validator::Validate;

/// The two enumerated analysis pathways.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PathwayKind {
    TumorNormal,
    TumorOnly,
}

/// VAF and frequency thresholds parameterizing the somatic filter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct VafThresholds {
    #[validate(range(min = 0.0, max = 1.0))]
    pub min_tumor_vaf: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub max_normal_vaf: f64,
    #[validate(range(min = 0.0))]
    pub min_tn_ratio: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub max_population_af: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub hotspot_min_vaf: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub clonal_threshold: f64,
}

/// The pathway configuration selected by the workflow router. A pure value:
/// filtering and weighting depend only on this and the per-variant fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathwayConfig {
    pub kind: PathwayKind,
    /// KB names in lookup order; empty means snapshot order.
    #[serde(default)]
    pub kb_priority_order: Vec<String>,
    /// Multiplier per KB category, each in [0, 1.5].
    pub evidence_weight_multipliers: OrderMap<String, f64>,
    pub vaf_thresholds: VafThresholds,
    pub require_hotspot_rescue: bool,
}

impl PathwayConfig {
    pub fn tumor_normal() -> PathwayConfig {
        PathwayConfig {
            kind: PathwayKind::TumorNormal,
            kb_priority_order: vec![],
            evidence_weight_multipliers: [
                ("clinical_evidence", 1.0),
                ("hotspots", 0.85),
                ("population", 0.2),
                ("computational", 0.5),
                ("conservation", 0.5),
            ]
            .into_iter()
            .map(|(category, multiplier)| (category.to_string(), multiplier))
            .collect(),
            vaf_thresholds: VafThresholds {
                min_tumor_vaf: 0.05,
                max_normal_vaf: 0.02,
                min_tn_ratio: 5.0,
                max_population_af: 1.0,
                hotspot_min_vaf: 0.05,
                clonal_threshold: 0.40,
            },
            require_hotspot_rescue: false,
        }
    }

    pub fn tumor_only() -> PathwayConfig {
        PathwayConfig {
            kind: PathwayKind::TumorOnly,
            kb_priority_order: vec![],
            evidence_weight_multipliers: [
                ("clinical_evidence", 1.0),
                ("hotspots", 1.0),
                ("population", 0.7),
                ("computational", 0.6),
                ("conservation", 0.5),
            ]
            .into_iter()
            .map(|(category, multiplier)| (category.to_string(), multiplier))
            .collect(),
            vaf_thresholds: VafThresholds {
                min_tumor_vaf: 0.10,
                max_normal_vaf: 0.02,
                min_tn_ratio: 0.0,
                max_population_af: 0.001,
                hotspot_min_vaf: 0.05,
                clonal_threshold: 0.35,
            },
            require_hotspot_rescue: true,
        }
    }

    pub fn multiplier(&self, category: &str) -> f64 {
        self.evidence_weight_multipliers
            .get(category)
            .copied()
            .unwrap_or(1.0)
    }
}

/// A cancer-type-specific partial override applied on top of the base
/// pathway by the router.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PathwayPatch {
    #[serde(default)]
    pub min_tumor_vaf: Option<f64>,
    #[serde(default)]
    pub max_normal_vaf: Option<f64>,
    #[serde(default)]
    pub min_tn_ratio: Option<f64>,
    #[serde(default)]
    pub max_population_af: Option<f64>,
    #[serde(default)]
    pub hotspot_min_vaf: Option<f64>,
    #[serde(default)]
    pub clonal_threshold: Option<f64>,
    #[serde(default)]
    pub evidence_weight_multipliers: OrderMap<String, f64>,
    #[serde(default)]
    pub require_hotspot_rescue: Option<bool>,
}

impl PathwayPatch {
    fn apply(&self, mut config: PathwayConfig) -> PathwayConfig {
        let thresholds = &mut config.vaf_thresholds;
        if let Some(value) = self.min_tumor_vaf {
            thresholds.min_tumor_vaf = value;
        }
        if let Some(value) = self.max_normal_vaf {
            thresholds.max_normal_vaf = value;
        }
        if let Some(value) = self.min_tn_ratio {
            thresholds.min_tn_ratio = value;
        }
        if let Some(value) = self.max_population_af {
            thresholds.max_population_af = value;
        }
        if let Some(value) = self.hotspot_min_vaf {
            thresholds.hotspot_min_vaf = value;
        }
        if let Some(value) = self.clonal_threshold {
            thresholds.clonal_threshold = value;
        }
        for (category, multiplier) in &self.evidence_weight_multipliers {
            config
                .evidence_weight_multipliers
                .insert(category.clone(), *multiplier);
        }
        if let Some(value) = self.require_hotspot_rescue {
            config.require_hotspot_rescue = value;
        }
        config
    }
}

/// The workflow router. A pure function of the analysis type, the cancer
/// type, and the configured per-cancer-type patches; no state.
pub fn route_pathway(
    kind: PathwayKind,
    cancer_type: Option<&str>,
    overrides: &OrderMap<String, PathwayPatch>,
) -> PathwayConfig {
    let base = match kind {
        PathwayKind::TumorNormal => PathwayConfig::tumor_normal(),
        PathwayKind::TumorOnly => PathwayConfig::tumor_only(),
    };
    match cancer_type.and_then(|code| overrides.get(code)) {
        Some(patch) => patch.apply(base),
        None => base,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    fn test_tumor_normal_defaults() {
        let config = PathwayConfig::tumor_normal();
        assert_eq!(config.vaf_thresholds.min_tumor_vaf, 0.05);
        assert_eq!(config.vaf_thresholds.max_normal_vaf, 0.02);
        assert_eq!(config.vaf_thresholds.min_tn_ratio, 5.0);
        assert_eq!(config.vaf_thresholds.clonal_threshold, 0.40);
        assert_eq!(config.multiplier("clinical_evidence"), 1.0);
        assert_eq!(config.multiplier("hotspots"), 0.85);
        assert_eq!(config.multiplier("population"), 0.2);
        assert_eq!(config.multiplier("computational"), 0.5);
        assert!(!config.require_hotspot_rescue);
    }

    #[rstest]
    fn test_tumor_only_defaults() {
        let config = PathwayConfig::tumor_only();
        assert_eq!(config.vaf_thresholds.min_tumor_vaf, 0.10);
        assert_eq!(config.vaf_thresholds.max_population_af, 0.001);
        assert_eq!(config.vaf_thresholds.hotspot_min_vaf, 0.05);
        assert_eq!(config.vaf_thresholds.clonal_threshold, 0.35);
        assert_eq!(config.multiplier("population"), 0.7);
        assert_eq!(config.multiplier("computational"), 0.6);
        assert_eq!(config.multiplier("conservation"), 0.5);
        assert!(config.require_hotspot_rescue);
    }

    #[rstest]
    fn test_unknown_multiplier_category_defaults_to_one() {
        let config = PathwayConfig::tumor_only();
        assert_eq!(config.multiplier("unheard_of"), 1.0);
    }

    #[rstest]
    fn test_thresholds_validate() {
        assert!(PathwayConfig::tumor_normal().vaf_thresholds.validate().is_ok());
        assert!(PathwayConfig::tumor_only().vaf_thresholds.validate().is_ok());

        let mut thresholds = PathwayConfig::tumor_only().vaf_thresholds;
        thresholds.min_tumor_vaf = 1.4;
        assert!(thresholds.validate().is_err());
    }

    #[rstest]
    fn test_router_applies_cancer_type_patch() {
        let mut overrides = OrderMap::new();
        overrides.insert(
            "MEL".to_string(),
            PathwayPatch {
                min_tumor_vaf: Some(0.08),
                ..PathwayPatch::default()
            },
        );

        let patched = route_pathway(PathwayKind::TumorOnly, Some("MEL"), &overrides);
        assert_eq!(patched.vaf_thresholds.min_tumor_vaf, 0.08);
        // Untouched fields keep the base pathway's values.
        assert_eq!(patched.vaf_thresholds.max_population_af, 0.001);

        let untouched = route_pathway(PathwayKind::TumorOnly, Some("LUAD"), &overrides);
        assert_eq!(untouched.vaf_thresholds.min_tumor_vaf, 0.10);
    }

    #[rstest]
    fn test_patch_overrides_multipliers() {
        let mut overrides = OrderMap::new();
        let mut patch = PathwayPatch::default();
        patch
            .evidence_weight_multipliers
            .insert("population".to_string(), 0.4);
        overrides.insert("PAAD".to_string(), patch);

        let patched = route_pathway(PathwayKind::TumorOnly, Some("PAAD"), &overrides);
        assert_eq!(patched.multiplier("population"), 0.4);
        assert_eq!(patched.multiplier("clinical_evidence"), 1.0);
    }

    #[rstest]
    fn test_router_is_pure() {
        let overrides = OrderMap::new();
        let a = route_pathway(PathwayKind::TumorNormal, Some("LUAD"), &overrides);
        let b = route_pathway(PathwayKind::TumorNormal, Some("LUAD"), &overrides);
        assert_eq!(a, b);
        let c = route_pathway(PathwayKind::TumorNormal, None, &overrides);
        assert_eq!(a, c);
    }
}
