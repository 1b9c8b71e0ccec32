use std::path::Path;

use config::{Config, File};
use log::info;
use ordermap::OrderMap;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::config::cancer_type::CancerTaxonomy;
use crate::config::pathway::PathwayPatch;
use crate::error::ConstructionError;
use crate::model::variant::Assembly;

/// Quality pre-filter thresholds applied during normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct QualityThresholds {
    pub min_depth: u32,
    #[validate(range(min = 0.0))]
    pub min_mapping_quality: f64,
    /// Maximum Fisher strand bias (PHRED scale).
    #[validate(range(min = 0.0))]
    pub max_strand_bias: f64,
    #[validate(range(min = 0.0))]
    pub min_quality_by_depth: f64,
}

impl Default for QualityThresholds {
    fn default() -> QualityThresholds {
        QualityThresholds {
            min_depth: 20,
            min_mapping_quality: 30.0,
            max_strand_bias: 60.0,
            min_quality_by_depth: 2.0,
        }
    }
}

/// Dynamic-somatic-confidence weighting and gates. Component weights default
/// to equal thirds and are normalized before use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DscConfig {
    #[validate(range(min = 0.0, max = 1.0))]
    pub weight_vaf_purity: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub weight_prior: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub weight_context: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub tier_one_gate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub tier_two_gate: f64,
    #[validate(range(min = 0.0, max = 1.0))]
    pub filter_floor: f64,
    /// Below this purity-estimate confidence the VAF/purity component is
    /// discounted to neutral.
    #[validate(range(min = 0.0, max = 1.0))]
    pub purity_confidence_floor: f64,
}

impl Default for DscConfig {
    fn default() -> DscConfig {
        DscConfig {
            weight_vaf_purity: 1.0 / 3.0,
            weight_prior: 1.0 / 3.0,
            weight_context: 1.0 / 3.0,
            tier_one_gate: 0.9,
            tier_two_gate: 0.6,
            filter_floor: 0.2,
            purity_confidence_floor: 0.3,
        }
    }
}

impl DscConfig {
    /// Weights rescaled to sum to one; guards against config files that set
    /// an unnormalized triple.
    pub fn normalized_weights(&self) -> (f64, f64, f64) {
        let sum = self.weight_vaf_purity + self.weight_prior + self.weight_context;
        if sum <= f64::EPSILON {
            (1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0)
        } else {
            (
                self.weight_vaf_purity / sum,
                self.weight_prior / sum,
                self.weight_context / sum,
            )
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct BiomarkerThresholds {
    #[validate(range(min = 0.0))]
    pub tmb_high: f64,
    #[validate(range(min = 0.0))]
    pub tmb_intermediate: f64,
    /// Expression markers counted as elevated at or above the given value.
    pub expression_high: OrderMap<String, f64>,
}

impl Default for BiomarkerThresholds {
    fn default() -> BiomarkerThresholds {
        BiomarkerThresholds {
            tmb_high: 10.0,
            tmb_intermediate: 5.0,
            expression_high: OrderMap::new(),
        }
    }
}

fn default_incidental_genes() -> Vec<String> {
    [
        "APC", "BRCA1", "BRCA2", "MLH1", "MSH2", "MSH6", "PMS2", "MEN1", "PTEN", "RB1", "RET",
        "SDHB", "STK11", "TP53", "TSC1", "TSC2", "VHL", "WT1",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

fn default_timeout_seconds() -> f64 {
    5.0
}

fn default_emerging_confidence() -> f64 {
    0.5
}

/// Engine-level configuration, layered from built-in defaults and an optional
/// config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct EngineConfig {
    pub assembly: Assembly,
    #[validate(nested)]
    pub quality: QualityThresholds,
    #[validate(nested)]
    pub dsc: DscConfig,
    /// Minimum confidence for emerging/investigational records to emit
    /// Tier-IIE evidence.
    #[validate(range(min = 0.0, max = 1.0))]
    pub emerging_evidence_min_confidence: f64,
    pub incidental_genes: Vec<String>,
    #[validate(nested)]
    pub biomarkers: BiomarkerThresholds,
    pub taxonomy: CancerTaxonomy,
    pub pathway_overrides: OrderMap<String, PathwayPatch>,
    /// Per-variant wall-clock budget.
    #[validate(range(min = 0.1))]
    pub timeout_seconds: f64,
}

impl Default for EngineConfig {
    fn default() -> EngineConfig {
        EngineConfig {
            assembly: Assembly::Grch38,
            quality: QualityThresholds::default(),
            dsc: DscConfig::default(),
            emerging_evidence_min_confidence: default_emerging_confidence(),
            incidental_genes: default_incidental_genes(),
            biomarkers: BiomarkerThresholds::default(),
            taxonomy: CancerTaxonomy::default(),
            pathway_overrides: OrderMap::new(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl EngineConfig {
    pub fn gene_is_incidental(&self, gene: &str) -> bool {
        self.incidental_genes.iter().any(|g| g == gene)
    }
}

/// Loads the engine configuration, overlaying the optional file on top of
/// the built-in defaults.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig, ConstructionError> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    if !path.exists() {
        return Err(ConstructionError::NoConfigFileFound(path.to_path_buf()));
    }
    let settings = Config::builder()
        .add_source(File::from(path.to_path_buf()))
        .build()?;
    let engine: EngineConfig = settings.try_deserialize()?;
    engine.validate()?;
    info!("Engine configuration loaded from {}", path.display());
    Ok(engine)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[rstest]
    fn test_defaults_are_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timeout_seconds, 5.0);
        assert_eq!(config.dsc.tier_one_gate, 0.9);
        assert!(config.gene_is_incidental("BRCA2"));
        assert!(!config.gene_is_incidental("KRAS"));
    }

    #[rstest]
    fn test_weights_normalize_to_unit_sum() {
        let dsc = DscConfig {
            weight_vaf_purity: 2.0,
            weight_prior: 1.0,
            weight_context: 1.0,
            ..DscConfig::default()
        };
        let (a, b, c) = dsc.normalized_weights();
        assert!((a + b + c - 1.0).abs() < 1e-12);
        assert!((a - 0.5).abs() < 1e-12);
    }

    #[rstest]
    fn test_missing_config_file_is_an_error() {
        let error = load_engine_config(Some(Path::new("/nonexistent/oncoscribe.toml")));
        assert!(matches!(
            error,
            Err(ConstructionError::NoConfigFileFound(_))
        ));
    }

    #[rstest]
    fn test_config_file_overrides_defaults() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(file, "timeout_seconds = 12.5").unwrap();
        writeln!(file, "[quality]").unwrap();
        writeln!(file, "min_depth = 40").unwrap();
        file.flush().unwrap();

        let config = load_engine_config(Some(file.path())).unwrap();
        assert_eq!(config.timeout_seconds, 12.5);
        assert_eq!(config.quality.min_depth, 40);
        // Untouched sections keep their defaults.
        assert_eq!(config.dsc.filter_floor, 0.2);
    }
}
