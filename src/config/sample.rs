use ordermap::OrderMap;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use validator::Validate;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    TumorOnly,
    TumorNormal,
}

/// Measured biomarker inputs accompanying the specimen; each is compared
/// against the configured thresholds in the biomarker text block.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BiomarkerInputs {
    /// Tumor mutational burden, mutations per megabase.
    #[serde(default)]
    pub tmb: Option<f64>,
    /// Microsatellite status as reported upstream, e.g. "MSS" or "MSI-H".
    #[serde(default)]
    pub msi_status: Option<String>,
    #[serde(default)]
    pub expression: OrderMap<String, f64>,
}

/// Patient and specimen context supplied with the input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
pub struct SampleMetadata {
    #[validate(length(min = 1))]
    pub patient_id: String,
    #[validate(length(min = 1))]
    pub case_id: String,
    /// Missing code forces the pan-cancer fallback for all matching.
    #[serde(default)]
    pub cancer_type_code: Option<String>,
    #[serde(default)]
    pub tissue: Option<String>,
    pub analysis_type: AnalysisType,
    #[validate(range(min = 0.0, max = 1.0))]
    #[serde(default)]
    pub tumor_purity: Option<f64>,
    #[serde(default)]
    pub specimen_type: Option<String>,
    #[serde(default)]
    pub biomarkers: BiomarkerInputs,
    /// Genes with adequate sequencing coverage, used by the pertinent-negative
    /// block. Empty means coverage was not reported and all genes are assumed
    /// covered.
    #[serde(default)]
    pub covered_genes: Vec<String>,
}

impl SampleMetadata {
    pub fn new(patient_id: &str, case_id: &str, analysis_type: AnalysisType) -> SampleMetadata {
        SampleMetadata {
            patient_id: patient_id.to_string(),
            case_id: case_id.to_string(),
            cancer_type_code: None,
            tissue: None,
            analysis_type,
            tumor_purity: None,
            specimen_type: None,
            biomarkers: BiomarkerInputs::default(),
            covered_genes: vec![],
        }
    }

    pub fn cancer_type(&self) -> Option<&str> {
        self.cancer_type_code.as_deref()
    }

    pub fn gene_is_covered(&self, gene: &str) -> bool {
        self.covered_genes.is_empty() || self.covered_genes.iter().any(|g| g == gene)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use validator::Validate;

    #[rstest]
    fn test_valid_metadata_passes_validation() {
        let mut metadata = SampleMetadata::new("P-001", "CASE-1", AnalysisType::TumorOnly);
        metadata.tumor_purity = Some(0.6);
        assert!(metadata.validate().is_ok());
    }

    #[rstest]
    fn test_out_of_range_purity_fails_validation() {
        let mut metadata = SampleMetadata::new("P-001", "CASE-1", AnalysisType::TumorOnly);
        metadata.tumor_purity = Some(1.4);
        assert!(metadata.validate().is_err());
    }

    #[rstest]
    fn test_empty_patient_id_fails_validation() {
        let metadata = SampleMetadata::new("", "CASE-1", AnalysisType::TumorNormal);
        assert!(metadata.validate().is_err());
    }

    #[rstest]
    fn test_coverage_defaults_to_all_genes() {
        let mut metadata = SampleMetadata::new("P-001", "CASE-1", AnalysisType::TumorOnly);
        assert!(metadata.gene_is_covered("BRAF"));
        metadata.covered_genes = vec!["EGFR".to_string()];
        assert!(metadata.gene_is_covered("EGFR"));
        assert!(!metadata.gene_is_covered("BRAF"));
    }
}
