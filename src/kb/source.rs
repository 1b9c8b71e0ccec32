use ordermap::OrderMap;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Reliability tiers ordered from most to least authoritative. The tier sets
/// the base confidence of single-source evidence and the citation ordering in
/// narrative text.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ReliabilityTier {
    Regulatory,
    ProfessionalGuideline,
    ExpertCurated,
    CommunityCurated,
    Computational,
}

impl ReliabilityTier {
    pub fn base_confidence(&self) -> f64 {
        match self {
            ReliabilityTier::Regulatory => 0.99,
            ReliabilityTier::ProfessionalGuideline => 0.95,
            ReliabilityTier::ExpertCurated => 0.85,
            ReliabilityTier::CommunityCurated => 0.7,
            ReliabilityTier::Computational => 0.5,
        }
    }
}

/// The fixed query shape a KB answers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum QueryShape {
    PositionRange,
    ExactPosition,
    CodonPosition,
    GeneSymbol,
    AminoAcidChange,
}

/// KB families; the family selects the hit-parsing rules and the pathway
/// weight-multiplier category.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum KbKind {
    CuratedEvidence,
    ClinicalSignificance,
    Hotspot,
    PopulationFrequency,
    PanelOfNormals,
    GeneRole,
}

impl KbKind {
    /// Category key used by `PathwayConfig::evidence_weight_multipliers`.
    pub fn multiplier_category(&self) -> &'static str {
        match self {
            KbKind::CuratedEvidence | KbKind::ClinicalSignificance | KbKind::GeneRole => {
                "clinical_evidence"
            }
            KbKind::Hotspot => "hotspots",
            KbKind::PopulationFrequency | KbKind::PanelOfNormals => "population",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GeneRole {
    TumorSuppressor,
    Oncogene,
    Both,
}

impl GeneRole {
    pub fn is_tumor_suppressor(&self) -> bool {
        matches!(self, GeneRole::TumorSuppressor | GeneRole::Both)
    }

    pub fn is_oncogene(&self) -> bool {
        matches!(self, GeneRole::Oncogene | GeneRole::Both)
    }
}

/// A named, versioned source. The engine depends only on this descriptor and
/// the uniform lookup interface of the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbDescriptor {
    pub name: String,
    pub version: String,
    pub kind: KbKind,
    pub query_shape: QueryShape,
    pub reliability: ReliabilityTier,
    /// Build date of the underlying data, as shipped with the snapshot.
    pub freshness: String,
}

/// One entry in a KB file. Fields are raw and shape-dependent; the evidence
/// mapping rules decide what they mean.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct KbRecord {
    pub record_id: String,
    #[serde(default)]
    pub gene: Option<String>,
    #[serde(default)]
    pub chromosome: Option<String>,
    #[serde(default)]
    pub position: Option<u64>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub alternate: Option<String>,
    #[serde(default)]
    pub start: Option<u64>,
    #[serde(default)]
    pub end: Option<u64>,
    #[serde(default)]
    pub codon: Option<u32>,
    #[serde(default)]
    pub protein_change: Option<String>,
    #[serde(default)]
    pub cancer_type: Option<String>,
    #[serde(default)]
    pub level: Option<crate::model::bundle::CuratedLevel>,
    #[serde(default)]
    pub oncogenicity: Option<String>,
    #[serde(default)]
    pub significance: Option<String>,
    #[serde(default)]
    pub review_stars: Option<u8>,
    #[serde(default)]
    pub count: Option<u32>,
    #[serde(default)]
    pub population_af: Option<OrderMap<String, f64>>,
    #[serde(default)]
    pub panel_frequency: Option<f64>,
    #[serde(default)]
    pub role: Option<GeneRole>,
    #[serde(default)]
    pub critical_domains: Vec<String>,
    #[serde(default)]
    pub pathways: Vec<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub drugs: Vec<String>,
    /// Marks emerging/investigational therapeutic records.
    #[serde(default)]
    pub investigational: bool,
    #[serde(default)]
    pub external_reference: Option<String>,
}

/// On-disk layout of one KB snapshot file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KbFile {
    pub name: String,
    pub version: String,
    pub kind: KbKind,
    pub query_shape: QueryShape,
    pub reliability: ReliabilityTier,
    #[serde(default)]
    pub freshness: String,
    pub records: Vec<KbRecord>,
}

impl KbFile {
    pub fn descriptor(&self) -> KbDescriptor {
        KbDescriptor {
            name: self.name.clone(),
            version: self.version.clone(),
            kind: self.kind,
            query_shape: self.query_shape,
            reliability: self.reliability,
            freshness: self.freshness.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_reliability_order_matches_confidence() {
        let tiers = [
            ReliabilityTier::Regulatory,
            ReliabilityTier::ProfessionalGuideline,
            ReliabilityTier::ExpertCurated,
            ReliabilityTier::CommunityCurated,
            ReliabilityTier::Computational,
        ];
        for pair in tiers.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].base_confidence() > pair[1].base_confidence());
        }
    }

    #[rstest]
    #[case(GeneRole::TumorSuppressor, true, false)]
    #[case(GeneRole::Oncogene, false, true)]
    #[case(GeneRole::Both, true, true)]
    fn test_gene_role_predicates(
        #[case] role: GeneRole,
        #[case] tsg: bool,
        #[case] oncogene: bool,
    ) {
        assert_eq!(role.is_tumor_suppressor(), tsg);
        assert_eq!(role.is_oncogene(), oncogene);
    }
}
