use chrono::{DateTime, Utc};
use ordermap::OrderMap;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::config::pathway::PathwayKind;
use crate::dsc::DscScore;
use crate::kb::source::ReliabilityTier;
use crate::model::evidence::{Evidence, Framework};
use crate::model::variant::{Variant, VariantKey};
use crate::purity::PurityEstimate;

/// AMP/ASCO/CAP therapeutic actionability tiers.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum TherapeuticTier {
    #[strum(serialize = "IA")]
    #[serde(rename = "IA")]
    Ia,
    #[strum(serialize = "IB")]
    #[serde(rename = "IB")]
    Ib,
    #[strum(serialize = "IIC")]
    #[serde(rename = "IIC")]
    Iic,
    #[strum(serialize = "IID")]
    #[serde(rename = "IID")]
    Iid,
    #[strum(serialize = "IIE")]
    #[serde(rename = "IIE")]
    Iie,
    #[strum(serialize = "III")]
    #[serde(rename = "III")]
    Iii,
    #[strum(serialize = "IV")]
    #[serde(rename = "IV")]
    Iv,
    #[strum(serialize = "unclassified")]
    #[serde(rename = "unclassified")]
    Unclassified,
}

impl TherapeuticTier {
    /// Lower rank is more actionable.
    pub fn rank(&self) -> u8 {
        match self {
            TherapeuticTier::Ia => 0,
            TherapeuticTier::Ib => 1,
            TherapeuticTier::Iic => 2,
            TherapeuticTier::Iid => 3,
            TherapeuticTier::Iie => 4,
            TherapeuticTier::Iii => 5,
            TherapeuticTier::Iv => 6,
            TherapeuticTier::Unclassified => 7,
        }
    }
}

/// VICC/CGC oncogenicity classes derived from the point sum.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum OncogenicityClass {
    Oncogenic,
    LikelyOncogenic,
    Vus,
    LikelyBenign,
    Benign,
    Unclassified,
}

impl OncogenicityClass {
    pub fn from_points(points: i32) -> OncogenicityClass {
        match points {
            p if p >= 7 => OncogenicityClass::Oncogenic,
            p if p >= 4 => OncogenicityClass::LikelyOncogenic,
            p if p >= -3 => OncogenicityClass::Vus,
            p if p >= -6 => OncogenicityClass::LikelyBenign,
            _ => OncogenicityClass::Benign,
        }
    }

    pub fn is_oncogenic(&self) -> bool {
        matches!(
            self,
            OncogenicityClass::Oncogenic | OncogenicityClass::LikelyOncogenic
        )
    }

    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            OncogenicityClass::Benign | OncogenicityClass::LikelyBenign
        )
    }
}

/// Curated actionability levels as carried by the curated-evidence KB.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum CuratedLevel {
    #[strum(serialize = "1")]
    #[serde(rename = "1")]
    Level1,
    #[strum(serialize = "2")]
    #[serde(rename = "2")]
    Level2,
    #[strum(serialize = "3A")]
    #[serde(rename = "3A")]
    Level3a,
    #[strum(serialize = "3B")]
    #[serde(rename = "3B")]
    Level3b,
    #[strum(serialize = "4")]
    #[serde(rename = "4")]
    Level4,
    #[strum(serialize = "R1")]
    #[serde(rename = "R1")]
    R1,
    #[strum(serialize = "R2")]
    #[serde(rename = "R2")]
    R2,
}

impl CuratedLevel {
    /// Lower rank is more favorable; resistance levels sort last.
    pub fn rank(&self) -> u8 {
        match self {
            CuratedLevel::Level1 => 0,
            CuratedLevel::Level2 => 1,
            CuratedLevel::Level3a => 2,
            CuratedLevel::Level3b => 3,
            CuratedLevel::Level4 => 4,
            CuratedLevel::R1 => 5,
            CuratedLevel::R2 => 6,
        }
    }

    /// Single-step downgrade applied on cancer-type fallback.
    pub fn downgraded(&self) -> CuratedLevel {
        match self {
            CuratedLevel::Level1 => CuratedLevel::Level2,
            CuratedLevel::Level2 => CuratedLevel::Level3a,
            CuratedLevel::Level3a => CuratedLevel::Level3b,
            CuratedLevel::Level3b | CuratedLevel::Level4 => CuratedLevel::Level4,
            CuratedLevel::R1 | CuratedLevel::R2 => CuratedLevel::R2,
        }
    }
}

/// One classifier outcome. Exactly one per framework per bundle, even when
/// the label is `unclassified`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierResult {
    pub framework: Framework,
    pub label: String,
    pub points: Option<i32>,
    pub evidence_ids: Vec<String>,
    /// Factors that changed the raw outcome, e.g. DSC gates or cancer-type
    /// fallback downgrades.
    pub modulators: Vec<String>,
    pub confidence: f64,
}

impl TierResult {
    pub fn unclassified(framework: Framework) -> TierResult {
        TierResult {
            framework,
            label: "unclassified".to_string(),
            points: None,
            evidence_ids: vec![],
            modulators: vec![],
            confidence: 0.0,
        }
    }
}

/// The eight narrative blocks, in their fixed report order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TextBlock {
    GeneralGeneInfo,
    GeneDxInterpretation,
    GeneralVariantInfo,
    VariantDxInterpretation,
    IncidentalFindings,
    ChromosomalAlterationInterpretation,
    PertinentNegatives,
    Biomarkers,
}

impl TextBlock {
    pub const ALL: [TextBlock; 8] = [
        TextBlock::GeneralGeneInfo,
        TextBlock::GeneDxInterpretation,
        TextBlock::GeneralVariantInfo,
        TextBlock::VariantDxInterpretation,
        TextBlock::IncidentalFindings,
        TextBlock::ChromosomalAlterationInterpretation,
        TextBlock::PertinentNegatives,
        TextBlock::Biomarkers,
    ];
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub number: usize,
    pub evidence_id: String,
    pub source: String,
    pub reliability: ReliabilityTier,
    pub display_label: String,
    pub external_reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CannedText {
    pub block: TextBlock,
    pub body: String,
    pub citations: Vec<Citation>,
    pub confidence: f64,
}

impl CannedText {
    pub fn empty(block: TextBlock) -> CannedText {
        CannedText {
            block,
            body: String::new(),
            citations: vec![],
            confidence: 1.0,
        }
    }
}

/// Pipeline phases, in execution order; partial bundles record how far they
/// got.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Normalize,
    Filter,
    Purity,
    Dsc,
    Aggregate,
    Classify,
    Reconcile,
    Synthesize,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BundleStatus {
    Complete,
    Partial,
    Timeout,
    Cancelled,
}

/// Reproducibility header embedded in every bundle: same variant, same
/// pathway, same snapshot means the same bundle, byte for byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleHeader {
    pub pathway: PathwayKind,
    /// KB name -> version, sorted by name.
    pub kb_snapshot: OrderMap<String, String>,
    pub engine_version: String,
}

/// The final per-variant output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterpretationBundle {
    pub input_index: usize,
    pub key: VariantKey,
    pub variant: Variant,
    pub purity: PurityEstimate,
    pub dsc: DscScore,
    pub evidence: Vec<Evidence>,
    pub therapeutic: TierResult,
    pub oncogenicity: TierResult,
    pub curated: TierResult,
    pub texts: Vec<CannedText>,
    pub header: BundleHeader,
    pub phases_completed: Vec<Phase>,
    pub errors: Vec<String>,
    pub status: BundleStatus,
}

impl InterpretationBundle {
    pub fn evidence_by_id(&self, id: &str) -> Option<&Evidence> {
        self.evidence.iter().find(|e| e.id == id)
    }
}

/// A variant dropped before interpretation, with the reason it was dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilteredVariant {
    pub key: VariantKey,
    pub reason: String,
}

/// Run-level header: pathway, snapshot, thresholds in effect, counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunHeader {
    pub pathway: PathwayKind,
    pub kb_snapshot: OrderMap<String, String>,
    pub thresholds: crate::config::pathway::VafThresholds,
    pub input_count: usize,
    pub filtered_count: usize,
    pub interpreted_count: usize,
    pub error_count: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub header: RunHeader,
    pub bundles: Vec<InterpretationBundle>,
    pub filtered_variants: Vec<FilteredVariant>,
}
