use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// The classification framework an evidence code belongs to.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Framework {
    Therapeutic,
    Oncogenicity,
    CuratedLevel,
}

/// Rule identifiers emitted by the evidence-mapping table. Oncogenicity codes
/// carry the VICC/CGC point weights; therapeutic codes carry none.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
pub enum EvidenceCode {
    #[strum(serialize = "OVS1")]
    #[serde(rename = "OVS1")]
    Ovs1,
    #[strum(serialize = "OS1")]
    #[serde(rename = "OS1")]
    Os1,
    #[strum(serialize = "OS2")]
    #[serde(rename = "OS2")]
    Os2,
    #[strum(serialize = "OS3")]
    #[serde(rename = "OS3")]
    Os3,
    #[strum(serialize = "OM1")]
    #[serde(rename = "OM1")]
    Om1,
    #[strum(serialize = "OM2")]
    #[serde(rename = "OM2")]
    Om2,
    #[strum(serialize = "OM3")]
    #[serde(rename = "OM3")]
    Om3,
    #[strum(serialize = "OM4")]
    #[serde(rename = "OM4")]
    Om4,
    #[strum(serialize = "OP1")]
    #[serde(rename = "OP1")]
    Op1,
    #[strum(serialize = "OP2")]
    #[serde(rename = "OP2")]
    Op2,
    #[strum(serialize = "OP3")]
    #[serde(rename = "OP3")]
    Op3,
    #[strum(serialize = "OP4")]
    #[serde(rename = "OP4")]
    Op4,
    #[strum(serialize = "SBVS1")]
    #[serde(rename = "SBVS1")]
    Sbvs1,
    #[strum(serialize = "SBS1")]
    #[serde(rename = "SBS1")]
    Sbs1,
    #[strum(serialize = "SBS2")]
    #[serde(rename = "SBS2")]
    Sbs2,
    #[strum(serialize = "SBP1")]
    #[serde(rename = "SBP1")]
    Sbp1,
    #[strum(serialize = "Tier-IA-FDA")]
    #[serde(rename = "Tier-IA-FDA")]
    TierIaFda,
    #[strum(serialize = "Tier-IB-Guideline")]
    #[serde(rename = "Tier-IB-Guideline")]
    TierIbGuideline,
    #[strum(serialize = "Tier-IIC")]
    #[serde(rename = "Tier-IIC")]
    TierIic,
    #[strum(serialize = "Tier-IID")]
    #[serde(rename = "Tier-IID")]
    TierIid,
    #[strum(serialize = "Tier-IIE")]
    #[serde(rename = "Tier-IIE")]
    TierIie,
}

impl EvidenceCode {
    pub fn framework(&self) -> Framework {
        match self {
            EvidenceCode::TierIaFda
            | EvidenceCode::TierIbGuideline
            | EvidenceCode::TierIic
            | EvidenceCode::TierIid
            | EvidenceCode::TierIie => Framework::Therapeutic,
            _ => Framework::Oncogenicity,
        }
    }

    /// Signed VICC/CGC point weight; zero for therapeutic codes.
    pub fn base_points(&self) -> i32 {
        match self {
            EvidenceCode::Ovs1 => 8,
            EvidenceCode::Os1 | EvidenceCode::Os2 | EvidenceCode::Os3 => 4,
            EvidenceCode::Om1 | EvidenceCode::Om2 | EvidenceCode::Om3 | EvidenceCode::Om4 => 2,
            EvidenceCode::Op1 | EvidenceCode::Op2 | EvidenceCode::Op3 | EvidenceCode::Op4 => 1,
            EvidenceCode::Sbvs1 => -8,
            EvidenceCode::Sbs1 | EvidenceCode::Sbs2 => -4,
            EvidenceCode::Sbp1 => -1,
            EvidenceCode::TierIaFda
            | EvidenceCode::TierIbGuideline
            | EvidenceCode::TierIic
            | EvidenceCode::TierIid
            | EvidenceCode::TierIie => 0,
        }
    }

    pub fn is_benign(&self) -> bool {
        self.base_points() < 0
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    SupportsPathogenic,
    SupportsBenign,
    SupportsActionable,
    Neutral,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    VeryStrong,
    Strong,
    Moderate,
    Supporting,
}

impl Strength {
    /// Lower rank sorts first.
    pub fn rank(&self) -> u8 {
        match self {
            Strength::VeryStrong => 0,
            Strength::Strong => 1,
            Strength::Moderate => 2,
            Strength::Supporting => 3,
        }
    }
}

/// Provenance of one evidence record: which KB, at which version, which entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvidenceSource {
    pub kb: String,
    pub kb_version: String,
    pub record_id: String,
}

/// The unit consumed by the classifiers. Immutable once emitted; conflict
/// resolution happens in the reconciler, not by mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evidence {
    /// Stable identifier assigned after the deterministic sort ("E01", ...).
    pub id: String,
    pub code: EvidenceCode,
    pub direction: Direction,
    pub strength: Strength,
    /// Framework-defined signed points (summed by the oncogenicity classifier).
    pub points: i32,
    /// Points scaled by the pathway's per-KB multiplier; drives ranking and
    /// confidence weighting, not the published point thresholds.
    pub weight: f64,
    pub sources: Vec<EvidenceSource>,
    pub confidence: f64,
    pub rationale: String,
    pub conflict: bool,
}

impl Evidence {
    pub fn new(
        code: EvidenceCode,
        direction: Direction,
        strength: Strength,
        sources: Vec<EvidenceSource>,
        confidence: f64,
        rationale: impl Into<String>,
    ) -> Evidence {
        Evidence {
            id: String::new(),
            code,
            direction,
            strength,
            points: code.base_points(),
            weight: f64::from(code.base_points()),
            sources,
            confidence,
            rationale: rationale.into(),
            conflict: false,
        }
    }

    /// Bundle ordering: framework, strength descending, code lexicographic.
    pub fn bundle_ordering(&self, other: &Evidence) -> Ordering {
        self.code
            .framework()
            .cmp(&other.code.framework())
            .then(self.strength.rank().cmp(&other.strength.rank()))
            .then(self.code.to_string().cmp(&other.code.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(EvidenceCode::Ovs1, 8)]
    #[case(EvidenceCode::Os3, 4)]
    #[case(EvidenceCode::Om2, 2)]
    #[case(EvidenceCode::Op4, 1)]
    #[case(EvidenceCode::Sbvs1, -8)]
    #[case(EvidenceCode::Sbs2, -4)]
    #[case(EvidenceCode::Sbp1, -1)]
    #[case(EvidenceCode::TierIaFda, 0)]
    fn test_base_points(#[case] code: EvidenceCode, #[case] expected: i32) {
        assert_eq!(code.base_points(), expected);
    }

    #[rstest]
    fn test_code_display_round_trip() {
        for code in [
            EvidenceCode::Ovs1,
            EvidenceCode::Op4,
            EvidenceCode::Sbvs1,
            EvidenceCode::TierIaFda,
            EvidenceCode::TierIie,
        ] {
            let rendered = code.to_string();
            let parsed: EvidenceCode = rendered.parse().unwrap();
            assert_eq!(parsed, code);
        }
    }

    #[rstest]
    fn test_bundle_ordering_sorts_by_strength_then_code() {
        let strong = Evidence::new(
            EvidenceCode::Os1,
            Direction::SupportsPathogenic,
            Strength::Strong,
            vec![],
            0.9,
            "",
        );
        let supporting = Evidence::new(
            EvidenceCode::Op4,
            Direction::SupportsPathogenic,
            Strength::Supporting,
            vec![],
            0.9,
            "",
        );
        assert_eq!(strong.bundle_ordering(&supporting), Ordering::Less);

        let om1 = Evidence::new(
            EvidenceCode::Om1,
            Direction::SupportsPathogenic,
            Strength::Moderate,
            vec![],
            0.9,
            "",
        );
        let om3 = Evidence::new(
            EvidenceCode::Om3,
            Direction::SupportsPathogenic,
            Strength::Moderate,
            vec![],
            0.9,
            "",
        );
        assert_eq!(om1.bundle_ordering(&om3), Ordering::Less);
    }
}
