use log::debug;

use crate::model::bundle::{OncogenicityClass, TierResult};
use crate::model::evidence::{Evidence, EvidenceCode, Framework};

/// VICC/CGC point-based oncogenicity classification. The point sum is the
/// algebraic sum of every contributing record's points; nothing is dropped
/// silently.
pub fn classify_oncogenicity(evidence: &[Evidence]) -> (TierResult, OncogenicityClass) {
    let mut modulators = Vec::new();

    let has_standalone_benign = evidence.iter().any(|e| e.code == EvidenceCode::Sbvs1);
    let contributing: Vec<&Evidence> = evidence
        .iter()
        .filter(|e| e.code.framework() == Framework::Oncogenicity)
        .filter(|e| {
            // OP4 (absent from population) cannot stack with SBVS1 (>5% in a
            // continental group); the stand-alone benign criterion wins.
            if e.code == EvidenceCode::Op4 && has_standalone_benign {
                modulators.push("OP4 suppressed: cannot stack with SBVS1".to_string());
                return false;
            }
            true
        })
        .collect();

    if contributing.is_empty() {
        return (
            TierResult::unclassified(Framework::Oncogenicity),
            OncogenicityClass::Unclassified,
        );
    }

    let points: i32 = contributing.iter().map(|e| e.points).sum();
    let class = OncogenicityClass::from_points(points);
    let confidence = contributing.iter().map(|e| e.confidence).sum::<f64>()
        / contributing.len() as f64;
    debug!(
        "Oncogenicity: {points} points over {} records -> {class}",
        contributing.len()
    );

    let result = TierResult {
        framework: Framework::Oncogenicity,
        label: class.to_string(),
        points: Some(points),
        evidence_ids: contributing.iter().map(|e| e.id.clone()).collect(),
        modulators,
        confidence,
    };
    (result, class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::model::evidence::{Direction, EvidenceSource, Strength};

    fn evidence(code: EvidenceCode) -> Evidence {
        let direction = if code.is_benign() {
            Direction::SupportsBenign
        } else {
            Direction::SupportsPathogenic
        };
        Evidence::new(
            code,
            direction,
            Strength::Strong,
            vec![EvidenceSource {
                kb: "kb".to_string(),
                kb_version: "v1".to_string(),
                record_id: "r".to_string(),
            }],
            0.9,
            "",
        )
    }

    #[rstest]
    fn test_braf_like_evidence_is_oncogenic() {
        let set = vec![
            evidence(EvidenceCode::Os1),
            evidence(EvidenceCode::Os3),
            evidence(EvidenceCode::Op4),
        ];
        let (result, class) = classify_oncogenicity(&set);
        assert_eq!(class, OncogenicityClass::Oncogenic);
        assert_eq!(result.points, Some(9));
    }

    #[rstest]
    fn test_moderate_evidence_is_likely_oncogenic() {
        let set = vec![
            evidence(EvidenceCode::Om1),
            evidence(EvidenceCode::Op1),
            evidence(EvidenceCode::Op4),
        ];
        let (result, class) = classify_oncogenicity(&set);
        assert_eq!(class, OncogenicityClass::LikelyOncogenic);
        assert_eq!(result.points, Some(4));
    }

    #[rstest]
    fn test_ovs1_alone_is_oncogenic() {
        let (result, class) = classify_oncogenicity(&[evidence(EvidenceCode::Ovs1)]);
        assert_eq!(class, OncogenicityClass::Oncogenic);
        assert_eq!(result.points, Some(8));
    }

    #[rstest]
    fn test_standalone_benign_suppresses_op4() {
        let set = vec![evidence(EvidenceCode::Sbvs1), evidence(EvidenceCode::Op4)];
        let (result, class) = classify_oncogenicity(&set);
        assert_eq!(class, OncogenicityClass::Benign);
        assert_eq!(result.points, Some(-8));
        assert!(!result.modulators.is_empty());
    }

    #[rstest]
    fn test_point_sum_matches_algebraic_sum() {
        let set = vec![
            evidence(EvidenceCode::Os1),
            evidence(EvidenceCode::Om3),
            evidence(EvidenceCode::Sbp1),
        ];
        let expected: i32 = set.iter().map(|e| e.points).sum();
        let (result, _) = classify_oncogenicity(&set);
        assert_eq!(result.points, Some(expected));
    }

    #[rstest]
    fn test_no_evidence_is_unclassified() {
        let (result, class) = classify_oncogenicity(&[]);
        assert_eq!(class, OncogenicityClass::Unclassified);
        assert_eq!(result.label, "unclassified");
        assert_eq!(result.points, None);
    }

    #[rstest]
    fn test_therapeutic_codes_do_not_contribute_points() {
        let set = vec![evidence(EvidenceCode::TierIaFda), evidence(EvidenceCode::Op1)];
        let (result, class) = classify_oncogenicity(&set);
        assert_eq!(result.points, Some(1));
        assert_eq!(class, OncogenicityClass::Vus);
    }
}
