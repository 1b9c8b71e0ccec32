use std::collections::BTreeSet;

use log::debug;

use crate::model::evidence::{Direction, Evidence};

/// Confidence floors from cross-KB concordance. Concordance is measured on
/// direction, not on the specific code.
pub fn concordance_confidence(distinct_sources: usize, base: f64) -> f64 {
    let floor = match distinct_sources {
        0 | 1 => base,
        2 => 0.85,
        3 => 0.95,
        _ => 0.99,
    };
    base.max(floor).clamp(0.0, 1.0)
}

/// Raises per-evidence confidence where independent KBs agree on a direction
/// and marks every record involved in a pathogenic/benign disagreement with
/// a conflict annotation. Returns the number of conflicting directions.
pub fn apply_concordance(evidence: &mut [Evidence]) -> usize {
    let count_for = |direction: Direction, evidence: &[Evidence]| -> usize {
        evidence
            .iter()
            .filter(|e| e.direction == direction)
            .flat_map(|e| e.sources.iter().map(|s| s.kb.clone()))
            .collect::<BTreeSet<_>>()
            .len()
    };
    let pathogenic_sources = count_for(Direction::SupportsPathogenic, evidence);
    let benign_sources = count_for(Direction::SupportsBenign, evidence);
    let actionable_sources = count_for(Direction::SupportsActionable, evidence);

    for record in evidence.iter_mut() {
        let concordant = match record.direction {
            Direction::SupportsPathogenic => pathogenic_sources,
            Direction::SupportsBenign => benign_sources,
            Direction::SupportsActionable => actionable_sources,
            Direction::Neutral => 1,
        };
        record.confidence = concordance_confidence(concordant, record.confidence);
    }

    let discordant = pathogenic_sources > 0 && benign_sources > 0;
    if discordant {
        debug!(
            "Discordant evidence: {pathogenic_sources} pathogenic vs {benign_sources} benign sources"
        );
        for record in evidence.iter_mut() {
            if matches!(
                record.direction,
                Direction::SupportsPathogenic | Direction::SupportsBenign
            ) {
                record.conflict = true;
            }
        }
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::model::evidence::{EvidenceCode, EvidenceSource, Strength};

    fn evidence(code: EvidenceCode, direction: Direction, kb: &str, confidence: f64) -> Evidence {
        Evidence {
            confidence,
            ..Evidence::new(
                code,
                direction,
                Strength::Strong,
                vec![EvidenceSource {
                    kb: kb.to_string(),
                    kb_version: "v1".to_string(),
                    record_id: format!("{kb}:1"),
                }],
                confidence,
                "",
            )
        }
    }

    #[rstest]
    #[case(1, 0.7, 0.7)]
    #[case(2, 0.7, 0.85)]
    #[case(3, 0.7, 0.95)]
    #[case(4, 0.7, 0.99)]
    #[case(6, 0.7, 0.99)]
    #[case(2, 0.9, 0.9)]
    fn test_concordance_floors(
        #[case] sources: usize,
        #[case] base: f64,
        #[case] expected: f64,
    ) {
        assert!((concordance_confidence(sources, base) - expected).abs() < 1e-12);
    }

    #[rstest]
    fn test_concordant_directions_raise_confidence() {
        let mut records = vec![
            evidence(
                EvidenceCode::Os1,
                Direction::SupportsPathogenic,
                "curated",
                0.85,
            ),
            evidence(
                EvidenceCode::Os3,
                Direction::SupportsPathogenic,
                "hotspots",
                0.7,
            ),
            evidence(
                EvidenceCode::Op4,
                Direction::SupportsPathogenic,
                "population",
                0.7,
            ),
        ];
        let conflicts = apply_concordance(&mut records);
        assert_eq!(conflicts, 0);
        for record in &records {
            assert!(record.confidence >= 0.95);
            assert!(!record.conflict);
        }
    }

    #[rstest]
    fn test_discordance_marks_conflicts() {
        let mut records = vec![
            evidence(
                EvidenceCode::Os1,
                Direction::SupportsPathogenic,
                "curated",
                0.85,
            ),
            evidence(
                EvidenceCode::Sbs2,
                Direction::SupportsBenign,
                "clinvar",
                0.7,
            ),
        ];
        let conflicts = apply_concordance(&mut records);
        assert_eq!(conflicts, 1);
        assert!(records.iter().all(|r| r.conflict));
    }
}
