use log::{debug, info};

use crate::aggregate::aggregator::assign_evidence_ids;
use crate::aggregate::rules::POPULATION_STANDALONE_AF;
use crate::aggregate::{AggregationOutcome, CuratedObservation};
use crate::classify::{TherapeuticContext, classify_curated, classify_oncogenicity, classify_therapeutic};
use crate::config::engine_config::DscConfig;
use crate::config::pathway::PathwayKind;
use crate::dsc::DscScore;
use crate::model::bundle::{CuratedLevel, TherapeuticTier, TierResult};
use crate::model::evidence::{
    Direction, Evidence, EvidenceCode, EvidenceSource, Strength,
};

/// Confidence of OS1 satisfied by a curated oncogenic call at level 2 or
/// better.
const CURATED_OS1_CONFIDENCE: f64 = 0.95;
/// Confidence of OS1 satisfied by a two-star pathogenic submission.
const CLINSIG_OS1_CONFIDENCE: f64 = 0.85;

#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledResults {
    /// The final evidence set with stable identifiers assigned.
    pub evidence: Vec<Evidence>,
    pub therapeutic: TierResult,
    pub oncogenicity: TierResult,
    pub curated: TierResult,
    pub notes: Vec<String>,
}

/// Runs the three classifiers, applies the cross-framework reconciliation
/// rules once, and re-runs the classifiers on the augmented evidence.
/// Termination is by construction: there is exactly one reconciliation pass.
pub fn reconcile_and_classify(
    mut aggregation: AggregationOutcome,
    pathway_kind: PathwayKind,
    dsc: &DscScore,
    dsc_config: &DscConfig,
) -> ReconciledResults {
    let mut notes = Vec::new();

    // First pass, on the evidence as aggregated.
    let (_, first_class) = classify_oncogenicity(&aggregation.evidence);

    // Cross-framework evidence propagation.
    let has_os1 = aggregation
        .evidence
        .iter()
        .any(|e| e.code == EvidenceCode::Os1);
    if !has_os1 {
        if aggregation.has_curated_oncogenic_level2 {
            let evidence = reconciled_os1(
                &aggregation.curated,
                CURATED_OS1_CONFIDENCE,
                "reconciled: curated oncogenic call at level 2 or better",
            );
            notes.push("OS1 satisfied by curated oncogenicity".to_string());
            aggregation.evidence.push(evidence);
        } else if aggregation.has_two_star_pathogenic {
            let evidence = Evidence::new(
                EvidenceCode::Os1,
                Direction::SupportsPathogenic,
                Strength::Strong,
                vec![EvidenceSource {
                    kb: "clinical_significance".to_string(),
                    kb_version: String::new(),
                    record_id: "two_star_pathogenic".to_string(),
                }],
                CLINSIG_OS1_CONFIDENCE,
                "reconciled: pathogenic with two-star review status",
            );
            notes.push("OS1 satisfied by two-star pathogenic submission".to_string());
            aggregation.evidence.push(evidence);
        }
    }

    // Single re-run on the final evidence set, with identifiers settled.
    assign_evidence_ids(&mut aggregation.evidence);
    let (mut oncogenicity, class) = classify_oncogenicity(&aggregation.evidence);
    let ctx = TherapeuticContext {
        pathway_kind,
        dsc,
        dsc_config,
        oncogenicity: class,
        max_population_af: aggregation.max_population_af,
    };
    let mut therapeutic = classify_therapeutic(&aggregation.evidence, &ctx);
    let curated = classify_curated(&aggregation.curated, &aggregation.evidence);

    // An oncogenic variant without therapeutic evidence stays Tier III, not
    // IV, unless the population frequency exceeds the stand-alone threshold.
    if class.is_oncogenic()
        && therapeutic.label == TherapeuticTier::Iv.to_string()
        && !aggregation
            .max_population_af
            .is_some_and(|af| af > POPULATION_STANDALONE_AF)
    {
        let note = "oncogenic call forces Tier III over Tier IV".to_string();
        debug!("{note}");
        therapeutic.label = TherapeuticTier::Iii.to_string();
        therapeutic.modulators.push(note.clone());
        notes.push(note);
    }

    if first_class != class {
        info!("Reconciliation changed oncogenicity from {first_class} to {class}");
    }
    if aggregation.conflict_count > 0 {
        oncogenicity
            .modulators
            .push("conflicting evidence directions recorded".to_string());
    }

    ReconciledResults {
        evidence: aggregation.evidence,
        therapeutic,
        oncogenicity,
        curated,
        notes,
    }
}

fn reconciled_os1(
    curated: &[CuratedObservation],
    confidence: f64,
    rationale: &str,
) -> Evidence {
    let sources: Vec<EvidenceSource> = curated
        .iter()
        .filter(|o| o.oncogenic && o.level.rank() <= CuratedLevel::Level2.rank())
        .map(|o| EvidenceSource {
            kb: o.kb.clone(),
            kb_version: o.kb_version.clone(),
            record_id: o.record_id.clone(),
        })
        .collect();
    Evidence::new(
        EvidenceCode::Os1,
        Direction::SupportsPathogenic,
        Strength::Strong,
        sources,
        confidence,
        rationale,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::config::cancer_type::CancerTypeMatch;
    use crate::model::bundle::OncogenicityClass;

    fn observation(level: CuratedLevel, oncogenic: bool) -> CuratedObservation {
        CuratedObservation {
            kb: "curated_evidence".to_string(),
            kb_version: "v1".to_string(),
            record_id: "CUR:1".to_string(),
            level,
            cancer_match: CancerTypeMatch::Exact,
            oncogenic,
            drugs: vec![],
            investigational: false,
        }
    }

    fn evidence(code: EvidenceCode, direction: Direction) -> Evidence {
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

    fn dsc(value: f64) -> DscScore {
        DscScore {
            value,
            vaf_purity_component: value,
            prior_component: value,
            context_component: 0.5,
            rationale: String::new(),
        }
    }

    #[rstest]
    fn test_curated_oncogenic_satisfies_os1() {
        let aggregation = AggregationOutcome {
            evidence: vec![evidence(EvidenceCode::Om1, Direction::SupportsPathogenic)],
            curated: vec![observation(CuratedLevel::Level2, true)],
            has_curated_oncogenic_level2: true,
            ..AggregationOutcome::default()
        };
        let score = dsc(0.95);
        let results = reconcile_and_classify(
            aggregation,
            PathwayKind::TumorNormal,
            &score,
            &DscConfig::default(),
        );

        let os1 = results
            .evidence
            .iter()
            .find(|e| e.code == EvidenceCode::Os1)
            .expect("reconciler should add OS1");
        assert!((os1.confidence - CURATED_OS1_CONFIDENCE).abs() < 1e-9);
        // OS1 (+4) + OM1 (+2) = 6: likely oncogenic after reconciliation.
        assert_eq!(results.oncogenicity.points, Some(6));
        assert_eq!(
            results.oncogenicity.label,
            OncogenicityClass::LikelyOncogenic.to_string()
        );
        assert!(!results.notes.is_empty());
    }

    #[rstest]
    fn test_two_star_pathogenic_satisfies_os1_at_lower_confidence() {
        let aggregation = AggregationOutcome {
            evidence: vec![],
            has_two_star_pathogenic: true,
            ..AggregationOutcome::default()
        };
        let score = dsc(0.95);
        let results = reconcile_and_classify(
            aggregation,
            PathwayKind::TumorNormal,
            &score,
            &DscConfig::default(),
        );
        let os1 = results
            .evidence
            .iter()
            .find(|e| e.code == EvidenceCode::Os1)
            .unwrap();
        assert!((os1.confidence - CLINSIG_OS1_CONFIDENCE).abs() < 1e-9);
    }

    #[rstest]
    fn test_existing_os1_is_not_duplicated() {
        let aggregation = AggregationOutcome {
            evidence: vec![evidence(EvidenceCode::Os1, Direction::SupportsPathogenic)],
            curated: vec![observation(CuratedLevel::Level1, true)],
            has_curated_oncogenic_level2: true,
            ..AggregationOutcome::default()
        };
        let score = dsc(0.95);
        let results = reconcile_and_classify(
            aggregation,
            PathwayKind::TumorNormal,
            &score,
            &DscConfig::default(),
        );
        let os1_count = results
            .evidence
            .iter()
            .filter(|e| e.code == EvidenceCode::Os1)
            .count();
        assert_eq!(os1_count, 1);
        assert!(results.notes.is_empty());
    }

    #[rstest]
    fn test_oncogenic_moderate_frequency_forces_tier_three() {
        // SBS1 alone would leave the therapeutic fallback at Tier IV via the
        // benign-leaning class, but the oncogenic evidence dominates.
        let aggregation = AggregationOutcome {
            evidence: vec![
                evidence(EvidenceCode::Ovs1, Direction::SupportsPathogenic),
                evidence(EvidenceCode::Sbs1, Direction::SupportsBenign),
            ],
            max_population_af: Some(0.02),
            ..AggregationOutcome::default()
        };
        let score = dsc(0.95);
        let results = reconcile_and_classify(
            aggregation,
            PathwayKind::TumorNormal,
            &score,
            &DscConfig::default(),
        );
        // OVS1 (+8) + SBS1 (-4) = 4: likely oncogenic, Tier III.
        assert_eq!(results.therapeutic.label, "III");
    }

    #[rstest]
    fn test_reconciliation_is_single_pass_and_idempotent() {
        let aggregation = AggregationOutcome {
            evidence: vec![evidence(EvidenceCode::Om1, Direction::SupportsPathogenic)],
            curated: vec![observation(CuratedLevel::Level2, true)],
            has_curated_oncogenic_level2: true,
            ..AggregationOutcome::default()
        };
        let score = dsc(0.95);
        let first = reconcile_and_classify(
            aggregation.clone(),
            PathwayKind::TumorNormal,
            &score,
            &DscConfig::default(),
        );
        let second = reconcile_and_classify(
            aggregation,
            PathwayKind::TumorNormal,
            &score,
            &DscConfig::default(),
        );
        assert_eq!(first, second);
        assert_eq!(
            first
                .evidence
                .iter()
                .filter(|e| e.code == EvidenceCode::Os1)
                .count(),
            1
        );
    }
}
