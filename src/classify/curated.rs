use log::debug;

use crate::aggregate::CuratedObservation;
use crate::config::cancer_type::CancerTypeMatch;
use crate::model::bundle::TierResult;
use crate::model::evidence::{Evidence, Framework};

/// Curated-level assignment: the most favorable level with an exact
/// cancer-type match wins; related-cancer and pan-cancer records fall back
/// with a single-step level downgrade.
pub fn classify_curated(
    observations: &[CuratedObservation],
    evidence: &[Evidence],
) -> TierResult {
    let pick = |matcher: &dyn Fn(CancerTypeMatch) -> bool| -> Option<&CuratedObservation> {
        observations
            .iter()
            .filter(|o| matcher(o.cancer_match))
            .min_by_key(|o| (o.level.rank(), o.record_id.clone()))
    };

    let exact = pick(&|m| m == CancerTypeMatch::Exact);
    let related = pick(&|m| matches!(m, CancerTypeMatch::Parent | CancerTypeMatch::OrganSystem));
    let pan = pick(&|m| m == CancerTypeMatch::PanCancer);

    let (observation, level, confidence, modulators) = match (exact, related, pan) {
        (Some(observation), _, _) => (observation, observation.level, 0.9, vec![]),
        (None, Some(observation), _) => (
            observation,
            observation.level.downgraded(),
            0.75,
            vec![format!(
                "cancer_type_fallback: {} match, level {} downgraded to {}",
                observation.cancer_match,
                observation.level,
                observation.level.downgraded()
            )],
        ),
        (None, None, Some(observation)) => (
            observation,
            observation.level.downgraded(),
            0.6,
            vec![format!(
                "cancer_type_fallback: pan-cancer record, level {} downgraded to {}",
                observation.level,
                observation.level.downgraded()
            )],
        ),
        (None, None, None) => return TierResult::unclassified(Framework::CuratedLevel),
    };

    let evidence_ids = evidence
        .iter()
        .filter(|e| {
            e.sources
                .iter()
                .any(|s| s.record_id == observation.record_id)
        })
        .map(|e| e.id.clone())
        .collect();
    debug!(
        "Curated level {level} from record {} ({} match)",
        observation.record_id, observation.cancer_match
    );

    TierResult {
        framework: Framework::CuratedLevel,
        label: level.to_string(),
        points: None,
        evidence_ids,
        modulators,
        confidence,
    }
}
