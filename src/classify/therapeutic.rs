use log::debug;

use crate::aggregate::rules::POPULATION_STANDALONE_AF;
use crate::config::engine_config::DscConfig;
use crate::config::pathway::PathwayKind;
use crate::dsc::DscScore;
use crate::model::bundle::{OncogenicityClass, TherapeuticTier, TierResult};
use crate::model::evidence::{Evidence, EvidenceCode, Framework};

/// Everything the therapeutic classifier needs beyond the evidence set.
#[derive(Debug, Clone, Copy)]
pub struct TherapeuticContext<'a> {
    pub pathway_kind: PathwayKind,
    pub dsc: &'a DscScore,
    pub dsc_config: &'a DscConfig,
    pub oncogenicity: OncogenicityClass,
    pub max_population_af: Option<f64>,
}

fn tier_of_code(code: EvidenceCode) -> Option<TherapeuticTier> {
    match code {
        EvidenceCode::TierIaFda => Some(TherapeuticTier::Ia),
        EvidenceCode::TierIbGuideline => Some(TherapeuticTier::Ib),
        EvidenceCode::TierIic => Some(TherapeuticTier::Iic),
        EvidenceCode::TierIid => Some(TherapeuticTier::Iid),
        EvidenceCode::TierIie => Some(TherapeuticTier::Iie),
        _ => None,
    }
}

/// AMP/ASCO/CAP therapeutic tier assignment. Picks the most actionable tier
/// supported by the evidence, then applies the common-variant stand-alone
/// rule and, in tumor-only runs, the DSC gates.
pub fn classify_therapeutic(evidence: &[Evidence], ctx: &TherapeuticContext<'_>) -> TierResult {
    let mut modulators = Vec::new();

    // Common-variant stand-alone: population frequency above 5% forces Tier
    // IV regardless of any other evidence.
    if ctx
        .max_population_af
        .is_some_and(|af| af > POPULATION_STANDALONE_AF)
    {
        let ids = evidence_ids_for(evidence, EvidenceCode::Sbvs1);
        return TierResult {
            framework: Framework::Therapeutic,
            label: TherapeuticTier::Iv.to_string(),
            points: None,
            evidence_ids: ids,
            modulators: vec!["common_variant_standalone".to_string()],
            confidence: 0.99,
        };
    }

    let best = evidence
        .iter()
        .filter_map(|e| tier_of_code(e.code).map(|tier| (tier, e)))
        .min_by_key(|(tier, _)| tier.rank());

    let (tier, confidence, evidence_ids) = match best {
        Some((tier, _)) => {
            let chosen_code = evidence
                .iter()
                .filter_map(|e| tier_of_code(e.code).map(|t| (t, e.code)))
                .filter(|(t, _)| *t == tier)
                .map(|(_, code)| code)
                .next()
                .unwrap_or(EvidenceCode::TierIie);
            let ids = evidence_ids_for(evidence, chosen_code);
            let confidence = evidence
                .iter()
                .filter(|e| e.code == chosen_code)
                .map(|e| e.confidence)
                .fold(0.0f64, f64::max);
            (tier, confidence, ids)
        }
        None => {
            // No direct therapeutic evidence: fall through to the
            // oncogenicity-derived tiers.
            let tier = if ctx.oncogenicity.is_oncogenic() {
                TherapeuticTier::Iii
            } else if ctx.oncogenicity.is_benign() {
                TherapeuticTier::Iv
            } else {
                TherapeuticTier::Unclassified
            };
            (tier, 0.5, vec![])
        }
    };

    let gated = apply_dsc_gates(tier, ctx, &mut modulators);
    debug!("Therapeutic tier {gated} (raw {tier}, DSC {:.2})", ctx.dsc.value);

    TierResult {
        framework: Framework::Therapeutic,
        label: gated.to_string(),
        points: None,
        evidence_ids,
        modulators,
        confidence,
    }
}

/// Tumor-only DSC gates: Tier I needs DSC above the tier-one gate, Tier II
/// above the tier-two gate; below that the result caps at Tier III. In
/// tumor-normal runs DSC is reported but never gates.
fn apply_dsc_gates(
    tier: TherapeuticTier,
    ctx: &TherapeuticContext<'_>,
    modulators: &mut Vec<String>,
) -> TherapeuticTier {
    if ctx.pathway_kind != PathwayKind::TumorOnly {
        return tier;
    }
    let dsc = ctx.dsc.value;
    let gates = ctx.dsc_config;
    let demoted = match tier {
        TherapeuticTier::Ia | TherapeuticTier::Ib => {
            if dsc >= gates.tier_one_gate {
                tier
            } else if dsc >= gates.tier_two_gate {
                TherapeuticTier::Iic
            } else {
                TherapeuticTier::Iii
            }
        }
        TherapeuticTier::Iic | TherapeuticTier::Iid | TherapeuticTier::Iie => {
            if dsc >= gates.tier_two_gate {
                tier
            } else {
                TherapeuticTier::Iii
            }
        }
        other => other,
    };
    if demoted != tier {
        modulators.push(format!(
            "dsc_gate: demoted from {tier} to {demoted} at DSC {dsc:.2}"
        ));
    }
    demoted
}

fn evidence_ids_for(evidence: &[Evidence], code: EvidenceCode) -> Vec<String> {
    evidence
        .iter()
        .filter(|e| e.code == code)
        .map(|e| e.id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::model::evidence::{Direction, EvidenceSource, Strength};

    fn evidence(code: EvidenceCode) -> Evidence {
        Evidence::new(
            code,
            Direction::SupportsActionable,
            Strength::Strong,
            vec![EvidenceSource {
                kb: "curated".to_string(),
                kb_version: "v1".to_string(),
                record_id: "r".to_string(),
            }],
            0.95,
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

    fn ctx<'a>(
        pathway_kind: PathwayKind,
        dsc: &'a DscScore,
        dsc_config: &'a DscConfig,
        oncogenicity: OncogenicityClass,
        max_population_af: Option<f64>,
    ) -> TherapeuticContext<'a> {
        TherapeuticContext {
            pathway_kind,
            dsc,
            dsc_config,
            oncogenicity,
            max_population_af,
        }
    }

    #[rstest]
    fn test_tier_ia_with_high_dsc() {
        let score = dsc(0.93);
        let config = DscConfig::default();
        let context = ctx(
            PathwayKind::TumorOnly,
            &score,
            &config,
            OncogenicityClass::Oncogenic,
            None,
        );
        let result = classify_therapeutic(&[evidence(EvidenceCode::TierIaFda)], &context);
        assert_eq!(result.label, "IA");
        assert!(result.modulators.is_empty());
    }

    #[rstest]
    #[case(0.75, "IIC")]
    #[case(0.45, "III")]
    fn test_dsc_gates_demote_tier_one(#[case] dsc_value: f64, #[case] expected: &str) {
        let score = dsc(dsc_value);
        let config = DscConfig::default();
        let context = ctx(
            PathwayKind::TumorOnly,
            &score,
            &config,
            OncogenicityClass::Oncogenic,
            None,
        );
        let result = classify_therapeutic(&[evidence(EvidenceCode::TierIaFda)], &context);
        assert_eq!(result.label, expected);
        assert_eq!(result.modulators.len(), 1);
    }

    #[rstest]
    fn test_tumor_normal_ignores_dsc_gate() {
        let score = dsc(0.3);
        let config = DscConfig::default();
        let context = ctx(
            PathwayKind::TumorNormal,
            &score,
            &config,
            OncogenicityClass::Oncogenic,
            None,
        );
        let result = classify_therapeutic(&[evidence(EvidenceCode::TierIaFda)], &context);
        assert_eq!(result.label, "IA");
    }

    #[rstest]
    #[case(OncogenicityClass::Oncogenic, "III")]
    #[case(OncogenicityClass::LikelyOncogenic, "III")]
    #[case(OncogenicityClass::Benign, "IV")]
    #[case(OncogenicityClass::LikelyBenign, "IV")]
    #[case(OncogenicityClass::Vus, "unclassified")]
    fn test_oncogenicity_fallback_without_therapeutic_evidence(
        #[case] class: OncogenicityClass,
        #[case] expected: &str,
    ) {
        let score = dsc(0.95);
        let config = DscConfig::default();
        let context = ctx(PathwayKind::TumorNormal, &score, &config, class, None);
        let result = classify_therapeutic(&[], &context);
        assert_eq!(result.label, expected);
    }

    #[rstest]
    fn test_common_variant_standalone_overrides_everything() {
        let score = dsc(0.95);
        let config = DscConfig::default();
        let context = ctx(
            PathwayKind::TumorNormal,
            &score,
            &config,
            OncogenicityClass::Oncogenic,
            Some(0.12),
        );
        let result = classify_therapeutic(&[evidence(EvidenceCode::TierIaFda)], &context);
        assert_eq!(result.label, "IV");
        assert_eq!(result.modulators, vec!["common_variant_standalone"]);
    }

    #[rstest]
    fn test_most_actionable_tier_wins() {
        let score = dsc(0.95);
        let config = DscConfig::default();
        let context = ctx(
            PathwayKind::TumorOnly,
            &score,
            &config,
            OncogenicityClass::Oncogenic,
            None,
        );
        let set = vec![
            evidence(EvidenceCode::TierIid),
            evidence(EvidenceCode::TierIbGuideline),
            evidence(EvidenceCode::TierIie),
        ];
        let result = classify_therapeutic(&set, &context);
        assert_eq!(result.label, "IB");
    }
}
