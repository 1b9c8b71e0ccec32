use crate::kb::hit::KnowledgeBaseHit;
use crate::kb::source::{GeneRole, KbKind};
use crate::kb::store::{VariantQuery, normalize_protein_change};
use crate::model::annotation::FunctionalAnnotation;
use crate::model::evidence::{Direction, EvidenceCode, Strength};
use crate::model::variant::{Consequence, Variant};

/// Splice-impact delta at or above this value counts as splice-disrupting.
pub const SPLICE_DELTA_THRESHOLD: f64 = 0.2;
/// Predictor-consensus size for computational evidence.
pub const PREDICTOR_CONSENSUS: usize = 3;
/// Stand-alone benign population frequency.
pub const POPULATION_STANDALONE_AF: f64 = 0.05;
/// Strong-benign population frequency.
pub const POPULATION_STRONG_AF: f64 = 0.01;

/// Predicates over a single KB hit. The table below, not a class hierarchy,
/// is the unit of clinical correctness; every row is exhaustively testable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HitPredicate {
    /// Curated record calls the variant oncogenic.
    CuratedOncogenic,
    /// Clinical-significance "Pathogenic" with at least this review status.
    PathogenicMinStars(u8),
    /// Clinical-significance "Pathogenic" with review status in this range.
    PathogenicStarsBetween(u8, u8),
    /// Clinical-significance "Benign" with at least this review status.
    BenignMinStars(u8),
    /// Clinical-significance "Benign" below this review status.
    BenignStarsBelow(u8),
    /// Hotspot observations of the same change (or codon-level counts) at or
    /// above the threshold.
    HotspotRecurrentMin(u32),
    HotspotRecurrentBetween(u32, u32),
    /// A different amino-acid change at a recurrently mutated codon.
    HotspotNovelChangeMin(u32),
}

impl HitPredicate {
    pub fn matches(&self, hit: &KnowledgeBaseHit, query: &VariantQuery) -> bool {
        match self {
            HitPredicate::CuratedOncogenic => hit
                .record
                .oncogenicity
                .as_deref()
                .is_some_and(|o| o.eq_ignore_ascii_case("oncogenic")),
            HitPredicate::PathogenicMinStars(min) => {
                is_pathogenic(hit) && hit.record.review_stars.unwrap_or(0) >= *min
            }
            HitPredicate::PathogenicStarsBetween(min, max) => {
                let stars = hit.record.review_stars.unwrap_or(0);
                is_pathogenic(hit) && stars >= *min && stars <= *max
            }
            HitPredicate::BenignMinStars(min) => {
                is_benign(hit) && hit.record.review_stars.unwrap_or(0) >= *min
            }
            HitPredicate::BenignStarsBelow(max) => {
                is_benign(hit) && hit.record.review_stars.unwrap_or(0) < *max
            }
            HitPredicate::HotspotRecurrentMin(min) => {
                same_change(hit, query) && hit.record.count.unwrap_or(0) >= *min
            }
            HitPredicate::HotspotRecurrentBetween(min, max) => {
                let count = hit.record.count.unwrap_or(0);
                same_change(hit, query) && count >= *min && count <= *max
            }
            HitPredicate::HotspotNovelChangeMin(min) => {
                !same_change(hit, query) && hit.record.count.unwrap_or(0) >= *min
            }
        }
    }
}

fn is_pathogenic(hit: &KnowledgeBaseHit) -> bool {
    hit.record
        .significance
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("pathogenic"))
}

fn is_benign(hit: &KnowledgeBaseHit) -> bool {
    hit.record
        .significance
        .as_deref()
        .is_some_and(|s| s.eq_ignore_ascii_case("benign"))
}

/// A hotspot record without a recorded change counts as the same change
/// (codon-level recurrence).
fn same_change(hit: &KnowledgeBaseHit, query: &VariantQuery) -> bool {
    match (&hit.record.protein_change, &query.protein_change) {
        (Some(recorded), Some(observed)) => {
            normalize_protein_change(recorded) == *observed
        }
        _ => true,
    }
}

/// One row of the hit-driven mapping table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRule {
    pub kind: KbKind,
    pub predicate: HitPredicate,
    pub code: EvidenceCode,
    pub strength: Strength,
    pub direction: Direction,
}

/// The hit-driven portion of the evidence-mapping table. Rows are evaluated
/// in order; several rows may fire for one hit.
pub fn hit_rules() -> Vec<HitRule> {
    use Direction::{SupportsBenign, SupportsPathogenic};
    use HitPredicate as P;
    use KbKind::{ClinicalSignificance, CuratedEvidence, Hotspot};

    vec![
        HitRule {
            kind: CuratedEvidence,
            predicate: P::CuratedOncogenic,
            code: EvidenceCode::Os1,
            strength: Strength::Strong,
            direction: SupportsPathogenic,
        },
        HitRule {
            kind: ClinicalSignificance,
            predicate: P::PathogenicMinStars(3),
            code: EvidenceCode::Os1,
            strength: Strength::Strong,
            direction: SupportsPathogenic,
        },
        HitRule {
            kind: ClinicalSignificance,
            predicate: P::PathogenicStarsBetween(1, 2),
            code: EvidenceCode::Op1,
            strength: Strength::Supporting,
            direction: SupportsPathogenic,
        },
        HitRule {
            kind: ClinicalSignificance,
            predicate: P::BenignMinStars(2),
            code: EvidenceCode::Sbs2,
            strength: Strength::Strong,
            direction: SupportsBenign,
        },
        HitRule {
            kind: ClinicalSignificance,
            predicate: P::BenignStarsBelow(2),
            code: EvidenceCode::Sbp1,
            strength: Strength::Supporting,
            direction: SupportsBenign,
        },
        HitRule {
            kind: Hotspot,
            predicate: P::HotspotRecurrentMin(50),
            code: EvidenceCode::Os3,
            strength: Strength::Strong,
            direction: SupportsPathogenic,
        },
        HitRule {
            kind: Hotspot,
            predicate: P::HotspotRecurrentBetween(10, 49),
            code: EvidenceCode::Om3,
            strength: Strength::Moderate,
            direction: SupportsPathogenic,
        },
        HitRule {
            kind: Hotspot,
            predicate: P::HotspotNovelChangeMin(10),
            code: EvidenceCode::Om4,
            strength: Strength::Moderate,
            direction: SupportsPathogenic,
        },
    ]
}

/// Context a variant-level rule sees: everything the aggregator knows about
/// one variant, independent of any single hit.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub variant: &'a Variant,
    pub annotation: &'a FunctionalAnnotation,
    pub gene_role: Option<GeneRole>,
    /// Critical domains carried by the gene-role KB for this gene.
    pub critical_domains: &'a [String],
    /// Maximum allele frequency across population KBs and the annotator
    /// snapshot; `None` when the variant is absent everywhere.
    pub max_population_af: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ContextPredicate {
    /// Predicted-null variant in an authoritative tumor-suppressor gene,
    /// outside the NMD-escape region.
    NullVariantInTsg,
    /// Combined population frequency above the threshold.
    PopulationAfAbove(f64),
    /// Combined population frequency within (low, high].
    PopulationAfBetween(f64, f64),
    /// Absent from every population source.
    AbsentFromPopulation,
    /// At least this many predictors call the variant damaging.
    DamagingConsensus(usize),
    /// At least this many predictors call it tolerated, none damaging.
    BenignConsensus(usize),
    /// Splice-impact delta at or above the threshold.
    SpliceImpact(f64),
    /// Variant falls in a critical, well-established protein domain of a
    /// known cancer gene.
    InCriticalDomain,
    /// In-frame length change in a known cancer gene.
    InframeIndelInCancerGene,
}

impl ContextPredicate {
    pub fn matches(&self, ctx: &RuleContext<'_>) -> bool {
        match self {
            ContextPredicate::NullVariantInTsg => {
                ctx.variant.is_predicted_null()
                    && ctx.gene_role.is_some_and(|r| r.is_tumor_suppressor())
                    && !ctx.annotation.escapes_nmd
            }
            ContextPredicate::PopulationAfAbove(threshold) => {
                ctx.max_population_af.is_some_and(|af| af > *threshold)
            }
            ContextPredicate::PopulationAfBetween(low, high) => ctx
                .max_population_af
                .is_some_and(|af| af > *low && af <= *high),
            ContextPredicate::AbsentFromPopulation => ctx.max_population_af.is_none(),
            ContextPredicate::DamagingConsensus(min) => {
                ctx.annotation.damaging_predictor_count() >= *min
            }
            ContextPredicate::BenignConsensus(min) => {
                ctx.annotation.tolerated_predictor_count() >= *min
                    && ctx.annotation.damaging_predictor_count() == 0
            }
            ContextPredicate::SpliceImpact(threshold) => ctx
                .annotation
                .max_splice_delta()
                .is_some_and(|delta| delta >= *threshold),
            ContextPredicate::InCriticalDomain => {
                if ctx.gene_role.is_none() || ctx.annotation.domains.is_empty() {
                    return false;
                }
                ctx.critical_domains.is_empty()
                    || ctx
                        .annotation
                        .domains
                        .iter()
                        .any(|d| ctx.critical_domains.contains(d))
            }
            ContextPredicate::InframeIndelInCancerGene => {
                ctx.gene_role.is_some()
                    && ctx.variant.consequences.iter().any(|c| {
                        matches!(
                            c,
                            Consequence::InframeInsertion | Consequence::InframeDeletion
                        )
                    })
            }
        }
    }
}

/// One row of the variant-level mapping table. `category` keys the pathway
/// weight multiplier.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContextRule {
    pub predicate: ContextPredicate,
    pub code: EvidenceCode,
    pub strength: Strength,
    pub direction: Direction,
    pub category: &'static str,
}

pub fn context_rules() -> Vec<ContextRule> {
    use ContextPredicate as P;
    use Direction::{SupportsBenign, SupportsPathogenic};

    vec![
        ContextRule {
            predicate: P::NullVariantInTsg,
            code: EvidenceCode::Ovs1,
            strength: Strength::VeryStrong,
            direction: SupportsPathogenic,
            category: "clinical_evidence",
        },
        ContextRule {
            predicate: P::PopulationAfAbove(POPULATION_STANDALONE_AF),
            code: EvidenceCode::Sbvs1,
            strength: Strength::VeryStrong,
            direction: SupportsBenign,
            category: "population",
        },
        ContextRule {
            predicate: P::PopulationAfBetween(POPULATION_STRONG_AF, POPULATION_STANDALONE_AF),
            code: EvidenceCode::Sbs1,
            strength: Strength::Strong,
            direction: SupportsBenign,
            category: "population",
        },
        ContextRule {
            predicate: P::AbsentFromPopulation,
            code: EvidenceCode::Op4,
            strength: Strength::Supporting,
            direction: SupportsPathogenic,
            category: "population",
        },
        ContextRule {
            predicate: P::DamagingConsensus(PREDICTOR_CONSENSUS),
            code: EvidenceCode::Op1,
            strength: Strength::Supporting,
            direction: SupportsPathogenic,
            category: "computational",
        },
        ContextRule {
            predicate: P::BenignConsensus(PREDICTOR_CONSENSUS),
            code: EvidenceCode::Sbp1,
            strength: Strength::Supporting,
            direction: SupportsBenign,
            category: "computational",
        },
        ContextRule {
            predicate: P::SpliceImpact(SPLICE_DELTA_THRESHOLD),
            code: EvidenceCode::Op3,
            strength: Strength::Supporting,
            direction: SupportsPathogenic,
            category: "computational",
        },
        ContextRule {
            predicate: P::InCriticalDomain,
            code: EvidenceCode::Om1,
            strength: Strength::Moderate,
            direction: SupportsPathogenic,
            category: "clinical_evidence",
        },
        ContextRule {
            predicate: P::InframeIndelInCancerGene,
            code: EvidenceCode::Om2,
            strength: Strength::Moderate,
            direction: SupportsPathogenic,
            category: "clinical_evidence",
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::kb::source::{KbRecord, ReliabilityTier};
    use crate::model::annotation::{PopulationSnapshot, PredictorCall, PredictorScore};
    use crate::model::variant::{AlleleDepth, Assembly, VariantKey, VariantType};

    fn variant_with(consequences: Vec<Consequence>) -> Variant {
        Variant {
            key: VariantKey {
                assembly: Assembly::Grch38,
                chromosome: "13".to_string(),
                position: 32_340_301,
                reference: "G".to_string(),
                alternate: "A".to_string(),
            },
            variant_type: VariantType::Snv,
            gene: Some("BRCA2".to_string()),
            transcript: None,
            hgvs_c: None,
            hgvs_p: None,
            consequences,
            genotype: "0/1".to_string(),
            tumor_depth: AlleleDepth {
                reference_reads: 50,
                alternate_reads: 50,
            },
            normal_depth: None,
            total_depth: 100,
            quality: Some(200.0),
            tumor_vaf: 0.5,
            normal_vaf: None,
            multiallelic: false,
            original_position: 32_340_301,
            original_record: String::new(),
            hotspot_rescued: false,
        }
    }

    fn hit(kind: KbKind, record: KbRecord) -> KnowledgeBaseHit {
        KnowledgeBaseHit {
            kb: "test".to_string(),
            kb_version: "v1".to_string(),
            kind,
            reliability: ReliabilityTier::ExpertCurated,
            record,
        }
    }

    fn query(protein_change: Option<&str>) -> VariantQuery {
        VariantQuery {
            chromosome: "7".to_string(),
            position: 1,
            reference: "A".to_string(),
            alternate: "T".to_string(),
            gene: Some("BRAF".to_string()),
            protein_change: protein_change.map(str::to_string),
            codon: Some(600),
        }
    }

    #[rstest]
    #[case(3, true)]
    #[case(4, true)]
    #[case(2, false)]
    fn test_pathogenic_star_threshold(#[case] stars: u8, #[case] fires: bool) {
        let predicate = HitPredicate::PathogenicMinStars(3);
        let h = hit(
            KbKind::ClinicalSignificance,
            KbRecord {
                record_id: "CV:1".to_string(),
                significance: Some("Pathogenic".to_string()),
                review_stars: Some(stars),
                ..KbRecord::default()
            },
        );
        assert_eq!(predicate.matches(&h, &query(None)), fires);
    }

    #[rstest]
    fn test_hotspot_same_vs_novel_change() {
        let record = KbRecord {
            record_id: "HS:1".to_string(),
            protein_change: Some("V600E".to_string()),
            count: Some(120),
            ..KbRecord::default()
        };
        let h = hit(KbKind::Hotspot, record);

        assert!(HitPredicate::HotspotRecurrentMin(50).matches(&h, &query(Some("V600E"))));
        assert!(!HitPredicate::HotspotNovelChangeMin(10).matches(&h, &query(Some("V600E"))));

        assert!(HitPredicate::HotspotNovelChangeMin(10).matches(&h, &query(Some("V600K"))));
        assert!(!HitPredicate::HotspotRecurrentMin(50).matches(&h, &query(Some("V600K"))));
    }

    #[rstest]
    fn test_ovs1_requires_tsg_and_nmd_sensitivity() {
        let variant = variant_with(vec![Consequence::SpliceDonorVariant]);
        let annotation = FunctionalAnnotation::default();
        let base = RuleContext {
            variant: &variant,
            annotation: &annotation,
            gene_role: Some(GeneRole::TumorSuppressor),
            critical_domains: &[],
            max_population_af: None,
        };
        assert!(ContextPredicate::NullVariantInTsg.matches(&base));

        // Not a TSG: never fires, regardless of consequence.
        let not_tsg = RuleContext {
            gene_role: Some(GeneRole::Oncogene),
            ..base
        };
        assert!(!ContextPredicate::NullVariantInTsg.matches(&not_tsg));
        let no_role = RuleContext {
            gene_role: None,
            ..base
        };
        assert!(!ContextPredicate::NullVariantInTsg.matches(&no_role));

        // Last-exon nonsense escaping NMD is excluded.
        let escapes = FunctionalAnnotation {
            escapes_nmd: true,
            ..FunctionalAnnotation::default()
        };
        let escaping = RuleContext {
            annotation: &escapes,
            ..base
        };
        assert!(!ContextPredicate::NullVariantInTsg.matches(&escaping));

        // Missense is not a null variant.
        let missense = variant_with(vec![Consequence::MissenseVariant]);
        let not_null = RuleContext {
            variant: &missense,
            ..base
        };
        assert!(!ContextPredicate::NullVariantInTsg.matches(&not_null));
    }

    #[rstest]
    #[case(Some(0.051), true, false)]
    #[case(Some(0.049), false, true)]
    #[case(Some(0.008), false, false)]
    #[case(None, false, false)]
    fn test_population_boundaries(
        #[case] af: Option<f64>,
        #[case] standalone: bool,
        #[case] strong: bool,
    ) {
        let variant = variant_with(vec![]);
        let annotation = FunctionalAnnotation::default();
        let ctx = RuleContext {
            variant: &variant,
            annotation: &annotation,
            gene_role: None,
            critical_domains: &[],
            max_population_af: af,
        };
        assert_eq!(
            ContextPredicate::PopulationAfAbove(POPULATION_STANDALONE_AF).matches(&ctx),
            standalone
        );
        assert_eq!(
            ContextPredicate::PopulationAfBetween(POPULATION_STRONG_AF, POPULATION_STANDALONE_AF)
                .matches(&ctx),
            strong
        );
        assert_eq!(
            ContextPredicate::AbsentFromPopulation.matches(&ctx),
            af.is_none()
        );
    }

    #[rstest]
    fn test_predictor_consensus_rules() {
        let variant = variant_with(vec![]);
        let mut annotation = FunctionalAnnotation::default();
        for name in ["sift", "polyphen", "revel"] {
            annotation.predictors.insert(
                name.to_string(),
                PredictorScore {
                    score: 0.95,
                    call: PredictorCall::Damaging,
                },
            );
        }
        let ctx = RuleContext {
            variant: &variant,
            annotation: &annotation,
            gene_role: None,
            critical_domains: &[],
            max_population_af: None,
        };
        assert!(ContextPredicate::DamagingConsensus(3).matches(&ctx));
        assert!(!ContextPredicate::BenignConsensus(3).matches(&ctx));
    }

    #[rstest]
    fn test_critical_domain_rule() {
        let variant = variant_with(vec![Consequence::MissenseVariant]);
        let annotation = FunctionalAnnotation {
            domains: vec!["DNA-binding".to_string()],
            ..FunctionalAnnotation::default()
        };
        let domains = ["DNA-binding".to_string()];
        let ctx = RuleContext {
            variant: &variant,
            annotation: &annotation,
            gene_role: Some(GeneRole::TumorSuppressor),
            critical_domains: &domains,
            max_population_af: None,
        };
        assert!(ContextPredicate::InCriticalDomain.matches(&ctx));

        let other_domains = ["Kinase".to_string()];
        let mismatched = RuleContext {
            critical_domains: &other_domains,
            ..ctx
        };
        assert!(!ContextPredicate::InCriticalDomain.matches(&mismatched));
    }

    #[rstest]
    fn test_population_snapshot_flows_into_context() {
        // Guard that the annotation accessor used to build RuleContext keeps
        // reporting group maxima.
        let snapshot = PopulationSnapshot {
            by_group: [("afr".to_string(), 0.002), ("eas".to_string(), 0.03)]
                .into_iter()
                .collect(),
        };
        assert_eq!(snapshot.max_af(), Some(0.03));
    }

    #[rstest]
    fn test_every_oncogenicity_code_in_tables_has_nonzero_points() {
        for rule in hit_rules() {
            if rule.code.framework() == crate::model::evidence::Framework::Oncogenicity {
                assert_ne!(rule.code.base_points(), 0, "{:?}", rule.code);
            }
        }
        for rule in context_rules() {
            assert_ne!(rule.code.base_points(), 0, "{:?}", rule.code);
        }
    }
}
