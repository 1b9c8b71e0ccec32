use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::aggregate::concordance::apply_concordance;
use crate::aggregate::rules::{RuleContext, context_rules, hit_rules};
use crate::config::cancer_type::{CancerTaxonomy, CancerTypeMatch};
use crate::config::pathway::PathwayConfig;
use crate::kb::hit::KnowledgeBaseHit;
use crate::kb::source::{GeneRole, KbKind};
use crate::kb::store::{KbStore, VariantQuery};
use crate::model::annotation::FunctionalAnnotation;
use crate::model::bundle::CuratedLevel;
use crate::model::evidence::{Direction, Evidence, EvidenceCode, EvidenceSource, Strength};
use crate::model::variant::Variant;

/// A cancer-type-matched curated record, kept alongside the mapped evidence
/// for the curated-level classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CuratedObservation {
    pub kb: String,
    pub kb_version: String,
    pub record_id: String,
    pub level: CuratedLevel,
    pub cancer_match: CancerTypeMatch,
    pub oncogenic: bool,
    pub drugs: Vec<String>,
    pub investigational: bool,
}

/// Gene-level facts harvested from the gene-role KB for narrative text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneSummary {
    pub role: Option<GeneRole>,
    pub description: Option<String>,
    pub pathways: Vec<String>,
    pub critical_domains: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct AggregationOutcome {
    /// Mapped evidence, deterministically ordered, ids not yet assigned.
    pub evidence: Vec<Evidence>,
    pub curated: Vec<CuratedObservation>,
    pub gene_summary: GeneSummary,
    pub hotspot_max_count: Option<u32>,
    /// Maximum continental AF across the annotator snapshot and population
    /// KBs; `None` means absent everywhere.
    pub max_population_af: Option<f64>,
    /// Flags consumed by the cross-framework reconciler.
    pub has_two_star_pathogenic: bool,
    pub has_curated_oncogenic_level2: bool,
    pub conflict_count: usize,
    pub warnings: Vec<String>,
}

/// An unmapped evidence candidate; several candidates for the same code are
/// merged before emission.
#[derive(Debug, Clone)]
struct Candidate {
    code: EvidenceCode,
    direction: Direction,
    strength: Strength,
    source: EvidenceSource,
    base_confidence: f64,
    category: &'static str,
    rationale: String,
}

/// Queries every configured KB for a variant and converts the hits into
/// typed evidence through the mapping tables.
#[derive(Debug)]
pub struct EvidenceAggregator<'a> {
    store: &'a KbStore,
    taxonomy: &'a CancerTaxonomy,
    emerging_min_confidence: f64,
}

impl<'a> EvidenceAggregator<'a> {
    pub fn new(
        store: &'a KbStore,
        taxonomy: &'a CancerTaxonomy,
        emerging_min_confidence: f64,
    ) -> EvidenceAggregator<'a> {
        EvidenceAggregator {
            store,
            taxonomy,
            emerging_min_confidence,
        }
    }

    pub fn aggregate(
        &self,
        variant: &Variant,
        annotation: &FunctionalAnnotation,
        pathway: &PathwayConfig,
        cancer_type: Option<&str>,
    ) -> AggregationOutcome {
        let query = VariantQuery::from_variant(variant);
        let mut outcome = AggregationOutcome::default();

        let kb_order: Vec<String> = if pathway.kb_priority_order.is_empty() {
            self.store.descriptors().map(|d| d.name.clone()).collect()
        } else {
            pathway.kb_priority_order.clone()
        };

        let mut hits: Vec<KnowledgeBaseHit> = Vec::new();
        for kb_name in &kb_order {
            match self.store.lookup(kb_name, &query) {
                Ok(kb_hits) => hits.extend(kb_hits),
                Err(error) => {
                    warn!("KB lookup failed for {}: {error}", variant.key);
                    outcome.warnings.push(error.to_string());
                }
            }
        }

        outcome.gene_summary = gene_summary(&hits);
        outcome.hotspot_max_count = hits
            .iter()
            .filter(|h| h.kind == KbKind::Hotspot)
            .filter_map(|h| h.record.count)
            .max();
        outcome.max_population_af = combined_population_af(annotation, &hits);
        outcome.has_two_star_pathogenic = hits.iter().any(|h| {
            h.kind == KbKind::ClinicalSignificance
                && h.record
                    .significance
                    .as_deref()
                    .is_some_and(|s| s.eq_ignore_ascii_case("pathogenic"))
                && h.record.review_stars.unwrap_or(0) >= 2
        });

        let mut candidates: Vec<Candidate> = Vec::new();

        // Hit-driven table rows.
        let rules = hit_rules();
        for hit in &hits {
            for rule in rules.iter().filter(|r| r.kind == hit.kind) {
                if rule.predicate.matches(hit, &query) {
                    candidates.push(Candidate {
                        code: rule.code,
                        direction: rule.direction,
                        strength: rule.strength,
                        source: source_of(hit),
                        base_confidence: hit.reliability.base_confidence(),
                        category: hit.kind.multiplier_category(),
                        rationale: format!("{}: {} record {}", rule.code, hit.kb, hit.record_id()),
                    });
                }
            }
        }

        // Curated observations and therapeutic tier codes.
        for hit in hits.iter().filter(|h| h.kind == KbKind::CuratedEvidence) {
            let Some(level) = hit.record.level else {
                continue;
            };
            let Some(cancer_match) = self
                .taxonomy
                .match_level(hit.record.cancer_type.as_deref(), cancer_type)
            else {
                continue;
            };
            let observation = CuratedObservation {
                kb: hit.kb.clone(),
                kb_version: hit.kb_version.clone(),
                record_id: hit.record_id().to_string(),
                level,
                cancer_match,
                oncogenic: hit
                    .record
                    .oncogenicity
                    .as_deref()
                    .is_some_and(|o| o.eq_ignore_ascii_case("oncogenic")),
                drugs: hit.record.drugs.clone(),
                investigational: hit.record.investigational,
            };
            if observation.oncogenic && level.rank() <= CuratedLevel::Level2.rank() {
                outcome.has_curated_oncogenic_level2 = true;
            }
            if let Some((code, strength, rationale)) = self.tier_code_for(&observation, hit) {
                candidates.push(Candidate {
                    code,
                    direction: Direction::SupportsActionable,
                    strength,
                    source: source_of(hit),
                    base_confidence: hit.reliability.base_confidence(),
                    category: hit.kind.multiplier_category(),
                    rationale,
                });
            }
            outcome.curated.push(observation);
        }

        // Variant-level table rows.
        let gene_role = outcome
            .gene_summary
            .role
            .or_else(|| variant.gene.as_deref().and_then(|g| self.store.gene_role(g)));
        let ctx = RuleContext {
            variant,
            annotation,
            gene_role,
            critical_domains: &outcome.gene_summary.critical_domains,
            max_population_af: outcome.max_population_af,
        };
        for rule in context_rules() {
            if rule.predicate.matches(&ctx) {
                let (source, base_confidence) = context_source(rule.category, variant, &hits);
                candidates.push(Candidate {
                    code: rule.code,
                    direction: rule.direction,
                    strength: rule.strength,
                    source,
                    base_confidence,
                    category: rule.category,
                    rationale: format!("{}: variant-level rule", rule.code),
                });
            }
        }

        outcome.evidence = merge_candidates(candidates, pathway);
        outcome.conflict_count = apply_concordance(&mut outcome.evidence);
        outcome.evidence.sort_by(|a, b| a.bundle_ordering(b));
        debug!(
            "Aggregated {} evidence records for {} ({} curated observations)",
            outcome.evidence.len(),
            variant.key,
            outcome.curated.len()
        );
        outcome
    }

    /// Therapeutic tier code for one curated record: level-based, downgraded
    /// one step on any cancer-type fallback, with investigational records
    /// gated by the emerging-evidence knob.
    fn tier_code_for(
        &self,
        observation: &CuratedObservation,
        hit: &KnowledgeBaseHit,
    ) -> Option<(EvidenceCode, Strength, String)> {
        if observation.investigational {
            if hit.reliability.base_confidence() < self.emerging_min_confidence {
                return None;
            }
            return Some((
                EvidenceCode::TierIie,
                Strength::Supporting,
                format!("Tier-IIE: investigational record {}", observation.record_id),
            ));
        }
        let base = match observation.level {
            CuratedLevel::Level1 => (EvidenceCode::TierIaFda, Strength::VeryStrong),
            CuratedLevel::Level2 => (EvidenceCode::TierIbGuideline, Strength::Strong),
            CuratedLevel::Level3a | CuratedLevel::Level3b => {
                (EvidenceCode::TierIic, Strength::Moderate)
            }
            CuratedLevel::Level4 => (EvidenceCode::TierIid, Strength::Supporting),
            CuratedLevel::R1 | CuratedLevel::R2 => return None,
        };
        if observation.cancer_match.is_exact() {
            let rationale = format!(
                "{}: curated level {} record {} (exact cancer-type match)",
                base.0, observation.level, observation.record_id
            );
            return Some((base.0, base.1, rationale));
        }
        let downgraded = match base.0 {
            EvidenceCode::TierIaFda | EvidenceCode::TierIbGuideline => {
                (EvidenceCode::TierIic, Strength::Moderate)
            }
            EvidenceCode::TierIic => (EvidenceCode::TierIid, Strength::Supporting),
            EvidenceCode::TierIid => (EvidenceCode::TierIie, Strength::Supporting),
            _ => base,
        };
        let rationale = format!(
            "{}: curated level {} record {} (downgraded one step on {} fallback)",
            downgraded.0, observation.level, observation.record_id, observation.cancer_match
        );
        Some((downgraded.0, downgraded.1, rationale))
    }
}

fn source_of(hit: &KnowledgeBaseHit) -> EvidenceSource {
    EvidenceSource {
        kb: hit.kb.clone(),
        kb_version: hit.kb_version.clone(),
        record_id: hit.record_id().to_string(),
    }
}

fn gene_summary(hits: &[KnowledgeBaseHit]) -> GeneSummary {
    let mut summary = GeneSummary::default();
    for hit in hits.iter().filter(|h| h.kind == KbKind::GeneRole) {
        if summary.role.is_none() {
            summary.role = hit.record.role;
        }
        if summary.description.is_none() {
            summary.description = hit.record.description.clone();
        }
        for pathway in &hit.record.pathways {
            if !summary.pathways.contains(pathway) {
                summary.pathways.push(pathway.clone());
            }
        }
        for domain in &hit.record.critical_domains {
            if !summary.critical_domains.contains(domain) {
                summary.critical_domains.push(domain.clone());
            }
        }
    }
    summary
}

fn combined_population_af(
    annotation: &FunctionalAnnotation,
    hits: &[KnowledgeBaseHit],
) -> Option<f64> {
    let kb_max = hits
        .iter()
        .filter(|h| h.kind == KbKind::PopulationFrequency)
        .filter_map(|h| {
            h.record
                .population_af
                .as_ref()
                .and_then(|by_group| by_group.values().copied().fold(None, |acc: Option<f64>, af| {
                    Some(acc.map_or(af, |m| m.max(af)))
                }))
        })
        .fold(None, |acc: Option<f64>, af| Some(acc.map_or(af, |m| m.max(af))));
    match (annotation.max_population_af(), kb_max) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}

/// Source and base confidence for a variant-level rule: population rules
/// cite the population KB when it reported the variant, computational rules
/// cite the annotator.
fn context_source(
    category: &str,
    variant: &Variant,
    hits: &[KnowledgeBaseHit],
) -> (EvidenceSource, f64) {
    let kind = match category {
        "population" => Some(KbKind::PopulationFrequency),
        "clinical_evidence" => Some(KbKind::GeneRole),
        _ => None,
    };
    if let Some(kind) = kind
        && let Some(hit) = hits.iter().find(|h| h.kind == kind)
    {
        return (source_of(hit), hit.reliability.base_confidence());
    }
    let (kb, base) = match category {
        "population" => ("population_snapshot", 0.7),
        "computational" => ("functional_annotator", 0.5),
        _ => ("functional_annotator", 0.5),
    };
    (
        EvidenceSource {
            kb: kb.to_string(),
            kb_version: String::new(),
            record_id: variant.key.to_string(),
        },
        base,
    )
}

/// Merges candidates sharing a code into one evidence record: union of
/// sources, strongest strength, best confidence, most favorable multiplier.
fn merge_candidates(candidates: Vec<Candidate>, pathway: &PathwayConfig) -> Vec<Evidence> {
    let mut merged: Vec<Evidence> = Vec::new();
    let mut multipliers: Vec<f64> = Vec::new();

    for candidate in candidates {
        let multiplier = pathway.multiplier(candidate.category);
        if let Some(pos) = merged.iter().position(|e| e.code == candidate.code) {
            let existing = &mut merged[pos];
            if !existing
                .sources
                .iter()
                .any(|s| s.kb == candidate.source.kb && s.record_id == candidate.source.record_id)
            {
                existing.sources.push(candidate.source);
            }
            if candidate.strength.rank() < existing.strength.rank() {
                existing.strength = candidate.strength;
            }
            if candidate.base_confidence > existing.confidence {
                existing.confidence = candidate.base_confidence;
            }
            if !existing.rationale.contains(candidate.rationale.as_str()) {
                existing.rationale.push_str("; ");
                existing.rationale.push_str(&candidate.rationale);
            }
            if multiplier > multipliers[pos] {
                multipliers[pos] = multiplier;
                existing.weight = f64::from(existing.points) * multiplier;
            }
        } else {
            let mut evidence = Evidence::new(
                candidate.code,
                candidate.direction,
                candidate.strength,
                vec![candidate.source],
                candidate.base_confidence,
                candidate.rationale,
            );
            evidence.weight = f64::from(evidence.points) * multiplier;
            merged.push(evidence);
            multipliers.push(multiplier);
        }
    }
    merged
}

/// Assigns stable identifiers ("E01", "E02", ...) in the deterministic
/// bundle order. Called once, after reconciliation settles the final set.
pub fn assign_evidence_ids(evidence: &mut [Evidence]) {
    evidence.sort_by(|a, b| a.bundle_ordering(b));
    for (index, record) in evidence.iter_mut().enumerate() {
        record.id = format!("E{:02}", index + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    use crate::config::pathway::PathwayConfig;
    use crate::kb::source::{KbFile, KbRecord, QueryShape, ReliabilityTier};
    use crate::model::annotation::{PredictorCall, PredictorScore};
    use crate::model::variant::{AlleleDepth, Assembly, Consequence, VariantKey, VariantType};

    fn braf_variant() -> Variant {
        Variant {
            key: VariantKey {
                assembly: Assembly::Grch38,
                chromosome: "7".to_string(),
                position: 140_753_336,
                reference: "A".to_string(),
                alternate: "T".to_string(),
            },
            variant_type: VariantType::Snv,
            gene: Some("BRAF".to_string()),
            transcript: Some("NM_004333.6".to_string()),
            hgvs_c: Some("c.1799T>A".to_string()),
            hgvs_p: Some("p.V600E".to_string()),
            consequences: vec![Consequence::MissenseVariant],
            genotype: "0/1".to_string(),
            tumor_depth: AlleleDepth {
                reference_reads: 110,
                alternate_reads: 90,
            },
            normal_depth: None,
            total_depth: 200,
            quality: Some(700.0),
            tumor_vaf: 0.45,
            normal_vaf: None,
            multiallelic: false,
            original_position: 140_753_336,
            original_record: String::new(),
            hotspot_rescued: false,
        }
    }

    fn braf_store() -> KbStore {
        KbStore::from_files(vec![
            KbFile {
                name: "curated_evidence".to_string(),
                version: "2025-06".to_string(),
                kind: KbKind::CuratedEvidence,
                query_shape: QueryShape::AminoAcidChange,
                reliability: ReliabilityTier::Regulatory,
                freshness: String::new(),
                records: vec![KbRecord {
                    record_id: "CUR:BRAF:V600E:MEL".to_string(),
                    gene: Some("BRAF".to_string()),
                    protein_change: Some("V600E".to_string()),
                    cancer_type: Some("MEL".to_string()),
                    level: Some(CuratedLevel::Level1),
                    oncogenicity: Some("Oncogenic".to_string()),
                    drugs: vec!["vemurafenib".to_string()],
                    ..KbRecord::default()
                }],
            },
            KbFile {
                name: "clinvar".to_string(),
                version: "2025-05".to_string(),
                kind: KbKind::ClinicalSignificance,
                query_shape: QueryShape::AminoAcidChange,
                reliability: ReliabilityTier::CommunityCurated,
                freshness: String::new(),
                records: vec![KbRecord {
                    record_id: "CV:13961".to_string(),
                    gene: Some("BRAF".to_string()),
                    protein_change: Some("V600E".to_string()),
                    significance: Some("Pathogenic".to_string()),
                    review_stars: Some(3),
                    ..KbRecord::default()
                }],
            },
            KbFile {
                name: "hotspots".to_string(),
                version: "v2".to_string(),
                kind: KbKind::Hotspot,
                query_shape: QueryShape::CodonPosition,
                reliability: ReliabilityTier::ExpertCurated,
                freshness: String::new(),
                records: vec![KbRecord {
                    record_id: "HS:BRAF:600".to_string(),
                    gene: Some("BRAF".to_string()),
                    codon: Some(600),
                    protein_change: Some("V600E".to_string()),
                    count: Some(12_000),
                    ..KbRecord::default()
                }],
            },
            KbFile {
                name: "gene_roles".to_string(),
                version: "2025-01".to_string(),
                kind: KbKind::GeneRole,
                query_shape: QueryShape::GeneSymbol,
                reliability: ReliabilityTier::ExpertCurated,
                freshness: String::new(),
                records: vec![KbRecord {
                    record_id: "CGC:BRAF".to_string(),
                    gene: Some("BRAF".to_string()),
                    role: Some(GeneRole::Oncogene),
                    description: Some(
                        "Serine/threonine kinase in the MAPK signalling cascade".to_string(),
                    ),
                    pathways: vec!["MAPK".to_string()],
                    ..KbRecord::default()
                }],
            },
        ])
        .unwrap()
    }

    fn aggregator<'a>(store: &'a KbStore, taxonomy: &'a CancerTaxonomy) -> EvidenceAggregator<'a> {
        EvidenceAggregator::new(store, taxonomy, 0.5)
    }

    fn codes(outcome: &AggregationOutcome) -> Vec<EvidenceCode> {
        outcome.evidence.iter().map(|e| e.code).collect()
    }

    #[rstest]
    fn test_braf_v600e_melanoma_maps_expected_codes() {
        let store = braf_store();
        let taxonomy = CancerTaxonomy::default();
        let agg = aggregator(&store, &taxonomy);
        let pathway = PathwayConfig::tumor_only();

        let outcome = agg.aggregate(
            &braf_variant(),
            &FunctionalAnnotation::default(),
            &pathway,
            Some("MEL"),
        );

        let codes = codes(&outcome);
        assert!(codes.contains(&EvidenceCode::Os1));
        assert!(codes.contains(&EvidenceCode::Os3));
        assert!(codes.contains(&EvidenceCode::Op4));
        assert!(codes.contains(&EvidenceCode::TierIaFda));

        // OS1 merges the curated and ClinVar sources.
        let os1 = outcome
            .evidence
            .iter()
            .find(|e| e.code == EvidenceCode::Os1)
            .unwrap();
        assert_eq!(os1.sources.len(), 2);
        assert!(os1.confidence >= 0.95, "got {}", os1.confidence);

        assert_eq!(outcome.hotspot_max_count, Some(12_000));
        assert_eq!(outcome.curated.len(), 1);
        assert_eq!(outcome.curated[0].level, CuratedLevel::Level1);
        assert!(outcome.curated[0].cancer_match.is_exact());
        assert!(outcome.has_curated_oncogenic_level2);
    }

    #[rstest]
    fn test_cancer_type_fallback_downgrades_tier_code() {
        let store = braf_store();
        let taxonomy = CancerTaxonomy::default();
        let agg = aggregator(&store, &taxonomy);
        let pathway = PathwayConfig::tumor_only();

        // Melanoma-curated level 1 looked up for a skin-lineage sibling:
        // organ-system fallback, Tier-IA downgrades to Tier-IIC.
        let outcome = agg.aggregate(
            &braf_variant(),
            &FunctionalAnnotation::default(),
            &pathway,
            Some("SKCM"),
        );
        let codes = codes(&outcome);
        assert!(!codes.contains(&EvidenceCode::TierIaFda));
        assert!(codes.contains(&EvidenceCode::TierIic));
        assert_eq!(
            outcome.curated[0].cancer_match,
            CancerTypeMatch::OrganSystem
        );
    }

    #[rstest]
    fn test_weight_multipliers_scale_weight_not_points() {
        let store = braf_store();
        let taxonomy = CancerTaxonomy::default();
        let agg = aggregator(&store, &taxonomy);
        let pathway = PathwayConfig::tumor_only();

        let outcome = agg.aggregate(
            &braf_variant(),
            &FunctionalAnnotation::default(),
            &pathway,
            Some("MEL"),
        );
        let op4 = outcome
            .evidence
            .iter()
            .find(|e| e.code == EvidenceCode::Op4)
            .unwrap();
        assert_eq!(op4.points, 1);
        assert!((op4.weight - 0.7).abs() < 1e-12);
    }

    #[rstest]
    fn test_predictor_consensus_emits_op1() {
        let store = KbStore::from_files(vec![]).unwrap();
        let taxonomy = CancerTaxonomy::default();
        let agg = aggregator(&store, &taxonomy);
        let pathway = PathwayConfig::tumor_normal();

        let mut annotation = FunctionalAnnotation::default();
        for name in ["sift", "polyphen", "revel", "fathmm"] {
            annotation.predictors.insert(
                name.to_string(),
                PredictorScore {
                    score: 0.99,
                    call: PredictorCall::Damaging,
                },
            );
        }
        let outcome = agg.aggregate(&braf_variant(), &annotation, &pathway, None);
        let op1 = outcome
            .evidence
            .iter()
            .find(|e| e.code == EvidenceCode::Op1)
            .unwrap();
        assert_eq!(op1.sources[0].kb, "functional_annotator");
        // Computational evidence is down-weighted in the tumor-normal
        // pathway.
        assert!((op1.weight - 0.5).abs() < 1e-12);
    }

    #[rstest]
    fn test_unknown_kb_in_priority_order_is_isolated() {
        let store = braf_store();
        let taxonomy = CancerTaxonomy::default();
        let agg = aggregator(&store, &taxonomy);
        let mut pathway = PathwayConfig::tumor_only();
        pathway.kb_priority_order = vec!["hotspots".to_string(), "not_loaded".to_string()];

        let outcome = agg.aggregate(
            &braf_variant(),
            &FunctionalAnnotation::default(),
            &pathway,
            Some("MEL"),
        );
        assert_eq!(outcome.warnings.len(), 1);
        assert!(codes(&outcome).contains(&EvidenceCode::Os3));
    }

    #[rstest]
    fn test_evidence_ids_follow_bundle_order() {
        let store = braf_store();
        let taxonomy = CancerTaxonomy::default();
        let agg = aggregator(&store, &taxonomy);
        let pathway = PathwayConfig::tumor_only();

        let mut outcome = agg.aggregate(
            &braf_variant(),
            &FunctionalAnnotation::default(),
            &pathway,
            Some("MEL"),
        );
        assign_evidence_ids(&mut outcome.evidence);
        let ids: Vec<&str> = outcome.evidence.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["E01", "E02", "E03", "E04"]);
        // Therapeutic framework sorts first, then oncogenicity codes by
        // strength descending and code lexicographic.
        assert_eq!(outcome.evidence[0].code, EvidenceCode::TierIaFda);
        assert_eq!(outcome.evidence[1].code, EvidenceCode::Os1);
        assert_eq!(outcome.evidence[3].code, EvidenceCode::Op4);
    }

    #[rstest]
    fn test_aggregation_is_deterministic() {
        let store = braf_store();
        let taxonomy = CancerTaxonomy::default();
        let agg = aggregator(&store, &taxonomy);
        let pathway = PathwayConfig::tumor_only();

        let a = agg.aggregate(
            &braf_variant(),
            &FunctionalAnnotation::default(),
            &pathway,
            Some("MEL"),
        );
        let b = agg.aggregate(
            &braf_variant(),
            &FunctionalAnnotation::default(),
            &pathway,
            Some("MEL"),
        );
        assert_eq!(a.evidence, b.evidence);
        assert_eq!(a.curated, b.curated);
    }
}
