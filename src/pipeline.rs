use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{info, warn};
use ordermap::OrderMap;
use rayon::prelude::*;
use validator::Validate;

use crate::aggregate::EvidenceAggregator;
use crate::classify::reconcile_and_classify;
use crate::config::engine_config::EngineConfig;
use crate::config::pathway::{PathwayConfig, PathwayKind, route_pathway};
use crate::config::sample::{AnalysisType, SampleMetadata};
use crate::dsc::DscScorer;
use crate::error::PipelineError;
use crate::filter::{FilterDecision, SomaticFilter};
use crate::ingest::annotations::AnnotationCatalog;
use crate::ingest::normalizer::{Normalizer, attach_normal_vafs};
use crate::ingest::vcf::VcfFile;
use crate::kb::source::{KbKind, ReliabilityTier};
use crate::kb::store::{KbStore, VariantQuery};
use crate::model::annotation::FunctionalAnnotation;
use crate::model::bundle::{
    BundleHeader, BundleStatus, CannedText, FilteredVariant, InterpretationBundle, Phase,
    RunHeader, RunReport, TextBlock, TierResult,
};
use crate::model::evidence::Framework;
use crate::model::variant::{Variant, VariantKey};
use crate::purity::{PurityEstimate, UpstreamPurity, estimate_purity};
use crate::report::synthesizer::{ExpectedAlteration, SynthesisContext, TextSynthesizer};

/// Inputs for one run beyond the pipeline's own configuration.
#[derive(Debug, Default)]
pub struct RunInputs<'a> {
    pub normal_vafs: Option<&'a OrderMap<VariantKey, f64>>,
    pub upstream_purity: Option<UpstreamPurity>,
}

enum VariantOutcome {
    Bundle(Box<InterpretationBundle>),
    Filtered(FilteredVariant),
}

/// The interpretation pipeline: per-variant phases run strictly in sequence,
/// variants run in parallel over shared read-only reference data.
pub struct Pipeline {
    config: EngineConfig,
    metadata: SampleMetadata,
    pathway: PathwayConfig,
    store: Arc<KbStore>,
}

impl Pipeline {
    pub fn new(
        config: EngineConfig,
        metadata: SampleMetadata,
        store: Arc<KbStore>,
    ) -> Pipeline {
        let kind = match metadata.analysis_type {
            AnalysisType::TumorOnly => PathwayKind::TumorOnly,
            AnalysisType::TumorNormal => PathwayKind::TumorNormal,
        };
        let pathway = route_pathway(kind, metadata.cancer_type(), &config.pathway_overrides);
        info!(
            "Pipeline configured: {} pathway, cancer type {}",
            pathway.kind,
            metadata.cancer_type().unwrap_or("<pan-cancer>")
        );
        Pipeline {
            config,
            metadata,
            pathway,
            store,
        }
    }

    pub fn pathway(&self) -> &PathwayConfig {
        &self.pathway
    }

    pub fn run(
        &self,
        file: &VcfFile,
        catalog: &AnnotationCatalog,
        inputs: RunInputs<'_>,
        cancel: &AtomicBool,
    ) -> Result<RunReport, PipelineError> {
        self.metadata.validate()?;
        let started_at = Utc::now();
        let input_count = file.records.len();

        let normalizer = Normalizer::new(self.config.assembly, self.config.quality);
        let mut batch = normalizer.normalize_file(file, catalog)?;
        if self.pathway.kind == PathwayKind::TumorNormal
            && let Some(normal_vafs) = inputs.normal_vafs
        {
            attach_normal_vafs(&mut batch.variants, normal_vafs);
        }

        let purity = estimate_purity(
            inputs.upstream_purity,
            self.metadata.tumor_purity,
            &batch.variants,
        );
        info!(
            "Purity estimate {:.2} from {} (confidence {:.2})",
            purity.value, purity.source, purity.confidence
        );

        let observed_genes: BTreeSet<String> = batch
            .variants
            .iter()
            .filter_map(|v| v.gene.clone())
            .collect();
        let expected_actionable = self.expected_actionable();
        let reliabilities = self.reliability_map();

        let outcomes: Vec<VariantOutcome> = batch
            .variants
            .into_par_iter()
            .enumerate()
            .map(|(index, variant)| {
                self.process_variant(
                    index,
                    variant,
                    catalog,
                    &purity,
                    &expected_actionable,
                    &observed_genes,
                    &reliabilities,
                    cancel,
                )
            })
            .collect();

        let mut bundles = Vec::new();
        let mut filtered = batch.filtered;
        for outcome in outcomes {
            match outcome {
                VariantOutcome::Bundle(bundle) => bundles.push(*bundle),
                VariantOutcome::Filtered(record) => filtered.push(record),
            }
        }
        // Workers finish out of order; restore input order for consumers.
        bundles.sort_by_key(|b| b.input_index);

        let error_count =
            batch.errors.len() + bundles.iter().map(|b| b.errors.len()).sum::<usize>();
        let header = RunHeader {
            pathway: self.pathway.kind,
            kb_snapshot: self.store.snapshot(),
            thresholds: self.pathway.vaf_thresholds,
            input_count,
            filtered_count: filtered.len(),
            interpreted_count: bundles.len(),
            error_count,
            started_at,
            finished_at: Utc::now(),
        };
        info!(
            "Run complete: {} input records, {} interpreted, {} filtered, {} errors",
            header.input_count, header.interpreted_count, header.filtered_count, error_count
        );
        Ok(RunReport {
            header,
            bundles,
            filtered_variants: filtered,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn process_variant(
        &self,
        input_index: usize,
        variant: Variant,
        catalog: &AnnotationCatalog,
        purity: &PurityEstimate,
        expected_actionable: &[ExpectedAlteration],
        observed_genes: &BTreeSet<String>,
        reliabilities: &OrderMap<String, ReliabilityTier>,
        cancel: &AtomicBool,
    ) -> VariantOutcome {
        let deadline = Instant::now() + Duration::from_secs_f64(self.config.timeout_seconds);
        let mut phases = vec![Phase::Normalize];
        let annotation = catalog
            .get(
                &variant.key.chromosome,
                variant.key.position,
                &variant.key.reference,
                &variant.key.alternate,
            )
            .map(|record| record.functional.clone())
            .unwrap_or_default();

        if cancel.load(Ordering::Relaxed) {
            return self.incomplete(input_index, variant, &annotation, purity, phases, BundleStatus::Cancelled);
        }

        // Somatic filter.
        let filter = SomaticFilter::new(&self.pathway, &self.store);
        let variant = match filter.apply(variant, &annotation) {
            FilterDecision::Keep(variant) => *variant,
            FilterDecision::Drop(record) => {
                info!("Variant {} filtered: {}", record.key, record.reason);
                return VariantOutcome::Filtered(record);
            }
        };
        phases.push(Phase::Filter);
        phases.push(Phase::Purity);

        // Dynamic somatic confidence, with the tumor-only floor gate.
        let query = VariantQuery::from_variant(&variant);
        let hotspot_count = self
            .store
            .lookup_kind(KbKind::Hotspot, &query)
            .into_iter()
            .filter_map(|hit| hit.record.count)
            .max();
        let scorer = DscScorer::new(self.config.dsc);
        let dsc = scorer.score(&variant, &annotation, purity, hotspot_count);
        phases.push(Phase::Dsc);
        if self.pathway.kind == PathwayKind::TumorOnly
            && dsc.value < self.config.dsc.filter_floor
        {
            info!(
                "Variant {} downgraded to filtered at DSC {:.2}",
                variant.key, dsc.value
            );
            return VariantOutcome::Filtered(FilteredVariant {
                key: variant.key,
                reason: "low_somatic_confidence".to_string(),
            });
        }

        if cancel.load(Ordering::Relaxed) {
            return self.incomplete(input_index, variant, &annotation, purity, phases, BundleStatus::Cancelled);
        }
        if Instant::now() > deadline {
            warn!("Variant {} exceeded the per-variant budget", variant.key);
            return self.incomplete(input_index, variant, &annotation, purity, phases, BundleStatus::Timeout);
        }

        // Evidence aggregation.
        let aggregator = EvidenceAggregator::new(
            &self.store,
            &self.config.taxonomy,
            self.config.emerging_evidence_min_confidence,
        );
        let aggregation = aggregator.aggregate(
            &variant,
            &annotation,
            &self.pathway,
            self.metadata.cancer_type(),
        );
        let errors = aggregation.warnings.clone();
        let gene_summary = aggregation.gene_summary.clone();
        let max_population_af = aggregation.max_population_af;
        phases.push(Phase::Aggregate);

        if Instant::now() > deadline {
            warn!("Variant {} exceeded the per-variant budget", variant.key);
            return self.incomplete(input_index, variant, &annotation, purity, phases, BundleStatus::Timeout);
        }

        // Classification and the single reconciliation pass.
        let results = reconcile_and_classify(
            aggregation,
            self.pathway.kind,
            &dsc,
            &self.config.dsc,
        );
        phases.push(Phase::Classify);
        phases.push(Phase::Reconcile);

        // Narrative synthesis.
        let oncogenicity_class = results
            .oncogenicity
            .label
            .parse()
            .unwrap_or(crate::model::bundle::OncogenicityClass::Unclassified);
        let ctx = SynthesisContext {
            variant: &variant,
            annotation: &annotation,
            metadata: &self.metadata,
            config: &self.config,
            gene_summary: &gene_summary,
            evidence: &results.evidence,
            therapeutic: &results.therapeutic,
            oncogenicity: &results.oncogenicity,
            curated: &results.curated,
            oncogenicity_class,
            max_population_af,
            expected_actionable,
            observed_genes,
            reliabilities,
            degraded: !errors.is_empty(),
        };
        let texts = TextSynthesizer::synthesize(&ctx);
        phases.push(Phase::Synthesize);

        let status = if errors.is_empty() {
            BundleStatus::Complete
        } else {
            BundleStatus::Partial
        };
        VariantOutcome::Bundle(Box::new(InterpretationBundle {
            input_index,
            key: variant.key.clone(),
            variant,
            purity: *purity,
            dsc,
            evidence: results.evidence,
            therapeutic: results.therapeutic,
            oncogenicity: results.oncogenicity,
            curated: results.curated,
            texts,
            header: self.bundle_header(),
            phases_completed: phases,
            errors,
            status,
        }))
    }

    /// A structured bundle for timeouts and cancellations: the completed
    /// phases are recorded and no partial evidence from an incomplete phase
    /// is carried.
    #[allow(clippy::too_many_arguments)]
    fn incomplete(
        &self,
        input_index: usize,
        variant: Variant,
        annotation: &FunctionalAnnotation,
        purity: &PurityEstimate,
        phases: Vec<Phase>,
        status: BundleStatus,
    ) -> VariantOutcome {
        let scorer = DscScorer::new(self.config.dsc);
        let dsc = if phases.contains(&Phase::Dsc) {
            scorer.score(&variant, annotation, purity, None)
        } else {
            crate::dsc::DscScore {
                value: 0.0,
                vaf_purity_component: 0.0,
                prior_component: 0.0,
                context_component: 0.5,
                rationale: "not computed".to_string(),
            }
        };
        VariantOutcome::Bundle(Box::new(InterpretationBundle {
            input_index,
            key: variant.key.clone(),
            variant,
            purity: *purity,
            dsc,
            evidence: vec![],
            therapeutic: TierResult::unclassified(Framework::Therapeutic),
            oncogenicity: TierResult::unclassified(Framework::Oncogenicity),
            curated: TierResult::unclassified(Framework::CuratedLevel),
            texts: TextBlock::ALL.iter().map(|b| CannedText::empty(*b)).collect(),
            header: self.bundle_header(),
            phases_completed: phases,
            errors: vec![format!("pipeline_{status}")],
            status,
        }))
    }

    fn bundle_header(&self) -> BundleHeader {
        BundleHeader {
            pathway: self.pathway.kind,
            kb_snapshot: self.store.snapshot(),
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Genes with level 1 or 2 curated records for the sample's cancer type;
    /// the pertinent-negative block reports those without an observed
    /// alteration.
    fn expected_actionable(&self) -> Vec<ExpectedAlteration> {
        use crate::model::bundle::CuratedLevel;

        let mut expected: Vec<ExpectedAlteration> = Vec::new();
        for record in self.store.records_of_kind(KbKind::CuratedEvidence) {
            let Some(level) = record.level else { continue };
            if level.rank() > CuratedLevel::Level2.rank() {
                continue;
            }
            let exact = self
                .config
                .taxonomy
                .match_level(record.cancer_type.as_deref(), self.metadata.cancer_type())
                .is_some_and(|m| m.is_exact());
            if !exact {
                continue;
            }
            let Some(gene) = record.gene.clone() else {
                continue;
            };
            if let Some(existing) = expected.iter_mut().find(|e| e.gene == gene) {
                if level.rank() < existing.level.rank() {
                    existing.level = level;
                }
            } else {
                expected.push(ExpectedAlteration { gene, level });
            }
        }
        expected.sort_by(|a, b| a.gene.cmp(&b.gene));
        expected
    }

    /// Reliability tier per citable source: every loaded KB plus the
    /// synthetic sources used for annotator-derived evidence.
    fn reliability_map(&self) -> OrderMap<String, ReliabilityTier> {
        let mut map: OrderMap<String, ReliabilityTier> = self
            .store
            .descriptors()
            .map(|d| (d.name.clone(), d.reliability))
            .collect();
        map.insert(
            "population_snapshot".to_string(),
            ReliabilityTier::CommunityCurated,
        );
        map.insert(
            "functional_annotator".to_string(),
            ReliabilityTier::Computational,
        );
        map.insert(
            "clinical_significance".to_string(),
            ReliabilityTier::CommunityCurated,
        );
        map
    }
}
