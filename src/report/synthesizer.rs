use std::collections::BTreeSet;

use ordermap::OrderMap;
use serde::{Deserialize, Serialize};

use crate::aggregate::GeneSummary;
use crate::config::engine_config::EngineConfig;
use crate::config::sample::SampleMetadata;
use crate::kb::source::ReliabilityTier;
use crate::model::annotation::FunctionalAnnotation;
use crate::model::bundle::{CannedText, CuratedLevel, OncogenicityClass, TextBlock, TierResult};
use crate::model::evidence::Evidence;
use crate::model::variant::Variant;
use crate::report::blocks;

/// Blocks whose cited evidence falls below this confidence gain a standard
/// qualifier sentence.
const LOW_CONFIDENCE_THRESHOLD: f64 = 0.6;
const LOW_CONFIDENCE_QUALIFIER: &str =
    "Supporting evidence for this section carries reduced confidence; interpret with caution. ";
const DEGRADED_QUALIFIER: &str =
    "Evidence retrieval was incomplete for this variant and the description below may be \
degraded. ";

/// An actionable alteration expected for the cancer type, used by the
/// pertinent-negatives block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpectedAlteration {
    pub gene: String,
    pub level: CuratedLevel,
}

/// Everything the block generators are allowed to see. Read-only; block
/// generation is a pure function of this context.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisContext<'a> {
    pub variant: &'a Variant,
    pub annotation: &'a FunctionalAnnotation,
    pub metadata: &'a SampleMetadata,
    pub config: &'a EngineConfig,
    pub gene_summary: &'a GeneSummary,
    pub evidence: &'a [Evidence],
    pub therapeutic: &'a TierResult,
    pub oncogenicity: &'a TierResult,
    pub curated: &'a TierResult,
    pub oncogenicity_class: OncogenicityClass,
    pub max_population_af: Option<f64>,
    pub expected_actionable: &'a [ExpectedAlteration],
    pub observed_genes: &'a BTreeSet<String>,
    pub reliabilities: &'a OrderMap<String, ReliabilityTier>,
    /// Set when per-variant errors degraded evidence retrieval.
    pub degraded: bool,
}

/// Produces the eight canned-text blocks, always in the enumerated order.
/// Given the same context the output is byte-identical: no randomness, no
/// free generation.
#[derive(Debug, Default)]
pub struct TextSynthesizer;

impl TextSynthesizer {
    pub fn synthesize(ctx: &SynthesisContext<'_>) -> Vec<CannedText> {
        TextBlock::ALL
            .iter()
            .map(|block| {
                let text = match block {
                    TextBlock::GeneralGeneInfo => blocks::general_gene_info(ctx),
                    TextBlock::GeneDxInterpretation => blocks::gene_dx_interpretation(ctx),
                    TextBlock::GeneralVariantInfo => blocks::general_variant_info(ctx),
                    TextBlock::VariantDxInterpretation => blocks::variant_dx_interpretation(ctx),
                    TextBlock::IncidentalFindings => blocks::incidental_findings(ctx),
                    TextBlock::ChromosomalAlterationInterpretation => {
                        blocks::chromosomal_alteration(ctx)
                    }
                    TextBlock::PertinentNegatives => blocks::pertinent_negatives(ctx),
                    TextBlock::Biomarkers => blocks::biomarkers(ctx),
                };
                Self::qualify(text, ctx)
            })
            .collect()
    }

    /// Applies the standard qualifier prefixes: low cited confidence on any
    /// block, degraded evidence on the technical block.
    fn qualify(mut text: CannedText, ctx: &SynthesisContext<'_>) -> CannedText {
        if text.body.is_empty() {
            return text;
        }
        if text.confidence < LOW_CONFIDENCE_THRESHOLD {
            text.body = format!("{LOW_CONFIDENCE_QUALIFIER}{}", text.body);
        }
        if ctx.degraded && text.block == TextBlock::GeneralVariantInfo {
            text.body = format!("{DEGRADED_QUALIFIER}{}", text.body);
        }
        text
    }
}
