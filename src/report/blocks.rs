use crate::model::bundle::{CannedText, TextBlock};
use crate::model::evidence::{Direction, Evidence, EvidenceCode};
use crate::report::citations::{CitationList, reliability_order};
use crate::report::synthesizer::SynthesisContext;

/// Block 1: gene-level background from the gene-role, domain, and pathway
/// KBs.
pub fn general_gene_info(ctx: &SynthesisContext<'_>) -> CannedText {
    let gene = ctx.variant.gene_symbol();
    if gene.is_empty() {
        return CannedText::empty(TextBlock::GeneralGeneInfo);
    }
    let mut body = String::new();
    if let Some(description) = &ctx.gene_summary.description {
        body.push_str(&format!("{gene}: {description}."));
    }
    if let Some(role) = ctx.gene_summary.role {
        if !body.is_empty() {
            body.push(' ');
        }
        body.push_str(&format!(
            "{gene} is classified as a {} in the gene-role knowledge base.",
            role_phrase(role)
        ));
    }
    if !ctx.gene_summary.pathways.is_empty() {
        if !body.is_empty() {
            body.push(' ');
        }
        body.push_str(&format!(
            "Annotated pathways: {}.",
            ctx.gene_summary.pathways.join(", ")
        ));
    }
    CannedText {
        block: TextBlock::GeneralGeneInfo,
        body,
        citations: vec![],
        confidence: 1.0,
    }
}

/// Block 2: the gene's role in the sample's cancer type.
pub fn gene_dx_interpretation(ctx: &SynthesisContext<'_>) -> CannedText {
    let gene = ctx.variant.gene_symbol();
    let Some(role) = ctx.gene_summary.role else {
        return CannedText::empty(TextBlock::GeneDxInterpretation);
    };
    let cancer = ctx
        .metadata
        .cancer_type()
        .unwrap_or("the submitted tumor type (pan-cancer fallback)");
    let mechanism = match role {
        role if role.is_tumor_suppressor() && role.is_oncogene() => {
            "both loss-of-function and activating alterations are disease-relevant"
        }
        role if role.is_tumor_suppressor() => {
            "loss-of-function alterations abrogate its tumor-suppressive activity"
        }
        _ => "activating alterations drive constitutive signalling",
    };
    let body = format!(
        "In {cancer}, {gene} acts as a {}; {mechanism}.",
        role_phrase(role)
    );
    CannedText {
        block: TextBlock::GeneDxInterpretation,
        body,
        citations: vec![],
        confidence: 1.0,
    }
}

/// Block 3: the technical description of the variant -- consequence, HGVS,
/// population frequency, and functional predictions.
pub fn general_variant_info(ctx: &SynthesisContext<'_>) -> CannedText {
    let variant = ctx.variant;
    let mut citations = CitationList::new();
    let mut body = String::new();

    let consequence = variant
        .consequences
        .first()
        .map(|c| c.as_term().to_string())
        .unwrap_or_else(|| variant.variant_type.to_string());
    body.push_str(&format!("{} ({consequence}) at {}", hgvs_phrase(ctx), variant.key));
    body.push_str(&format!(
        ". Observed at tumor VAF {:.2} (depth {})",
        variant.tumor_vaf, variant.total_depth
    ));
    if let Some(normal_vaf) = variant.normal_vaf {
        body.push_str(&format!(", normal VAF {normal_vaf:.2}"));
    }
    body.push('.');
    if variant.hotspot_rescued {
        body.push_str(" Retained through hotspot rescue despite tumor-only filtering.");
    }

    let population_evidence: Vec<&Evidence> = ctx
        .evidence
        .iter()
        .filter(|e| {
            matches!(
                e.code,
                EvidenceCode::Sbvs1 | EvidenceCode::Sbs1 | EvidenceCode::Op4
            )
        })
        .collect();
    match ctx.max_population_af {
        None => {
            body.push_str(" Absent from population databases");
            if let Some(op4) = population_evidence
                .iter()
                .find(|e| e.code == EvidenceCode::Op4)
            {
                let marker = citations.cite(op4, ctx.reliabilities);
                body.push_str(&format!(" {}", CitationList::marker(marker)));
            }
            body.push('.');
        }
        Some(af) => {
            body.push_str(&format!(
                " Maximum continental population allele frequency {af:.4}"
            ));
            let frequency_cluster: Vec<&Evidence> = population_evidence
                .iter()
                .copied()
                .filter(|e| e.code != EvidenceCode::Op4)
                .collect();
            if !frequency_cluster.is_empty() {
                let marker = citations.cite_cluster(&frequency_cluster, ctx.reliabilities);
                body.push_str(&format!(" {marker}"));
            }
            body.push('.');
        }
    }

    let damaging = ctx.annotation.damaging_predictor_count();
    let total = ctx.annotation.predictors.len();
    if total > 0 {
        body.push_str(&format!(
            " Functional predictors: {damaging} of {total} call the variant damaging"
        ));
        let computational: Vec<&Evidence> = ctx
            .evidence
            .iter()
            .filter(|e| {
                matches!(
                    e.code,
                    EvidenceCode::Op1 | EvidenceCode::Op3 | EvidenceCode::Sbp1
                )
            })
            .collect();
        if !computational.is_empty() {
            let marker = citations.cite_cluster(&computational, ctx.reliabilities);
            body.push_str(&format!(" {marker}"));
        }
        body.push('.');
    }

    let confidence = citations.min_confidence(ctx.evidence);
    CannedText {
        block: TextBlock::GeneralVariantInfo,
        body,
        citations: citations.into_citations(),
        confidence,
    }
}

/// Block 4: the synthesized diagnostic interpretation across the three
/// frameworks, with clustered citations for concordant evidence and an
/// explicit qualifier for discordant evidence.
pub fn variant_dx_interpretation(ctx: &SynthesisContext<'_>) -> CannedText {
    let mut citations = CitationList::new();
    let mut body = format!(
        "{} in {} is assigned therapeutic tier {}, oncogenicity '{}'",
        hgvs_phrase(ctx),
        ctx.variant.gene_symbol(),
        ctx.therapeutic.label,
        ctx.oncogenicity.label
    );
    if let Some(points) = ctx.oncogenicity.points {
        body.push_str(&format!(" ({points} points)"));
    }
    if ctx.curated.label != "unclassified" {
        body.push_str(&format!(", curated level {}", ctx.curated.label));
    }
    body.push('.');

    let ordered = reliability_order(ctx.evidence, ctx.reliabilities);
    let supporting: Vec<&Evidence> = ordered
        .iter()
        .copied()
        .filter(|e| {
            matches!(
                e.direction,
                Direction::SupportsPathogenic | Direction::SupportsActionable
            )
        })
        .collect();
    if !supporting.is_empty() {
        let codes: Vec<String> = supporting.iter().map(|e| e.code.to_string()).collect();
        let marker = citations.cite_cluster(&supporting, ctx.reliabilities);
        body.push_str(&format!(
            " Supporting evidence: {} {marker}.",
            codes.join(", ")
        ));
    }
    let discordant: Vec<&Evidence> = ordered
        .iter()
        .copied()
        .filter(|e| e.direction == Direction::SupportsBenign)
        .collect();
    if !discordant.is_empty() && !supporting.is_empty() {
        let marker = citations.cite_cluster(&discordant, ctx.reliabilities);
        body.push_str(&format!(
            " Discordant benign evidence was also recorded and should be weighed {marker}."
        ));
    } else if !discordant.is_empty() {
        let codes: Vec<String> = discordant.iter().map(|e| e.code.to_string()).collect();
        let marker = citations.cite_cluster(&discordant, ctx.reliabilities);
        body.push_str(&format!(
            " Benign-direction evidence: {} {marker}.",
            codes.join(", ")
        ));
    }
    for modulator in ctx
        .therapeutic
        .modulators
        .iter()
        .chain(&ctx.oncogenicity.modulators)
        .chain(&ctx.curated.modulators)
    {
        body.push_str(&format!(" Note: {modulator}."));
    }

    let confidence = citations.min_confidence(ctx.evidence);
    CannedText {
        block: TextBlock::VariantDxInterpretation,
        body,
        citations: citations.into_citations(),
        confidence,
    }
}

/// Block 5: incidental findings -- only for oncogenic calls in the
/// configured incidental-findings gene list.
pub fn incidental_findings(ctx: &SynthesisContext<'_>) -> CannedText {
    let gene = ctx.variant.gene_symbol();
    if !ctx.config.gene_is_incidental(gene) || !ctx.oncogenicity_class.is_oncogenic() {
        return CannedText::empty(TextBlock::IncidentalFindings);
    }
    let mut citations = CitationList::new();
    let pathogenic: Vec<&Evidence> = reliability_order(ctx.evidence, ctx.reliabilities)
        .into_iter()
        .filter(|e| e.direction == Direction::SupportsPathogenic)
        .collect();
    let marker = if pathogenic.is_empty() {
        String::new()
    } else {
        format!(" {}", citations.cite_cluster(&pathogenic, ctx.reliabilities))
    };
    let body = format!(
        "{gene} is on the incidental-findings gene list and this variant is classified '{}'. \
Germline confirmation and genetic counselling should be considered{marker}.",
        ctx.oncogenicity.label
    );
    let confidence = citations.min_confidence(ctx.evidence);
    CannedText {
        block: TextBlock::IncidentalFindings,
        body,
        citations: citations.into_citations(),
        confidence,
    }
}

/// Block 6: chromosomal alterations -- populated only for structural or
/// copy-number input.
pub fn chromosomal_alteration(ctx: &SynthesisContext<'_>) -> CannedText {
    if !ctx.variant.is_structural() {
        return CannedText::empty(TextBlock::ChromosomalAlterationInterpretation);
    }
    let body = format!(
        "Structural alteration {} detected in {} at {}:{} (tumor VAF {:.2}).",
        ctx.variant.key.alternate,
        ctx.variant.gene_symbol(),
        ctx.variant.key.chromosome,
        ctx.variant.key.position,
        ctx.variant.tumor_vaf
    );
    CannedText {
        block: TextBlock::ChromosomalAlterationInterpretation,
        body,
        citations: vec![],
        confidence: 1.0,
    }
}

/// Block 7: expected actionable alterations for this cancer type that were
/// not observed, restricted to genes with adequate coverage.
pub fn pertinent_negatives(ctx: &SynthesisContext<'_>) -> CannedText {
    let missing: Vec<String> = ctx
        .expected_actionable
        .iter()
        .filter(|expected| !ctx.observed_genes.contains(&expected.gene))
        .filter(|expected| ctx.metadata.gene_is_covered(&expected.gene))
        .map(|expected| format!("{} (level {})", expected.gene, expected.level))
        .collect();
    if missing.is_empty() {
        return CannedText::empty(TextBlock::PertinentNegatives);
    }
    let body = format!(
        "No reportable alterations were detected in the following actionable genes with \
adequate coverage: {}.",
        missing.join(", ")
    );
    CannedText {
        block: TextBlock::PertinentNegatives,
        body,
        citations: vec![],
        confidence: 1.0,
    }
}

/// Block 8: measured biomarkers against the configured thresholds.
pub fn biomarkers(ctx: &SynthesisContext<'_>) -> CannedText {
    let inputs = &ctx.metadata.biomarkers;
    let thresholds = &ctx.config.biomarkers;
    let mut sentences: Vec<String> = Vec::new();

    if let Some(tmb) = inputs.tmb {
        let bucket = if tmb >= thresholds.tmb_high {
            "high"
        } else if tmb >= thresholds.tmb_intermediate {
            "intermediate"
        } else {
            "low"
        };
        sentences.push(format!(
            "Tumor mutational burden {tmb:.1} mut/Mb: {bucket} (thresholds {:.1}/{:.1})",
            thresholds.tmb_intermediate, thresholds.tmb_high
        ));
    }
    if let Some(msi) = &inputs.msi_status {
        sentences.push(format!("Microsatellite status: {msi}"));
    }
    for (marker, value) in &inputs.expression {
        match thresholds.expression_high.get(marker) {
            Some(threshold) if value >= threshold => {
                sentences.push(format!(
                    "{marker} expression {value:.1} is elevated (threshold {threshold:.1})"
                ));
            }
            Some(threshold) => {
                sentences.push(format!(
                    "{marker} expression {value:.1} is within range (threshold {threshold:.1})"
                ));
            }
            None => sentences.push(format!("{marker} expression {value:.1}")),
        }
    }

    if sentences.is_empty() {
        return CannedText::empty(TextBlock::Biomarkers);
    }
    CannedText {
        block: TextBlock::Biomarkers,
        body: format!("{}.", sentences.join(". ")),
        citations: vec![],
        confidence: 1.0,
    }
}

fn role_phrase(role: crate::kb::source::GeneRole) -> &'static str {
    match role {
        crate::kb::source::GeneRole::TumorSuppressor => "tumor suppressor",
        crate::kb::source::GeneRole::Oncogene => "oncogene",
        crate::kb::source::GeneRole::Both => "dual-role cancer gene",
    }
}

fn hgvs_phrase(ctx: &SynthesisContext<'_>) -> String {
    match (&ctx.variant.hgvs_c, &ctx.variant.hgvs_p) {
        (Some(c), Some(p)) => format!("{c} ({p})"),
        (Some(c), None) => c.clone(),
        (None, Some(p)) => p.clone(),
        (None, None) => ctx.variant.key.to_string(),
    }
}
