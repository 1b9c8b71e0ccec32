use log::{debug, warn};
use ordermap::OrderMap;

use crate::config::engine_config::QualityThresholds;
use crate::ingest::annotations::AnnotationCatalog;
use crate::ingest::error::IngestError;
use crate::ingest::vcf::{VcfFile, VcfRecord};
use crate::model::bundle::FilteredVariant;
use crate::model::variant::{Assembly, Variant, VariantKey, VariantType};

const KNOWN_CHROMOSOMES: [&str; 25] = [
    "1", "2", "3", "4", "5", "6", "7", "8", "9", "10", "11", "12", "13", "14", "15", "16", "17",
    "18", "19", "20", "21", "22", "X", "Y", "MT",
];

/// Normalization output for one raw record: kept variants plus the alleles
/// dropped by the quality pre-filter.
#[derive(Debug, Clone, Default)]
pub struct NormalizedRecord {
    pub variants: Vec<Variant>,
    pub filtered: Vec<FilteredVariant>,
}

/// Normalization output for a whole input file. Per-record failures are
/// isolated: the record is skipped and the reason recorded.
#[derive(Debug, Clone, Default)]
pub struct NormalizedBatch {
    pub variants: Vec<Variant>,
    pub filtered: Vec<FilteredVariant>,
    pub errors: Vec<String>,
}

/// Canonicalizes raw records into single-allele, left-aligned variants and
/// applies the quality pre-filter.
#[derive(Debug, Clone)]
pub struct Normalizer {
    assembly: Assembly,
    quality: QualityThresholds,
}

impl Normalizer {
    pub fn new(assembly: Assembly, quality: QualityThresholds) -> Normalizer {
        Normalizer { assembly, quality }
    }

    /// Rejects input whose assembly does not match the configured reference.
    /// A file that does not declare an assembly is accepted with a warning.
    pub fn check_assembly(&self, declared: Option<&str>) -> Result<(), IngestError> {
        match declared {
            None => {
                warn!(
                    "Input does not declare a genome assembly; assuming {}",
                    self.assembly
                );
                Ok(())
            }
            Some(found) => {
                let parsed: Option<Assembly> = found.parse().ok();
                if parsed == Some(self.assembly) {
                    Ok(())
                } else {
                    Err(IngestError::MismatchedAssembly {
                        expected: self.assembly.to_string(),
                        found: found.to_string(),
                    })
                }
            }
        }
    }

    pub fn normalize_file(
        &self,
        file: &VcfFile,
        catalog: &AnnotationCatalog,
    ) -> Result<NormalizedBatch, IngestError> {
        self.check_assembly(file.assembly.as_deref())?;
        let tumor = file.tumor_sample();
        let normal = file.normal_sample();

        let mut batch = NormalizedBatch::default();
        for record in &file.records {
            match self.normalize_record(record, tumor, normal, catalog) {
                Ok(normalized) => {
                    batch.variants.extend(normalized.variants);
                    batch.filtered.extend(normalized.filtered);
                }
                Err(error) => {
                    warn!("Skipping record at line {}: {}", record.line, error);
                    batch.errors.push(error.to_string());
                }
            }
        }
        debug!(
            "Normalization: {} variants kept, {} filtered, {} errors",
            batch.variants.len(),
            batch.filtered.len(),
            batch.errors.len()
        );
        Ok(batch)
    }

    /// Produces one variant per alternate allele, partitioning per-allele
    /// fields by index.
    pub fn normalize_record(
        &self,
        record: &VcfRecord,
        tumor_sample: usize,
        normal_sample: Option<usize>,
        catalog: &AnnotationCatalog,
    ) -> Result<NormalizedRecord, IngestError> {
        let mut normalized = NormalizedRecord::default();

        if !KNOWN_CHROMOSOMES.contains(&record.chromosome.as_str()) {
            warn!(
                "Unknown chromosome '{}' at line {}; record skipped",
                record.chromosome, record.line
            );
            normalized.filtered.push(FilteredVariant {
                key: VariantKey {
                    assembly: self.assembly,
                    chromosome: record.chromosome.clone(),
                    position: record.position,
                    reference: record.reference.clone(),
                    alternate: record.alternates.join(","),
                },
                reason: "unknown_chromosome".to_string(),
            });
            return Ok(normalized);
        }

        let multiallelic = record.alternates.len() > 1;
        let genotype = record.genotype(tumor_sample)?;
        let total_depth = record.sample_depth(tumor_sample)?;
        let quality_reason = self.quality_filter_reason(record, tumor_sample);

        for (allele_index, alternate) in record.alternates.iter().enumerate() {
            let (position, reference, alternate) =
                left_align(record.position, &record.reference, alternate);
            let key = VariantKey {
                assembly: self.assembly,
                chromosome: record.chromosome.clone(),
                position,
                reference,
                alternate,
            };

            if let Some(reason) = &quality_reason {
                normalized.filtered.push(FilteredVariant {
                    key,
                    reason: reason.clone(),
                });
                continue;
            }

            let tumor_depth = record.allele_depth(tumor_sample, allele_index)?;
            let normal_depth = match normal_sample {
                Some(sample) => Some(record.allele_depth(sample, allele_index)?),
                None => None,
            };
            let annotation =
                catalog.get(&key.chromosome, key.position, &key.reference, &key.alternate);

            normalized.variants.push(Variant {
                variant_type: VariantType::classify(&key.reference, &key.alternate),
                gene: annotation.and_then(|a| a.gene.clone()),
                transcript: annotation.and_then(|a| a.transcript.clone()),
                hgvs_c: annotation.and_then(|a| a.hgvs_c.clone()),
                hgvs_p: annotation.and_then(|a| a.hgvs_p.clone()),
                consequences: annotation
                    .map(|a| a.consequences.clone())
                    .unwrap_or_default(),
                genotype: genotype.clone(),
                tumor_vaf: tumor_depth.vaf(),
                normal_vaf: normal_depth.as_ref().map(|d| d.vaf()),
                tumor_depth,
                normal_depth,
                total_depth,
                quality: record.quality,
                multiallelic,
                original_position: record.position,
                original_record: record.raw.clone(),
                hotspot_rescued: false,
                key,
            });
        }
        Ok(normalized)
    }

    fn quality_filter_reason(&self, record: &VcfRecord, tumor_sample: usize) -> Option<String> {
        if let Ok(depth) = record.sample_depth(tumor_sample)
            && depth < self.quality.min_depth
        {
            return Some("low_depth".to_string());
        }
        if let Some(mq) = record.info_f64("MQ")
            && mq < self.quality.min_mapping_quality
        {
            return Some("low_mapping_quality".to_string());
        }
        if let Some(fs) = record.info_f64("FS")
            && fs > self.quality.max_strand_bias
        {
            return Some("strand_bias".to_string());
        }
        if let Some(qd) = record.info_f64("QD")
            && qd < self.quality.min_quality_by_depth
        {
            return Some("low_quality_by_depth".to_string());
        }
        None
    }
}

/// Attaches normal-sample VAFs from a separate normal input, matching by
/// variant key. Variants missing from the normal input get a VAF of zero.
pub fn attach_normal_vafs(variants: &mut [Variant], normal_vafs: &OrderMap<VariantKey, f64>) {
    for variant in variants {
        if variant.normal_vaf.is_none() {
            variant.normal_vaf = normal_vafs.get(&variant.key).copied().or(Some(0.0));
        }
    }
}

/// Parsimony trimming: shared suffix first, then shared prefix, keeping at
/// least one base of each allele and shifting the position right on prefix
/// removal. Applying it twice yields the same representation.
pub fn left_align(position: u64, reference: &str, alternate: &str) -> (u64, String, String) {
    if alternate.starts_with('<') {
        // Symbolic alleles are not trimmed.
        return (position, reference.to_string(), alternate.to_string());
    }
    let mut reference: Vec<u8> = reference.as_bytes().to_vec();
    let mut alternate: Vec<u8> = alternate.as_bytes().to_vec();
    let mut position = position;

    while reference.len() > 1 && alternate.len() > 1 && reference.last() == alternate.last() {
        reference.pop();
        alternate.pop();
    }
    while reference.len() > 1 && alternate.len() > 1 && reference.first() == alternate.first() {
        reference.remove(0);
        alternate.remove(0);
        position += 1;
    }

    (
        position,
        String::from_utf8(reference).unwrap_or_default(),
        String::from_utf8(alternate).unwrap_or_default(),
    )
}
