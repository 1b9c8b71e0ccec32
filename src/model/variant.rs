use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Genome assembly the run is pinned to. Records from any other assembly are
/// rejected during ingestion.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumString,
)]
pub enum Assembly {
    #[strum(serialize = "GRCh37", serialize = "hg19")]
    #[serde(rename = "GRCh37", alias = "hg19")]
    Grch37,
    #[strum(serialize = "GRCh38", serialize = "hg38")]
    #[serde(rename = "GRCh38", alias = "hg38")]
    Grch38,
}

/// The identity of a normalized variant: one alternate allele per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariantKey {
    pub assembly: Assembly,
    pub chromosome: String,
    pub position: u64,
    pub reference: String,
    pub alternate: String,
}

impl fmt::Display for VariantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}>{}",
            self.chromosome, self.position, self.reference, self.alternate
        )
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum VariantType {
    Snv,
    Mnv,
    Insertion,
    Deletion,
    Complex,
    Structural,
}

impl VariantType {
    /// Classification from allele lengths, after normalization.
    pub fn classify(reference: &str, alternate: &str) -> VariantType {
        if alternate.starts_with('<') {
            return VariantType::Structural;
        }
        match (reference.len(), alternate.len()) {
            (1, 1) => VariantType::Snv,
            (r, a) if r == a => VariantType::Mnv,
            (1, a) if a > 1 => VariantType::Insertion,
            (r, 1) if r > 1 => VariantType::Deletion,
            _ => VariantType::Complex,
        }
    }
}

/// Sequence-ontology consequence terms attached by the external annotator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Consequence {
    StopGained,
    FrameshiftVariant,
    SpliceAcceptorVariant,
    SpliceDonorVariant,
    StartLost,
    StopLost,
    TranscriptAblation,
    MissenseVariant,
    SynonymousVariant,
    InframeInsertion,
    InframeDeletion,
    SpliceRegionVariant,
    IntronVariant,
    Other(String),
}

impl Consequence {
    /// Terms counting as predicted-null for loss-of-function reasoning:
    /// nonsense, frameshift, canonical splice, start loss, multi-exon loss.
    pub fn is_predicted_null(&self) -> bool {
        matches!(
            self,
            Consequence::StopGained
                | Consequence::FrameshiftVariant
                | Consequence::SpliceAcceptorVariant
                | Consequence::SpliceDonorVariant
                | Consequence::StartLost
                | Consequence::TranscriptAblation
        )
    }

    pub fn as_term(&self) -> &str {
        match self {
            Consequence::StopGained => "stop_gained",
            Consequence::FrameshiftVariant => "frameshift_variant",
            Consequence::SpliceAcceptorVariant => "splice_acceptor_variant",
            Consequence::SpliceDonorVariant => "splice_donor_variant",
            Consequence::StartLost => "start_lost",
            Consequence::StopLost => "stop_lost",
            Consequence::TranscriptAblation => "transcript_ablation",
            Consequence::MissenseVariant => "missense_variant",
            Consequence::SynonymousVariant => "synonymous_variant",
            Consequence::InframeInsertion => "inframe_insertion",
            Consequence::InframeDeletion => "inframe_deletion",
            Consequence::SpliceRegionVariant => "splice_region_variant",
            Consequence::IntronVariant => "intron_variant",
            Consequence::Other(term) => term,
        }
    }
}

impl FromStr for Consequence {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "stop_gained" => Consequence::StopGained,
            "frameshift_variant" => Consequence::FrameshiftVariant,
            "splice_acceptor_variant" => Consequence::SpliceAcceptorVariant,
            "splice_donor_variant" => Consequence::SpliceDonorVariant,
            "start_lost" => Consequence::StartLost,
            "stop_lost" => Consequence::StopLost,
            "transcript_ablation" => Consequence::TranscriptAblation,
            "missense_variant" => Consequence::MissenseVariant,
            "synonymous_variant" => Consequence::SynonymousVariant,
            "inframe_insertion" => Consequence::InframeInsertion,
            "inframe_deletion" => Consequence::InframeDeletion,
            "splice_region_variant" => Consequence::SpliceRegionVariant,
            "intron_variant" => Consequence::IntronVariant,
            other => Consequence::Other(other.to_string()),
        })
    }
}

impl fmt::Display for Consequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_term())
    }
}

impl Serialize for Consequence {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_term())
    }
}

impl<'de> Deserialize<'de> for Consequence {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let term = String::deserialize(deserializer)?;
        Ok(term.parse().unwrap_or(Consequence::Other(term)))
    }
}

/// Per-sample read support at a variant site.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlleleDepth {
    pub reference_reads: u32,
    pub alternate_reads: u32,
}

impl AlleleDepth {
    pub fn total(&self) -> u32 {
        self.reference_reads + self.alternate_reads
    }

    pub fn vaf(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            0.0
        } else {
            f64::from(self.alternate_reads) / f64::from(total)
        }
    }
}

/// An immutable, normalized variant. Multi-allelic input sites are split
/// before this record is populated, so there is exactly one alternate allele.
/// The original input representation is kept for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub key: VariantKey,
    pub variant_type: VariantType,
    pub gene: Option<String>,
    pub transcript: Option<String>,
    pub hgvs_c: Option<String>,
    pub hgvs_p: Option<String>,
    pub consequences: Vec<Consequence>,
    pub genotype: String,
    pub tumor_depth: AlleleDepth,
    pub normal_depth: Option<AlleleDepth>,
    pub total_depth: u32,
    pub quality: Option<f64>,
    pub tumor_vaf: f64,
    pub normal_vaf: Option<f64>,
    pub multiallelic: bool,
    pub original_position: u64,
    pub original_record: String,
    /// Set when the tumor-only somatic filter kept this variant only because
    /// of a hotspot match.
    pub hotspot_rescued: bool,
}

impl Variant {
    pub fn is_structural(&self) -> bool {
        self.variant_type == VariantType::Structural
    }

    pub fn is_predicted_null(&self) -> bool {
        self.consequences.iter().any(Consequence::is_predicted_null)
    }

    pub fn gene_symbol(&self) -> &str {
        self.gene.as_deref().unwrap_or("")
    }

    /// Functional update used by the somatic filter; the record itself is
    /// never mutated in place.
    pub fn with_hotspot_rescue(mut self) -> Variant {
        self.hotspot_rescued = true;
        self
    }
}
