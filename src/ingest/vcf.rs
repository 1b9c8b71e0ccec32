use std::fs;
use std::path::Path;

use log::warn;
use ordermap::OrderMap;

use crate::ingest::error::IngestError;
use crate::model::variant::AlleleDepth;

/// FORMAT fields that must be present on every record.
const REQUIRED_FORMAT_FIELDS: [&str; 3] = ["GT", "AD", "DP"];
/// INFO fields whose absence is reported once as a warning.
const RECOMMENDED_INFO_FIELDS: [&str; 4] = ["AF", "MQ", "FS", "QD"];

/// One raw variant-call line, split but not yet normalized. Multi-allelic
/// sites still carry all alternate alleles here.
#[derive(Debug, Clone, PartialEq)]
pub struct VcfRecord {
    pub line: usize,
    pub chromosome: String,
    /// 1-based input position.
    pub position: u64,
    pub id: String,
    pub reference: String,
    pub alternates: Vec<String>,
    pub quality: Option<f64>,
    pub filter: String,
    pub info: OrderMap<String, String>,
    pub format: Vec<String>,
    pub samples: Vec<Vec<String>>,
    pub raw: String,
}

impl VcfRecord {
    pub fn info_f64(&self, key: &str) -> Option<f64> {
        self.info.get(key).and_then(|v| v.parse().ok())
    }

    fn format_index(&self, field: &str) -> Option<usize> {
        self.format.iter().position(|f| f == field)
    }

    fn sample_field(&self, sample: usize, field: &str) -> Option<&str> {
        let idx = self.format_index(field)?;
        self.samples.get(sample)?.get(idx).map(String::as_str)
    }

    pub fn genotype(&self, sample: usize) -> Result<String, IngestError> {
        self.sample_field(sample, "GT")
            .map(str::to_string)
            .ok_or_else(|| IngestError::MissingFormatField {
                field: "GT".to_string(),
                line: self.line,
            })
    }

    pub fn sample_depth(&self, sample: usize) -> Result<u32, IngestError> {
        self.sample_field(sample, "DP")
            .and_then(|v| v.parse().ok())
            .ok_or_else(|| IngestError::MissingFormatField {
                field: "DP".to_string(),
                line: self.line,
            })
    }

    /// Allelic depths for one alternate allele (0-based allele index).
    pub fn allele_depth(
        &self,
        sample: usize,
        allele_index: usize,
    ) -> Result<AlleleDepth, IngestError> {
        let raw = self.sample_field(sample, "AD").ok_or_else(|| {
            IngestError::MissingFormatField {
                field: "AD".to_string(),
                line: self.line,
            }
        })?;
        let depths: Vec<u32> = raw
            .split(',')
            .map(|d| d.parse().unwrap_or(0))
            .collect();
        let reference_reads = depths.first().copied().unwrap_or(0);
        let alternate_reads = depths.get(allele_index + 1).copied().unwrap_or(0);
        Ok(AlleleDepth {
            reference_reads,
            alternate_reads,
        })
    }

    fn validate_format(&self) -> Result<(), IngestError> {
        for field in REQUIRED_FORMAT_FIELDS {
            if self.format_index(field).is_none() {
                return Err(IngestError::MissingFormatField {
                    field: field.to_string(),
                    line: self.line,
                });
            }
        }
        Ok(())
    }
}

/// A parsed input file: header-derived assembly string, sample names, and
/// the raw records in input order.
#[derive(Debug, Clone, PartialEq)]
pub struct VcfFile {
    pub assembly: Option<String>,
    pub sample_names: Vec<String>,
    pub records: Vec<VcfRecord>,
}

impl VcfFile {
    pub fn tumor_sample(&self) -> usize {
        0
    }

    pub fn normal_sample(&self) -> Option<usize> {
        (self.sample_names.len() > 1).then_some(1)
    }
}

pub fn read_vcf(path: &Path) -> Result<VcfFile, IngestError> {
    let raw = fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_vcf(&raw, path)
}

fn parse_vcf(raw: &str, path: &Path) -> Result<VcfFile, IngestError> {
    let mut assembly = None;
    let mut sample_names: Option<Vec<String>> = None;
    let mut records = Vec::new();
    let mut missing_info_warned = false;

    for (idx, line) in raw.lines().enumerate() {
        let line_number = idx + 1;
        if line.is_empty() {
            continue;
        }
        if let Some(meta) = line.strip_prefix("##") {
            if assembly.is_none() {
                assembly = detect_assembly(meta);
            }
            continue;
        }
        if let Some(header) = line.strip_prefix("#CHROM") {
            // After stripping "#CHROM" the first split entry is empty; the
            // fixed columns POS..FORMAT follow, then the sample names.
            let columns: Vec<&str> = header.split('\t').collect();
            let names: Vec<String> = columns
                .iter()
                .skip(9)
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if names.is_empty() {
                return Err(IngestError::NoSamples);
            }
            sample_names = Some(names);
            continue;
        }
        if line.starts_with('#') {
            continue;
        }
        if sample_names.is_none() {
            return Err(IngestError::MissingHeader(path.to_path_buf()));
        }

        let record = parse_record(line, line_number)?;
        record.validate_format()?;
        if !missing_info_warned {
            let missing: Vec<&str> = RECOMMENDED_INFO_FIELDS
                .into_iter()
                .filter(|field| !record.info.contains_key(*field))
                .collect();
            if !missing.is_empty() {
                warn!(
                    "Recommended INFO fields missing from input (first seen at line {}): {}",
                    line_number,
                    missing.join(", ")
                );
                missing_info_warned = true;
            }
        }
        records.push(record);
    }

    let sample_names = sample_names.ok_or_else(|| IngestError::MissingHeader(path.to_path_buf()))?;
    Ok(VcfFile {
        assembly,
        sample_names,
        records,
    })
}

fn detect_assembly(meta_line: &str) -> Option<String> {
    let interesting = meta_line.starts_with("reference=")
        || meta_line.starts_with("assembly=")
        || meta_line.contains("assembly=");
    if !interesting {
        return None;
    }
    for known in ["GRCh38", "GRCh37", "hg38", "hg19"] {
        if meta_line.contains(known) {
            return Some(known.to_string());
        }
    }
    None
}

fn parse_record(line: &str, line_number: usize) -> Result<VcfRecord, IngestError> {
    let fields: Vec<&str> = line.split('\t').collect();
    if fields.len() < 10 {
        return Err(IngestError::MalformedRecord {
            line: line_number,
            reason: format!("expected at least 10 tab-separated columns, found {}", fields.len()),
        });
    }

    let position: u64 = fields[1].parse().map_err(|_| IngestError::MalformedRecord {
        line: line_number,
        reason: format!("invalid position '{}'", fields[1]),
    })?;
    let reference = fields[3].to_string();
    if reference.is_empty() || reference == "." {
        return Err(IngestError::MalformedRecord {
            line: line_number,
            reason: "missing reference allele".to_string(),
        });
    }
    let alternates: Vec<String> = fields[4]
        .split(',')
        .map(str::to_string)
        .filter(|a| !a.is_empty() && a != ".")
        .collect();
    if alternates.is_empty() {
        return Err(IngestError::MalformedRecord {
            line: line_number,
            reason: "missing alternate allele".to_string(),
        });
    }

    let quality = fields[5].parse().ok();
    let info = fields[7]
        .split(';')
        .filter(|kv| !kv.is_empty())
        .map(|kv| match kv.split_once('=') {
            Some((k, v)) => (k.to_string(), v.to_string()),
            None => (kv.to_string(), String::new()),
        })
        .collect();
    let format = fields[8].split(':').map(str::to_string).collect();
    let samples = fields[9..]
        .iter()
        .map(|s| s.split(':').map(str::to_string).collect())
        .collect();

    Ok(VcfRecord {
        line: line_number,
        chromosome: fields[0].trim_start_matches("chr").to_string(),
        position,
        id: fields[2].to_string(),
        reference,
        alternates,
        quality,
        filter: fields[6].to_string(),
        info,
        format,
        samples,
        raw: line.to_string(),
    })
}
