use std::fs;
use std::path::Path;

use log::info;
use ordermap::OrderMap;
use serde::{Deserialize, Serialize};

use crate::ingest::error::IngestError;
use crate::model::annotation::FunctionalAnnotation;
use crate::model::variant::Consequence;

/// One record produced by the external functional annotator for a single
/// normalized allele. The transcript is the annotator's canonical (MANE)
/// selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    pub chromosome: String,
    pub position: u64,
    pub reference: String,
    pub alternate: String,
    #[serde(default)]
    pub gene: Option<String>,
    #[serde(default)]
    pub transcript: Option<String>,
    #[serde(default)]
    pub hgvs_c: Option<String>,
    #[serde(default)]
    pub hgvs_p: Option<String>,
    #[serde(default)]
    pub consequences: Vec<Consequence>,
    #[serde(default)]
    pub functional: FunctionalAnnotation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct AnnotationFile {
    #[serde(default)]
    annotator: String,
    #[serde(default)]
    version: String,
    records: Vec<AnnotationRecord>,
}

/// The sidecar annotations for one input file, keyed by normalized allele.
/// The annotator is a black box; a missing record simply yields no
/// functional annotation.
#[derive(Debug, Clone, Default)]
pub struct AnnotationCatalog {
    by_allele: OrderMap<(String, u64, String, String), AnnotationRecord>,
}

impl AnnotationCatalog {
    pub fn load(path: &Path) -> Result<AnnotationCatalog, IngestError> {
        let raw = fs::read_to_string(path).map_err(|source| IngestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: AnnotationFile =
            serde_json::from_str(&raw).map_err(|source| IngestError::AnnotationParse {
                path: path.to_path_buf(),
                source,
            })?;
        info!(
            "Loaded {} annotation records from '{}' ({} {})",
            file.records.len(),
            path.display(),
            file.annotator,
            file.version
        );
        Ok(AnnotationCatalog::from_records(file.records))
    }

    pub fn from_records(records: Vec<AnnotationRecord>) -> AnnotationCatalog {
        let by_allele = records
            .into_iter()
            .map(|record| {
                (
                    (
                        record.chromosome.clone(),
                        record.position,
                        record.reference.clone(),
                        record.alternate.clone(),
                    ),
                    record,
                )
            })
            .collect();
        AnnotationCatalog { by_allele }
    }

    pub fn get(
        &self,
        chromosome: &str,
        position: u64,
        reference: &str,
        alternate: &str,
    ) -> Option<&AnnotationRecord> {
        self.by_allele.get(&(
            chromosome.to_string(),
            position,
            reference.to_string(),
            alternate.to_string(),
        ))
    }

    pub fn len(&self) -> usize {
        self.by_allele.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_allele.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn braf_record() -> AnnotationRecord {
        AnnotationRecord {
            chromosome: "7".to_string(),
            position: 140_753_336,
            reference: "A".to_string(),
            alternate: "T".to_string(),
            gene: Some("BRAF".to_string()),
            transcript: Some("NM_004333.6".to_string()),
            hgvs_c: Some("c.1799T>A".to_string()),
            hgvs_p: Some("p.V600E".to_string()),
            consequences: vec![Consequence::MissenseVariant],
            functional: FunctionalAnnotation::default(),
        }
    }

    #[rstest]
    fn test_catalog_lookup_by_allele() {
        let catalog = AnnotationCatalog::from_records(vec![braf_record()]);
        assert_eq!(catalog.len(), 1);
        let hit = catalog.get("7", 140_753_336, "A", "T").unwrap();
        assert_eq!(hit.gene.as_deref(), Some("BRAF"));
        assert!(catalog.get("7", 140_753_336, "A", "G").is_none());
    }

    #[rstest]
    fn test_sidecar_json_round_trip() {
        let file = AnnotationFile {
            annotator: "fn-annotator".to_string(),
            version: "2.4".to_string(),
            records: vec![braf_record()],
        };
        let raw = serde_json::to_string(&file).unwrap();
        let parsed: AnnotationFile = serde_json::from_str(&raw).unwrap();
        assert_eq!(parsed, file);
    }
}
