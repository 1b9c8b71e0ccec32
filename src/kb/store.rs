use std::fs;
use std::path::Path;

use log::{debug, info};
use ordermap::OrderMap;
use regex::Regex;

use crate::kb::error::KbError;
use crate::kb::hit::KnowledgeBaseHit;
use crate::kb::source::{GeneRole, KbDescriptor, KbFile, KbKind, KbRecord, QueryShape};
use crate::model::variant::Variant;

/// The per-variant lookup key, carrying every coordinate a query shape can
/// ask for. Built once per variant before aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantQuery {
    pub chromosome: String,
    pub position: u64,
    pub reference: String,
    pub alternate: String,
    pub gene: Option<String>,
    pub protein_change: Option<String>,
    pub codon: Option<u32>,
}

impl VariantQuery {
    pub fn from_variant(variant: &Variant) -> VariantQuery {
        let protein_change = variant.hgvs_p.as_deref().map(normalize_protein_change);
        let codon = protein_change.as_deref().and_then(extract_codon);
        VariantQuery {
            chromosome: variant.key.chromosome.clone(),
            position: variant.key.position,
            reference: variant.key.reference.clone(),
            alternate: variant.key.alternate.clone(),
            gene: variant.gene.clone(),
            protein_change,
            codon,
        }
    }
}

/// Strips the HGVS `p.` prefix and optional parentheses: `p.(V600E)` -> `V600E`.
pub fn normalize_protein_change(hgvs_p: &str) -> String {
    hgvs_p
        .trim()
        .trim_start_matches("p.")
        .trim_start_matches('(')
        .trim_end_matches(')')
        .to_string()
}

/// Extracts the codon number from a short protein change such as `V600E`.
pub fn extract_codon(protein_change: &str) -> Option<u32> {
    let re = Regex::new(r"^[A-Za-z*]+(\d+)").ok()?;
    re.captures(protein_change)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Reads and parses one KB snapshot file.
pub fn read_kb_file(path: &Path) -> Result<KbFile, KbError> {
    let raw = fs::read_to_string(path).map_err(|source| KbError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let file: KbFile = serde_json::from_str(&raw).map_err(|source| KbError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(
        "Loaded KB '{}' version {} ({} records)",
        file.name,
        file.version,
        file.records.len()
    );
    Ok(file)
}

#[derive(Debug)]
struct LoadedKb {
    descriptor: KbDescriptor,
    records: Vec<KbRecord>,
    by_gene: OrderMap<String, Vec<usize>>,
    by_gene_codon: OrderMap<(String, u32), Vec<usize>>,
    by_protein_change: OrderMap<(String, String), Vec<usize>>,
    by_site: OrderMap<(String, u64, String, String), Vec<usize>>,
    by_chromosome: OrderMap<String, Vec<usize>>,
}

impl LoadedKb {
    fn new(file: KbFile) -> LoadedKb {
        let descriptor = file.descriptor();
        let mut kb = LoadedKb {
            descriptor,
            records: file.records,
            by_gene: OrderMap::new(),
            by_gene_codon: OrderMap::new(),
            by_protein_change: OrderMap::new(),
            by_site: OrderMap::new(),
            by_chromosome: OrderMap::new(),
        };
        for (idx, record) in kb.records.iter().enumerate() {
            match kb.descriptor.query_shape {
                QueryShape::GeneSymbol => {
                    if let Some(gene) = &record.gene {
                        kb.by_gene.entry(gene.clone()).or_default().push(idx);
                    }
                }
                QueryShape::CodonPosition => {
                    if let (Some(gene), Some(codon)) = (&record.gene, record.codon) {
                        kb.by_gene_codon
                            .entry((gene.clone(), codon))
                            .or_default()
                            .push(idx);
                    }
                }
                QueryShape::AminoAcidChange => {
                    if let (Some(gene), Some(change)) = (&record.gene, &record.protein_change) {
                        kb.by_protein_change
                            .entry((gene.clone(), normalize_protein_change(change)))
                            .or_default()
                            .push(idx);
                    }
                }
                QueryShape::ExactPosition => {
                    if let (Some(chromosome), Some(position)) =
                        (&record.chromosome, record.position)
                    {
                        let reference = record.reference.clone().unwrap_or_default();
                        let alternate = record.alternate.clone().unwrap_or_default();
                        kb.by_site
                            .entry((chromosome.clone(), position, reference, alternate))
                            .or_default()
                            .push(idx);
                    }
                }
                QueryShape::PositionRange => {
                    if let Some(chromosome) = &record.chromosome {
                        kb.by_chromosome
                            .entry(chromosome.clone())
                            .or_default()
                            .push(idx);
                    }
                }
            }
        }
        kb
    }

    fn matching_indices(&self, query: &VariantQuery) -> Vec<usize> {
        match self.descriptor.query_shape {
            QueryShape::GeneSymbol => query
                .gene
                .as_ref()
                .and_then(|gene| self.by_gene.get(gene))
                .cloned()
                .unwrap_or_default(),
            QueryShape::CodonPosition => match (&query.gene, query.codon) {
                (Some(gene), Some(codon)) => self
                    .by_gene_codon
                    .get(&(gene.clone(), codon))
                    .cloned()
                    .unwrap_or_default(),
                _ => vec![],
            },
            QueryShape::AminoAcidChange => match (&query.gene, &query.protein_change) {
                (Some(gene), Some(change)) => self
                    .by_protein_change
                    .get(&(gene.clone(), change.clone()))
                    .cloned()
                    .unwrap_or_default(),
                _ => vec![],
            },
            QueryShape::ExactPosition => self
                .by_site
                .get(&(
                    query.chromosome.clone(),
                    query.position,
                    query.reference.clone(),
                    query.alternate.clone(),
                ))
                .cloned()
                .unwrap_or_default(),
            QueryShape::PositionRange => self
                .by_chromosome
                .get(&query.chromosome)
                .map(|indices| {
                    indices
                        .iter()
                        .copied()
                        .filter(|&idx| {
                            let record = &self.records[idx];
                            let start = record.start.unwrap_or(0);
                            let end = record.end.unwrap_or(u64::MAX);
                            start <= query.position && query.position <= end
                        })
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    fn hits(&self, query: &VariantQuery) -> Vec<KnowledgeBaseHit> {
        self.matching_indices(query)
            .into_iter()
            .map(|idx| KnowledgeBaseHit {
                kb: self.descriptor.name.clone(),
                kb_version: self.descriptor.version.clone(),
                kind: self.descriptor.kind,
                reliability: self.descriptor.reliability,
                record: self.records[idx].clone(),
            })
            .collect()
    }
}

/// All loaded knowledge bases. Read-only and shared after startup; a run pins
/// to the snapshot captured here.
#[derive(Debug)]
pub struct KbStore {
    kbs: Vec<LoadedKb>,
}

impl KbStore {
    pub fn from_files(files: Vec<KbFile>) -> Result<KbStore, KbError> {
        let mut kbs: Vec<LoadedKb> = Vec::with_capacity(files.len());
        for file in files {
            if kbs.iter().any(|kb| kb.descriptor.name == file.name) {
                return Err(KbError::DuplicateKb(file.name));
            }
            kbs.push(LoadedKb::new(file));
        }
        kbs.sort_by(|a, b| a.descriptor.name.cmp(&b.descriptor.name));
        Ok(KbStore { kbs })
    }

    /// Loads every `*.json` file in the snapshot directory. Any unreadable or
    /// unparseable file is fatal.
    pub fn load_dir(dir: &Path) -> Result<KbStore, KbError> {
        KbStore::load_dir_with_extra(dir, vec![])
    }

    /// As `load_dir`, with additional KB files (e.g. a run-specific panel of
    /// normals) joined into the snapshot.
    pub fn load_dir_with_extra(dir: &Path, extra: Vec<KbFile>) -> Result<KbStore, KbError> {
        if !dir.is_dir() {
            return Err(KbError::MissingDirectory(dir.to_path_buf()));
        }
        let mut paths: Vec<_> = fs::read_dir(dir)
            .map_err(|source| KbError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        let mut files = Vec::with_capacity(paths.len() + extra.len());
        for path in paths {
            files.push(read_kb_file(&path)?);
        }
        files.extend(extra);
        let store = KbStore::from_files(files)?;
        info!("Knowledge-base snapshot loaded: {} sources", store.kbs.len());
        Ok(store)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &KbDescriptor> {
        self.kbs.iter().map(|kb| &kb.descriptor)
    }

    pub fn descriptor(&self, name: &str) -> Option<&KbDescriptor> {
        self.kbs
            .iter()
            .map(|kb| &kb.descriptor)
            .find(|d| d.name == name)
    }

    /// KB name -> version, sorted by name. Recorded in every bundle header.
    pub fn snapshot(&self) -> OrderMap<String, String> {
        self.kbs
            .iter()
            .map(|kb| (kb.descriptor.name.clone(), kb.descriptor.version.clone()))
            .collect()
    }

    pub fn lookup(
        &self,
        kb_name: &str,
        query: &VariantQuery,
    ) -> Result<Vec<KnowledgeBaseHit>, KbError> {
        let kb = self
            .kbs
            .iter()
            .find(|kb| kb.descriptor.name == kb_name)
            .ok_or_else(|| KbError::UnknownKb(kb_name.to_string()))?;
        Ok(kb.hits(query))
    }

    /// Hits across every KB of one family, in snapshot order.
    pub fn lookup_kind(&self, kind: KbKind, query: &VariantQuery) -> Vec<KnowledgeBaseHit> {
        self.kbs
            .iter()
            .filter(|kb| kb.descriptor.kind == kind)
            .flat_map(|kb| kb.hits(query))
            .collect()
    }

    pub fn is_hotspot(&self, query: &VariantQuery) -> bool {
        !self.lookup_kind(KbKind::Hotspot, query).is_empty()
    }

    pub fn panel_of_normals_frequency(&self, query: &VariantQuery) -> Option<f64> {
        self.lookup_kind(KbKind::PanelOfNormals, query)
            .into_iter()
            .filter_map(|hit| hit.record.panel_frequency)
            .fold(None, |acc, f| Some(acc.map_or(f, |m: f64| m.max(f))))
    }

    /// All records of one KB family, in snapshot order. Used for run-level
    /// scans such as the pertinent-negative gene list.
    pub fn records_of_kind(&self, kind: KbKind) -> impl Iterator<Item = &KbRecord> {
        self.kbs
            .iter()
            .filter(move |kb| kb.descriptor.kind == kind)
            .flat_map(|kb| kb.records.iter())
    }

    pub fn gene_role(&self, gene: &str) -> Option<GeneRole> {
        let query = VariantQuery {
            chromosome: String::new(),
            position: 0,
            reference: String::new(),
            alternate: String::new(),
            gene: Some(gene.to_string()),
            protein_change: None,
            codon: None,
        };
        self.lookup_kind(KbKind::GeneRole, &query)
            .into_iter()
            .find_map(|hit| hit.record.role)
    }
}
