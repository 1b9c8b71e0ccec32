use ordermap::OrderMap;

use crate::kb::source::ReliabilityTier;
use crate::model::bundle::Citation;
use crate::model::evidence::Evidence;

/// Per-block citation collector. Citations are numbered in order of first
/// appearance; citing the same evidence twice reuses its number.
#[derive(Debug, Default)]
pub struct CitationList {
    citations: Vec<Citation>,
}

impl CitationList {
    pub fn new() -> CitationList {
        CitationList::default()
    }

    /// Registers a citation for one evidence record and returns its number.
    pub fn cite(
        &mut self,
        evidence: &Evidence,
        reliabilities: &OrderMap<String, ReliabilityTier>,
    ) -> usize {
        if let Some(existing) = self
            .citations
            .iter()
            .find(|c| c.evidence_id == evidence.id)
        {
            return existing.number;
        }
        let source = evidence.sources.first();
        let kb = source.map(|s| s.kb.clone()).unwrap_or_default();
        let reliability = reliabilities
            .get(&kb)
            .copied()
            .unwrap_or(ReliabilityTier::Computational);
        let number = self.citations.len() + 1;
        self.citations.push(Citation {
            number,
            evidence_id: evidence.id.clone(),
            source: kb.clone(),
            reliability,
            display_label: format!("{} ({})", kb, evidence.code),
            external_reference: source.map(|s| format!("{}:{}", s.kb, s.record_id)),
        });
        number
    }

    /// Cites a cluster of concordant evidence and renders the bracketed
    /// marker, e.g. `[1,2,3]`.
    pub fn cite_cluster(
        &mut self,
        cluster: &[&Evidence],
        reliabilities: &OrderMap<String, ReliabilityTier>,
    ) -> String {
        let numbers: Vec<String> = cluster
            .iter()
            .map(|e| self.cite(e, reliabilities).to_string())
            .collect();
        format!("[{}]", numbers.join(","))
    }

    pub fn marker(number: usize) -> String {
        format!("[{number}]")
    }

    pub fn min_confidence(&self, evidence: &[Evidence]) -> f64 {
        self.citations
            .iter()
            .filter_map(|c| evidence.iter().find(|e| e.id == c.evidence_id))
            .map(|e| e.confidence)
            .fold(1.0f64, f64::min)
    }

    pub fn into_citations(self) -> Vec<Citation> {
        self.citations
    }

    pub fn is_empty(&self) -> bool {
        self.citations.is_empty()
    }
}

/// Reliability-first weaving order: regulatory sources are cited before
/// guideline, expert, community, and computational ones; ties break on the
/// code for determinism.
pub fn reliability_order<'a>(
    evidence: &'a [Evidence],
    reliabilities: &OrderMap<String, ReliabilityTier>,
) -> Vec<&'a Evidence> {
    let tier_of = |e: &Evidence| {
        e.sources
            .iter()
            .filter_map(|s| reliabilities.get(&s.kb).copied())
            .min()
            .unwrap_or(ReliabilityTier::Computational)
    };
    let mut ordered: Vec<&Evidence> = evidence.iter().collect();
    ordered.sort_by_key(|e| (tier_of(e), e.code.to_string()));
    ordered
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    use crate::model::evidence::{Direction, EvidenceCode, EvidenceSource, Strength};

    fn evidence(id: &str, code: EvidenceCode, kb: &str) -> Evidence {
        Evidence {
            id: id.to_string(),
            ..Evidence::new(
                code,
                Direction::SupportsPathogenic,
                Strength::Strong,
                vec![EvidenceSource {
                    kb: kb.to_string(),
                    kb_version: "v1".to_string(),
                    record_id: "r1".to_string(),
                }],
                0.9,
                "",
            )
        }
    }

    fn reliabilities() -> OrderMap<String, ReliabilityTier> {
        [
            ("curated".to_string(), ReliabilityTier::Regulatory),
            ("clinvar".to_string(), ReliabilityTier::CommunityCurated),
            ("hotspots".to_string(), ReliabilityTier::ExpertCurated),
        ]
        .into_iter()
        .collect()
    }

    #[rstest]
    fn test_numbers_follow_first_appearance() {
        let mut list = CitationList::new();
        let reliabilities = reliabilities();
        let a = evidence("E01", EvidenceCode::Os1, "curated");
        let b = evidence("E02", EvidenceCode::Os3, "hotspots");

        assert_eq!(list.cite(&a, &reliabilities), 1);
        assert_eq!(list.cite(&b, &reliabilities), 2);
        // Re-citing reuses the number.
        assert_eq!(list.cite(&a, &reliabilities), 1);
        assert_eq!(list.into_citations().len(), 2);
    }

    #[rstest]
    fn test_cluster_marker_format() {
        let mut list = CitationList::new();
        let reliabilities = reliabilities();
        let a = evidence("E01", EvidenceCode::Os1, "curated");
        let b = evidence("E02", EvidenceCode::Os3, "hotspots");
        let marker = list.cite_cluster(&[&a, &b], &reliabilities);
        assert_eq!(marker, "[1,2]");
    }

    #[rstest]
    fn test_reliability_order_puts_regulatory_first() {
        let reliabilities = reliabilities();
        let set = vec![
            evidence("E01", EvidenceCode::Op1, "clinvar"),
            evidence("E02", EvidenceCode::Os3, "hotspots"),
            evidence("E03", EvidenceCode::Os1, "curated"),
        ];
        let ordered = reliability_order(&set, &reliabilities);
        assert_eq!(ordered[0].id, "E03");
        assert_eq!(ordered[1].id, "E02");
        assert_eq!(ordered[2].id, "E01");
    }
}
