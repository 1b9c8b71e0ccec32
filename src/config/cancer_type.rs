use ordermap::OrderMap;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// How closely a KB record's cancer type matches the sample's. Precedence:
/// exact code, then immediate parent, then organ system, then pan-cancer.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
    EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CancerTypeMatch {
    Exact,
    Parent,
    OrganSystem,
    PanCancer,
}

impl CancerTypeMatch {
    pub fn is_exact(&self) -> bool {
        *self == CancerTypeMatch::Exact
    }
}

/// Placement of one cancer-type code in the taxonomy.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CancerLineage {
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub organ_system: Option<String>,
}

/// A small cancer-type taxonomy used to resolve evidence match precedence.
/// The built-in table covers common codes; the config file can extend it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CancerTaxonomy {
    pub lineages: OrderMap<String, CancerLineage>,
}

impl Default for CancerTaxonomy {
    fn default() -> CancerTaxonomy {
        let table = [
            ("MEL", "SKCM", "SKIN"),
            ("SKCM", "SKIN", "SKIN"),
            ("LUAD", "NSCLC", "LUNG"),
            ("LUSC", "NSCLC", "LUNG"),
            ("NSCLC", "LUNG", "LUNG"),
            ("SCLC", "LUNG", "LUNG"),
            ("PAAD", "PANCREAS", "GI"),
            ("COAD", "CRC", "GI"),
            ("READ", "CRC", "GI"),
            ("CRC", "BOWEL", "GI"),
            ("STAD", "STOMACH", "GI"),
            ("BRCA", "BREAST", "BREAST"),
            ("PRAD", "PROSTATE", "GU"),
            ("BLCA", "BLADDER", "GU"),
            ("KIRC", "KIDNEY", "GU"),
            ("GBM", "BRAIN", "CNS"),
            ("LGG", "BRAIN", "CNS"),
            ("AML", "LEUKEMIA", "BLOOD"),
            ("CML", "LEUKEMIA", "BLOOD"),
            ("DLBCL", "LYMPHOMA", "BLOOD"),
            ("OV", "OVARY", "GYN"),
            ("UCEC", "UTERUS", "GYN"),
            ("THCA", "THYROID", "ENDOCRINE"),
            ("HCC", "LIVER", "GI"),
            ("CHOL", "BILIARY", "GI"),
        ];
        CancerTaxonomy {
            lineages: table
                .into_iter()
                .map(|(code, parent, organ)| {
                    (
                        code.to_string(),
                        CancerLineage {
                            parent: Some(parent.to_string()),
                            organ_system: Some(organ.to_string()),
                        },
                    )
                })
                .collect(),
        }
    }
}

impl CancerTaxonomy {
    /// Resolves the match level between a KB record's cancer type and the
    /// sample's. A record without a cancer type is pan-cancer; a sample
    /// without a code only matches pan-cancer records.
    pub fn match_level(
        &self,
        record_type: Option<&str>,
        sample_type: Option<&str>,
    ) -> Option<CancerTypeMatch> {
        let record = match record_type {
            None => return Some(CancerTypeMatch::PanCancer),
            Some(code) if code.eq_ignore_ascii_case("pan-cancer") => {
                return Some(CancerTypeMatch::PanCancer);
            }
            Some(code) => code,
        };
        let sample = sample_type?;
        if record.eq_ignore_ascii_case(sample) {
            return Some(CancerTypeMatch::Exact);
        }

        let sample_lineage = self.lineages.get(sample);
        if let Some(parent) = sample_lineage.and_then(|l| l.parent.as_deref())
            && record.eq_ignore_ascii_case(parent)
        {
            return Some(CancerTypeMatch::Parent);
        }
        if let Some(organ) = sample_lineage.and_then(|l| l.organ_system.as_deref())
            && record.eq_ignore_ascii_case(organ)
        {
            return Some(CancerTypeMatch::OrganSystem);
        }
        // Sibling codes under the same organ system still count as an
        // organ-system match.
        if let Some(record_lineage) = self.lineages.get(record)
            && let Some(sample_lineage) = sample_lineage
            && record_lineage.organ_system.is_some()
            && record_lineage.organ_system == sample_lineage.organ_system
        {
            return Some(CancerTypeMatch::OrganSystem);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Some("LUAD"), Some("LUAD"), Some(CancerTypeMatch::Exact))]
    #[case(Some("NSCLC"), Some("LUAD"), Some(CancerTypeMatch::Parent))]
    #[case(Some("LUNG"), Some("LUAD"), Some(CancerTypeMatch::OrganSystem))]
    #[case(Some("LUSC"), Some("LUAD"), Some(CancerTypeMatch::OrganSystem))]
    #[case(None, Some("LUAD"), Some(CancerTypeMatch::PanCancer))]
    #[case(Some("pan-cancer"), Some("LUAD"), Some(CancerTypeMatch::PanCancer))]
    #[case(Some("BRCA"), Some("LUAD"), None)]
    #[case(Some("LUAD"), None, None)]
    #[case(None, None, Some(CancerTypeMatch::PanCancer))]
    fn test_match_levels(
        #[case] record: Option<&str>,
        #[case] sample: Option<&str>,
        #[case] expected: Option<CancerTypeMatch>,
    ) {
        let taxonomy = CancerTaxonomy::default();
        assert_eq!(taxonomy.match_level(record, sample), expected);
    }

    #[rstest]
    fn test_precedence_ordering() {
        assert!(CancerTypeMatch::Exact < CancerTypeMatch::Parent);
        assert!(CancerTypeMatch::Parent < CancerTypeMatch::OrganSystem);
        assert!(CancerTypeMatch::OrganSystem < CancerTypeMatch::PanCancer);
    }
}
