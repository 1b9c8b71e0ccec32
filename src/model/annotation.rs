use ordermap::OrderMap;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Categorical call reported by a functional predictor alongside its score.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PredictorCall {
    Damaging,
    Tolerated,
    Ambiguous,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictorScore {
    pub score: f64,
    pub call: PredictorCall,
}

/// Population allele frequencies per continental ancestry group, as captured
/// by the annotator. Absence of the snapshot means the variant was not found
/// in any population database.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    pub by_group: OrderMap<String, f64>,
}

impl PopulationSnapshot {
    pub fn max_af(&self) -> Option<f64> {
        self.by_group
            .values()
            .copied()
            .fold(None, |acc, af| Some(acc.map_or(af, |m: f64| m.max(af))))
    }

    pub fn group_af(&self, group: &str) -> Option<f64> {
        self.by_group.get(group).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_group.is_empty()
    }
}

/// Functional annotation attached to a variant by the external annotator.
/// Every field is optional: a missing sidecar record yields the default.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FunctionalAnnotation {
    #[serde(default)]
    pub predictors: OrderMap<String, PredictorScore>,
    /// Splice-impact delta scores keyed by model name.
    #[serde(default)]
    pub splice_deltas: OrderMap<String, f64>,
    /// Protein domains the variant position falls into.
    #[serde(default)]
    pub domains: Vec<String>,
    #[serde(default)]
    pub conservation: Option<f64>,
    #[serde(default)]
    pub population: Option<PopulationSnapshot>,
    /// True when a truncating variant falls in the terminal region that
    /// escapes nonsense-mediated decay.
    #[serde(default)]
    pub escapes_nmd: bool,
}

impl FunctionalAnnotation {
    pub fn max_population_af(&self) -> Option<f64> {
        self.population.as_ref().and_then(PopulationSnapshot::max_af)
    }

    /// True when no population database reported this variant at all.
    pub fn absent_from_population(&self) -> bool {
        self.population.as_ref().is_none_or(PopulationSnapshot::is_empty)
    }

    pub fn damaging_predictor_count(&self) -> usize {
        self.predictors
            .values()
            .filter(|p| p.call == PredictorCall::Damaging)
            .count()
    }

    pub fn tolerated_predictor_count(&self) -> usize {
        self.predictors
            .values()
            .filter(|p| p.call == PredictorCall::Tolerated)
            .count()
    }

    pub fn max_splice_delta(&self) -> Option<f64> {
        self.splice_deltas
            .values()
            .copied()
            .fold(None, |acc, d| Some(acc.map_or(d, |m: f64| m.max(d))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn snapshot(pairs: &[(&str, f64)]) -> PopulationSnapshot {
        PopulationSnapshot {
            by_group: pairs
                .iter()
                .map(|(group, af)| (group.to_string(), *af))
                .collect(),
        }
    }

    #[rstest]
    fn test_max_af_across_groups() {
        let pop = snapshot(&[("afr", 0.001), ("eas", 0.012), ("nfe", 0.0004)]);
        assert_eq!(pop.max_af(), Some(0.012));
    }

    #[rstest]
    fn test_absent_from_population() {
        let mut annotation = FunctionalAnnotation::default();
        assert!(annotation.absent_from_population());

        annotation.population = Some(PopulationSnapshot::default());
        assert!(annotation.absent_from_population());

        annotation.population = Some(snapshot(&[("nfe", 0.0001)]));
        assert!(!annotation.absent_from_population());
    }

    #[rstest]
    fn test_predictor_counts() {
        let mut annotation = FunctionalAnnotation::default();
        for (name, call) in [
            ("sift", PredictorCall::Damaging),
            ("polyphen", PredictorCall::Damaging),
            ("revel", PredictorCall::Damaging),
            ("fathmm", PredictorCall::Tolerated),
        ] {
            annotation
                .predictors
                .insert(name.to_string(), PredictorScore { score: 0.9, call });
        }
        assert_eq!(annotation.damaging_predictor_count(), 3);
        assert_eq!(annotation.tolerated_predictor_count(), 1);
    }
}
