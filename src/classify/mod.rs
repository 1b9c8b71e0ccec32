pub mod curated;
pub mod oncogenicity;
pub mod reconciler;
pub mod therapeutic;

pub use curated::classify_curated;
pub use oncogenicity::classify_oncogenicity;
pub use reconciler::{ReconciledResults, reconcile_and_classify};
pub use therapeutic::{TherapeuticContext, classify_therapeutic};
