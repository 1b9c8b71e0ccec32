pub mod annotations;
pub mod error;
pub mod normalizer;
pub mod vcf;
