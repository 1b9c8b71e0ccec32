pub mod cancer_type;
pub mod engine_config;
pub mod pathway;
pub mod sample;
