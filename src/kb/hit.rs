use serde::{Deserialize, Serialize};

use crate::kb::source::{KbKind, KbRecord, ReliabilityTier};

/// One raw match returned by the lookup interface. The aggregator converts
/// hits into typed evidence; nothing downstream touches KB records directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeBaseHit {
    pub kb: String,
    pub kb_version: String,
    pub kind: KbKind,
    pub reliability: ReliabilityTier,
    pub record: KbRecord,
}

impl KnowledgeBaseHit {
    pub fn record_id(&self) -> &str {
        &self.record.record_id
    }
}
