//! Records of chain/anchor verification attempts.

use crate::ids::TraceId;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationKind {
    ChainIntegrity,
    DatabaseMatch,
    AnchorMatch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub trace_id: TraceId,
    pub kind: VerificationKind,
    pub valid: bool,
    pub error: Option<String>,
    pub verified_by: String,
    pub at: SystemTime,
}
