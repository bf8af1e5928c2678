// src/api/dto/compliance_dto.rs

use crate::service::compliance_service::{Anomaly, Recommendation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Default)]
pub struct ComplianceQueryParams {
    /// Trailing window in days (default 30, max 365).
    pub days: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct ComplianceScoreResponse {
    pub compliance_score: u32,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AnomalyListResponse {
    pub anomalies: Vec<Anomaly>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct RecommendationListResponse {
    pub recommendations: Vec<Recommendation>,
    pub total: usize,
}
