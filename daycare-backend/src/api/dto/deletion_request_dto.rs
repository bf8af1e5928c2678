// src/api/dto/deletion_request_dto.rs

use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateDeletionRequestBody {
    #[validate(length(min = 1, message = "A reason is required"))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RejectDeletionRequestBody {
    #[validate(length(min = 1, message = "A rejection reason is required"))]
    pub reason: String,
}

#[derive(Debug, Deserialize, Default)]
pub struct DeletionRequestListParams {
    /// PENDING / APPROVED / REJECTED
    pub status: Option<String>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}
