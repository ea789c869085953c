// Admin feedback moderation (`/admin/feedbacks`)

use std::sync::Arc;

use crate::auth::Role;
use crate::error::Result;
use crate::http_client::{ApiRequest, ClinicHttpClient};
use crate::models::Feedback;

pub struct FeedbackService {
    client: Arc<ClinicHttpClient>,
}

impl FeedbackService {
    pub fn new(client: Arc<ClinicHttpClient>) -> Self {
        Self { client }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        self.client.send_json(request.role(Role::Admin)).await
    }

    /// All feedback, optionally only with the given status
    pub async fn list(&self, status: Option<&str>) -> Result<Vec<Feedback>> {
        let mut request = ApiRequest::get("/admin/feedbacks");
        if let Some(status) = status.filter(|s| !s.is_empty()) {
            request = request.query("status", status);
        }
        self.get_json(request).await
    }

    pub async fn get(&self, id: i64) -> Result<Feedback> {
        self.get_json(ApiRequest::get(format!("/admin/feedbacks/{}", id)))
            .await
    }

    pub async fn by_doctor(&self, doctor_id: i64) -> Result<Vec<Feedback>> {
        self.get_json(ApiRequest::get(format!("/admin/feedbacks/doctor/{}", doctor_id)))
            .await
    }

    pub async fn by_patient(&self, patient_id: i64) -> Result<Vec<Feedback>> {
        self.get_json(ApiRequest::get(format!("/admin/feedbacks/patient/{}", patient_id)))
            .await
    }

    pub async fn hide(&self, id: i64) -> Result<Feedback> {
        let feedback = self
            .get_json(ApiRequest::put(format!("/admin/feedbacks/{}/hide", id)))
            .await?;
        tracing::info!(id = id, "Feedback hidden");
        Ok(feedback)
    }

    pub async fn unhide(&self, id: i64) -> Result<Feedback> {
        let feedback = self
            .get_json(ApiRequest::put(format!("/admin/feedbacks/{}/unhide", id)))
            .await?;
        tracing::info!(id = id, "Feedback visible again");
        Ok(feedback)
    }
}
