// Doctor workspace (`/doctor/...`), always sent with the doctor's credential

use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;

use crate::auth::Role;
use crate::error::Result;
use crate::http_client::{ApiRequest, ClinicHttpClient};
use crate::models::{Appointment, CancelAppointmentRequest, Doctor, Feedback, FeedbackReply};

pub struct DoctorService {
    client: Arc<ClinicHttpClient>,
}

impl DoctorService {
    pub fn new(client: Arc<ClinicHttpClient>) -> Self {
        Self { client }
    }

    fn request(&self, request: ApiRequest) -> ApiRequest {
        request.role(Role::Doctor)
    }

    pub async fn profile(&self) -> Result<Doctor> {
        self.client
            .send_json(self.request(ApiRequest::get("/doctor/profile")))
            .await
    }

    /// The doctor's own appointments, or only those on `date`
    pub async fn appointments(&self, date: Option<NaiveDate>) -> Result<Vec<Appointment>> {
        let mut request = ApiRequest::get("/doctor/appointments");
        if let Some(date) = date {
            request = request.query("date", date.format("%Y-%m-%d").to_string());
        }
        self.client.send_json(self.request(request)).await
    }

    pub async fn appointment(&self, id: i64) -> Result<Appointment> {
        self.client
            .send_json(self.request(ApiRequest::get(format!("/doctor/appointments/{}", id))))
            .await
    }

    pub async fn confirm_appointment(&self, id: i64) -> Result<Appointment> {
        let confirmed: Appointment = self
            .client
            .send_json(self.request(ApiRequest::put(format!(
                "/doctor/appointments/{}/confirm",
                id
            ))))
            .await?;
        tracing::info!(id = id, "Appointment confirmed");
        Ok(confirmed)
    }

    pub async fn cancel_appointment(&self, id: i64, reason: &str) -> Result<Appointment> {
        let body = serde_json::to_value(CancelAppointmentRequest {
            cancellation_reason: reason.to_string(),
        })?;
        let cancelled: Appointment = self
            .client
            .send_json(
                self.request(ApiRequest::post(format!("/doctor/appointments/{}/cancel", id)))
                    .json(body),
            )
            .await?;
        tracing::info!(id = id, "Appointment cancelled by doctor");
        Ok(cancelled)
    }

    pub async fn feedbacks(&self) -> Result<Vec<Feedback>> {
        self.client
            .send_json(self.request(ApiRequest::get("/doctor/feedbacks")))
            .await
    }

    /// Reply to a feedback; `edit` replaces an earlier reply
    pub async fn reply_to_feedback(&self, id: i64, reply: &str, edit: bool) -> Result<Feedback> {
        let body = serde_json::to_value(FeedbackReply {
            doctor_reply: reply.trim().to_string(),
        })?;
        let path = format!("/doctor/feedbacks/{}/reply", id);
        let request = if edit {
            ApiRequest::put(path)
        } else {
            ApiRequest::post(path)
        };
        self.client.send_json(self.request(request).json(body)).await
    }

    /// Average rating as reported by the server (a bare number or an object)
    pub async fn average_rating(&self) -> Result<Value> {
        self.client
            .send_json(self.request(ApiRequest::get("/doctor/average-rating")))
            .await
    }
}
