// Admin appointment management (`/admin/appointments`)

use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;

use crate::auth::Role;
use crate::error::Result;
use crate::http_client::{ApiRequest, ClinicHttpClient};
use crate::models::{Appointment, CancelAppointmentRequest};

pub struct AppointmentService {
    client: Arc<ClinicHttpClient>,
}

impl AppointmentService {
    pub fn new(client: Arc<ClinicHttpClient>) -> Self {
        Self { client }
    }

    /// All appointments, or only those on `date`
    pub async fn list(&self, date: Option<NaiveDate>) -> Result<Vec<Appointment>> {
        let mut request = ApiRequest::get("/admin/appointments").role(Role::Admin);
        if let Some(date) = date {
            request = request.query("date", date.format("%Y-%m-%d").to_string());
        }
        self.client.send_json(request).await
    }

    pub async fn get(&self, id: i64) -> Result<Appointment> {
        self.client
            .send_json(ApiRequest::get(format!("/admin/appointments/{}", id)).role(Role::Admin))
            .await
    }

    /// Replace an appointment. Takes raw JSON so fields unknown to this client survive.
    pub async fn update(&self, id: i64, appointment: &Value) -> Result<Appointment> {
        self.client
            .send_json(
                ApiRequest::put(format!("/admin/appointments/{}", id))
                    .role(Role::Admin)
                    .json(appointment.clone()),
            )
            .await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        self.client
            .send_empty(ApiRequest::delete(format!("/admin/appointments/{}", id)).role(Role::Admin))
            .await
    }

    pub async fn cancel(&self, id: i64, reason: &str) -> Result<Appointment> {
        let body = serde_json::to_value(CancelAppointmentRequest {
            cancellation_reason: reason.to_string(),
        })?;
        let cancelled: Appointment = self
            .client
            .send_json(
                ApiRequest::post(format!("/admin/appointments/{}/cancel", id))
                    .role(Role::Admin)
                    .json(body),
            )
            .await?;
        tracing::info!(id = id, "Appointment cancelled");
        Ok(cancelled)
    }
}
