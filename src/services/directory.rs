// Admin doctor and patient records (`/admin/doctors`, `/admin/patients`)

use std::sync::Arc;

use crate::auth::Role;
use crate::error::Result;
use crate::http_client::{ApiRequest, ClinicHttpClient};
use crate::models::{Doctor, DoctorRequest, Patient, PatientRequest};

pub struct DirectoryService {
    client: Arc<ClinicHttpClient>,
}

impl DirectoryService {
    pub fn new(client: Arc<ClinicHttpClient>) -> Self {
        Self { client }
    }

    fn search(path: &str, term: Option<&str>) -> ApiRequest {
        let mut request = ApiRequest::get(path).role(Role::Admin);
        if let Some(term) = term.filter(|s| !s.is_empty()) {
            request = request.query("search", term);
        }
        request
    }

    pub async fn list_doctors(&self, search: Option<&str>) -> Result<Vec<Doctor>> {
        self.client
            .send_json(Self::search("/admin/doctors", search))
            .await
    }

    pub async fn get_doctor(&self, id: i64) -> Result<Doctor> {
        self.client
            .send_json(ApiRequest::get(format!("/admin/doctors/{}", id)).role(Role::Admin))
            .await
    }

    pub async fn create_doctor(&self, doctor: &DoctorRequest) -> Result<Doctor> {
        let body = serde_json::to_value(doctor)?;
        let created: Doctor = self
            .client
            .send_json(ApiRequest::post("/admin/doctors").role(Role::Admin).json(body))
            .await?;
        tracing::info!(id = created.id, name = %created.full_name, "Doctor created");
        Ok(created)
    }

    pub async fn update_doctor(&self, id: i64, doctor: &DoctorRequest) -> Result<Doctor> {
        let body = serde_json::to_value(doctor)?;
        self.client
            .send_json(
                ApiRequest::put(format!("/admin/doctors/{}", id))
                    .role(Role::Admin)
                    .json(body),
            )
            .await
    }

    pub async fn list_patients(&self, search: Option<&str>) -> Result<Vec<Patient>> {
        self.client
            .send_json(Self::search("/admin/patients", search))
            .await
    }

    pub async fn get_patient(&self, id: i64) -> Result<Patient> {
        self.client
            .send_json(ApiRequest::get(format!("/admin/patients/{}", id)).role(Role::Admin))
            .await
    }

    pub async fn create_patient(&self, patient: &PatientRequest) -> Result<Patient> {
        let body = serde_json::to_value(patient)?;
        let created: Patient = self
            .client
            .send_json(ApiRequest::post("/admin/patients").role(Role::Admin).json(body))
            .await?;
        tracing::info!(id = created.id, name = %created.full_name, "Patient created");
        Ok(created)
    }

    pub async fn update_patient(&self, id: i64, patient: &PatientRequest) -> Result<Patient> {
        let body = serde_json::to_value(patient)?;
        self.client
            .send_json(
                ApiRequest::put(format!("/admin/patients/{}", id))
                    .role(Role::Admin)
                    .json(body),
            )
            .await
    }
}
