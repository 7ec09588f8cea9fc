//! Data access layer.
//!
//! `ClinicApi` abstracts the clinic backend; `HttpClinicApi` talks to the
//! HTTP API over reqwest. `DataContext` owns the client-side [`AppState`],
//! refreshes it with concurrent reads and applies mutations optimistically.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};

use chrono::NaiveDateTime;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::api::endpoints::consultations::ConsultationsResponse;
use crate::api::endpoints::medecins::MedecinsResponse;
use crate::api::endpoints::patients::PatientsResponse;
use crate::api::endpoints::rendez_vous::RendezVousResponse;
use crate::api::error::ErrorBody;
use crate::dashboard::{self, DashboardStats, WeeklySummary};
use crate::models::enums::TreatmentStatus;
use crate::models::{Consultation, Medecin, Notification, Patient, RendezVous};
use crate::notifications::{self, NotificationCenter, Toast, Variant};
use crate::scheduling;
use crate::state::{self, AppState, FetchedData};

// ─── Errors ─────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Server returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("{0}")]
    Conflict(String),
}

// ─── Backend abstraction ────────────────────────────────────

/// Clinic backend operations.
pub trait ClinicApi: Send + Sync {
    fn fetch_patients(&self) -> impl Future<Output = Result<Vec<Patient>, ClientError>> + Send;
    fn fetch_medecins(&self) -> impl Future<Output = Result<Vec<Medecin>, ClientError>> + Send;
    fn fetch_rendez_vous(&self)
        -> impl Future<Output = Result<Vec<RendezVous>, ClientError>> + Send;
    fn fetch_consultations(
        &self,
    ) -> impl Future<Output = Result<Vec<Consultation>, ClientError>> + Send;
    fn fetch_dashboard_stats(
        &self,
    ) -> impl Future<Output = Result<DashboardStats, ClientError>> + Send;

    fn create_patient(
        &self,
        patient: &Patient,
    ) -> impl Future<Output = Result<Patient, ClientError>> + Send;
    fn update_patient(
        &self,
        patient: &Patient,
    ) -> impl Future<Output = Result<Patient, ClientError>> + Send;
    fn delete_patient(&self, id: &str) -> impl Future<Output = Result<(), ClientError>> + Send;
    fn change_patient_status(
        &self,
        id: &str,
        statut: TreatmentStatus,
        date: Option<&str>,
    ) -> impl Future<Output = Result<Patient, ClientError>> + Send;

    fn create_medecin(
        &self,
        medecin: &Medecin,
    ) -> impl Future<Output = Result<Medecin, ClientError>> + Send;
    fn update_medecin(
        &self,
        medecin: &Medecin,
    ) -> impl Future<Output = Result<Medecin, ClientError>> + Send;
    fn delete_medecin(&self, id: &str) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn create_rendez_vous(
        &self,
        rdv: &RendezVous,
    ) -> impl Future<Output = Result<RendezVous, ClientError>> + Send;
    fn update_rendez_vous(
        &self,
        rdv: &RendezVous,
    ) -> impl Future<Output = Result<RendezVous, ClientError>> + Send;
    fn delete_rendez_vous(&self, id: &str)
        -> impl Future<Output = Result<(), ClientError>> + Send;

    fn create_consultation(
        &self,
        consultation: &Consultation,
    ) -> impl Future<Output = Result<Consultation, ClientError>> + Send;
    fn update_consultation(
        &self,
        consultation: &Consultation,
    ) -> impl Future<Output = Result<Consultation, ClientError>> + Send;
    fn delete_consultation(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

// ─── HTTP implementation ────────────────────────────────────

#[derive(Debug, Clone)]
pub struct HttpClinicApi {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct StatusChangeBody<'a> {
    statut: TreatmentStatus,
    date: Option<&'a str>,
}

#[derive(Deserialize)]
struct NotificationsBody {
    notifications: Vec<Notification>,
}

impl HttpClinicApi {
    /// `base_url` is the server root, e.g. `http://127.0.0.1:3001`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{path}", self.base_url)
    }

    /// Server-computed notifications, for callers that skip local state.
    pub async fn fetch_notifications(
        &self,
        variant: Variant,
    ) -> Result<Vec<Notification>, ClientError> {
        let variant = match variant {
            Variant::Dashboard => "dashboard",
            Variant::Center => "center",
        };
        let body: NotificationsBody = self
            .get(&format!("/notifications?variant={variant}"))
            .await?;
        Ok(body.notifications)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        let response = self.client.get(self.url(path)).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .request(method, self.url(path))
            .json(body)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let response = self.client.delete(self.url(path)).send().await?;
        check(response).await?;
        Ok(())
    }
}

/// Turn non-success responses into `ClientError`, reading the server's
/// error body when there is one.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error.message,
        Err(_) => status.canonical_reason().unwrap_or("Unknown error").to_string(),
    };
    if status == StatusCode::CONFLICT {
        return Err(ClientError::Conflict(message));
    }
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}

impl ClinicApi for HttpClinicApi {
    async fn fetch_patients(&self) -> Result<Vec<Patient>, ClientError> {
        let body: PatientsResponse = self.get("/patients").await?;
        Ok(body.patients)
    }

    async fn fetch_medecins(&self) -> Result<Vec<Medecin>, ClientError> {
        let body: MedecinsResponse = self.get("/medecins").await?;
        Ok(body.medecins)
    }

    async fn fetch_rendez_vous(&self) -> Result<Vec<RendezVous>, ClientError> {
        let body: RendezVousResponse = self.get("/rendez-vous").await?;
        Ok(body.rendez_vous)
    }

    async fn fetch_consultations(&self) -> Result<Vec<Consultation>, ClientError> {
        let body: ConsultationsResponse = self.get("/consultations").await?;
        Ok(body.consultations)
    }

    async fn fetch_dashboard_stats(&self) -> Result<DashboardStats, ClientError> {
        self.get("/stats/dashboard").await
    }

    async fn create_patient(&self, patient: &Patient) -> Result<Patient, ClientError> {
        self.send_json(Method::POST, "/patients", patient).await
    }

    async fn update_patient(&self, patient: &Patient) -> Result<Patient, ClientError> {
        self.send_json(Method::PUT, &format!("/patients/{}", patient.id), patient)
            .await
    }

    async fn delete_patient(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&format!("/patients/{id}")).await
    }

    async fn change_patient_status(
        &self,
        id: &str,
        statut: TreatmentStatus,
        date: Option<&str>,
    ) -> Result<Patient, ClientError> {
        let body = StatusChangeBody { statut, date };
        self.send_json(Method::POST, &format!("/patients/{id}/statut"), &body)
            .await
    }

    async fn create_medecin(&self, medecin: &Medecin) -> Result<Medecin, ClientError> {
        self.send_json(Method::POST, "/medecins", medecin).await
    }

    async fn update_medecin(&self, medecin: &Medecin) -> Result<Medecin, ClientError> {
        self.send_json(Method::PUT, &format!("/medecins/{}", medecin.id), medecin)
            .await
    }

    async fn delete_medecin(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&format!("/medecins/{id}")).await
    }

    async fn create_rendez_vous(&self, rdv: &RendezVous) -> Result<RendezVous, ClientError> {
        self.send_json(Method::POST, "/rendez-vous", rdv).await
    }

    async fn update_rendez_vous(&self, rdv: &RendezVous) -> Result<RendezVous, ClientError> {
        self.send_json(Method::PUT, &format!("/rendez-vous/{}", rdv.id), rdv)
            .await
    }

    async fn delete_rendez_vous(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&format!("/rendez-vous/{id}")).await
    }

    async fn create_consultation(
        &self,
        consultation: &Consultation,
    ) -> Result<Consultation, ClientError> {
        self.send_json(Method::POST, "/consultations", consultation)
            .await
    }

    async fn update_consultation(
        &self,
        consultation: &Consultation,
    ) -> Result<Consultation, ClientError> {
        self.send_json(
            Method::PUT,
            &format!("/consultations/{}", consultation.id),
            consultation,
        )
        .await
    }

    async fn delete_consultation(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&format!("/consultations/{id}")).await
    }
}

// ─── Data context ───────────────────────────────────────────

/// Issue all five reads concurrently.
pub async fn fetch_all<A: ClinicApi>(api: &A) -> Result<FetchedData, ClientError> {
    let (patients, medecins, rendez_vous, consultations, stats) = tokio::try_join!(
        api.fetch_patients(),
        api.fetch_medecins(),
        api.fetch_rendez_vous(),
        api.fetch_consultations(),
        api.fetch_dashboard_stats(),
    )?;
    Ok(FetchedData {
        patients,
        medecins,
        rendez_vous,
        consultations,
        dashboard_stats: Some(stats),
    })
}

/// Client-side state container bound to a backend.
///
/// The state lock is never held across an await, so `refresh` and the
/// mutations may run concurrently on a shared reference.
pub struct DataContext<A> {
    api: A,
    state: Mutex<AppState>,
}

impl<A: ClinicApi> DataContext<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            state: Mutex::new(AppState::new()),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    fn lock(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` against the current state.
    pub fn with_state<R>(&self, f: impl FnOnce(&AppState) -> R) -> R {
        f(&self.lock())
    }

    /// Clone of the current state.
    pub fn state(&self) -> AppState {
        self.lock().clone()
    }

    /// Re-read every collection. Returns `false` when this completion was
    /// superseded by a newer one and discarded.
    pub async fn refresh(&self) -> bool {
        let ticket = self.lock().begin_fetch();
        let result = fetch_all(&self.api).await;
        self.lock().apply(ticket, result)
    }

    // ─── Patients ───

    pub async fn add_patient(&self, patient: &Patient) -> Result<Patient, ClientError> {
        let created = self.api.create_patient(patient).await?;
        state::upsert(&mut self.lock().patients, created.clone());
        self.refresh().await;
        Ok(created)
    }

    pub async fn update_patient(&self, patient: &Patient) -> Result<Patient, ClientError> {
        let updated = self.api.update_patient(patient).await?;
        state::upsert(&mut self.lock().patients, updated.clone());
        self.refresh().await;
        Ok(updated)
    }

    pub async fn delete_patient(&self, id: &str) -> Result<(), ClientError> {
        self.api.delete_patient(id).await?;
        state::remove(&mut self.lock().patients, id);
        self.refresh().await;
        Ok(())
    }

    pub async fn change_patient_status(
        &self,
        id: &str,
        statut: TreatmentStatus,
        date: Option<&str>,
    ) -> Result<Patient, ClientError> {
        let updated = self.api.change_patient_status(id, statut, date).await?;
        state::upsert(&mut self.lock().patients, updated.clone());
        self.refresh().await;
        Ok(updated)
    }

    // ─── Doctors ───

    pub async fn add_medecin(&self, medecin: &Medecin) -> Result<Medecin, ClientError> {
        let created = self.api.create_medecin(medecin).await?;
        state::upsert(&mut self.lock().medecins, created.clone());
        self.refresh().await;
        Ok(created)
    }

    pub async fn update_medecin(&self, medecin: &Medecin) -> Result<Medecin, ClientError> {
        let updated = self.api.update_medecin(medecin).await?;
        state::upsert(&mut self.lock().medecins, updated.clone());
        self.refresh().await;
        Ok(updated)
    }

    pub async fn delete_medecin(&self, id: &str) -> Result<(), ClientError> {
        self.api.delete_medecin(id).await?;
        state::remove(&mut self.lock().medecins, id);
        self.refresh().await;
        Ok(())
    }

    // ─── Appointments ───

    /// Reject a double booking against local state before sending.
    fn ensure_slot_free(&self, rdv: &RendezVous) -> Result<(), ClientError> {
        let checked = self.with_state(|s| scheduling::check_slot(&s.rendez_vous, rdv));
        checked.map_err(|e| {
            tracing::info!(patient = %rdv.patient, heure = %rdv.heure, "Double booking rejected locally");
            ClientError::Conflict(e.to_string())
        })
    }

    pub async fn add_rendez_vous(&self, rdv: &RendezVous) -> Result<RendezVous, ClientError> {
        self.ensure_slot_free(rdv)?;
        let created = self.api.create_rendez_vous(rdv).await?;
        state::upsert(&mut self.lock().rendez_vous, created.clone());
        self.refresh().await;
        Ok(created)
    }

    pub async fn update_rendez_vous(&self, rdv: &RendezVous) -> Result<RendezVous, ClientError> {
        self.ensure_slot_free(rdv)?;
        let updated = self.api.update_rendez_vous(rdv).await?;
        state::upsert(&mut self.lock().rendez_vous, updated.clone());
        self.refresh().await;
        Ok(updated)
    }

    pub async fn delete_rendez_vous(&self, id: &str) -> Result<(), ClientError> {
        self.api.delete_rendez_vous(id).await?;
        state::remove(&mut self.lock().rendez_vous, id);
        self.refresh().await;
        Ok(())
    }

    // ─── Consultations ───

    pub async fn add_consultation(
        &self,
        consultation: &Consultation,
    ) -> Result<Consultation, ClientError> {
        let created = self.api.create_consultation(consultation).await?;
        state::upsert(&mut self.lock().consultations, created.clone());
        self.refresh().await;
        Ok(created)
    }

    pub async fn update_consultation(
        &self,
        consultation: &Consultation,
    ) -> Result<Consultation, ClientError> {
        let updated = self.api.update_consultation(consultation).await?;
        state::upsert(&mut self.lock().consultations, updated.clone());
        self.refresh().await;
        Ok(updated)
    }

    pub async fn delete_consultation(&self, id: &str) -> Result<(), ClientError> {
        self.api.delete_consultation(id).await?;
        state::remove(&mut self.lock().consultations, id);
        self.refresh().await;
        Ok(())
    }

    // ─── Views ───

    /// Dashboard notification feed over the current state.
    pub fn notifications(&self, now: NaiveDateTime) -> Vec<Notification> {
        self.with_state(|s| notifications::generate(&s.snapshot(), now, Variant::Dashboard))
    }

    /// Feed the notification center from the current state. Returns the
    /// toasts to show.
    pub fn refresh_center(&self, center: &mut NotificationCenter, now: NaiveDateTime) -> Vec<Toast> {
        self.with_state(|s| center.refresh(&s.snapshot(), now))
    }

    pub fn weekly_summaries(&self, now: NaiveDateTime, n: usize) -> Vec<WeeklySummary> {
        self.with_state(|s| dashboard::weekly_summaries(&s.snapshot(), now, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    use crate::api::server::{start_api_server_on, ApiServer};
    use crate::core_state::CoreState;
    use crate::models::enums::{AppointmentStatus, AppointmentType, DoctorStatus};
    use crate::scheduling::DOUBLE_BOOKING_MESSAGE;
    use crate::state::LOAD_ERROR_MESSAGE;

    async fn start() -> (tempfile::TempDir, ApiServer, DataContext<HttpClinicApi>) {
        let dir = tempfile::tempdir().unwrap();
        let core = Arc::new(CoreState::new(dir.path().join("clinic.db")).unwrap());
        let server = start_api_server_on(core, IpAddr::V4(Ipv4Addr::LOCALHOST))
            .await
            .unwrap();
        let ctx = DataContext::new(HttpClinicApi::new(server.session.base_url()));
        (dir, server, ctx)
    }

    fn at(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn rdv(patient: &str, heure: &str) -> RendezVous {
        RendezVous {
            date: "2024-05-08".into(),
            heure: heure.into(),
            patient: patient.into(),
            medecin: "Dr. Haddad".into(),
            medecin_id: Some("m1".into()),
            kind: AppointmentType::Consultation,
            statut: Some(AppointmentStatus::Confirme),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn refresh_loads_everything() {
        let (_dir, server, ctx) = start().await;
        assert!(ctx.refresh().await);

        let state = ctx.state();
        assert!(!state.loading);
        assert!(state.error.is_none());
        assert!(state.patients.is_empty());
        assert!(state.dashboard_stats.is_some());

        server.stop().await;
    }

    #[tokio::test]
    async fn mutations_update_local_state() {
        let (_dir, server, ctx) = start().await;

        let patient = ctx
            .add_patient(&Patient {
                nom: "Benali".into(),
                prenom: "Karim".into(),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(!patient.id.is_empty());

        let medecin = ctx
            .add_medecin(&Medecin {
                id: "m1".into(),
                nom: "Haddad".into(),
                prenom: "Samia".into(),
                status: DoctorStatus::EnConge,
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(medecin.status, DoctorStatus::EnConge);

        let state = ctx.state();
        assert_eq!(state.patients.len(), 1);
        assert_eq!(state.medecins.len(), 1);
        let stats = state.dashboard_stats.unwrap();
        assert_eq!(stats.overview.total_patients, 1);

        ctx.delete_patient(&patient.id).await.unwrap();
        assert!(ctx.state().patients.is_empty());

        server.stop().await;
    }

    #[tokio::test]
    async fn status_change_goes_through_history() {
        let (_dir, server, ctx) = start().await;
        let patient = ctx
            .add_patient(&Patient {
                nom: "Saidi".into(),
                statut: Some(TreatmentStatus::Nouveau),
                created_at: Some("2024-03-01T09:00:00".into()),
                ..Default::default()
            })
            .await
            .unwrap();

        let updated = ctx
            .change_patient_status(
                &patient.id,
                TreatmentStatus::SousTraitement,
                Some("2024-03-10T10:00:00"),
            )
            .await
            .unwrap();
        assert_eq!(updated.statut, Some(TreatmentStatus::SousTraitement));
        assert_eq!(updated.statut_history.len(), 2);

        server.stop().await;
    }

    #[tokio::test]
    async fn booking_a_taken_slot_is_rejected_locally() {
        let (_dir, server, ctx) = start().await;

        ctx.add_rendez_vous(&rdv("Karim", "10:00")).await.unwrap();
        ctx.add_rendez_vous(&rdv("Lina", "10:30")).await.unwrap();

        let err = ctx.add_rendez_vous(&rdv("Nadia", "10:00")).await.unwrap_err();
        assert!(matches!(&err, ClientError::Conflict(m) if m == DOUBLE_BOOKING_MESSAGE));
        assert_eq!(ctx.state().rendez_vous.len(), 2);

        server.stop().await;
    }

    #[tokio::test]
    async fn server_rejects_conflict_missed_by_stale_state() {
        let (_dir, server, ctx) = start().await;
        // Booked by another client; local state never saw it
        let other = HttpClinicApi::new(server.session.base_url());
        other.create_rendez_vous(&rdv("Karim", "10:00")).await.unwrap();

        let err = ctx.add_rendez_vous(&rdv("Nadia", "10:00")).await.unwrap_err();
        assert!(matches!(&err, ClientError::Conflict(m) if m == DOUBLE_BOOKING_MESSAGE));

        server.stop().await;
    }

    #[tokio::test]
    async fn missing_record_is_status_error() {
        let (_dir, server, ctx) = start().await;
        let err = ctx.delete_medecin("nope").await.unwrap_err();
        assert!(matches!(err, ClientError::Status { status: 404, .. }));
        server.stop().await;
    }

    #[tokio::test]
    async fn unreachable_server_records_load_error() {
        let (_dir, server, ctx) = start().await;
        ctx.add_medecin(&Medecin {
            nom: "Haddad".into(),
            ..Default::default()
        })
        .await
        .unwrap();
        server.stop().await;

        assert!(ctx.refresh().await);
        let state = ctx.state();
        assert_eq!(state.error.as_deref(), Some(LOAD_ERROR_MESSAGE));
        assert_eq!(state.medecins.len(), 1, "previous data kept");
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn concurrent_refreshes_settle() {
        let (_dir, server, ctx) = start().await;
        let (a, b) = tokio::join!(ctx.refresh(), ctx.refresh());
        // At least the newest completion lands; an older one may be dropped
        assert!(a || b);
        assert!(!ctx.state().loading);
        server.stop().await;
    }

    #[tokio::test]
    async fn views_derive_from_local_state() {
        let (_dir, server, ctx) = start().await;
        ctx.add_medecin(&Medecin {
            id: "m1".into(),
            nom: "Haddad".into(),
            status: DoctorStatus::EnConge,
            ..Default::default()
        })
        .await
        .unwrap();
        let mut urgent = rdv("Karim", "15:00");
        urgent.kind = AppointmentType::Urgence;
        ctx.add_rendez_vous(&urgent).await.unwrap();

        let now = at("2024-05-08 10:00:00");
        let feed = ctx.notifications(now);
        assert_eq!(feed[0].title, "URGENCE");
        assert!(feed.iter().any(|n| n.id == "doctors-leave"));

        let weeks = ctx.weekly_summaries(now, 4);
        assert_eq!(weeks.len(), 4);
        assert_eq!(weeks[3].urgences, 1);

        let mut center = NotificationCenter::new();
        let toasts = ctx.refresh_center(&mut center, now);
        assert!(!toasts.is_empty());
        assert!(center.unread_count() > 0);

        let remote = ctx.api().fetch_notifications(Variant::Center).await.unwrap();
        assert!(remote.iter().any(|n| n.id == "doctors-leave"));

        server.stop().await;
    }
}
