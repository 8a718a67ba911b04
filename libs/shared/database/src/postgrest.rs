use std::fmt::Display;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};

use shared_config::AppConfig;
use shared_models::{
    AppointmentKey, AppointmentSlot, Client, ClientId, ConsultationRecord, DiagnosticCode,
    Doctor, DoctorId, FactSchema, FactTable, Medication, Nurse, NurseId, Prescription,
    PrescriptionId, SoapField, SoapNotes,
};

use crate::client::PostgrestClient;
use crate::error::StoreError;
use crate::filters::{AppointmentFilter, FactFilter};
use crate::store::RecordStore;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ==============================================================================
// ROW SHAPES
// ==============================================================================

#[derive(Debug, Deserialize)]
struct AppointmentRow {
    vat_doctor: String,
    date_timestamp: NaiveDateTime,
    vat_client: String,
    description: Option<String>,
}

impl From<AppointmentRow> for AppointmentSlot {
    fn from(row: AppointmentRow) -> Self {
        AppointmentSlot {
            doctor: DoctorId(row.vat_doctor),
            timestamp: row.date_timestamp,
            client: ClientId(row.vat_client),
            description: row.description.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EmployeeName {
    name: String,
}

#[derive(Debug, Deserialize)]
struct StaffRow {
    vat: String,
    employee: Option<EmployeeName>,
}

impl StaffRow {
    fn name(&self) -> String {
        self.employee.as_ref().map(|e| e.name.clone()).unwrap_or_default()
    }
}

#[derive(Debug, Deserialize)]
struct DiagnosticRow {
    id: String,
}

#[derive(Debug, Deserialize)]
struct PrescriptionRow {
    id: String,
    name: String,
    lab: String,
    dosage: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantRow {
    vat_nurse: String,
}

#[derive(Debug, Deserialize)]
struct ClientDimension {
    age: Option<i64>,
    gender: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FactRow {
    date: NaiveDate,
    num_diagnostic_codes: Option<i64>,
    dim_client: Option<ClientDimension>,
}

/// `<op>.<value>` filter operand with the value percent-encoded.
fn operand(op: &str, value: impl Display) -> String {
    format!("{}.{}", op, urlencoding::encode(&value.to_string()))
}

fn key_filter(key: &AppointmentKey) -> String {
    format!(
        "vat_doctor={}&date_timestamp={}",
        operand("eq", &key.doctor),
        operand("eq", key.timestamp.format(TIMESTAMP_FORMAT))
    )
}

fn key_body(key: &AppointmentKey) -> serde_json::Map<String, Value> {
    let mut body = serde_json::Map::new();
    body.insert("vat_doctor".to_string(), json!(key.doctor));
    body.insert(
        "date_timestamp".to_string(),
        json!(key.timestamp.format(TIMESTAMP_FORMAT).to_string()),
    );
    body
}

fn is_unique_violation(err: &StoreError) -> bool {
    matches!(err, StoreError::Http { status: 409, .. })
}

/// [`RecordStore`] over the clinic's relational schema exposed through PostgREST.
/// Uniqueness is enforced by the tables' primary keys; a 409 response is the
/// database rejecting a duplicate within its own transaction.
pub struct PostgrestStore {
    client: PostgrestClient,
}

impl PostgrestStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: PostgrestClient::new(config),
        }
    }

    async fn consultation_exists(&self, key: &AppointmentKey) -> Result<bool, StoreError> {
        let path = format!("/rest/v1/consultation?{}&select=vat_doctor", key_filter(key));
        let rows: Vec<Value> = self.client.request(Method::GET, &path, None).await?;
        Ok(!rows.is_empty())
    }

    async fn require_consultation(&self, key: &AppointmentKey) -> Result<(), StoreError> {
        if self.consultation_exists(key).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound(format!("consultation {}", key)))
        }
    }
}

#[async_trait]
impl RecordStore for PostgrestStore {
    #[instrument(skip(self))]
    async fn fetch_facts(&self, filter: &FactFilter) -> Result<FactTable, StoreError> {
        let mut path = "/rest/v1/facts_consultations?select=date,num_diagnostic_codes,dim_client(age,gender)".to_string();
        if let Some(from) = filter.from {
            path.push_str(&format!("&date={}", operand("gte", from)));
        }
        if let Some(to) = filter.to {
            path.push_str(&format!("&date={}", operand("lte", to)));
        }

        let rows: Vec<FactRow> = self.client.request(Method::GET, &path, None).await?;

        let mut facts = FactTable::new(FactSchema::consultations());
        for row in rows {
            let (age, gender) = match row.dim_client {
                Some(client) => (client.age, client.gender),
                None => (None, None),
            };
            facts.push_consultation(row.date, age, gender.as_deref(), row.num_diagnostic_codes)?;
        }

        debug!("Fetched {} consultation facts", facts.len());
        Ok(facts)
    }

    async fn fetch_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentSlot>, StoreError> {
        let mut path = "/rest/v1/appointment?order=date_timestamp.asc,vat_doctor.asc".to_string();
        if let Some(doctor) = &filter.doctor {
            path.push_str(&format!("&vat_doctor={}", operand("eq", doctor)));
        }
        if let Some(client) = &filter.client {
            path.push_str(&format!("&vat_client={}", operand("eq", client)));
        }
        if let Some(timestamp) = filter.timestamp {
            path.push_str(&format!(
                "&date_timestamp={}",
                operand("eq", timestamp.format(TIMESTAMP_FORMAT))
            ));
        }

        let rows: Vec<AppointmentRow> = self.client.request(Method::GET, &path, None).await?;
        Ok(rows.into_iter().map(AppointmentSlot::from).collect())
    }

    #[instrument(skip(self, slot), fields(doctor = %slot.doctor, timestamp = %slot.timestamp))]
    async fn insert_appointment(&self, slot: AppointmentSlot) -> Result<(), StoreError> {
        let mut body = key_body(&slot.key());
        body.insert("vat_client".to_string(), json!(slot.client));
        body.insert("description".to_string(), json!(slot.description));

        match self
            .client
            .execute(Method::POST, "/rest/v1/appointment", Some(Value::Object(body)))
            .await
        {
            Err(err) if is_unique_violation(&err) => Err(StoreError::SlotConflict {
                doctor: slot.doctor,
                timestamp: slot.timestamp,
            }),
            other => other,
        }
    }

    async fn fetch_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        let rows: Vec<StaffRow> = self
            .client
            .request(Method::GET, "/rest/v1/doctor?select=vat,employee(name)", None)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| Doctor {
                name: row.name(),
                vat: DoctorId(row.vat),
            })
            .collect())
    }

    async fn fetch_nurses(&self) -> Result<Vec<Nurse>, StoreError> {
        let rows: Vec<StaffRow> = self
            .client
            .request(Method::GET, "/rest/v1/nurse?select=vat,employee(name)", None)
            .await?;
        Ok(rows
            .into_iter()
            .map(|row| Nurse {
                name: row.name(),
                vat: NurseId(row.vat),
            })
            .collect())
    }

    async fn fetch_client(&self, vat: &ClientId) -> Result<Option<Client>, StoreError> {
        let path = format!(
            "/rest/v1/client?vat={}&select=vat,name,birth_date,gender,street,city,zip",
            operand("eq", vat)
        );
        let mut rows: Vec<Client> = self.client.request(Method::GET, &path, None).await?;
        Ok(rows.pop())
    }

    async fn fetch_diagnostic_codes(&self) -> Result<Vec<DiagnosticCode>, StoreError> {
        let rows: Vec<DiagnosticRow> = self
            .client
            .request(Method::GET, "/rest/v1/diagnostic_code?select=id", None)
            .await?;
        Ok(rows.into_iter().map(|row| DiagnosticCode(row.id)).collect())
    }

    async fn fetch_medications(&self) -> Result<Vec<Medication>, StoreError> {
        self.client
            .request(Method::GET, "/rest/v1/medication?select=name,lab", None)
            .await
    }

    async fn fetch_consultation(
        &self,
        key: &AppointmentKey,
    ) -> Result<Option<ConsultationRecord>, StoreError> {
        let filter = key_filter(key);

        let soap_path = format!(
            "/rest/v1/consultation?{}&select=soap_s,soap_o,soap_a,soap_p",
            filter
        );
        let mut soap_rows: Vec<SoapNotes> = self.client.request(Method::GET, &soap_path, None).await?;
        let Some(soap) = soap_rows.pop() else {
            return Ok(None);
        };

        let diagnostics_path = format!("/rest/v1/consultation_diagnostic?{}&select=id", filter);
        let prescriptions_path = format!(
            "/rest/v1/prescription?{}&select=id,name,lab,dosage,description",
            filter
        );
        let assistant_path = format!("/rest/v1/consultation_assistant?{}&select=vat_nurse", filter);

        let (diagnostics, prescriptions, assistants) = tokio::try_join!(
            self.client.request::<Vec<DiagnosticRow>>(Method::GET, &diagnostics_path, None),
            self.client.request::<Vec<PrescriptionRow>>(Method::GET, &prescriptions_path, None),
            self.client.request::<Vec<AssistantRow>>(Method::GET, &assistant_path, None),
        )?;

        Ok(Some(ConsultationRecord {
            key: key.clone(),
            soap,
            assisting_nurse: assistants.into_iter().next().map(|row| NurseId(row.vat_nurse)),
            diagnostics: diagnostics.into_iter().map(|row| DiagnosticCode(row.id)).collect(),
            prescriptions: prescriptions
                .into_iter()
                .map(|row| Prescription {
                    id: PrescriptionId(row.id),
                    medication: Medication {
                        name: row.name,
                        lab: row.lab,
                    },
                    dosage: row.dosage.unwrap_or_default(),
                    description: row.description.unwrap_or_default(),
                })
                .collect(),
        }))
    }

    async fn create_consultation(&self, key: &AppointmentKey) -> Result<(), StoreError> {
        match self
            .client
            .execute(Method::POST, "/rest/v1/consultation", Some(Value::Object(key_body(key))))
            .await
        {
            Err(err) if is_unique_violation(&err) => Err(StoreError::ConsultationExists(key.clone())),
            other => other,
        }
    }

    async fn update_consultation_field(
        &self,
        key: &AppointmentKey,
        field: SoapField,
        value: Option<String>,
    ) -> Result<(), StoreError> {
        let path = format!("/rest/v1/consultation?{}", key_filter(key));
        let mut body = serde_json::Map::new();
        body.insert(field.column().to_string(), json!(value));

        let updated: Vec<Value> = self
            .client
            .execute_returning(Method::PATCH, &path, Some(Value::Object(body)))
            .await?;

        if updated.is_empty() {
            return Err(StoreError::NotFound(format!("consultation {}", key)));
        }
        Ok(())
    }

    async fn append_diagnostic(
        &self,
        key: &AppointmentKey,
        code: &DiagnosticCode,
    ) -> Result<bool, StoreError> {
        self.require_consultation(key).await?;

        let mut body = key_body(key);
        body.insert("id".to_string(), json!(code));

        // Needs UNIQUE (vat_doctor, date_timestamp, id): PostgREST skips the
        // duplicate row and returns an empty representation.
        match self
            .client
            .insert_ignoring_duplicates::<DiagnosticRow>(
                "/rest/v1/consultation_diagnostic?on_conflict=vat_doctor,date_timestamp,id",
                Value::Object(body),
            )
            .await
        {
            Ok(inserted) => Ok(!inserted.is_empty()),
            Err(err) if is_unique_violation(&err) => {
                warn!("Diagnostic {} attached concurrently to {}", code, key);
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    async fn insert_prescription(
        &self,
        key: &AppointmentKey,
        prescription: &Prescription,
    ) -> Result<(), StoreError> {
        self.require_consultation(key).await?;

        let mut body = key_body(key);
        body.insert("id".to_string(), json!(prescription.id));
        body.insert("name".to_string(), json!(prescription.medication.name));
        body.insert("lab".to_string(), json!(prescription.medication.lab));
        body.insert("dosage".to_string(), json!(prescription.dosage));
        body.insert("description".to_string(), json!(prescription.description));

        match self
            .client
            .execute(Method::POST, "/rest/v1/prescription", Some(Value::Object(body)))
            .await
        {
            Err(err) if is_unique_violation(&err) => Err(StoreError::DuplicatePrescription {
                key: key.clone(),
                id: prescription.id.clone(),
            }),
            other => other,
        }
    }

    async fn set_assisting_nurse(
        &self,
        key: &AppointmentKey,
        nurse: &NurseId,
    ) -> Result<(), StoreError> {
        self.require_consultation(key).await?;

        let mut body = key_body(key);
        body.insert("vat_nurse".to_string(), json!(nurse));

        self.client
            .upsert(
                "/rest/v1/consultation_assistant?on_conflict=vat_doctor,date_timestamp",
                Value::Object(body),
            )
            .await
    }
}
