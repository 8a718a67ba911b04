use std::collections::BTreeMap;
use std::collections::btree_map::Entry;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use shared_models::{
    age_at, AppointmentKey, AppointmentSlot, Client, ClientId, ConsultationRecord,
    DiagnosticCode, Doctor, FactSchema, FactTable, Medication, Nurse, NurseId, Prescription,
    SoapField,
};

use crate::error::StoreError;
use crate::filters::{AppointmentFilter, FactFilter};
use crate::store::RecordStore;

/// Initial contents of a [`MemoryStore`], loadable from JSON.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub doctors: Vec<Doctor>,
    pub nurses: Vec<Nurse>,
    pub clients: Vec<Client>,
    pub diagnostic_codes: Vec<DiagnosticCode>,
    pub medications: Vec<Medication>,
    pub appointments: Vec<AppointmentSlot>,
}

#[derive(Debug, Default)]
struct Catalog {
    doctors: Vec<Doctor>,
    nurses: Vec<Nurse>,
    clients: BTreeMap<ClientId, Client>,
    diagnostic_codes: Vec<DiagnosticCode>,
    medications: Vec<Medication>,
}

/// In-process store. Each table sits behind its own lock; every
/// compare-and-insert runs entirely under one write guard.
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: RwLock<Catalog>,
    appointments: RwLock<BTreeMap<AppointmentKey, AppointmentSlot>>,
    consultations: RwLock<BTreeMap<AppointmentKey, ConsultationRecord>>,
}

impl MemoryStore {
    pub fn new(seed: SeedData) -> Self {
        let mut appointments = BTreeMap::new();
        for slot in seed.appointments {
            if let Entry::Vacant(entry) = appointments.entry(slot.key()) {
                entry.insert(slot);
            } else {
                warn!("Skipping duplicate seeded appointment {}", slot.key());
            }
        }

        let catalog = Catalog {
            doctors: seed.doctors,
            nurses: seed.nurses,
            clients: seed.clients.into_iter().map(|c| (c.vat.clone(), c)).collect(),
            diagnostic_codes: seed.diagnostic_codes,
            medications: seed.medications,
        };

        Self {
            catalog: RwLock::new(catalog),
            appointments: RwLock::new(appointments),
            consultations: RwLock::new(BTreeMap::new()),
        }
    }

    async fn with_consultation<T>(
        &self,
        key: &AppointmentKey,
        apply: impl FnOnce(&mut ConsultationRecord) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut consultations = self.consultations.write().await;
        let record = consultations
            .get_mut(key)
            .ok_or_else(|| StoreError::NotFound(format!("consultation {}", key)))?;
        apply(record)
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn fetch_facts(&self, filter: &FactFilter) -> Result<FactTable, StoreError> {
        let catalog = self.catalog.read().await;
        let appointments = self.appointments.read().await;
        let consultations = self.consultations.read().await;

        let mut facts = FactTable::new(FactSchema::consultations());
        for (key, consultation) in consultations.iter() {
            let date = key.timestamp.date();
            if !filter.contains(date) {
                continue;
            }

            let client = appointments
                .get(key)
                .and_then(|slot| catalog.clients.get(&slot.client));
            if client.is_none() {
                warn!("Consultation {} has no resolvable client", key);
            }

            facts.push_consultation(
                date,
                client.and_then(|c| age_at(c.birth_date, key.timestamp)),
                client.map(|c| c.gender.as_str()),
                Some(consultation.diagnostics.len() as i64),
            )?;
        }

        debug!("Derived {} consultation facts", facts.len());
        Ok(facts)
    }

    async fn fetch_appointments(
        &self,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentSlot>, StoreError> {
        let appointments = self.appointments.read().await;
        let mut result: Vec<AppointmentSlot> = appointments
            .values()
            .filter(|slot| filter.matches(slot))
            .cloned()
            .collect();
        result.sort_by(|a, b| (a.timestamp, &a.doctor).cmp(&(b.timestamp, &b.doctor)));
        Ok(result)
    }

    async fn insert_appointment(&self, slot: AppointmentSlot) -> Result<(), StoreError> {
        let mut appointments = self.appointments.write().await;
        match appointments.entry(slot.key()) {
            Entry::Occupied(_) => Err(StoreError::SlotConflict {
                doctor: slot.doctor,
                timestamp: slot.timestamp,
            }),
            Entry::Vacant(entry) => {
                entry.insert(slot);
                Ok(())
            }
        }
    }

    async fn fetch_doctors(&self) -> Result<Vec<Doctor>, StoreError> {
        Ok(self.catalog.read().await.doctors.clone())
    }

    async fn fetch_nurses(&self) -> Result<Vec<Nurse>, StoreError> {
        Ok(self.catalog.read().await.nurses.clone())
    }

    async fn fetch_client(&self, vat: &ClientId) -> Result<Option<Client>, StoreError> {
        Ok(self.catalog.read().await.clients.get(vat).cloned())
    }

    async fn fetch_diagnostic_codes(&self) -> Result<Vec<DiagnosticCode>, StoreError> {
        Ok(self.catalog.read().await.diagnostic_codes.clone())
    }

    async fn fetch_medications(&self) -> Result<Vec<Medication>, StoreError> {
        Ok(self.catalog.read().await.medications.clone())
    }

    async fn fetch_consultation(
        &self,
        key: &AppointmentKey,
    ) -> Result<Option<ConsultationRecord>, StoreError> {
        Ok(self.consultations.read().await.get(key).cloned())
    }

    async fn create_consultation(&self, key: &AppointmentKey) -> Result<(), StoreError> {
        let mut consultations = self.consultations.write().await;
        match consultations.entry(key.clone()) {
            Entry::Occupied(_) => Err(StoreError::ConsultationExists(key.clone())),
            Entry::Vacant(entry) => {
                entry.insert(ConsultationRecord::new(key.clone()));
                Ok(())
            }
        }
    }

    async fn update_consultation_field(
        &self,
        key: &AppointmentKey,
        field: SoapField,
        value: Option<String>,
    ) -> Result<(), StoreError> {
        self.with_consultation(key, |record| {
            record.soap.set(field, value);
            Ok(())
        })
        .await
    }

    async fn append_diagnostic(
        &self,
        key: &AppointmentKey,
        code: &DiagnosticCode,
    ) -> Result<bool, StoreError> {
        self.with_consultation(key, |record| {
            if record.has_diagnostic(code) {
                return Ok(false);
            }
            record.diagnostics.push(code.clone());
            Ok(true)
        })
        .await
    }

    async fn insert_prescription(
        &self,
        key: &AppointmentKey,
        prescription: &Prescription,
    ) -> Result<(), StoreError> {
        self.with_consultation(key, |record| {
            if record.prescription(&prescription.id).is_some() {
                return Err(StoreError::DuplicatePrescription {
                    key: key.clone(),
                    id: prescription.id.clone(),
                });
            }
            record.prescriptions.push(prescription.clone());
            Ok(())
        })
        .await
    }

    async fn set_assisting_nurse(
        &self,
        key: &AppointmentKey,
        nurse: &NurseId,
    ) -> Result<(), StoreError> {
        self.with_consultation(key, |record| {
            record.assisting_nurse = Some(nurse.clone());
            Ok(())
        })
        .await
    }
}
