use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};

use shared_database::{MemoryStore, SeedData, StoreHandle};
use shared_models::{
    AppointmentKey, AppointmentSlot, Client, ClientId, DiagnosticCode, Doctor, DoctorId,
    Medication, Nurse, NurseId,
};

use crate::timestamp::parse_timestamp;

/// Parses a fixture timestamp, panicking on malformed input.
pub fn ts(value: &str) -> NaiveDateTime {
    parse_timestamp(value).expect("fixture timestamp must be valid")
}

pub fn key(doctor: &str, at: &str) -> AppointmentKey {
    AppointmentKey::new(doctor, ts(at))
}

pub fn slot(doctor: &str, at: &str, client: &str) -> AppointmentSlot {
    AppointmentSlot {
        doctor: DoctorId::from(doctor),
        timestamp: ts(at),
        client: ClientId::from(client),
        description: "routine check-up".to_string(),
    }
}

pub struct TestClinic;

impl TestClinic {
    pub fn doctors() -> Vec<Doctor> {
        vec![
            Doctor { vat: DoctorId::from("D1"), name: "Dr. Ana Reis".to_string() },
            Doctor { vat: DoctorId::from("D2"), name: "Dr. Bruno Lima".to_string() },
            Doctor { vat: DoctorId::from("D3"), name: "Dr. Carla Matos".to_string() },
        ]
    }

    pub fn nurses() -> Vec<Nurse> {
        vec![
            Nurse { vat: NurseId::from("N1"), name: "Duarte Silva".to_string() },
            Nurse { vat: NurseId::from("N2"), name: "Eva Sousa".to_string() },
        ]
    }

    pub fn clients() -> Vec<Client> {
        vec![
            Self::client("C1", "Filipa Nunes", (1984, 5, 20), "F"),
            Self::client("C2", "Gil Pacheco", (1990, 11, 2), "M"),
            Self::client("C3", "Helena Rocha", (1984, 1, 10), "F"),
        ]
    }

    pub fn diagnostic_codes() -> Vec<DiagnosticCode> {
        ["J06", "R51", "I10"].into_iter().map(DiagnosticCode::from).collect()
    }

    pub fn medications() -> Vec<Medication> {
        vec![
            Medication { name: "Paracetamol".to_string(), lab: "Generis".to_string() },
            Medication { name: "Amoxicillin".to_string(), lab: "Bluepharma".to_string() },
        ]
    }

    /// Catalog plus no appointments.
    pub fn seed() -> SeedData {
        SeedData {
            doctors: Self::doctors(),
            nurses: Self::nurses(),
            clients: Self::clients(),
            diagnostic_codes: Self::diagnostic_codes(),
            medications: Self::medications(),
            appointments: Vec::new(),
        }
    }

    pub fn seed_with(appointments: Vec<AppointmentSlot>) -> SeedData {
        SeedData {
            appointments,
            ..Self::seed()
        }
    }

    pub fn store() -> StoreHandle {
        Self::store_with(Vec::new())
    }

    pub fn store_with(appointments: Vec<AppointmentSlot>) -> StoreHandle {
        Arc::new(MemoryStore::new(Self::seed_with(appointments)))
    }

    fn client(vat: &str, name: &str, birth: (i32, u32, u32), gender: &str) -> Client {
        Client {
            vat: ClientId::from(vat),
            name: name.to_string(),
            birth_date: NaiveDate::from_ymd_opt(birth.0, birth.1, birth.2)
                .expect("fixture birth date must be valid"),
            gender: gender.to_string(),
            street: Some("Rua Direita 1".to_string()),
            city: Some("Lisboa".to_string()),
            zip: Some("1100-001".to_string()),
        }
    }
}
