use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveDateTime};

use shared_database::{AppointmentFilter, FactFilter, MemoryStore, RecordStore, SeedData, StoreError};
use shared_models::{
    AppointmentKey, AppointmentSlot, Client, ClientId, DiagnosticCode, DimensionValue, Doctor,
    DoctorId, Medication, NurseId, Prescription, PrescriptionId, SoapField,
};

fn ts(value: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M").unwrap()
}

fn slot(doctor: &str, at: &str, client: &str) -> AppointmentSlot {
    AppointmentSlot {
        doctor: DoctorId::from(doctor),
        timestamp: ts(at),
        client: ClientId::from(client),
        description: String::new(),
    }
}

fn seed() -> SeedData {
    SeedData {
        doctors: vec![Doctor {
            vat: DoctorId::from("D1"),
            name: "Dr. Ana Reis".to_string(),
        }],
        clients: vec![Client {
            vat: ClientId::from("C1"),
            name: "Rui Costa".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1984, 5, 20).unwrap(),
            gender: "M".to_string(),
            street: None,
            city: None,
            zip: None,
        }],
        appointments: vec![slot("D1", "2024-03-01 09:00", "C1")],
        ..SeedData::default()
    }
}

#[tokio::test]
async fn test_insert_appointment_rejects_taken_slot() {
    let store = MemoryStore::new(seed());

    let result = store.insert_appointment(slot("D1", "2024-03-01 09:00", "C2")).await;
    assert_matches!(result, Err(StoreError::SlotConflict { doctor, .. }) if doctor == DoctorId::from("D1"));

    store.insert_appointment(slot("D1", "2024-03-01 10:00", "C2")).await.unwrap();
    let booked = store.fetch_appointments(&AppointmentFilter::default()).await.unwrap();
    assert_eq!(booked.len(), 2);
    assert_eq!(booked[0].timestamp, ts("2024-03-01 09:00"));
    assert_eq!(booked[0].client, ClientId::from("C1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_inserts_book_slot_once() {
    let store = Arc::new(MemoryStore::new(SeedData::default()));

    let attempts = (0..16).map(|i| {
        let store = store.clone();
        tokio::spawn(async move {
            store
                .insert_appointment(slot("D1", "2024-03-01 11:00", &format!("C{}", i)))
                .await
        })
    });

    let results = futures::future::join_all(attempts).await;
    let successes = results.iter().filter(|r| matches!(r, Ok(Ok(())))).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Ok(Err(StoreError::SlotConflict { .. }))))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(conflicts, 15);
}

#[tokio::test]
async fn test_consultation_lifecycle() {
    let store = MemoryStore::new(seed());
    let key = AppointmentKey::new("D1", ts("2024-03-01 09:00"));

    assert!(store.fetch_consultation(&key).await.unwrap().is_none());
    assert_matches!(
        store.update_consultation_field(&key, SoapField::Plan, Some("rest".into())).await,
        Err(StoreError::NotFound(_))
    );

    store.create_consultation(&key).await.unwrap();
    assert_matches!(
        store.create_consultation(&key).await,
        Err(StoreError::ConsultationExists(existing)) if existing == key
    );

    store
        .update_consultation_field(&key, SoapField::Subjective, Some("headache".into()))
        .await
        .unwrap();
    assert!(store.append_diagnostic(&key, &DiagnosticCode::from("R51")).await.unwrap());
    assert!(!store.append_diagnostic(&key, &DiagnosticCode::from("R51")).await.unwrap());
    store.set_assisting_nurse(&key, &NurseId::from("N1")).await.unwrap();
    store.set_assisting_nurse(&key, &NurseId::from("N2")).await.unwrap();

    let prescription = Prescription {
        id: PrescriptionId::from("P1"),
        medication: Medication {
            name: "Paracetamol".to_string(),
            lab: "Generis".to_string(),
        },
        dosage: "500mg".to_string(),
        description: "every 8 hours".to_string(),
    };
    store.insert_prescription(&key, &prescription).await.unwrap();
    assert_matches!(
        store.insert_prescription(&key, &prescription).await,
        Err(StoreError::DuplicatePrescription { .. })
    );

    let record = store.fetch_consultation(&key).await.unwrap().unwrap();
    assert_eq!(record.soap.soap_s.as_deref(), Some("headache"));
    assert_eq!(record.soap.soap_p, None);
    assert_eq!(record.diagnostics, vec![DiagnosticCode::from("R51")]);
    assert_eq!(record.assisting_nurse, Some(NurseId::from("N2")));
    assert_eq!(record.prescriptions, vec![prescription]);
}

#[tokio::test]
async fn test_fetch_facts_derives_one_row_per_consultation() {
    let store = MemoryStore::new(seed());
    let key = AppointmentKey::new("D1", ts("2024-03-01 09:00"));
    store.create_consultation(&key).await.unwrap();
    store.append_diagnostic(&key, &DiagnosticCode::from("R51")).await.unwrap();
    store.append_diagnostic(&key, &DiagnosticCode::from("J06")).await.unwrap();

    let facts = store.fetch_facts(&FactFilter::default()).await.unwrap();
    assert_eq!(facts.len(), 1);

    let record = &facts.records()[0];
    assert_eq!(
        record.dimensions(),
        &[
            DimensionValue::Int(2024),
            DimensionValue::Int(3),
            DimensionValue::Int(1),
            DimensionValue::Int(39),
            DimensionValue::from("M"),
        ]
    );
    assert_eq!(record.measure(0), Some(2));

    let outside = FactFilter {
        from: NaiveDate::from_ymd_opt(2024, 4, 1),
        to: None,
    };
    assert!(store.fetch_facts(&outside).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_connect_builds_memory_store_from_seed() {
    let config = shared_config::AppConfig::in_memory();
    let store = shared_database::connect(&config, seed());

    let doctors = store.fetch_doctors().await.unwrap();
    assert_eq!(doctors.len(), 1);
    assert!(store.fetch_client(&ClientId::from("C1")).await.unwrap().is_some());
    assert!(store.fetch_client(&ClientId::from("C9")).await.unwrap().is_none());
}
