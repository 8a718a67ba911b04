use std::collections::HashSet;

use assert_matches::assert_matches;

use appointment_cell::models::*;
use appointment_cell::services::{AvailabilityService, BookingService};
use shared_database::{AppointmentFilter, RecordStore};
use shared_models::{AppointmentSlot, ClientId, DoctorId};
use shared_utils::test_utils::{key, slot, ts, TestClinic};

fn request(doctor: &str, client: &str, date: &str, time: &str) -> BookAppointmentRequest {
    BookAppointmentRequest {
        doctor: DoctorId::from(doctor),
        client: ClientId::from(client),
        date: date.to_string(),
        time: time.to_string(),
        description: Some("follow-up".to_string()),
    }
}

#[tokio::test]
async fn test_search_doctors_excludes_booked_doctor() {
    let store = TestClinic::store_with(vec![slot("D2", "2024-03-01 09:00", "C1")]);
    let service = AvailabilityService::new(store);

    let free = service.search_doctors("2024-03-01", "09:00").await.unwrap();
    let names: Vec<_> = free.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["Dr. Ana Reis", "Dr. Carla Matos"]);

    let later = service.search_doctors("2024-03-01", "09:30").await.unwrap();
    assert_eq!(later.len(), 3);
}

#[tokio::test]
async fn test_search_doctors_rejects_malformed_time() {
    let service = AvailabilityService::new(TestClinic::store());

    assert_matches!(
        service.search_doctors("2024-03-01", "quarter past nine").await,
        Err(SchedulingError::InvalidTimestamp(_))
    );
}

#[tokio::test]
async fn test_book_appointment_then_retry_keeps_failing() {
    let store = TestClinic::store();
    let service = BookingService::new(store.clone());

    let booked = service
        .book_appointment(request("D1", "C1", "2024-03-01", "09:00"))
        .await
        .unwrap();
    assert_eq!(booked.key(), key("D1", "2024-03-01 09:00"));
    assert_eq!(booked.description, "follow-up");

    for _ in 0..2 {
        assert_matches!(
            service
                .book_appointment(request("D1", "C2", "2024-03-01", "09:00"))
                .await,
            Err(SchedulingError::SlotConflict { doctor, .. }) if doctor == DoctorId::from("D1")
        );
    }

    let all = store.fetch_appointments(&AppointmentFilter::default()).await.unwrap();
    assert_eq!(all, vec![booked]);

    let free = AvailabilityService::new(store)
        .doctors_available_at(ts("2024-03-01 09:00"))
        .await
        .unwrap();
    assert!(free.iter().all(|d| d.vat != DoctorId::from("D1")));
}

#[tokio::test]
async fn test_book_appointment_validates_references() {
    let service = BookingService::new(TestClinic::store());

    assert_matches!(
        service.book_appointment(request("D9", "C1", "2024-03-01", "09:00")).await,
        Err(SchedulingError::UnknownDoctor(d)) if d == DoctorId::from("D9")
    );
    assert_matches!(
        service.book_appointment(request("D1", "C9", "2024-03-01", "09:00")).await,
        Err(SchedulingError::UnknownClient(c)) if c == ClientId::from("C9")
    );
    assert_matches!(
        service.book_appointment(request("D1", "C1", "03/01/2024", "09:00")).await,
        Err(SchedulingError::InvalidTimestamp(_))
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_commits_book_exactly_once() {
    let store = TestClinic::store();

    let attempts = ["C1", "C2", "C3", "C1", "C2", "C3", "C1", "C2"]
        .into_iter()
        .map(|client| {
            let service = BookingService::new(store.clone());
            tokio::spawn(async move {
                service
                    .commit_appointment(slot("D3", "2024-03-04 14:00", client))
                    .await
            })
        });

    let results = futures::future::join_all(attempts).await;
    let successes: Vec<AppointmentSlot> = results
        .into_iter()
        .map(|joined| joined.unwrap())
        .filter_map(|result| match result {
            Ok(slot) => Some(slot),
            Err(SchedulingError::SlotConflict { .. }) => None,
            Err(e) => panic!("unexpected error: {}", e),
        })
        .collect();

    assert_eq!(successes.len(), 1);
    let stored = store
        .fetch_appointments(&AppointmentFilter::at(ts("2024-03-04 14:00")))
        .await
        .unwrap();
    assert_eq!(stored, successes);
}

#[tokio::test]
async fn test_client_appointments_flag_consultations() {
    let store = TestClinic::store_with(vec![
        slot("D2", "2024-03-02 10:00", "C1"),
        slot("D1", "2024-03-01 09:00", "C1"),
        slot("D1", "2024-03-01 10:00", "C2"),
    ]);
    store.create_consultation(&key("D1", "2024-03-01 09:00")).await.unwrap();
    let service = BookingService::new(store);

    let history = service.client_appointments(&ClientId::from("C1")).await.unwrap();
    let summary: Vec<_> = history
        .iter()
        .map(|a| (a.slot.key(), a.has_consultation))
        .collect();
    assert_eq!(
        summary,
        vec![
            (key("D1", "2024-03-01 09:00"), true),
            (key("D2", "2024-03-02 10:00"), false),
        ]
    );

    assert!(service
        .client_appointments(&ClientId::from("C3"))
        .await
        .unwrap()
        .is_empty());
    assert_matches!(
        service.client_appointments(&ClientId::from("C9")).await,
        Err(SchedulingError::UnknownClient(_))
    );
}

#[tokio::test]
async fn test_is_available_for_single_doctor() {
    let store = TestClinic::store_with(vec![slot("D1", "2024-03-01 09:00", "C1")]);
    let service = AvailabilityService::new(store);
    let at = ts("2024-03-01 09:00");

    assert!(!service.is_available(&DoctorId::from("D1"), at).await.unwrap());
    assert!(service.is_available(&DoctorId::from("D2"), at).await.unwrap());

    let free: HashSet<_> = service
        .doctors_available_at(at)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d.vat)
        .collect();
    assert_eq!(free, HashSet::from([DoctorId::from("D2"), DoctorId::from("D3")]));
}
