// libs/appointment-cell/src/services/availability.rs
use std::collections::HashSet;

use chrono::NaiveDateTime;
use tracing::{debug, instrument};

use shared_database::{AppointmentFilter, StoreHandle};
use shared_models::{AppointmentSlot, Doctor, DoctorId};
use shared_utils::combine_date_time;

use crate::models::SchedulingError;

/// Candidates with no appointment at exactly `at`.
///
/// Builds the busy set from `appointments` once, so the cost is linear in
/// candidates plus appointments. Appointments at other timestamps are ignored.
pub fn available_doctors(
    at: NaiveDateTime,
    candidates: &HashSet<DoctorId>,
    appointments: &[AppointmentSlot],
) -> HashSet<DoctorId> {
    let busy: HashSet<&DoctorId> = appointments
        .iter()
        .filter(|slot| slot.timestamp == at)
        .map(|slot| &slot.doctor)
        .collect();

    candidates
        .iter()
        .filter(|doctor| !busy.contains(doctor))
        .cloned()
        .collect()
}

pub struct AvailabilityService {
    store: StoreHandle,
}

impl AvailabilityService {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Doctors free at the slot given by a scheduling form, ordered by name.
    pub async fn search_doctors(
        &self,
        date: &str,
        time: &str,
    ) -> Result<Vec<Doctor>, SchedulingError> {
        let at = combine_date_time(date, time)?;
        self.doctors_available_at(at).await
    }

    #[instrument(skip(self))]
    pub async fn doctors_available_at(
        &self,
        at: NaiveDateTime,
    ) -> Result<Vec<Doctor>, SchedulingError> {
        let doctors = self.store.fetch_doctors().await?;
        let booked = self.store.fetch_appointments(&AppointmentFilter::at(at)).await?;

        let candidates: HashSet<DoctorId> = doctors.iter().map(|d| d.vat.clone()).collect();
        let free = available_doctors(at, &candidates, &booked);

        let mut available: Vec<Doctor> = doctors
            .into_iter()
            .filter(|d| free.contains(&d.vat))
            .collect();
        available.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.vat.cmp(&b.vat)));

        debug!("{} of {} doctors free at {}", available.len(), candidates.len(), at);
        Ok(available)
    }

    /// Whether `doctor` has no appointment at `at`. Unknown doctors are never free.
    pub async fn is_available(
        &self,
        doctor: &DoctorId,
        at: NaiveDateTime,
    ) -> Result<bool, SchedulingError> {
        let booked = self
            .store
            .fetch_appointments(&AppointmentFilter {
                doctor: Some(doctor.clone()),
                timestamp: Some(at),
                ..AppointmentFilter::default()
            })
            .await?;

        let candidates = HashSet::from([doctor.clone()]);
        Ok(available_doctors(at, &candidates, &booked).contains(doctor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::test_utils::{slot, ts};

    fn doctors(ids: &[&str]) -> HashSet<DoctorId> {
        ids.iter().map(|id| DoctorId::from(*id)).collect()
    }

    #[test]
    fn booked_doctor_is_excluded_only_at_that_timestamp() {
        let booked = vec![slot("doctorA", "2024-03-01 09:00", "C1")];
        let candidates = doctors(&["doctorA", "doctorB"]);

        assert_eq!(
            available_doctors(ts("2024-03-01 09:00"), &candidates, &booked),
            doctors(&["doctorB"])
        );
        assert_eq!(
            available_doctors(ts("2024-03-01 09:30"), &candidates, &booked),
            candidates
        );
    }

    #[test]
    fn resolver_is_idempotent() {
        let booked = vec![
            slot("doctorA", "2024-03-01 09:00", "C1"),
            slot("doctorC", "2024-03-01 09:00", "C2"),
        ];
        let candidates = doctors(&["doctorA", "doctorB", "doctorC"]);
        let at = ts("2024-03-01 09:00");

        let first = available_doctors(at, &candidates, &booked);
        let second = available_doctors(at, &first, &booked);
        assert_eq!(first, second);
        assert!(first.is_subset(&candidates));
    }

    #[test]
    fn empty_inputs() {
        let at = ts("2024-03-01 09:00");
        assert!(available_doctors(at, &HashSet::new(), &[]).is_empty());
        let candidates = doctors(&["doctorA"]);
        assert_eq!(available_doctors(at, &candidates, &[]), candidates);
    }
}
