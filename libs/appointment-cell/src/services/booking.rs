// libs/appointment-cell/src/services/booking.rs
use futures::future::try_join_all;
use tracing::{debug, info, instrument, warn};

use shared_database::{AppointmentFilter, StoreError, StoreHandle};
use shared_models::{AppointmentSlot, ClientId};
use shared_utils::combine_date_time;

use crate::models::{BookAppointmentRequest, ClientAppointment, SchedulingError};
use crate::services::availability::AvailabilityService;

pub struct BookingService {
    store: StoreHandle,
    availability: AvailabilityService,
}

impl BookingService {
    pub fn new(store: StoreHandle) -> Self {
        Self {
            availability: AvailabilityService::new(store.clone()),
            store,
        }
    }

    /// Books a slot from scheduling form input.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<AppointmentSlot, SchedulingError> {
        let timestamp = combine_date_time(&request.date, &request.time)?;
        self.commit_appointment(AppointmentSlot {
            doctor: request.doctor,
            timestamp,
            client: request.client,
            description: request.description.unwrap_or_default(),
        })
        .await
    }

    /// Inserts `slot` if its doctor is free at its timestamp.
    ///
    /// The availability pre-check only short-circuits obvious conflicts; the
    /// store insert is the atomic compare-and-insert that decides races.
    #[instrument(skip(self, slot), fields(doctor = %slot.doctor, timestamp = %slot.timestamp))]
    pub async fn commit_appointment(
        &self,
        slot: AppointmentSlot,
    ) -> Result<AppointmentSlot, SchedulingError> {
        let doctors = self.store.fetch_doctors().await?;
        if !doctors.iter().any(|d| d.vat == slot.doctor) {
            return Err(SchedulingError::UnknownDoctor(slot.doctor));
        }
        if self.store.fetch_client(&slot.client).await?.is_none() {
            return Err(SchedulingError::UnknownClient(slot.client));
        }

        if !self.availability.is_available(&slot.doctor, slot.timestamp).await? {
            warn!("Slot already taken for doctor {} at {}", slot.doctor, slot.timestamp);
            return Err(SchedulingError::SlotConflict {
                doctor: slot.doctor,
                timestamp: slot.timestamp,
            });
        }

        match self.store.insert_appointment(slot.clone()).await {
            Ok(()) => {
                info!("Booked appointment {} for client {}", slot.key(), slot.client);
                Ok(slot)
            }
            Err(StoreError::SlotConflict { doctor, timestamp }) => {
                warn!("Lost booking race for doctor {} at {}", doctor, timestamp);
                Err(SchedulingError::SlotConflict { doctor, timestamp })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// A client's appointments by timestamp, each flagged with whether it has a consultation.
    #[instrument(skip(self))]
    pub async fn client_appointments(
        &self,
        client: &ClientId,
    ) -> Result<Vec<ClientAppointment>, SchedulingError> {
        if self.store.fetch_client(client).await?.is_none() {
            return Err(SchedulingError::UnknownClient(client.clone()));
        }

        let slots = self
            .store
            .fetch_appointments(&AppointmentFilter::for_client(client.clone()))
            .await?;
        debug!("Client {} has {} appointments", client, slots.len());

        let consultations = try_join_all(slots.iter().map(|slot| {
            let key = slot.key();
            let store = self.store.clone();
            async move { store.fetch_consultation(&key).await }
        }))
        .await?;

        Ok(slots
            .into_iter()
            .zip(consultations)
            .map(|(slot, consultation)| ClientAppointment {
                slot,
                has_consultation: consultation.is_some(),
            })
            .collect())
    }
}
