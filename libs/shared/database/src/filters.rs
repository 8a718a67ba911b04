use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use shared_models::{AppointmentSlot, ClientId, DoctorId};

/// Equality predicates on appointment key fields. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub doctor: Option<DoctorId>,
    pub client: Option<ClientId>,
    pub timestamp: Option<NaiveDateTime>,
}

impl AppointmentFilter {
    pub fn at(timestamp: NaiveDateTime) -> Self {
        Self {
            timestamp: Some(timestamp),
            ..Self::default()
        }
    }

    pub fn for_client(client: ClientId) -> Self {
        Self {
            client: Some(client),
            ..Self::default()
        }
    }

    pub fn matches(&self, slot: &AppointmentSlot) -> bool {
        self.doctor.as_ref().map_or(true, |d| d == &slot.doctor)
            && self.client.as_ref().map_or(true, |c| c == &slot.client)
            && self.timestamp.map_or(true, |t| t == slot.timestamp)
    }
}

/// Inclusive consultation-date range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FactFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl FactFilter {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |from| date >= from) && self.to.map_or(true, |to| date <= to)
    }
}
