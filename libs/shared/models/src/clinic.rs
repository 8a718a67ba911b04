// libs/shared/models/src/clinic.rs
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==============================================================================
// IDENTIFIERS
// ==============================================================================

macro_rules! vat_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

vat_identifier!(
    /// VAT number of a doctor (an employee with a doctor role).
    DoctorId
);
vat_identifier!(
    /// VAT number of a client.
    ClientId
);
vat_identifier!(
    /// VAT number of a nurse.
    NurseId
);
vat_identifier!(DiagnosticCode);
vat_identifier!(
    /// Caller-supplied prescription identifier, unique within one consultation.
    PrescriptionId
);

// ==============================================================================
// REFERENCE DATA
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub vat: DoctorId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nurse {
    pub vat: NurseId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub vat: ClientId,
    pub name: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub zip: Option<String>,
}

/// A medication is identified by its name together with the producing lab.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Medication {
    pub name: String,
    pub lab: String,
}

// ==============================================================================
// APPOINTMENTS
// ==============================================================================

/// Identity of an appointment and of the consultation it may own.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AppointmentKey {
    pub doctor: DoctorId,
    pub timestamp: NaiveDateTime,
}

impl AppointmentKey {
    pub fn new(doctor: impl Into<DoctorId>, timestamp: NaiveDateTime) -> Self {
        Self {
            doctor: doctor.into(),
            timestamp,
        }
    }
}

impl fmt::Display for AppointmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.doctor, self.timestamp.format("%Y-%m-%d %H:%M:%S"))
    }
}

/// A booked, fixed-duration slot. There is no end time: two appointments
/// clash only when they share doctor and start timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentSlot {
    pub doctor: DoctorId,
    pub timestamp: NaiveDateTime,
    pub client: ClientId,
    #[serde(default)]
    pub description: String,
}

impl AppointmentSlot {
    pub fn key(&self) -> AppointmentKey {
        AppointmentKey {
            doctor: self.doctor.clone(),
            timestamp: self.timestamp,
        }
    }
}

// ==============================================================================
// CONSULTATIONS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoapField {
    #[serde(rename = "soap_s")]
    Subjective,
    #[serde(rename = "soap_o")]
    Objective,
    #[serde(rename = "soap_a")]
    Assessment,
    #[serde(rename = "soap_p")]
    Plan,
}

impl SoapField {
    pub const ALL: [SoapField; 4] = [
        SoapField::Subjective,
        SoapField::Objective,
        SoapField::Assessment,
        SoapField::Plan,
    ];

    /// Column name used by the record store.
    pub fn column(&self) -> &'static str {
        match self {
            SoapField::Subjective => "soap_s",
            SoapField::Objective => "soap_o",
            SoapField::Assessment => "soap_a",
            SoapField::Plan => "soap_p",
        }
    }
}

impl fmt::Display for SoapField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for SoapField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "s" | "soap_s" | "soaps" | "subjective" => Ok(SoapField::Subjective),
            "o" | "soap_o" | "soapo" | "objective" => Ok(SoapField::Objective),
            "a" | "soap_a" | "soapa" | "assessment" => Ok(SoapField::Assessment),
            "p" | "soap_p" | "soapp" | "plan" => Ok(SoapField::Plan),
            _ => Err(format!("Unknown SOAP field: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoapNotes {
    pub soap_s: Option<String>,
    pub soap_o: Option<String>,
    pub soap_a: Option<String>,
    pub soap_p: Option<String>,
}

impl SoapNotes {
    pub fn get(&self, field: SoapField) -> Option<&str> {
        match field {
            SoapField::Subjective => self.soap_s.as_deref(),
            SoapField::Objective => self.soap_o.as_deref(),
            SoapField::Assessment => self.soap_a.as_deref(),
            SoapField::Plan => self.soap_p.as_deref(),
        }
    }

    /// Sets one field and leaves the other three untouched.
    pub fn set(&mut self, field: SoapField, value: Option<String>) {
        let slot = match field {
            SoapField::Subjective => &mut self.soap_s,
            SoapField::Objective => &mut self.soap_o,
            SoapField::Assessment => &mut self.soap_a,
            SoapField::Plan => &mut self.soap_p,
        };
        *slot = value;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prescription {
    pub id: PrescriptionId,
    pub medication: Medication,
    pub dosage: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsultationRecord {
    pub key: AppointmentKey,
    #[serde(flatten)]
    pub soap: SoapNotes,
    pub assisting_nurse: Option<NurseId>,
    pub diagnostics: Vec<DiagnosticCode>,
    pub prescriptions: Vec<Prescription>,
}

impl ConsultationRecord {
    pub fn new(key: AppointmentKey) -> Self {
        Self {
            key,
            soap: SoapNotes::default(),
            assisting_nurse: None,
            diagnostics: Vec::new(),
            prescriptions: Vec::new(),
        }
    }

    pub fn has_diagnostic(&self, code: &DiagnosticCode) -> bool {
        self.diagnostics.iter().any(|existing| existing == code)
    }

    pub fn prescription(&self, id: &PrescriptionId) -> Option<&Prescription> {
        self.prescriptions.iter().find(|p| &p.id == id)
    }
}
