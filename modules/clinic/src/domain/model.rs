//! Domain records and value types.
//!
//! These are the shapes services hand out. They mirror the storage rows but
//! carry parsed status enums instead of raw strings; the mapping lives in
//! `infra::storage::map`.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Default page size when the caller does not ask for one.
pub const DEFAULT_PAGE_SIZE: u64 = 25;
/// Upper bound on page size; larger requests are clamped, not rejected.
pub const MAX_PAGE_SIZE: u64 = 100;

/// Limit/offset pagination request.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageRequest {
    pub limit: u64,
    pub offset: u64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl PageRequest {
    /// Effective `(limit, offset)` with the limit clamped to
    /// `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn clamped(self) -> (u64, u64) {
        let limit = self.limit.clamp(1, MAX_PAGE_SIZE);
        (limit, self.offset)
    }
}

/// One page of results plus the total row count for the same filter.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

/// Staff role inside an organisation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Doctor,
    Reception,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Doctor => "doctor",
            Self::Reception => "reception",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Self::Admin),
            "doctor" => Some(Self::Doctor),
            "reception" => Some(Self::Reception),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of an appointment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Booked,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Booked => "booked",
            Self::Confirmed => "confirmed",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::NoShow => "no_show",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "booked" => Some(Self::Booked),
            "confirmed" => Some(Self::Confirmed),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            "no_show" => Some(Self::NoShow),
            _ => None,
        }
    }

    /// Whether this status may move to `next`.
    ///
    /// Completed, cancelled and no-show are terminal.
    #[must_use]
    pub fn can_transition(self, next: Self) -> bool {
        matches!(
            (self, next),
            (
                Self::Booked,
                Self::Confirmed | Self::InProgress | Self::Cancelled | Self::NoShow
            ) | (
                Self::Confirmed,
                Self::InProgress | Self::Cancelled | Self::NoShow
            ) | (Self::InProgress, Self::Completed)
        )
    }

    /// Statuses that still occupy the doctor's calendar slot.
    pub const SLOT_BLOCKING: [Self; 3] = [Self::Booked, Self::Confirmed, Self::InProgress];

    /// Whether an appointment in this status still occupies its slot.
    #[must_use]
    pub fn blocks_slot(self) -> bool {
        Self::SLOT_BLOCKING.contains(&self)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a laboratory order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabOrderStatus {
    Ordered,
    Completed,
    Cancelled,
}

impl LabOrderStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ordered" => Some(Self::Ordered),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for LabOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle of a radiology order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RadiologyOrderStatus {
    Ordered,
    Reported,
    Cancelled,
}

impl RadiologyOrderStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ordered => "ordered",
            Self::Reported => "reported",
            Self::Cancelled => "cancelled",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ordered" => Some(Self::Ordered),
            "reported" => Some(Self::Reported),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

impl fmt::Display for RadiologyOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Settlement state of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Issued,
    PartiallyPaid,
    Paid,
    Void,
}

impl InvoiceStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
            Self::Void => "void",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "issued" => Some(Self::Issued),
            "partially_paid" => Some(Self::PartiallyPaid),
            "paid" => Some(Self::Paid),
            "void" => Some(Self::Void),
            _ => None,
        }
    }

    /// Whether money is still owed on an invoice in this state.
    #[must_use]
    pub fn is_outstanding(self) -> bool {
        matches!(self, Self::Issued | Self::PartiallyPaid)
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a payment was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    Transfer,
    Insurance,
}

impl PaymentMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Card => "card",
            Self::Transfer => "transfer",
            Self::Insurance => "insurance",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "cash" => Some(Self::Cash),
            "card" => Some(Self::Card),
            "transfer" => Some(Self::Transfer),
            "insurance" => Some(Self::Insurance),
            _ => None,
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Organisation {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Member {
    pub id: i64,
    pub org_id: i64,
    pub user_id: i64,
    pub display_name: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Patient {
    pub id: i64,
    pub org_id: i64,
    /// Medical record number, unique within the organisation.
    pub mrn: String,
    pub given_name: String,
    pub family_name: String,
    pub date_of_birth: NaiveDate,
    pub sex: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Doctor {
    pub id: i64,
    pub org_id: i64,
    pub given_name: String,
    pub family_name: String,
    pub specialty: String,
    pub consultation_fee: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Appointment {
    pub id: i64,
    pub org_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub scheduled_start: DateTime<Utc>,
    pub scheduled_end: DateTime<Utc>,
    pub reason: Option<String>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Visit {
    pub id: i64,
    pub org_id: i64,
    pub appointment_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub blood_pressure: Option<String>,
    pub pulse_bpm: Option<i32>,
    pub temperature_c: Option<Decimal>,
    pub diagnosis: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Prescription {
    pub id: i64,
    pub org_id: i64,
    pub visit_id: i64,
    pub patient_id: i64,
    pub medication: String,
    pub dosage: String,
    pub frequency: String,
    pub duration_days: i32,
    pub instructions: Option<String>,
    pub issued_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabOrder {
    pub id: i64,
    pub org_id: i64,
    pub patient_id: i64,
    /// Doctor who placed the order.
    pub ordered_by: i64,
    pub test_name: String,
    pub status: LabOrderStatus,
    pub ordered_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabResult {
    pub id: i64,
    pub org_id: i64,
    pub order_id: i64,
    pub patient_id: i64,
    /// Panel the measurement belongs to, e.g. "haematology".
    pub category: String,
    pub name: String,
    pub value: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub flagged: bool,
    pub recorded_at: DateTime<Utc>,
}

/// Lab results for one patient, grouped by panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LabResultGroup {
    pub category: String,
    pub results: Vec<LabResult>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RadiologyOrder {
    pub id: i64,
    pub org_id: i64,
    pub patient_id: i64,
    pub ordered_by: i64,
    /// Imaging modality, e.g. "x-ray", "mri".
    pub modality: String,
    pub body_site: String,
    pub status: RadiologyOrderStatus,
    pub report: Option<String>,
    pub ordered_at: DateTime<Utc>,
    pub reported_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Invoice {
    pub id: i64,
    pub org_id: i64,
    pub patient_id: i64,
    pub visit_id: Option<i64>,
    pub total: Decimal,
    pub status: InvoiceStatus,
    pub issued_on: NaiveDate,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Payment {
    pub id: i64,
    pub org_id: i64,
    pub invoice_id: i64,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub reference: Option<String>,
    pub received_at: DateTime<Utc>,
}

/// An invoice together with its payments and derived balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceStatement {
    pub invoice: Invoice,
    pub payments: Vec<Payment>,
    pub paid: Decimal,
    pub due: Decimal,
}

/// Per-organisation practice settings.
///
/// Identified by the organisation alone; `updated_at` is `None` when the
/// organisation has never written settings and the defaults apply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrgSettings {
    pub org_id: i64,
    pub clinic_name: Option<String>,
    /// ISO 4217 currency code.
    pub currency: String,
    /// IANA timezone name.
    pub timezone: String,
    pub default_appointment_minutes: i32,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub id: i64,
    pub org_id: i64,
    pub recipient_id: i64,
    pub message: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    #[must_use]
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn statuses_round_trip_through_strings() {
        for status in [
            AppointmentStatus::Booked,
            AppointmentStatus::Confirmed,
            AppointmentStatus::InProgress,
            AppointmentStatus::Completed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::NoShow,
        ] {
            assert_eq!(AppointmentStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(AppointmentStatus::parse("unknown"), None);

        for status in [
            InvoiceStatus::Issued,
            InvoiceStatus::PartiallyPaid,
            InvoiceStatus::Paid,
            InvoiceStatus::Void,
        ] {
            assert_eq!(InvoiceStatus::parse(status.as_str()), Some(status));
        }

        for role in [Role::Admin, Role::Doctor, Role::Reception] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
    }

    #[test]
    fn appointment_transitions_follow_the_lifecycle() {
        use AppointmentStatus as S;

        assert!(S::Booked.can_transition(S::Confirmed));
        assert!(S::Booked.can_transition(S::InProgress));
        assert!(S::Confirmed.can_transition(S::InProgress));
        assert!(S::InProgress.can_transition(S::Completed));

        assert!(!S::Completed.can_transition(S::Cancelled));
        assert!(!S::Cancelled.can_transition(S::Booked));
        assert!(!S::InProgress.can_transition(S::Cancelled));
        assert!(!S::NoShow.can_transition(S::Confirmed));
    }

    #[test]
    fn slot_blocking_covers_live_statuses_only() {
        assert!(AppointmentStatus::Booked.blocks_slot());
        assert!(AppointmentStatus::InProgress.blocks_slot());
        assert!(!AppointmentStatus::Cancelled.blocks_slot());
        assert!(!AppointmentStatus::Completed.blocks_slot());
    }

    #[test]
    fn page_request_clamps_its_limit() {
        assert_eq!(PageRequest::default().clamped(), (DEFAULT_PAGE_SIZE, 0));
        assert_eq!(
            PageRequest {
                limit: 0,
                offset: 5
            }
            .clamped(),
            (1, 5)
        );
        assert_eq!(
            PageRequest {
                limit: 10_000,
                offset: 0
            }
            .clamped(),
            (MAX_PAGE_SIZE, 0)
        );
    }

    #[test]
    fn outstanding_states_are_the_unpaid_ones() {
        assert!(InvoiceStatus::Issued.is_outstanding());
        assert!(InvoiceStatus::PartiallyPaid.is_outstanding());
        assert!(!InvoiceStatus::Paid.is_outstanding());
        assert!(!InvoiceStatus::Void.is_outstanding());
    }

    #[test]
    fn enums_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&AppointmentStatus::NoShow).unwrap(),
            "\"no_show\""
        );
        assert_eq!(
            serde_json::to_string(&InvoiceStatus::PartiallyPaid).unwrap(),
            "\"partially_paid\""
        );
    }
}
