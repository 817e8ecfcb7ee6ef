//! Row to domain model mappers.
//!
//! Columns that store enums as strings are parsed here; an unknown value
//! means the row was written outside the application and maps to
//! [`DomainError::Corrupt`].

use crate::domain::error::DomainError;
use crate::domain::model::{
    Appointment, AppointmentStatus, Doctor, Invoice, InvoiceStatus, LabOrder, LabOrderStatus,
    LabResult, Member, Notification, OrgSettings, Organisation, Patient, Payment, PaymentMethod,
    Prescription, RadiologyOrder, RadiologyOrderStatus, Role, Visit,
};

use super::entities::{
    appointment, doctor, invoice, lab_order, lab_result, member, notification, org_settings,
    organisation, patient, payment, prescription, radiology_order, visit,
};

fn corrupt_status(table: &'static str, id: i64, raw: &str) -> DomainError {
    DomainError::corrupt(format!("{table} row {id} carries unknown value {raw:?}"))
}

impl From<organisation::Model> for Organisation {
    fn from(row: organisation::Model) -> Self {
        Self {
            id: row.id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

pub fn member(row: member::Model) -> Result<Member, DomainError> {
    let role =
        Role::parse(&row.role).ok_or_else(|| corrupt_status("members", row.id, &row.role))?;
    Ok(Member {
        id: row.id,
        org_id: row.org_id,
        user_id: row.user_id,
        display_name: row.display_name,
        role,
        created_at: row.created_at,
    })
}

impl From<patient::Model> for Patient {
    fn from(row: patient::Model) -> Self {
        Self {
            id: row.id,
            org_id: row.org_id,
            mrn: row.mrn,
            given_name: row.given_name,
            family_name: row.family_name,
            date_of_birth: row.date_of_birth,
            sex: row.sex,
            phone: row.phone,
            email: row.email,
            address: row.address,
            archived: row.archived,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl From<doctor::Model> for Doctor {
    fn from(row: doctor::Model) -> Self {
        Self {
            id: row.id,
            org_id: row.org_id,
            given_name: row.given_name,
            family_name: row.family_name,
            specialty: row.specialty,
            consultation_fee: row.consultation_fee,
            active: row.active,
            created_at: row.created_at,
        }
    }
}

pub fn appointment(row: appointment::Model) -> Result<Appointment, DomainError> {
    let status = AppointmentStatus::parse(&row.status)
        .ok_or_else(|| corrupt_status("appointments", row.id, &row.status))?;
    Ok(Appointment {
        id: row.id,
        org_id: row.org_id,
        patient_id: row.patient_id,
        doctor_id: row.doctor_id,
        scheduled_start: row.scheduled_start,
        scheduled_end: row.scheduled_end,
        reason: row.reason,
        status,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

impl From<visit::Model> for Visit {
    fn from(row: visit::Model) -> Self {
        Self {
            id: row.id,
            org_id: row.org_id,
            appointment_id: row.appointment_id,
            patient_id: row.patient_id,
            doctor_id: row.doctor_id,
            started_at: row.started_at,
            ended_at: row.ended_at,
            blood_pressure: row.blood_pressure,
            pulse_bpm: row.pulse_bpm,
            temperature_c: row.temperature_c,
            diagnosis: row.diagnosis,
            notes: row.notes,
        }
    }
}

impl From<prescription::Model> for Prescription {
    fn from(row: prescription::Model) -> Self {
        Self {
            id: row.id,
            org_id: row.org_id,
            visit_id: row.visit_id,
            patient_id: row.patient_id,
            medication: row.medication,
            dosage: row.dosage,
            frequency: row.frequency,
            duration_days: row.duration_days,
            instructions: row.instructions,
            issued_at: row.issued_at,
        }
    }
}

pub fn lab_order(row: lab_order::Model) -> Result<LabOrder, DomainError> {
    let status = LabOrderStatus::parse(&row.status)
        .ok_or_else(|| corrupt_status("lab_orders", row.id, &row.status))?;
    Ok(LabOrder {
        id: row.id,
        org_id: row.org_id,
        patient_id: row.patient_id,
        ordered_by: row.ordered_by,
        test_name: row.test_name,
        status,
        ordered_at: row.ordered_at,
        completed_at: row.completed_at,
    })
}

impl From<lab_result::Model> for LabResult {
    fn from(row: lab_result::Model) -> Self {
        Self {
            id: row.id,
            org_id: row.org_id,
            order_id: row.order_id,
            patient_id: row.patient_id,
            category: row.category,
            name: row.name,
            value: row.value,
            unit: row.unit,
            reference_range: row.reference_range,
            flagged: row.flagged,
            recorded_at: row.recorded_at,
        }
    }
}

pub fn radiology_order(row: radiology_order::Model) -> Result<RadiologyOrder, DomainError> {
    let status = RadiologyOrderStatus::parse(&row.status)
        .ok_or_else(|| corrupt_status("radiology_orders", row.id, &row.status))?;
    Ok(RadiologyOrder {
        id: row.id,
        org_id: row.org_id,
        patient_id: row.patient_id,
        ordered_by: row.ordered_by,
        modality: row.modality,
        body_site: row.body_site,
        status,
        report: row.report,
        ordered_at: row.ordered_at,
        reported_at: row.reported_at,
    })
}

pub fn invoice(row: invoice::Model) -> Result<Invoice, DomainError> {
    let status = InvoiceStatus::parse(&row.status)
        .ok_or_else(|| corrupt_status("invoices", row.id, &row.status))?;
    Ok(Invoice {
        id: row.id,
        org_id: row.org_id,
        patient_id: row.patient_id,
        visit_id: row.visit_id,
        total: row.total,
        status,
        issued_on: row.issued_on,
        created_at: row.created_at,
    })
}

pub fn payment(row: payment::Model) -> Result<Payment, DomainError> {
    let method = PaymentMethod::parse(&row.method)
        .ok_or_else(|| corrupt_status("payments", row.id, &row.method))?;
    Ok(Payment {
        id: row.id,
        org_id: row.org_id,
        invoice_id: row.invoice_id,
        amount: row.amount,
        method,
        reference: row.reference,
        received_at: row.received_at,
    })
}

impl From<org_settings::Model> for OrgSettings {
    fn from(row: org_settings::Model) -> Self {
        Self {
            org_id: row.org_id,
            clinic_name: row.clinic_name,
            currency: row.currency,
            timezone: row.timezone,
            default_appointment_minutes: row.default_appointment_minutes,
            updated_at: Some(row.updated_at),
        }
    }
}

impl From<notification::Model> for Notification {
    fn from(row: notification::Model) -> Self {
        Self {
            id: row.id,
            org_id: row.org_id,
            recipient_id: row.recipient_id,
            message: row.message,
            read_at: row.read_at,
            created_at: row.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use chrono::Utc;

    use super::*;

    #[test]
    fn appointment_status_strings_parse() {
        let now = Utc::now();
        let row = appointment::Model {
            id: 7,
            org_id: 1,
            patient_id: 2,
            doctor_id: 3,
            scheduled_start: now,
            scheduled_end: now,
            reason: None,
            status: "confirmed".to_owned(),
            created_at: now,
            updated_at: now,
        };

        let mapped = appointment(row).unwrap();
        assert_eq!(mapped.status, AppointmentStatus::Confirmed);
    }

    #[test]
    fn unknown_status_maps_to_corrupt() {
        let now = Utc::now();
        let row = appointment::Model {
            id: 7,
            org_id: 1,
            patient_id: 2,
            doctor_id: 3,
            scheduled_start: now,
            scheduled_end: now,
            reason: None,
            status: "teleported".to_owned(),
            created_at: now,
            updated_at: now,
        };

        let err = appointment(row).unwrap_err();
        assert!(matches!(err, DomainError::Corrupt(_)));
        assert!(err.to_string().contains("teleported"));
    }

    #[test]
    fn member_role_parses() {
        let row = member::Model {
            id: 1,
            org_id: 1,
            user_id: 100,
            display_name: "A. Nurse".to_owned(),
            role: "reception".to_owned(),
            created_at: Utc::now(),
        };

        assert_eq!(member(row).unwrap().role, Role::Reception);
    }

    #[test]
    fn settings_row_keeps_its_update_stamp() {
        let now = Utc::now();
        let row = org_settings::Model {
            id: 1,
            org_id: 4,
            clinic_name: Some("Praxis Nord".to_owned()),
            currency: "EUR".to_owned(),
            timezone: "Europe/Berlin".to_owned(),
            default_appointment_minutes: 20,
            updated_at: now,
        };

        let mapped = OrgSettings::from(row);
        assert_eq!(mapped.updated_at, Some(now));
        assert_eq!(mapped.org_id, 4);
    }
}
