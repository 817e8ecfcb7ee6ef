//! End-to-end clinical flows inside one practice: scheduling, visits,
//! prescriptions, diagnostics, billing, settings and the dashboards.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use chrono::Duration;
use common::{at, clinic, day, provision_org, seed_doctor, seed_patient};
use praxis_clinic::domain::error::DomainError;
use praxis_clinic::domain::model::{
    AppointmentStatus, InvoiceStatus, LabOrderStatus, PageRequest, PaymentMethod,
    RadiologyOrderStatus, Role,
};
use praxis_clinic::domain::service::appointments::{BookAppointment, RescheduleAppointment};
use praxis_clinic::domain::service::billing::{RaiseInvoice, RecordPayment};
use praxis_clinic::domain::service::diagnostics::{
    LabResultEntry, OrderLabTest, OrderRadiology,
};
use praxis_clinic::domain::service::doctors::UpdateDoctor;
use praxis_clinic::domain::service::organisations::NewMember;
use praxis_clinic::domain::service::patients::{PatientFilter, RegisterPatient, UpdateContact};
use praxis_clinic::domain::service::prescriptions::PrescriptionLine;
use praxis_clinic::domain::service::settings::{
    UpdateSettings, DEFAULT_APPOINTMENT_MINUTES, DEFAULT_CURRENCY,
};
use praxis_clinic::domain::service::visits::{CloseVisit, StartVisit};
use praxis_tenancy::{TenantContext, UserId};
use rust_decimal::Decimal;

#[tokio::test]
async fn booking_rejects_overlapping_slots() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let patient = seed_patient(&services, &ctx, "MRN-001", "Meyer").await;
    let other = seed_patient(&services, &ctx, "MRN-002", "Novak").await;
    let doctor = seed_doctor(&services, &ctx, "Okafor").await;

    let monday = day(2025, 3, 10);
    let first = services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 9, 0),
                scheduled_end: Some(at(monday, 9, 30)),
                reason: Some("checkup".to_owned()),
            },
        )
        .await
        .unwrap();
    assert_eq!(first.status, AppointmentStatus::Booked);

    // Overlapping window with the same doctor.
    let err = services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: other.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 9, 15),
                scheduled_end: Some(at(monday, 9, 45)),
                reason: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    // Back to back is fine.
    services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: other.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 9, 30),
                scheduled_end: Some(at(monday, 10, 0)),
                reason: None,
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn cancelled_appointments_free_their_slot() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let patient = seed_patient(&services, &ctx, "MRN-001", "Meyer").await;
    let doctor = seed_doctor(&services, &ctx, "Okafor").await;

    let monday = day(2025, 3, 10);
    let booked = services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 9, 0),
                scheduled_end: Some(at(monday, 9, 30)),
                reason: None,
            },
        )
        .await
        .unwrap();

    let cancelled = services.appointments.cancel(&ctx, booked.id).await.unwrap();
    assert_eq!(cancelled.status, AppointmentStatus::Cancelled);

    services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 9, 0),
                scheduled_end: Some(at(monday, 9, 30)),
                reason: None,
            },
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn rescheduling_moves_the_slot_and_rechecks_the_calendar() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let patient = seed_patient(&services, &ctx, "MRN-001", "Meyer").await;
    let other = seed_patient(&services, &ctx, "MRN-002", "Novak").await;
    let doctor = seed_doctor(&services, &ctx, "Okafor").await;

    let monday = day(2025, 3, 10);
    let first = services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 9, 0),
                scheduled_end: Some(at(monday, 9, 30)),
                reason: None,
            },
        )
        .await
        .unwrap();
    let second = services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: other.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 10, 0),
                scheduled_end: Some(at(monday, 10, 30)),
                reason: None,
            },
        )
        .await
        .unwrap();

    // Moving into the second slot clashes; 10:15 plus the kept half hour
    // overlaps 10:00..10:30.
    let err = services
        .appointments
        .reschedule(
            &ctx,
            first.id,
            RescheduleAppointment {
                scheduled_start: at(monday, 10, 15),
                scheduled_end: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let err = services
        .appointments
        .reschedule(
            &ctx,
            first.id,
            RescheduleAppointment {
                scheduled_start: at(monday, 12, 0),
                scheduled_end: Some(at(monday, 12, 0)),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation {
            field: "scheduled_end",
            ..
        }
    ));

    // Without an explicit end the appointment keeps its length.
    let moved = services
        .appointments
        .reschedule(
            &ctx,
            first.id,
            RescheduleAppointment {
                scheduled_start: at(monday, 11, 0),
                scheduled_end: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.scheduled_start, at(monday, 11, 0));
    assert_eq!(moved.scheduled_end, at(monday, 11, 30));
    assert_eq!(moved.status, AppointmentStatus::Booked);

    // The vacated window is bookable again.
    services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: other.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 9, 0),
                scheduled_end: Some(at(monday, 9, 30)),
                reason: None,
            },
        )
        .await
        .unwrap();

    // Cancelled appointments stay where they are.
    services.appointments.cancel(&ctx, second.id).await.unwrap();
    let err = services
        .appointments
        .reschedule(
            &ctx,
            second.id,
            RescheduleAppointment {
                scheduled_start: at(monday, 14, 0),
                scheduled_end: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn patient_appointment_history_pages_newest_first() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let patient = seed_patient(&services, &ctx, "MRN-001", "Meyer").await;
    let doctor = seed_doctor(&services, &ctx, "Okafor").await;

    let monday = day(2025, 3, 10);
    for hour in [9, 14] {
        services
            .appointments
            .book(
                &ctx,
                BookAppointment {
                    patient_id: patient.id,
                    doctor_id: doctor.id,
                    scheduled_start: at(monday, hour, 0),
                    scheduled_end: Some(at(monday, hour, 30)),
                    reason: None,
                },
            )
            .await
            .unwrap();
    }

    let page = services
        .appointments
        .for_patient(&ctx, patient.id, PageRequest { limit: 1, offset: 0 })
        .await
        .unwrap();
    assert_eq!(page.total, 2);
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].scheduled_start, at(monday, 14, 0));

    let rest = services
        .appointments
        .for_patient(&ctx, patient.id, PageRequest { limit: 1, offset: 1 })
        .await
        .unwrap();
    assert_eq!(rest.items[0].scheduled_start, at(monday, 9, 0));
}

#[tokio::test]
async fn doctor_updates_patch_fee_and_specialty() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let doctor = seed_doctor(&services, &ctx, "Okafor").await;

    let updated = services
        .doctors
        .update(
            &ctx,
            doctor.id,
            UpdateDoctor {
                specialty: Some("cardiology".to_owned()),
                consultation_fee: Some(Decimal::from(80)),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.specialty, "cardiology");
    assert_eq!(updated.consultation_fee, Decimal::from(80));

    // An empty patch changes nothing.
    let same = services
        .doctors
        .update(&ctx, doctor.id, UpdateDoctor::default())
        .await
        .unwrap();
    assert_eq!(same.specialty, "cardiology");
    assert_eq!(same.consultation_fee, Decimal::from(80));

    let err = services
        .doctors
        .update(
            &ctx,
            doctor.id,
            UpdateDoctor {
                specialty: Some("  ".to_owned()),
                consultation_fee: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation {
            field: "specialty",
            ..
        }
    ));

    let err = services
        .doctors
        .update(
            &ctx,
            doctor.id,
            UpdateDoctor {
                specialty: None,
                consultation_fee: Some(Decimal::from(-5)),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        DomainError::Validation {
            field: "consultation_fee",
            ..
        }
    ));
}

#[tokio::test]
async fn booking_defaults_the_end_from_practice_settings() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let patient = seed_patient(&services, &ctx, "MRN-001", "Meyer").await;
    let doctor = seed_doctor(&services, &ctx, "Okafor").await;
    let monday = day(2025, 3, 10);

    let appt = services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 9, 0),
                scheduled_end: None,
                reason: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(
        appt.scheduled_end - appt.scheduled_start,
        Duration::minutes(i64::from(DEFAULT_APPOINTMENT_MINUTES))
    );

    services
        .settings
        .update(
            &ctx,
            UpdateSettings {
                default_appointment_minutes: Some(20),
                ..UpdateSettings::default()
            },
        )
        .await
        .unwrap();

    let appt = services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 11, 0),
                scheduled_end: None,
                reason: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(
        appt.scheduled_end - appt.scheduled_start,
        Duration::minutes(20)
    );
}

#[tokio::test]
async fn booking_validates_patient_doctor_and_window() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let patient = seed_patient(&services, &ctx, "MRN-001", "Meyer").await;
    let doctor = seed_doctor(&services, &ctx, "Okafor").await;
    let monday = day(2025, 3, 10);

    // End before start.
    let err = services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 9, 30),
                scheduled_end: Some(at(monday, 9, 0)),
                reason: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));

    // Archived patients cannot be booked.
    services.patients.archive(&ctx, patient.id).await.unwrap();
    let err = services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 10, 0),
                scheduled_end: None,
                reason: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    // Neither can inactive doctors.
    let second = seed_patient(&services, &ctx, "MRN-002", "Novak").await;
    services.doctors.deactivate(&ctx, doctor.id).await.unwrap();
    let err = services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: second.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 10, 0),
                scheduled_end: None,
                reason: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn visit_lifecycle_runs_booked_to_completed() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let patient = seed_patient(&services, &ctx, "MRN-001", "Meyer").await;
    let doctor = seed_doctor(&services, &ctx, "Okafor").await;
    let monday = day(2025, 3, 10);

    let appt = services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 9, 0),
                scheduled_end: None,
                reason: Some("persistent cough".to_owned()),
            },
        )
        .await
        .unwrap();
    let appt = services.appointments.confirm(&ctx, appt.id).await.unwrap();
    assert_eq!(appt.status, AppointmentStatus::Confirmed);

    let visit = services
        .visits
        .start(
            &ctx,
            StartVisit {
                appointment_id: appt.id,
                blood_pressure: Some("120/80".to_owned()),
                pulse_bpm: Some(72),
                temperature_c: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(visit.patient_id, patient.id);
    assert_eq!(visit.doctor_id, doctor.id);
    assert!(visit.ended_at.is_none());

    let in_progress = services.appointments.get(&ctx, appt.id).await.unwrap();
    assert_eq!(in_progress.status, AppointmentStatus::InProgress);

    let closed = services
        .visits
        .close(
            &ctx,
            CloseVisit {
                visit_id: visit.id,
                diagnosis: Some("acute bronchitis".to_owned()),
                notes: Some("rest, fluids".to_owned()),
            },
        )
        .await
        .unwrap();
    assert!(closed.ended_at.is_some());
    assert_eq!(closed.diagnosis.as_deref(), Some("acute bronchitis"));

    let completed = services.appointments.get(&ctx, appt.id).await.unwrap();
    assert_eq!(completed.status, AppointmentStatus::Completed);

    // A completed appointment cannot start another visit.
    let err = services
        .visits
        .start(
            &ctx,
            StartVisit {
                appointment_id: appt.id,
                blood_pressure: None,
                pulse_bpm: None,
                temperature_c: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    // Nor can a closed visit be closed again.
    let err = services
        .visits
        .close(
            &ctx,
            CloseVisit {
                visit_id: visit.id,
                diagnosis: None,
                notes: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let history = services.visits.for_patient(&ctx, patient.id).await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn status_machine_rejects_dead_ends() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let patient = seed_patient(&services, &ctx, "MRN-001", "Meyer").await;
    let doctor = seed_doctor(&services, &ctx, "Okafor").await;
    let monday = day(2025, 3, 10);

    let appt = services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 9, 0),
                scheduled_end: None,
                reason: None,
            },
        )
        .await
        .unwrap();

    let confirmed = services.appointments.confirm(&ctx, appt.id).await.unwrap();
    let no_show = services
        .appointments
        .mark_no_show(&ctx, confirmed.id)
        .await
        .unwrap();
    assert_eq!(no_show.status, AppointmentStatus::NoShow);

    // No-show is terminal.
    let err = services.appointments.cancel(&ctx, appt.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
    let err = services.appointments.confirm(&ctx, appt.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn prescriptions_copy_the_visit_patient() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let patient = seed_patient(&services, &ctx, "MRN-001", "Meyer").await;
    let doctor = seed_doctor(&services, &ctx, "Okafor").await;
    let monday = day(2025, 3, 10);

    let appt = services
        .appointments
        .book(
            &ctx,
            BookAppointment {
                patient_id: patient.id,
                doctor_id: doctor.id,
                scheduled_start: at(monday, 9, 0),
                scheduled_end: None,
                reason: None,
            },
        )
        .await
        .unwrap();
    let visit = services
        .visits
        .start(
            &ctx,
            StartVisit {
                appointment_id: appt.id,
                blood_pressure: None,
                pulse_bpm: None,
                temperature_c: None,
            },
        )
        .await
        .unwrap();

    let err = services
        .prescriptions
        .issue(&ctx, visit.id, Vec::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));

    let issued = services
        .prescriptions
        .issue(
            &ctx,
            visit.id,
            vec![
                PrescriptionLine {
                    medication: "amoxicillin".to_owned(),
                    dosage: "500mg".to_owned(),
                    frequency: "3x daily".to_owned(),
                    duration_days: 7,
                    instructions: Some("with food".to_owned()),
                },
                PrescriptionLine {
                    medication: "ibuprofen".to_owned(),
                    dosage: "400mg".to_owned(),
                    frequency: "as needed".to_owned(),
                    duration_days: 5,
                    instructions: None,
                },
            ],
        )
        .await
        .unwrap();
    assert_eq!(issued.len(), 2);
    assert!(issued.iter().all(|p| p.patient_id == patient.id));
    assert!(issued.iter().all(|p| p.visit_id == visit.id));

    let by_visit = services.prescriptions.for_visit(&ctx, visit.id).await.unwrap();
    assert_eq!(by_visit.len(), 2);
    let by_patient = services
        .prescriptions
        .for_patient(&ctx, patient.id)
        .await
        .unwrap();
    assert_eq!(by_patient.len(), 2);
}

#[tokio::test]
async fn lab_orders_complete_with_grouped_results() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let patient = seed_patient(&services, &ctx, "MRN-001", "Meyer").await;
    let doctor = seed_doctor(&services, &ctx, "Okafor").await;

    let order = services
        .diagnostics
        .order_lab_test(
            &ctx,
            OrderLabTest {
                patient_id: patient.id,
                ordered_by: doctor.id,
                test_name: "full blood count".to_owned(),
            },
        )
        .await
        .unwrap();
    assert_eq!(order.status, LabOrderStatus::Ordered);

    let completed = services
        .diagnostics
        .submit_lab_results(
            &ctx,
            order.id,
            vec![
                LabResultEntry {
                    category: "haematology".to_owned(),
                    name: "haemoglobin".to_owned(),
                    value: "14.2".to_owned(),
                    unit: Some("g/dL".to_owned()),
                    reference_range: Some("13.0-17.0".to_owned()),
                    flagged: false,
                },
                LabResultEntry {
                    category: "chemistry".to_owned(),
                    name: "glucose".to_owned(),
                    value: "11.1".to_owned(),
                    unit: Some("mmol/L".to_owned()),
                    reference_range: Some("3.9-5.6".to_owned()),
                    flagged: true,
                },
                LabResultEntry {
                    category: "haematology".to_owned(),
                    name: "platelets".to_owned(),
                    value: "250".to_owned(),
                    unit: Some("10^9/L".to_owned()),
                    reference_range: None,
                    flagged: false,
                },
            ],
        )
        .await
        .unwrap();
    assert_eq!(completed.status, LabOrderStatus::Completed);
    assert!(completed.completed_at.is_some());

    // Completed orders take no further results and cannot be cancelled.
    let err = services
        .diagnostics
        .submit_lab_results(
            &ctx,
            order.id,
            vec![LabResultEntry {
                category: "chemistry".to_owned(),
                name: "sodium".to_owned(),
                value: "140".to_owned(),
                unit: None,
                reference_range: None,
                flagged: false,
            }],
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
    let err = services
        .diagnostics
        .cancel_lab_order(&ctx, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let groups = services
        .diagnostics
        .results_for_patient(&ctx, patient.id)
        .await
        .unwrap();
    let categories: Vec<&str> = groups.iter().map(|g| g.category.as_str()).collect();
    assert_eq!(categories, ["chemistry", "haematology"]);
    assert_eq!(groups[0].results.len(), 1);
    assert!(groups[0].results[0].flagged);
    assert_eq!(groups[1].results.len(), 2);
}

#[tokio::test]
async fn radiology_orders_take_one_report() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let patient = seed_patient(&services, &ctx, "MRN-001", "Meyer").await;
    let doctor = seed_doctor(&services, &ctx, "Okafor").await;

    let order = services
        .diagnostics
        .order_radiology(
            &ctx,
            OrderRadiology {
                patient_id: patient.id,
                ordered_by: doctor.id,
                modality: "x-ray".to_owned(),
                body_site: "left wrist".to_owned(),
            },
        )
        .await
        .unwrap();
    assert_eq!(order.status, RadiologyOrderStatus::Ordered);

    let reported = services
        .diagnostics
        .attach_radiology_report(&ctx, order.id, "no fracture seen".to_owned())
        .await
        .unwrap();
    assert_eq!(reported.status, RadiologyOrderStatus::Reported);
    assert_eq!(reported.report.as_deref(), Some("no fracture seen"));
    assert!(reported.reported_at.is_some());

    let err = services
        .diagnostics
        .attach_radiology_report(&ctx, order.id, "second opinion".to_owned())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
    let err = services
        .diagnostics
        .cancel_radiology_order(&ctx, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let orders = services
        .diagnostics
        .radiology_for_patient(&ctx, patient.id)
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
}

#[tokio::test]
async fn payments_settle_invoices_in_steps() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let patient = seed_patient(&services, &ctx, "MRN-001", "Meyer").await;

    let invoice = services
        .billing
        .raise_invoice(
            &ctx,
            RaiseInvoice {
                patient_id: patient.id,
                visit_id: None,
                total: Decimal::from(100),
                issued_on: day(2025, 3, 10),
            },
        )
        .await
        .unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Issued);

    let partial = services
        .billing
        .record_payment(
            &ctx,
            RecordPayment {
                invoice_id: invoice.id,
                amount: Decimal::from(40),
                method: PaymentMethod::Cash,
                reference: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(partial.status, InvoiceStatus::PartiallyPaid);

    let statement = services.billing.statement(&ctx, invoice.id).await.unwrap();
    assert_eq!(statement.paid, Decimal::from(40));
    assert_eq!(statement.due, Decimal::from(60));
    assert_eq!(statement.payments.len(), 1);

    // Paying more than is owed is rejected.
    let err = services
        .billing
        .record_payment(
            &ctx,
            RecordPayment {
                invoice_id: invoice.id,
                amount: Decimal::from(70),
                method: PaymentMethod::Card,
                reference: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));

    let settled = services
        .billing
        .record_payment(
            &ctx,
            RecordPayment {
                invoice_id: invoice.id,
                amount: Decimal::from(60),
                method: PaymentMethod::Card,
                reference: Some("TXN-4711".to_owned()),
            },
        )
        .await
        .unwrap();
    assert_eq!(settled.status, InvoiceStatus::Paid);

    let err = services
        .billing
        .record_payment(
            &ctx,
            RecordPayment {
                invoice_id: invoice.id,
                amount: Decimal::from(1),
                method: PaymentMethod::Cash,
                reference: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    // Settled invoices drop off the outstanding list.
    assert!(services.billing.outstanding(&ctx).await.unwrap().is_empty());
}

#[tokio::test]
async fn voiding_needs_a_clean_invoice() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let patient = seed_patient(&services, &ctx, "MRN-001", "Meyer").await;

    let clean = services
        .billing
        .raise_invoice(
            &ctx,
            RaiseInvoice {
                patient_id: patient.id,
                visit_id: None,
                total: Decimal::from(50),
                issued_on: day(2025, 3, 10),
            },
        )
        .await
        .unwrap();
    let voided = services.billing.void_invoice(&ctx, clean.id).await.unwrap();
    assert_eq!(voided.status, InvoiceStatus::Void);

    let err = services.billing.void_invoice(&ctx, clean.id).await.unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    // Void invoices refuse payments.
    let err = services
        .billing
        .record_payment(
            &ctx,
            RecordPayment {
                invoice_id: clean.id,
                amount: Decimal::from(10),
                method: PaymentMethod::Cash,
                reference: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    let paid_against = services
        .billing
        .raise_invoice(
            &ctx,
            RaiseInvoice {
                patient_id: patient.id,
                visit_id: None,
                total: Decimal::from(80),
                issued_on: day(2025, 3, 10),
            },
        )
        .await
        .unwrap();
    services
        .billing
        .record_payment(
            &ctx,
            RecordPayment {
                invoice_id: paid_against.id,
                amount: Decimal::from(30),
                method: PaymentMethod::Cash,
                reference: None,
            },
        )
        .await
        .unwrap();
    let err = services
        .billing
        .void_invoice(&ctx, paid_against.id)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));
}

#[tokio::test]
async fn settings_upsert_and_validate() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;

    let defaults = services.settings.get(&ctx).await.unwrap();
    assert_eq!(defaults.currency, DEFAULT_CURRENCY);
    assert_eq!(
        defaults.default_appointment_minutes,
        DEFAULT_APPOINTMENT_MINUTES
    );
    assert!(defaults.updated_at.is_none());

    let written = services
        .settings
        .update(
            &ctx,
            UpdateSettings {
                clinic_name: Some("Alpha Family Practice".to_owned()),
                currency: Some("eur".to_owned()),
                timezone: Some("Europe/Berlin".to_owned()),
                default_appointment_minutes: Some(20),
            },
        )
        .await
        .unwrap();
    assert_eq!(written.currency, "EUR");
    assert!(written.updated_at.is_some());

    // A later patch leaves untouched fields alone.
    let patched = services
        .settings
        .update(
            &ctx,
            UpdateSettings {
                clinic_name: Some("Alpha Praxis".to_owned()),
                ..UpdateSettings::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(patched.clinic_name.as_deref(), Some("Alpha Praxis"));
    assert_eq!(patched.currency, "EUR");
    assert_eq!(patched.timezone, "Europe/Berlin");
    assert_eq!(patched.default_appointment_minutes, 20);

    let err = services
        .settings
        .update(
            &ctx,
            UpdateSettings {
                currency: Some("euro".to_owned()),
                ..UpdateSettings::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { field: "currency", .. }));

    let err = services
        .settings
        .update(
            &ctx,
            UpdateSettings {
                default_appointment_minutes: Some(300),
                ..UpdateSettings::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));
}

#[tokio::test]
async fn patient_search_and_pagination() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;

    for (mrn, family) in [("MRN-001", "Adams"), ("MRN-002", "Baker"), ("MRN-003", "Carter")] {
        seed_patient(&services, &ctx, mrn, family).await;
    }

    let hits = services
        .patients
        .list(
            &ctx,
            &PatientFilter {
                search: Some("Bak".to_owned()),
                include_archived: false,
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(hits.total, 1);
    assert_eq!(hits.items[0].family_name, "Baker");

    let page = services
        .patients
        .list(
            &ctx,
            &PatientFilter::default(),
            PageRequest {
                limit: 2,
                offset: 0,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].family_name, "Adams");

    let rest = services
        .patients
        .list(
            &ctx,
            &PatientFilter::default(),
            PageRequest {
                limit: 2,
                offset: 2,
            },
        )
        .await
        .unwrap();
    assert_eq!(rest.items.len(), 1);
    assert_eq!(rest.items[0].family_name, "Carter");

    // Archived patients disappear from default listings.
    let target = &page.items[0];
    services.patients.archive(&ctx, target.id).await.unwrap();
    let visible = services
        .patients
        .list(&ctx, &PatientFilter::default(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(visible.total, 2);
    let everyone = services
        .patients
        .list(
            &ctx,
            &PatientFilter {
                search: None,
                include_archived: true,
            },
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(everyone.total, 3);
}

#[tokio::test]
async fn duplicate_mrn_is_a_conflict() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    seed_patient(&services, &ctx, "MRN-001", "Meyer").await;

    let err = services
        .patients
        .register(
            &ctx,
            RegisterPatient {
                mrn: "MRN-001".to_owned(),
                given_name: "Jo".to_owned(),
                family_name: "Doppel".to_owned(),
                date_of_birth: day(1985, 1, 1),
                sex: None,
                phone: None,
                email: None,
                address: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Conflict(_)));

    // The same MRN is fine in another practice.
    let beta = provision_org(&services, "beta clinic").await;
    seed_patient(&services, &beta, "MRN-001", "Meyer").await;
}

#[tokio::test]
async fn contact_updates_patch_single_fields() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let patient = seed_patient(&services, &ctx, "MRN-001", "Meyer").await;

    let updated = services
        .patients
        .update_contact(
            &ctx,
            patient.id,
            UpdateContact {
                email: Some("alex.meyer@example.org".to_owned()),
                ..UpdateContact::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.email.as_deref(), Some("alex.meyer@example.org"));
    assert_eq!(updated.phone.as_deref(), Some("555-0100"));
}

#[tokio::test]
async fn notifications_read_cycle() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;

    let first = services
        .notifications
        .push(&ctx, 7, "lab results ready".to_owned())
        .await
        .unwrap();
    services
        .notifications
        .push(&ctx, 7, "appointment confirmed".to_owned())
        .await
        .unwrap();

    let err = services
        .notifications
        .push(&ctx, 7, "   ".to_owned())
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Validation { .. }));

    let unread = services.notifications.unread_for(&ctx, 7).await.unwrap();
    assert_eq!(unread.len(), 2);
    assert_eq!(unread[0].message, "appointment confirmed");

    services.notifications.mark_read(&ctx, first.id).await.unwrap();
    // Marking twice is harmless.
    services.notifications.mark_read(&ctx, first.id).await.unwrap();
    let err = services.notifications.mark_read(&ctx, first.id + 999).await.unwrap_err();
    assert!(matches!(err, DomainError::NotFound { .. }));

    assert_eq!(services.notifications.unread_for(&ctx, 7).await.unwrap().len(), 1);

    let marked = services.notifications.mark_all_read(&ctx, 7).await.unwrap();
    assert_eq!(marked, 1);
    assert!(services.notifications.unread_for(&ctx, 7).await.unwrap().is_empty());

    let cleared = services.notifications.clear_read(&ctx, 7).await.unwrap();
    assert_eq!(cleared, 2);
}

#[tokio::test]
async fn dashboards_reflect_the_day() {
    let services = clinic().await;
    let ctx = provision_org(&services, "alpha clinic").await;
    let org = ctx.org_id().unwrap();
    let monday = day(2025, 3, 10);

    let patient = seed_patient(&services, &ctx, "MRN-001", "Meyer").await;
    let second = seed_patient(&services, &ctx, "MRN-002", "Novak").await;
    let doctor = seed_doctor(&services, &ctx, "Okafor").await;

    for (who, hour) in [(patient.id, 9), (second.id, 10)] {
        services
            .appointments
            .book(
                &ctx,
                BookAppointment {
                    patient_id: who,
                    doctor_id: doctor.id,
                    scheduled_start: at(monday, hour, 0),
                    scheduled_end: None,
                    reason: None,
                },
            )
            .await
            .unwrap();
    }
    services
        .billing
        .raise_invoice(
            &ctx,
            RaiseInvoice {
                patient_id: patient.id,
                visit_id: None,
                total: Decimal::from(100),
                issued_on: monday,
            },
        )
        .await
        .unwrap();
    services
        .notifications
        .push(&ctx, 7, "lab results ready".to_owned())
        .await
        .unwrap();

    // Without an acting user the summary is open to the operator tooling.
    let summary = services.dashboard.admin_summary(&ctx, monday).await.unwrap();
    assert_eq!(summary.patients, 2);
    assert_eq!(summary.active_doctors, 1);
    assert_eq!(summary.appointments_today, 2);
    assert_eq!(summary.outstanding_invoices, 1);
    assert_eq!(summary.outstanding_amount, Decimal::from(100));
    assert_eq!(summary.unread_notifications, 1);

    // A named user needs the admin role.
    services
        .organisations
        .add_member(
            &ctx,
            NewMember {
                org_id: org.get(),
                user_id: 21,
                display_name: "Front Desk".to_owned(),
                role: Role::Reception,
            },
        )
        .await
        .unwrap();
    let reception_ctx =
        TenantContext::organisation_for_user(org, UserId::new(21).unwrap());
    let err = services
        .dashboard
        .admin_summary(&reception_ctx, monday)
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::Forbidden(_)));

    services
        .organisations
        .add_member(
            &ctx,
            NewMember {
                org_id: org.get(),
                user_id: 22,
                display_name: "Practice Lead".to_owned(),
                role: Role::Admin,
            },
        )
        .await
        .unwrap();
    let admin_ctx = TenantContext::organisation_for_user(org, UserId::new(22).unwrap());
    services
        .dashboard
        .admin_summary(&admin_ctx, monday)
        .await
        .unwrap();

    let doctor_day = services
        .dashboard
        .doctor_day(&ctx, doctor.id, monday)
        .await
        .unwrap();
    assert_eq!(doctor_day.appointments.len(), 2);
    assert!(doctor_day.open_visits.is_empty());

    let first_appt_id = doctor_day.appointments[0].id;
    services
        .visits
        .start(
            &ctx,
            StartVisit {
                appointment_id: first_appt_id,
                blood_pressure: None,
                pulse_bpm: None,
                temperature_c: None,
            },
        )
        .await
        .unwrap();
    let doctor_day = services
        .dashboard
        .doctor_day(&ctx, doctor.id, monday)
        .await
        .unwrap();
    assert_eq!(doctor_day.open_visits.len(), 1);

    let reception = services.dashboard.reception_day(&ctx, monday).await.unwrap();
    assert_eq!(reception.appointments.len(), 2);
    assert_eq!(reception.outstanding.len(), 1);
    assert_eq!(reception.outstanding[0].due, Decimal::from(100));
}
