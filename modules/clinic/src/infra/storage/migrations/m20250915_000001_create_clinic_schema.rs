//! Initial clinic schema.
//!
//! Every table except `organisations` carries an `org_id` column with a
//! cascading foreign key to the owning organisation, plus an index on it.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Organisations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Organisations::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Organisations::Name).text().not_null())
                    .col(
                        ColumnDef::new(Organisations::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Members::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Members::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Members::OrgId).big_integer().not_null())
                    .col(ColumnDef::new(Members::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Members::DisplayName).text().not_null())
                    .col(ColumnDef::new(Members::Role).text().not_null())
                    .col(
                        ColumnDef::new(Members::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Members::Table, Members::OrgId)
                            .to(Organisations::Table, Organisations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_members_org")
                    .table(Members::Table)
                    .col(Members::OrgId)
                    .to_owned(),
            )
            .await?;

        // One membership per user per organisation.
        manager
            .create_index(
                Index::create()
                    .name("uq_members_org_user")
                    .table(Members::Table)
                    .col(Members::OrgId)
                    .col(Members::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Patients::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Patients::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Patients::OrgId).big_integer().not_null())
                    .col(ColumnDef::new(Patients::Mrn).text().not_null())
                    .col(ColumnDef::new(Patients::GivenName).text().not_null())
                    .col(ColumnDef::new(Patients::FamilyName).text().not_null())
                    .col(ColumnDef::new(Patients::DateOfBirth).date().not_null())
                    .col(ColumnDef::new(Patients::Sex).text())
                    .col(ColumnDef::new(Patients::Phone).text())
                    .col(ColumnDef::new(Patients::Email).text())
                    .col(ColumnDef::new(Patients::Address).text())
                    .col(
                        ColumnDef::new(Patients::Archived)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Patients::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Patients::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Patients::Table, Patients::OrgId)
                            .to(Organisations::Table, Organisations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_patients_org")
                    .table(Patients::Table)
                    .col(Patients::OrgId)
                    .to_owned(),
            )
            .await?;

        // Medical record numbers are unique within an organisation, not
        // globally.
        manager
            .create_index(
                Index::create()
                    .name("uq_patients_org_mrn")
                    .table(Patients::Table)
                    .col(Patients::OrgId)
                    .col(Patients::Mrn)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Doctors::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Doctors::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Doctors::OrgId).big_integer().not_null())
                    .col(ColumnDef::new(Doctors::GivenName).text().not_null())
                    .col(ColumnDef::new(Doctors::FamilyName).text().not_null())
                    .col(ColumnDef::new(Doctors::Specialty).text().not_null())
                    .col(
                        ColumnDef::new(Doctors::ConsultationFee)
                            .decimal_len(10, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Doctors::Active)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Doctors::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Doctors::Table, Doctors::OrgId)
                            .to(Organisations::Table, Organisations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_doctors_org")
                    .table(Doctors::Table)
                    .col(Doctors::OrgId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Appointments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Appointments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Appointments::OrgId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Appointments::PatientId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Appointments::DoctorId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Appointments::ScheduledStart)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Appointments::ScheduledEnd)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Appointments::Reason).text())
                    .col(ColumnDef::new(Appointments::Status).text().not_null())
                    .col(
                        ColumnDef::new(Appointments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Appointments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Appointments::Table, Appointments::OrgId)
                            .to(Organisations::Table, Organisations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Appointments::Table, Appointments::PatientId)
                            .to(Patients::Table, Patients::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Appointments::Table, Appointments::DoctorId)
                            .to(Doctors::Table, Doctors::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_appointments_org")
                    .table(Appointments::Table)
                    .col(Appointments::OrgId)
                    .to_owned(),
            )
            .await?;

        // Agenda and overlap lookups scan one doctor's day.
        manager
            .create_index(
                Index::create()
                    .name("idx_appointments_doctor_start")
                    .table(Appointments::Table)
                    .col(Appointments::DoctorId)
                    .col(Appointments::ScheduledStart)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Visits::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Visits::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Visits::OrgId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Visits::AppointmentId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Visits::PatientId).big_integer().not_null())
                    .col(ColumnDef::new(Visits::DoctorId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Visits::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Visits::EndedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(Visits::BloodPressure).text())
                    .col(ColumnDef::new(Visits::PulseBpm).integer())
                    .col(ColumnDef::new(Visits::TemperatureC).decimal_len(5, 2))
                    .col(ColumnDef::new(Visits::Diagnosis).text())
                    .col(ColumnDef::new(Visits::Notes).text())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Visits::Table, Visits::OrgId)
                            .to(Organisations::Table, Organisations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Visits::Table, Visits::AppointmentId)
                            .to(Appointments::Table, Appointments::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Visits::Table, Visits::PatientId)
                            .to(Patients::Table, Patients::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Visits::Table, Visits::DoctorId)
                            .to(Doctors::Table, Doctors::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_visits_org")
                    .table(Visits::Table)
                    .col(Visits::OrgId)
                    .to_owned(),
            )
            .await?;

        // An appointment produces at most one visit.
        manager
            .create_index(
                Index::create()
                    .name("uq_visits_appointment")
                    .table(Visits::Table)
                    .col(Visits::AppointmentId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_visits_patient")
                    .table(Visits::Table)
                    .col(Visits::PatientId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Prescriptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Prescriptions::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Prescriptions::OrgId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Prescriptions::VisitId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Prescriptions::PatientId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Prescriptions::Medication).text().not_null())
                    .col(ColumnDef::new(Prescriptions::Dosage).text().not_null())
                    .col(ColumnDef::new(Prescriptions::Frequency).text().not_null())
                    .col(
                        ColumnDef::new(Prescriptions::DurationDays)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Prescriptions::Instructions).text())
                    .col(
                        ColumnDef::new(Prescriptions::IssuedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Prescriptions::Table, Prescriptions::OrgId)
                            .to(Organisations::Table, Organisations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Prescriptions::Table, Prescriptions::VisitId)
                            .to(Visits::Table, Visits::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Prescriptions::Table, Prescriptions::PatientId)
                            .to(Patients::Table, Patients::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_prescriptions_org")
                    .table(Prescriptions::Table)
                    .col(Prescriptions::OrgId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_prescriptions_patient")
                    .table(Prescriptions::Table)
                    .col(Prescriptions::PatientId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LabOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LabOrders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LabOrders::OrgId).big_integer().not_null())
                    .col(
                        ColumnDef::new(LabOrders::PatientId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(LabOrders::OrderedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LabOrders::TestName).text().not_null())
                    .col(ColumnDef::new(LabOrders::Status).text().not_null())
                    .col(
                        ColumnDef::new(LabOrders::OrderedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LabOrders::CompletedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .from(LabOrders::Table, LabOrders::OrgId)
                            .to(Organisations::Table, Organisations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(LabOrders::Table, LabOrders::PatientId)
                            .to(Patients::Table, Patients::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(LabOrders::Table, LabOrders::OrderedBy)
                            .to(Doctors::Table, Doctors::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_lab_orders_org")
                    .table(LabOrders::Table)
                    .col(LabOrders::OrgId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_lab_orders_patient")
                    .table(LabOrders::Table)
                    .col(LabOrders::PatientId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LabResults::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LabResults::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LabResults::OrgId).big_integer().not_null())
                    .col(ColumnDef::new(LabResults::OrderId).big_integer().not_null())
                    .col(
                        ColumnDef::new(LabResults::PatientId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LabResults::Category).text().not_null())
                    .col(ColumnDef::new(LabResults::Name).text().not_null())
                    .col(ColumnDef::new(LabResults::Value).text().not_null())
                    .col(ColumnDef::new(LabResults::Unit).text())
                    .col(ColumnDef::new(LabResults::ReferenceRange).text())
                    .col(
                        ColumnDef::new(LabResults::Flagged)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(LabResults::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(LabResults::Table, LabResults::OrgId)
                            .to(Organisations::Table, Organisations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(LabResults::Table, LabResults::OrderId)
                            .to(LabOrders::Table, LabOrders::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(LabResults::Table, LabResults::PatientId)
                            .to(Patients::Table, Patients::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_lab_results_org")
                    .table(LabResults::Table)
                    .col(LabResults::OrgId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_lab_results_order")
                    .table(LabResults::Table)
                    .col(LabResults::OrderId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_lab_results_patient")
                    .table(LabResults::Table)
                    .col(LabResults::PatientId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(RadiologyOrders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RadiologyOrders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RadiologyOrders::OrgId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RadiologyOrders::PatientId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(RadiologyOrders::OrderedBy)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RadiologyOrders::Modality).text().not_null())
                    .col(ColumnDef::new(RadiologyOrders::BodySite).text().not_null())
                    .col(ColumnDef::new(RadiologyOrders::Status).text().not_null())
                    .col(ColumnDef::new(RadiologyOrders::Report).text())
                    .col(
                        ColumnDef::new(RadiologyOrders::OrderedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RadiologyOrders::ReportedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .from(RadiologyOrders::Table, RadiologyOrders::OrgId)
                            .to(Organisations::Table, Organisations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RadiologyOrders::Table, RadiologyOrders::PatientId)
                            .to(Patients::Table, Patients::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(RadiologyOrders::Table, RadiologyOrders::OrderedBy)
                            .to(Doctors::Table, Doctors::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_radiology_orders_org")
                    .table(RadiologyOrders::Table)
                    .col(RadiologyOrders::OrgId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_radiology_orders_patient")
                    .table(RadiologyOrders::Table)
                    .col(RadiologyOrders::PatientId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Invoices::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Invoices::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Invoices::OrgId).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::PatientId).big_integer().not_null())
                    .col(ColumnDef::new(Invoices::VisitId).big_integer())
                    .col(ColumnDef::new(Invoices::Total).decimal_len(10, 2).not_null())
                    .col(ColumnDef::new(Invoices::Status).text().not_null())
                    .col(ColumnDef::new(Invoices::IssuedOn).date().not_null())
                    .col(
                        ColumnDef::new(Invoices::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Invoices::Table, Invoices::OrgId)
                            .to(Organisations::Table, Organisations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Invoices::Table, Invoices::PatientId)
                            .to(Patients::Table, Patients::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Invoices::Table, Invoices::VisitId)
                            .to(Visits::Table, Visits::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_org")
                    .table(Invoices::Table)
                    .col(Invoices::OrgId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_invoices_patient")
                    .table(Invoices::Table)
                    .col(Invoices::PatientId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Payments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Payments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Payments::OrgId).big_integer().not_null())
                    .col(ColumnDef::new(Payments::InvoiceId).big_integer().not_null())
                    .col(ColumnDef::new(Payments::Amount).decimal_len(10, 2).not_null())
                    .col(ColumnDef::new(Payments::Method).text().not_null())
                    .col(ColumnDef::new(Payments::Reference).text())
                    .col(
                        ColumnDef::new(Payments::ReceivedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Payments::Table, Payments::OrgId)
                            .to(Organisations::Table, Organisations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Payments::Table, Payments::InvoiceId)
                            .to(Invoices::Table, Invoices::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_org")
                    .table(Payments::Table)
                    .col(Payments::OrgId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_payments_invoice")
                    .table(Payments::Table)
                    .col(Payments::InvoiceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrgSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrgSettings::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrgSettings::OrgId).big_integer().not_null())
                    .col(ColumnDef::new(OrgSettings::ClinicName).text())
                    .col(ColumnDef::new(OrgSettings::Currency).text().not_null())
                    .col(ColumnDef::new(OrgSettings::Timezone).text().not_null())
                    .col(
                        ColumnDef::new(OrgSettings::DefaultAppointmentMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrgSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(OrgSettings::Table, OrgSettings::OrgId)
                            .to(Organisations::Table, Organisations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // At most one settings row per organisation.
        manager
            .create_index(
                Index::create()
                    .name("uq_org_settings_org")
                    .table(OrgSettings::Table)
                    .col(OrgSettings::OrgId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Notifications::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Notifications::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Notifications::OrgId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Notifications::RecipientId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Notifications::Message).text().not_null())
                    .col(ColumnDef::new(Notifications::ReadAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(Notifications::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Notifications::Table, Notifications::OrgId)
                            .to(Organisations::Table, Organisations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_org")
                    .table(Notifications::Table)
                    .col(Notifications::OrgId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_notifications_recipient")
                    .table(Notifications::Table)
                    .col(Notifications::RecipientId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrgSettings::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Payments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Invoices::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(RadiologyOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LabResults::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LabOrders::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Prescriptions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Visits::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Appointments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Doctors::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Patients::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Members::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Organisations::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Organisations {
    Table,
    Id,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum Members {
    Table,
    Id,
    OrgId,
    UserId,
    DisplayName,
    Role,
    CreatedAt,
}

#[derive(Iden)]
enum Patients {
    Table,
    Id,
    OrgId,
    Mrn,
    GivenName,
    FamilyName,
    DateOfBirth,
    Sex,
    Phone,
    Email,
    Address,
    Archived,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Doctors {
    Table,
    Id,
    OrgId,
    GivenName,
    FamilyName,
    Specialty,
    ConsultationFee,
    Active,
    CreatedAt,
}

#[derive(Iden)]
enum Appointments {
    Table,
    Id,
    OrgId,
    PatientId,
    DoctorId,
    ScheduledStart,
    ScheduledEnd,
    Reason,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Visits {
    Table,
    Id,
    OrgId,
    AppointmentId,
    PatientId,
    DoctorId,
    StartedAt,
    EndedAt,
    BloodPressure,
    PulseBpm,
    TemperatureC,
    Diagnosis,
    Notes,
}

#[derive(Iden)]
enum Prescriptions {
    Table,
    Id,
    OrgId,
    VisitId,
    PatientId,
    Medication,
    Dosage,
    Frequency,
    DurationDays,
    Instructions,
    IssuedAt,
}

#[derive(Iden)]
enum LabOrders {
    Table,
    Id,
    OrgId,
    PatientId,
    OrderedBy,
    TestName,
    Status,
    OrderedAt,
    CompletedAt,
}

#[derive(Iden)]
enum LabResults {
    Table,
    Id,
    OrgId,
    OrderId,
    PatientId,
    Category,
    Name,
    Value,
    Unit,
    ReferenceRange,
    Flagged,
    RecordedAt,
}

#[derive(Iden)]
enum RadiologyOrders {
    Table,
    Id,
    OrgId,
    PatientId,
    OrderedBy,
    Modality,
    BodySite,
    Status,
    Report,
    OrderedAt,
    ReportedAt,
}

#[derive(Iden)]
enum Invoices {
    Table,
    Id,
    OrgId,
    PatientId,
    VisitId,
    Total,
    Status,
    IssuedOn,
    CreatedAt,
}

#[derive(Iden)]
enum Payments {
    Table,
    Id,
    OrgId,
    InvoiceId,
    Amount,
    Method,
    Reference,
    ReceivedAt,
}

#[derive(Iden)]
enum OrgSettings {
    Table,
    Id,
    OrgId,
    ClinicName,
    Currency,
    Timezone,
    DefaultAppointmentMinutes,
    UpdatedAt,
}

#[derive(Iden)]
enum Notifications {
    Table,
    Id,
    OrgId,
    RecipientId,
    Message,
    ReadAt,
    CreatedAt,
}
