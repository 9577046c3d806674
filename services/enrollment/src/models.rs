use chrono::NaiveDate;
use kairos_common::{CheckoutHandle, DocumentType, Gender, Modality, PaymentMethodChoice};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

// Request DTOs

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EnrollmentSubmission {
    #[validate]
    pub responsible_party: ResponsiblePartyPayload,

    pub is_minor: bool,

    /// One payload per student. For adult submissions this is the
    /// responsible party's own selection.
    #[validate]
    pub students: Vec<StudentPayload>,

    pub parental_authorization: bool,
    pub payment_commitment: bool,
    pub payment_method: PaymentMethodChoice,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ResponsiblePartyPayload {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "last name is required"))]
    pub last_name: String,

    pub document_type: DocumentType,

    #[validate(length(min = 3, max = 30, message = "document number is required"))]
    pub document_number: String,

    pub birth_date: NaiveDate,

    #[validate(email(message = "a valid email is required"))]
    pub email: String,

    #[validate(length(min = 7, max = 30, message = "mobile number is required"))]
    pub mobile: String,

    #[validate(length(min = 1, max = 255, message = "address is required"))]
    pub address: String,

    #[validate(length(min = 1, max = 100, message = "city is required"))]
    pub city: String,

    #[validate(length(min = 1, max = 100, message = "department is required"))]
    pub department: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct StudentPayload {
    #[validate(length(min = 1, max = 100, message = "name is required"))]
    pub name: String,

    #[validate(length(min = 1, max = 100, message = "last name is required"))]
    pub last_name: String,

    pub document_type: DocumentType,

    #[validate(length(min = 3, max = 30, message = "document number is required"))]
    pub document_number: String,

    pub birth_date: NaiveDate,
    pub gender: Gender,

    // Minors may omit email.
    #[validate(email(message = "email must be valid when present"))]
    pub email: Option<String>,

    pub modality: Modality,

    #[serde(default)]
    pub has_instrument_experience: bool,

    pub desired_instrument: Option<String>,
    pub enrolled_level: Option<String>,

    pub program_id: Uuid,
    pub schedule_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentStatusChange {
    pub status: kairos_common::EnrollmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateProgramRequest {
    #[validate(length(min = 1, max = 150))]
    pub name: String,

    pub description: Option<String>,

    #[validate(range(min = 1, max = 60))]
    pub duration_months: i32,

    pub monthly_fee: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProgramRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub duration_months: Option<i32>,
    pub monthly_fee: Option<Decimal>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateScheduleRequest {
    #[validate(length(min = 1, message = "at least one day is required"))]
    pub days_of_week: Vec<String>,

    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,

    #[validate(length(min = 1, max = 150))]
    pub teacher_name: String,

    #[validate(range(min = 1, max = 100))]
    pub max_students: i32,
}

// Response DTOs

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionResult {
    pub responsible_party_id: Uuid,
    pub enrollments: Vec<EnrollmentSummary>,
    pub payments: Vec<PaymentSummary>,
    pub warnings: Vec<SubmissionWarning>,
    pub checkout: Option<CheckoutHandle>,
    pub confirmation: Option<ConfirmationReceipt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrollmentSummary {
    pub enrollment_id: Uuid,
    pub student_id: Uuid,
    pub student_name: String,
    pub program_id: Uuid,
    pub program_name: String,
    pub status: String,
    pub admission_price: Decimal,
    pub discount_applied: Decimal,
    pub schedule_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentSummary {
    pub payment_id: Uuid,
    pub enrollment_id: Uuid,
    pub concept: String,
    pub amount: Decimal,
    pub status: String,
    pub due_date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmissionWarning {
    pub code: String,
    pub message: String,
    pub student_id: Option<Uuid>,
    pub schedule_id: Option<Uuid>,
}

impl SubmissionWarning {
    pub fn schedule_full(student_id: Uuid, schedule_id: Uuid) -> Self {
        Self {
            code: "SCHEDULE_FULL".to_string(),
            message: "The selected schedule filled up; the student was enrolled \
                      in the program without a schedule binding"
                .to_string(),
            student_id: Some(student_id),
            schedule_id: Some(schedule_id),
        }
    }

    pub fn gateway_unavailable(message: String) -> Self {
        Self {
            code: "GATEWAY_ERROR".to_string(),
            message,
            student_id: None,
            schedule_id: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationReceipt {
    pub message: String,
    pub total_due: Decimal,
    pub payment_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramWithSchedules {
    pub program: kairos_database::AcademicProgram,
    pub schedules: Vec<ScheduleSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub schedule_id: Uuid,
    pub days_of_week: Vec<String>,
    pub start_time: chrono::NaiveTime,
    pub end_time: chrono::NaiveTime,
    pub teacher_name: String,
    pub available_slots: i32,
}
