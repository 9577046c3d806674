use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Guardian of one or more minors, or a self-enrolling adult.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResponsibleParty {
    pub responsible_party_id: Uuid,
    pub name: String,
    pub last_name: String,
    pub document_type: String,
    pub document_number: String,
    pub birth_date: NaiveDate,
    pub email: Option<String>,
    pub mobile: String,
    pub address: String,
    pub city: String,
    pub department: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Student {
    pub student_id: Uuid,
    pub parent_id: Option<Uuid>,
    pub name: String,
    pub last_name: String,
    pub document_type: String,
    pub document_number: String,
    pub birth_date: NaiveDate,
    pub gender: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MusicalProfile {
    pub musical_profile_id: Uuid,
    pub student_id: Uuid,
    pub modality: String,
    pub has_instrument_experience: bool,
    pub desired_instrument: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AcademicProgram {
    pub program_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub duration_months: i32,
    pub monthly_fee: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Schedule {
    pub schedule_id: Uuid,
    pub program_id: Uuid,
    pub days_of_week: Vec<String>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub teacher_name: String,
    pub max_students: i32,
    pub enrolled_count: i32,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Schedule {
    pub fn available_slots(&self) -> i32 {
        self.max_students - self.enrolled_count
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Enrollment {
    pub enrollment_id: Uuid,
    pub student_id: Uuid,
    pub program_id: Uuid,
    pub status: String,
    pub enrollment_date: NaiveDate,
    pub enrolled_level: Option<String>,
    pub payment_commitment: bool,
    pub parental_authorization: bool,
    pub authorized_by: Option<String>,
    pub authorization_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ScheduleEnrollment {
    pub schedule_enrollment_id: Uuid,
    pub schedule_id: Uuid,
    pub student_id: Uuid,
    pub enrollment_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Payment {
    pub payment_id: Uuid,
    pub enrollment_id: Uuid,
    pub student_id: Uuid,
    pub program_id: Uuid,
    pub concept: String,
    pub amount: Decimal,
    pub original_amount: Decimal,
    pub paid_amount: Decimal,
    pub remaining_amount: Decimal,
    pub status: String,
    pub due_date: NaiveDate,
    pub payment_date: Option<DateTime<Utc>>,
    pub payment_method: Option<String>,
    pub gateway_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Immutable settlement record; one per completed payment.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PaymentTransaction {
    pub transaction_id: Uuid,
    pub payment_id: Uuid,
    pub amount: Decimal,
    pub method: String,
    pub external_reference: String,
    pub transaction_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
    pub roles: Vec<String>,
    pub hashed_password: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
