use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Age tier determining the base admission price of a student.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Kids,
    Teens,
    Big,
}

impl Modality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Modality::Kids => "kids",
            Modality::Teens => "teens",
            Modality::Big => "big",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "kids" => Some(Modality::Kids),
            "teens" => Some(Modality::Teens),
            "big" => Some(Modality::Big),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    Cc,
    Ti,
    Ce,
    Passport,
    RegistroCivil,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Cc => "cc",
            DocumentType::Ti => "ti",
            DocumentType::Ce => "ce",
            DocumentType::Passport => "passport",
            DocumentType::RegistroCivil => "registro_civil",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Female,
    Male,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Female => "female",
            Gender::Male => "male",
            Gender::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Active,
    Waiting,
    Suspended,
    Completed,
    Cancelled,
}

impl EnrollmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrollmentStatus::Active => "active",
            EnrollmentStatus::Waiting => "waiting",
            EnrollmentStatus::Suspended => "suspended",
            EnrollmentStatus::Completed => "completed",
            EnrollmentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(EnrollmentStatus::Active),
            "waiting" => Some(EnrollmentStatus::Waiting),
            "suspended" => Some(EnrollmentStatus::Suspended),
            "completed" => Some(EnrollmentStatus::Completed),
            "cancelled" => Some(EnrollmentStatus::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Overdue => "overdue",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending" => Some(PaymentStatus::Pending),
            "completed" => Some(PaymentStatus::Completed),
            "overdue" => Some(PaymentStatus::Overdue),
            _ => None,
        }
    }
}

/// How the family intends to settle the generated payments.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethodChoice {
    Online,
    Manual,
}

/// Concrete instrument used when a payment actually settles.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettlementMethod {
    Card,
    Pse,
    Cash,
    Transfer,
}

impl SettlementMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementMethod::Card => "card",
            SettlementMethod::Pse => "pse",
            SettlementMethod::Cash => "cash",
            SettlementMethod::Transfer => "transfer",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "card" | "CARD" => Some(SettlementMethod::Card),
            "pse" | "PSE" => Some(SettlementMethod::Pse),
            "cash" | "CASH" => Some(SettlementMethod::Cash),
            "transfer" | "TRANSFER" | "BANCOLOMBIA_TRANSFER" => Some(SettlementMethod::Transfer),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserRole {
    Administrador,
    Profesor,
    Estudiante,
    Responsable,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Administrador => "administrador",
            UserRole::Profesor => "profesor",
            UserRole::Estudiante => "estudiante",
            UserRole::Responsable => "responsable",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "administrador" => Some(UserRole::Administrador),
            "profesor" => Some(UserRole::Profesor),
            "estudiante" => Some(UserRole::Estudiante),
            "responsable" => Some(UserRole::Responsable),
            _ => None,
        }
    }
}

// Common response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}
