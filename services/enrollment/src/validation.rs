use kairos_common::FieldErrors;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::models::EnrollmentSubmission;

/// Full fail-fast validation pass: derive-based field checks plus the
/// cross-field rules the derive cannot express. Nothing is persisted when
/// this returns an error.
pub fn validate_submission(submission: &EnrollmentSubmission) -> FieldErrors {
    let mut errors = FieldErrors::new();

    if let Err(derive_errors) = submission.validate() {
        flatten_errors("", &derive_errors, &mut errors);
    }

    if submission.students.is_empty() {
        errors.push("students", "at least one student selection is required");
    }

    if !submission.payment_commitment {
        errors.push("payment_commitment", "the payment commitment must be accepted");
    }

    if submission.is_minor && !submission.parental_authorization {
        errors.push(
            "parental_authorization",
            "parental authorization is required when enrolling minors",
        );
    }

    if !submission.is_minor && submission.students.len() > 1 {
        errors.push(
            "students",
            "adult submissions enroll exactly one student: the responsible party",
        );
    }

    // Reject in-batch duplicates early; the database constraint would only
    // catch them at commit time.
    for (i, student) in submission.students.iter().enumerate() {
        let duplicated = submission.students[..i].iter().any(|prior| {
            prior.document_number == student.document_number
                && prior.program_id == student.program_id
        });
        if duplicated {
            errors.push(
                format!("students[{}].program_id", i),
                "this student is already selected for the same program in this submission",
            );
        }
    }

    errors
}

fn flatten_errors(prefix: &str, source: &ValidationErrors, out: &mut FieldErrors) {
    for (field, kind) in source.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for error in field_errors {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid value for {}", path));
                    out.push(path.clone(), message);
                }
            }
            ValidationErrorsKind::Struct(nested) => {
                flatten_errors(&path, nested, out);
            }
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    flatten_errors(&format!("{}[{}]", path, index), nested, out);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResponsiblePartyPayload, StudentPayload};
    use chrono::NaiveDate;
    use kairos_common::{
        AppError, DocumentType, Gender, Modality, PaymentMethodChoice,
    };
    use uuid::Uuid;

    fn guardian() -> ResponsiblePartyPayload {
        ResponsiblePartyPayload {
            name: "María".to_string(),
            last_name: "Pérez".to_string(),
            document_type: DocumentType::Cc,
            document_number: "10203040".to_string(),
            birth_date: NaiveDate::from_ymd_opt(1985, 3, 14).unwrap(),
            email: "maria.perez@example.com".to_string(),
            mobile: "3001234567".to_string(),
            address: "Calle 10 #4-21".to_string(),
            city: "Bogotá".to_string(),
            department: "Cundinamarca".to_string(),
        }
    }

    fn child(document: &str, program_id: Uuid) -> StudentPayload {
        StudentPayload {
            name: "Juan".to_string(),
            last_name: "Pérez".to_string(),
            document_type: DocumentType::Ti,
            document_number: document.to_string(),
            birth_date: NaiveDate::from_ymd_opt(2014, 6, 1).unwrap(),
            gender: Gender::Male,
            email: None,
            modality: Modality::Kids,
            has_instrument_experience: false,
            desired_instrument: Some("Piano".to_string()),
            enrolled_level: None,
            program_id,
            schedule_id: None,
        }
    }

    fn minor_submission() -> EnrollmentSubmission {
        EnrollmentSubmission {
            responsible_party: guardian(),
            is_minor: true,
            students: vec![child("99001122", Uuid::new_v4())],
            parental_authorization: true,
            payment_commitment: true,
            payment_method: PaymentMethodChoice::Manual,
        }
    }

    fn fields_of(errors: FieldErrors) -> Vec<String> {
        match errors.into_result() {
            Err(AppError::Validation(map)) => {
                let mut keys: Vec<String> = map.into_keys().collect();
                keys.sort();
                keys
            }
            Ok(()) => Vec::new(),
            Err(other) => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn valid_minor_submission_passes() {
        assert!(validate_submission(&minor_submission()).is_empty());
    }

    #[test]
    fn missing_commitment_and_authorization_are_field_errors() {
        let mut submission = minor_submission();
        submission.payment_commitment = false;
        submission.parental_authorization = false;

        let fields = fields_of(validate_submission(&submission));
        assert_eq!(fields, vec!["parental_authorization", "payment_commitment"]);
    }

    #[test]
    fn adult_submission_does_not_need_parental_authorization() {
        let mut submission = minor_submission();
        submission.is_minor = false;
        submission.parental_authorization = false;

        assert!(validate_submission(&submission).is_empty());
    }

    #[test]
    fn adult_submission_with_two_students_is_rejected() {
        let mut submission = minor_submission();
        submission.is_minor = false;
        submission.students.push(child("11223344", Uuid::new_v4()));

        let fields = fields_of(validate_submission(&submission));
        assert!(fields.contains(&"students".to_string()));
    }

    #[test]
    fn nested_student_errors_carry_indexed_paths() {
        let mut submission = minor_submission();
        submission.students[0].name = String::new();
        submission.students[0].email = Some("not-an-email".to_string());

        let fields = fields_of(validate_submission(&submission));
        assert!(fields.contains(&"students[0].name".to_string()));
        assert!(fields.contains(&"students[0].email".to_string()));
    }

    #[test]
    fn duplicate_student_program_pair_in_batch_is_rejected() {
        let program = Uuid::new_v4();
        let mut submission = minor_submission();
        submission.students = vec![child("55667788", program), child("55667788", program)];

        let fields = fields_of(validate_submission(&submission));
        assert!(fields.contains(&"students[1].program_id".to_string()));
    }

    #[test]
    fn empty_batch_is_rejected() {
        let mut submission = minor_submission();
        submission.students.clear();

        let fields = fields_of(validate_submission(&submission));
        assert!(fields.contains(&"students".to_string()));
    }

    #[test]
    fn guardian_email_is_required_and_validated() {
        let mut submission = minor_submission();
        submission.responsible_party.email = "broken".to_string();

        let fields = fields_of(validate_submission(&submission));
        assert!(fields.contains(&"responsible_party.email".to_string()));
    }
}
