use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use kairos_auth::JwtService;
use kairos_common::{AppError, FieldErrors, PaymentMethodChoice, PaymentStatus};
use kairos_database::{AcademicProgram, Enrollment, ResponsibleParty, Student};

use crate::catalog::CatalogService;
use kairos_common::gateway as checkout;
use crate::config::EnrollmentConfig;
use crate::discount::{family_discount, DiscountInput};
use crate::ledger::{self, GenerationInput, ADMISSION_CONCEPT};
use crate::models::*;
use crate::notifications::Mailer;
use crate::validation::validate_submission;

#[derive(Clone)]
pub struct AppState {
    pub config: EnrollmentConfig,
    pub db_pool: PgPool,
    pub jwt_service: JwtService,
    pub catalog: CatalogService,
    pub enrollment_service: EnrollmentService,
}

/// Multi-party enrollment orchestrator: one responsible party, one or
/// more students, all persisted in a single transaction.
#[derive(Clone)]
pub struct EnrollmentService {
    db_pool: PgPool,
    catalog: CatalogService,
    mailer: Mailer,
    config: EnrollmentConfig,
}

impl EnrollmentService {
    pub fn new(
        db_pool: PgPool,
        catalog: CatalogService,
        mailer: Mailer,
        config: EnrollmentConfig,
    ) -> Self {
        Self {
            db_pool,
            catalog,
            mailer,
            config,
        }
    }

    pub async fn submit_enrollment(
        &self,
        submission: EnrollmentSubmission,
    ) -> Result<SubmissionResult, AppError> {
        validate_submission(&submission).into_result()?;

        let programs = self.resolve_selections(&submission).await?;

        let today = Utc::now().date_naive();
        let mut warnings: Vec<SubmissionWarning> = Vec::new();
        let mut enrollments: Vec<EnrollmentSummary> = Vec::new();
        let mut payments: Vec<PaymentSummary> = Vec::new();

        let mut tx = self.db_pool.begin().await.map_err(AppError::Database)?;

        let responsible_party =
            upsert_responsible_party(&mut tx, &submission.responsible_party).await?;

        let discounts = self.compute_discounts(&submission);

        let mut first_admission_payment: Option<Uuid> = None;

        for (i, payload) in submission.students.iter().enumerate() {
            let program = &programs[i];
            let student = upsert_student(
                &mut tx,
                payload,
                submission.is_minor.then_some(responsible_party.responsible_party_id),
            )
            .await?;

            let enrollment =
                insert_enrollment(&mut tx, &submission, payload, &student, program, today).await?;

            let bound_schedule = match payload.schedule_id {
                Some(schedule_id) => {
                    let bound = bind_schedule(
                        &mut tx,
                        schedule_id,
                        student.student_id,
                        enrollment.enrollment_id,
                    )
                    .await?;
                    if !bound {
                        warnings
                            .push(SubmissionWarning::schedule_full(student.student_id, schedule_id));
                    }
                    bound.then_some(schedule_id)
                }
                None => None,
            };

            let base_price = self.config.tuition.base_price(payload.modality);
            let discount = discounts[i];
            let admission_price = base_price - discount;

            let generated = ledger::generate_for_enrollment(
                &mut tx,
                &GenerationInput {
                    enrollment_id: enrollment.enrollment_id,
                    student_id: student.student_id,
                    program_id: program.program_id,
                    admission_price,
                    monthly_fee: program.monthly_fee,
                    enrollment_date: today,
                    today,
                    lookback_months: self.config.tuition.lookback_months,
                },
            )
            .await?;

            if first_admission_payment.is_none() {
                first_admission_payment = generated
                    .iter()
                    .find(|p| {
                        p.concept == ADMISSION_CONCEPT
                            && p.status == PaymentStatus::Pending.as_str()
                    })
                    .map(|p| p.payment_id);
            }

            enrollments.push(EnrollmentSummary {
                enrollment_id: enrollment.enrollment_id,
                student_id: student.student_id,
                student_name: format!("{} {}", student.name, student.last_name),
                program_id: program.program_id,
                program_name: program.name.clone(),
                status: enrollment.status,
                admission_price,
                discount_applied: discount,
                schedule_id: bound_schedule,
            });

            payments.extend(generated.into_iter().map(|p| PaymentSummary {
                payment_id: p.payment_id,
                enrollment_id: p.enrollment_id,
                concept: p.concept,
                amount: p.amount,
                status: p.status,
                due_date: p.due_date,
            }));
        }

        // The gateway reference is assigned inside the transaction so a
        // later webhook can always resolve it; the handle itself is built
        // after commit and degrades to a warning on failure.
        let checkout_reference = match submission.payment_method {
            PaymentMethodChoice::Online => {
                let payment_id = first_admission_payment.ok_or_else(|| {
                    AppError::Gateway("No pending admission payment to check out".to_string())
                })?;
                let reference = checkout::new_reference(payment_id);
                assign_gateway_reference(&mut tx, payment_id, &reference).await?;
                Some((payment_id, reference))
            }
            PaymentMethodChoice::Manual => None,
        };

        tx.commit().await.map_err(AppError::Database)?;

        let total_due: Decimal = payments
            .iter()
            .filter(|p| p.status == PaymentStatus::Pending.as_str())
            .map(|p| p.amount)
            .sum();

        let (checkout_handle, confirmation) = match checkout_reference {
            Some((payment_id, reference)) => {
                let amount = payments
                    .iter()
                    .find(|p| p.payment_id == payment_id)
                    .map(|p| p.amount)
                    .unwrap_or_default();

                match checkout::build_checkout_handle(&self.config.gateway, reference, amount) {
                    Ok(handle) => (Some(handle), None),
                    Err(e) => {
                        tracing::warn!("checkout handle creation failed: {}", e);
                        warnings.push(SubmissionWarning::gateway_unavailable(e.to_string()));
                        (None, None)
                    }
                }
            }
            None => (
                None,
                Some(ConfirmationReceipt {
                    message: "Enrollment registered; payments are pending in-person settlement"
                        .to_string(),
                    total_due,
                    payment_count: payments.len(),
                }),
            ),
        };

        tracing::info!(
            "enrollment submitted: responsible party {}, {} student(s), {} payment(s)",
            responsible_party.responsible_party_id,
            enrollments.len(),
            payments.len()
        );

        self.mailer.spawn_enrollment_confirmation(
            responsible_party.email.clone().unwrap_or_default(),
            enrollments.iter().map(|e| e.student_name.clone()).collect(),
            total_due,
        );

        Ok(SubmissionResult {
            responsible_party_id: responsible_party.responsible_party_id,
            enrollments,
            payments,
            warnings,
            checkout: checkout_handle,
            confirmation,
        })
    }

    pub async fn change_enrollment_status(
        &self,
        enrollment_id: Uuid,
        change: EnrollmentStatusChange,
    ) -> Result<Enrollment, AppError> {
        sqlx::query_as::<_, Enrollment>(
            "UPDATE enrollments SET status = $2, updated_at = NOW() WHERE enrollment_id = $1 RETURNING *",
        )
        .bind(enrollment_id)
        .bind(change.status.as_str())
        .fetch_optional(&self.db_pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("Enrollment {} not found", enrollment_id)))
    }

    /// Resolves every program/schedule selection against the catalog,
    /// collecting per-field errors before anything is written.
    async fn resolve_selections(
        &self,
        submission: &EnrollmentSubmission,
    ) -> Result<Vec<AcademicProgram>, AppError> {
        let mut errors = FieldErrors::new();
        let mut programs = Vec::with_capacity(submission.students.len());

        for (i, student) in submission.students.iter().enumerate() {
            match self.catalog.find_active_program(student.program_id).await? {
                Some(program) => {
                    if let Some(schedule_id) = student.schedule_id {
                        match self.catalog.find_schedule(schedule_id).await? {
                            // Capacity is not checked here: a full schedule
                            // degrades to a warning at binding time instead
                            // of failing the submission.
                            Some(schedule)
                                if schedule.program_id == program.program_id
                                    && schedule.status == "active" => {}
                            _ => errors.push(
                                format!("students[{}].schedule_id", i),
                                "schedule not found for the selected program",
                            ),
                        }
                    }
                    programs.push(program);
                }
                None => {
                    errors.push(
                        format!("students[{}].program_id", i),
                        "program not found or not active",
                    );
                }
            }
        }

        errors.into_result()?;
        Ok(programs)
    }

    fn compute_discounts(&self, submission: &EnrollmentSubmission) -> Vec<Decimal> {
        if !submission.is_minor {
            return vec![Decimal::ZERO; submission.students.len()];
        }

        let batch: Vec<DiscountInput> = submission
            .students
            .iter()
            .map(|s| DiscountInput {
                last_name: s.last_name.clone(),
                base_price: self.config.tuition.base_price(s.modality),
            })
            .collect();

        family_discount(
            &batch,
            self.config.tuition.sibling_threshold,
            self.config.tuition.sibling_discount_percentage,
        )
    }
}

async fn upsert_responsible_party(
    tx: &mut Transaction<'_, Postgres>,
    payload: &ResponsiblePartyPayload,
) -> Result<ResponsibleParty, AppError> {
    // Idempotent on document number, falling back to email for adults
    // whose document was never captured.
    let existing = sqlx::query_as::<_, ResponsibleParty>(
        "SELECT * FROM responsible_parties WHERE document_number = $1 OR email = $2",
    )
    .bind(&payload.document_number)
    .bind(&payload.email)
    .fetch_optional(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    let row = match existing {
        Some(current) => {
            sqlx::query_as::<_, ResponsibleParty>(
                r#"
                UPDATE responsible_parties
                SET name = $2, last_name = $3, document_type = $4, document_number = $5,
                    birth_date = $6, email = $7, mobile = $8, address = $9,
                    city = $10, department = $11, updated_at = NOW()
                WHERE responsible_party_id = $1
                RETURNING *
                "#,
            )
            .bind(current.responsible_party_id)
            .bind(&payload.name)
            .bind(&payload.last_name)
            .bind(payload.document_type.as_str())
            .bind(&payload.document_number)
            .bind(payload.birth_date)
            .bind(&payload.email)
            .bind(&payload.mobile)
            .bind(&payload.address)
            .bind(&payload.city)
            .bind(&payload.department)
            .fetch_one(&mut **tx)
            .await
            .map_err(AppError::Database)?
        }
        None => {
            sqlx::query_as::<_, ResponsibleParty>(
                r#"
                INSERT INTO responsible_parties
                    (name, last_name, document_type, document_number, birth_date,
                     email, mobile, address, city, department)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING *
                "#,
            )
            .bind(&payload.name)
            .bind(&payload.last_name)
            .bind(payload.document_type.as_str())
            .bind(&payload.document_number)
            .bind(payload.birth_date)
            .bind(&payload.email)
            .bind(&payload.mobile)
            .bind(&payload.address)
            .bind(&payload.city)
            .bind(&payload.department)
            .fetch_one(&mut **tx)
            .await
            .map_err(AppError::Database)?
        }
    };

    Ok(row)
}

async fn upsert_student(
    tx: &mut Transaction<'_, Postgres>,
    payload: &StudentPayload,
    parent_id: Option<Uuid>,
) -> Result<Student, AppError> {
    let existing = sqlx::query_as::<_, Student>(
        "SELECT * FROM students WHERE document_number = $1",
    )
    .bind(&payload.document_number)
    .fetch_optional(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    let student = match existing {
        Some(current) => {
            sqlx::query_as::<_, Student>(
                r#"
                UPDATE students
                SET parent_id = COALESCE($2, parent_id), name = $3, last_name = $4,
                    document_type = $5, birth_date = $6, gender = $7, email = $8,
                    updated_at = NOW()
                WHERE student_id = $1
                RETURNING *
                "#,
            )
            .bind(current.student_id)
            .bind(parent_id)
            .bind(&payload.name)
            .bind(&payload.last_name)
            .bind(payload.document_type.as_str())
            .bind(payload.birth_date)
            .bind(payload.gender.as_str())
            .bind(&payload.email)
            .fetch_one(&mut **tx)
            .await
            .map_err(AppError::Database)?
        }
        None => {
            sqlx::query_as::<_, Student>(
                r#"
                INSERT INTO students
                    (parent_id, name, last_name, document_type, document_number,
                     birth_date, gender, email)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING *
                "#,
            )
            .bind(parent_id)
            .bind(&payload.name)
            .bind(&payload.last_name)
            .bind(payload.document_type.as_str())
            .bind(&payload.document_number)
            .bind(payload.birth_date)
            .bind(payload.gender.as_str())
            .bind(&payload.email)
            .fetch_one(&mut **tx)
            .await
            .map_err(AppError::Database)?
        }
    };

    // Attach or replace the musical profile.
    sqlx::query(
        r#"
        INSERT INTO musical_profiles
            (student_id, modality, has_instrument_experience, desired_instrument)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (student_id) DO UPDATE
        SET modality = EXCLUDED.modality,
            has_instrument_experience = EXCLUDED.has_instrument_experience,
            desired_instrument = EXCLUDED.desired_instrument,
            updated_at = NOW()
        "#,
    )
    .bind(student.student_id)
    .bind(payload.modality.as_str())
    .bind(payload.has_instrument_experience)
    .bind(&payload.desired_instrument)
    .execute(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(student)
}

async fn insert_enrollment(
    tx: &mut Transaction<'_, Postgres>,
    submission: &EnrollmentSubmission,
    payload: &StudentPayload,
    student: &Student,
    program: &AcademicProgram,
    today: chrono::NaiveDate,
) -> Result<Enrollment, AppError> {
    let authorized_by = submission.is_minor.then(|| {
        format!(
            "{} {}",
            submission.responsible_party.name, submission.responsible_party.last_name
        )
    });

    let result = sqlx::query_as::<_, Enrollment>(
        r#"
        INSERT INTO enrollments
            (student_id, program_id, status, enrollment_date, enrolled_level,
             payment_commitment, parental_authorization, authorized_by, authorization_date)
        VALUES ($1, $2, 'active', $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(student.student_id)
    .bind(program.program_id)
    .bind(today)
    .bind(&payload.enrolled_level)
    .bind(submission.payment_commitment)
    .bind(submission.is_minor && submission.parental_authorization)
    .bind(&authorized_by)
    .bind(submission.is_minor.then_some(today))
    .fetch_one(&mut **tx)
    .await;

    result.map_err(|e| {
        if is_unique_violation(&e, "uq_enrollments_student_program") {
            AppError::DuplicateEnrollment(format!(
                "Student {} is already enrolled in program '{}'",
                student.document_number, program.name
            ))
        } else {
            AppError::Database(e)
        }
    })
}

/// Atomic check-and-bind: the capacity test and the counter bump happen in
/// one statement, so two submissions racing for the last slot cannot both
/// succeed. Returns false when the schedule is full.
async fn bind_schedule(
    tx: &mut Transaction<'_, Postgres>,
    schedule_id: Uuid,
    student_id: Uuid,
    enrollment_id: Uuid,
) -> Result<bool, AppError> {
    let claimed = sqlx::query_scalar::<_, Uuid>(
        r#"
        UPDATE schedules
        SET enrolled_count = enrolled_count + 1, updated_at = NOW()
        WHERE schedule_id = $1 AND status = 'active' AND enrolled_count < max_students
        RETURNING schedule_id
        "#,
    )
    .bind(schedule_id)
    .fetch_optional(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    if claimed.is_none() {
        return Ok(false);
    }

    sqlx::query(
        r#"
        INSERT INTO schedule_enrollments (schedule_id, student_id, enrollment_id)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(schedule_id)
    .bind(student_id)
    .bind(enrollment_id)
    .execute(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(true)
}

async fn assign_gateway_reference(
    tx: &mut Transaction<'_, Postgres>,
    payment_id: Uuid,
    reference: &str,
) -> Result<(), AppError> {
    sqlx::query(
        "UPDATE payments SET gateway_reference = $2, updated_at = NOW() WHERE payment_id = $1",
    )
    .bind(payment_id)
    .bind(reference)
    .execute(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(())
}

fn is_unique_violation(error: &sqlx::Error, constraint: &str) -> bool {
    error
        .as_database_error()
        .and_then(|db| db.constraint())
        .map(|name| name == constraint)
        .unwrap_or(false)
}
