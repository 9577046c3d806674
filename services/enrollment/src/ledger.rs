use chrono::{Datelike, NaiveDate};
use kairos_common::AppError;
use kairos_database::Payment;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

const MONTHS_ES: [&str; 12] = [
    "Enero",
    "Febrero",
    "Marzo",
    "Abril",
    "Mayo",
    "Junio",
    "Julio",
    "Agosto",
    "Septiembre",
    "Octubre",
    "Noviembre",
    "Diciembre",
];

pub const ADMISSION_CONCEPT: &str = "Matrícula";

pub fn monthly_concept(due_date: NaiveDate) -> String {
    format!(
        "Mensualidad {} {}",
        MONTHS_ES[due_date.month0() as usize],
        due_date.year()
    )
}

pub fn end_of_month(year: i32, month: u32) -> NaiveDate {
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("first of month is always valid")
        .pred_opt()
        .expect("first of month has a predecessor")
}

/// End-of-month due dates covering `current - lookback` through one month
/// ahead of `today`, in ascending order.
pub fn monthly_due_dates(today: NaiveDate, lookback_months: u32) -> Vec<NaiveDate> {
    let lookback = lookback_months as i32;
    (-lookback..=1)
        .map(|offset| {
            let zero_based = today.year() * 12 + today.month0() as i32 + offset;
            let year = zero_based.div_euclid(12);
            let month = zero_based.rem_euclid(12) as u32 + 1;
            end_of_month(year, month)
        })
        .collect()
}

pub struct GenerationInput {
    pub enrollment_id: Uuid,
    pub student_id: Uuid,
    pub program_id: Uuid,
    /// Admission price after any sibling discount.
    pub admission_price: Decimal,
    pub monthly_fee: Decimal,
    pub enrollment_date: NaiveDate,
    pub today: NaiveDate,
    pub lookback_months: u32,
}

/// Materializes the payment obligations for one enrollment: the admission
/// payment plus the monthly run. Inserts land on the
/// (student, program, concept, due_date) unique key with ON CONFLICT DO
/// NOTHING,
/// so re-running generation never duplicates rows.
pub async fn generate_for_enrollment(
    tx: &mut Transaction<'_, Postgres>,
    input: &GenerationInput,
) -> Result<Vec<Payment>, AppError> {
    insert_payment(
        tx,
        input,
        ADMISSION_CONCEPT,
        input.admission_price,
        input.enrollment_date,
    )
    .await?;

    for due_date in monthly_due_dates(input.today, input.lookback_months) {
        insert_payment(tx, input, &monthly_concept(due_date), input.monthly_fee, due_date)
            .await?;
    }

    let payments = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments WHERE enrollment_id = $1 ORDER BY due_date, concept",
    )
    .bind(input.enrollment_id)
    .fetch_all(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(payments)
}

async fn insert_payment(
    tx: &mut Transaction<'_, Postgres>,
    input: &GenerationInput,
    concept: &str,
    amount: Decimal,
    due_date: NaiveDate,
) -> Result<(), AppError> {
    sqlx::query(
        r#"
        INSERT INTO payments (
            enrollment_id, student_id, program_id, concept,
            amount, original_amount, paid_amount, remaining_amount,
            status, due_date
        )
        VALUES ($1, $2, $3, $4, $5, $5, 0, $5, 'pending', $6)
        ON CONFLICT (student_id, program_id, concept, due_date) DO NOTHING
        "#,
    )
    .bind(input.enrollment_id)
    .bind(input.student_id)
    .bind(input.program_id)
    .bind(concept)
    .bind(amount)
    .bind(due_date)
    .execute(&mut **tx)
    .await
    .map_err(AppError::Database)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_run_spans_lookback_through_next_month() {
        let today = NaiveDate::from_ymd_opt(2026, 8, 15).unwrap();
        let dates = monthly_due_dates(today, 4);

        assert_eq!(dates.len(), 6);
        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2026, 4, 30).unwrap());
        assert_eq!(dates[4], NaiveDate::from_ymd_opt(2026, 8, 31).unwrap());
        assert_eq!(dates[5], NaiveDate::from_ymd_opt(2026, 9, 30).unwrap());
    }

    #[test]
    fn month_run_crosses_year_boundaries() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 10).unwrap();
        let dates = monthly_due_dates(today, 3);

        assert_eq!(dates[0], NaiveDate::from_ymd_opt(2025, 10, 31).unwrap());
        assert_eq!(dates.last().copied(), NaiveDate::from_ymd_opt(2026, 2, 28));
    }

    #[test]
    fn end_of_month_handles_leap_february() {
        assert_eq!(end_of_month(2024, 2), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(end_of_month(2026, 2), NaiveDate::from_ymd_opt(2026, 2, 28).unwrap());
        assert_eq!(end_of_month(2026, 12), NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    }

    #[test]
    fn monthly_concept_uses_spanish_month_names() {
        let due = NaiveDate::from_ymd_opt(2026, 1, 31).unwrap();
        assert_eq!(monthly_concept(due), "Mensualidad Enero 2026");

        let due = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(monthly_concept(due), "Mensualidad Diciembre 2025");
    }
}
