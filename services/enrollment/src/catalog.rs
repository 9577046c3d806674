use kairos_common::AppError;
use kairos_database::{AcademicProgram, Schedule};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{
    CreateProgramRequest, CreateScheduleRequest, ProgramWithSchedules, ScheduleSummary,
    UpdateProgramRequest,
};

/// Curriculum catalog: programs and their schedules. Read-only from the
/// enrollment flow; mutations are admin operations.
#[derive(Clone)]
pub struct CatalogService {
    db_pool: PgPool,
}

impl CatalogService {
    pub fn new(db_pool: PgPool) -> Self {
        Self { db_pool }
    }

    pub async fn list_active_programs(&self) -> Result<Vec<ProgramWithSchedules>, AppError> {
        let programs = sqlx::query_as::<_, AcademicProgram>(
            "SELECT * FROM academic_programs WHERE status = 'active' ORDER BY name",
        )
        .fetch_all(&self.db_pool)
        .await
        .map_err(AppError::Database)?;

        let mut result = Vec::with_capacity(programs.len());
        for program in programs {
            let schedules = sqlx::query_as::<_, Schedule>(
                "SELECT * FROM schedules WHERE program_id = $1 AND status = 'active' ORDER BY start_time",
            )
            .bind(program.program_id)
            .fetch_all(&self.db_pool)
            .await
            .map_err(AppError::Database)?;

            let schedules = schedules
                .into_iter()
                .map(|s| ScheduleSummary {
                    schedule_id: s.schedule_id,
                    days_of_week: s.days_of_week.clone(),
                    start_time: s.start_time,
                    end_time: s.end_time,
                    teacher_name: s.teacher_name.clone(),
                    available_slots: s.available_slots(),
                })
                .collect();

            result.push(ProgramWithSchedules { program, schedules });
        }

        Ok(result)
    }

    pub async fn find_active_program(
        &self,
        program_id: Uuid,
    ) -> Result<Option<AcademicProgram>, AppError> {
        sqlx::query_as::<_, AcademicProgram>(
            "SELECT * FROM academic_programs WHERE program_id = $1 AND status = 'active'",
        )
        .bind(program_id)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn find_schedule(&self, schedule_id: Uuid) -> Result<Option<Schedule>, AppError> {
        sqlx::query_as::<_, Schedule>("SELECT * FROM schedules WHERE schedule_id = $1")
            .bind(schedule_id)
            .fetch_optional(&self.db_pool)
            .await
            .map_err(AppError::Database)
    }

    // Admin operations

    pub async fn create_program(
        &self,
        request: CreateProgramRequest,
    ) -> Result<AcademicProgram, AppError> {
        sqlx::query_as::<_, AcademicProgram>(
            r#"
            INSERT INTO academic_programs (name, description, duration_months, monthly_fee)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.duration_months)
        .bind(request.monthly_fee)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)
    }

    pub async fn update_program(
        &self,
        program_id: Uuid,
        request: UpdateProgramRequest,
    ) -> Result<AcademicProgram, AppError> {
        if let Some(status) = &request.status {
            if status != "active" && status != "inactive" {
                return Err(AppError::field_validation(
                    "status",
                    "status must be 'active' or 'inactive'",
                ));
            }
        }

        sqlx::query_as::<_, AcademicProgram>(
            r#"
            UPDATE academic_programs
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                duration_months = COALESCE($4, duration_months),
                monthly_fee = COALESCE($5, monthly_fee),
                status = COALESCE($6, status),
                updated_at = NOW()
            WHERE program_id = $1
            RETURNING *
            "#,
        )
        .bind(program_id)
        .bind(&request.name)
        .bind(&request.description)
        .bind(request.duration_months)
        .bind(request.monthly_fee)
        .bind(&request.status)
        .fetch_optional(&self.db_pool)
        .await
        .map_err(AppError::Database)?
        .ok_or_else(|| AppError::NotFound(format!("Program {} not found", program_id)))
    }

    pub async fn create_schedule(
        &self,
        program_id: Uuid,
        request: CreateScheduleRequest,
    ) -> Result<Schedule, AppError> {
        if request.end_time <= request.start_time {
            return Err(AppError::field_validation(
                "end_time",
                "end time must be after start time",
            ));
        }

        self.find_active_program(program_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Program {} not found", program_id)))?;

        sqlx::query_as::<_, Schedule>(
            r#"
            INSERT INTO schedules (program_id, days_of_week, start_time, end_time, teacher_name, max_students)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(program_id)
        .bind(&request.days_of_week)
        .bind(request.start_time)
        .bind(request.end_time)
        .bind(&request.teacher_name)
        .bind(request.max_students)
        .fetch_one(&self.db_pool)
        .await
        .map_err(AppError::Database)
    }
}
