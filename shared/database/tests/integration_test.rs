use kairos_common::DatabaseConfig;
use kairos_database::{create_pool, MigrationRunner};
use uuid::Uuid;

#[tokio::test]
async fn migrations_create_schema_and_enforce_constraints() {
    // Skip test if no database is available
    if std::env::var("DATABASE_URL").is_err() {
        println!("Skipping database test - DATABASE_URL not set");
        return;
    }

    let config = DatabaseConfig {
        database: format!("kairos_test_{}", Uuid::new_v4().simple()),
        ..DatabaseConfig::from_env()
    };

    let pool = create_pool(&config).await.expect("Failed to connect to test database");

    let runner = MigrationRunner::new(pool.clone());
    runner.run_all_migrations().await.expect("Failed to run migrations");

    // Test that tables were created
    let table_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'public'",
    )
    .fetch_one(&pool)
    .await
    .expect("Failed to count tables");

    assert!(table_count >= 9, "Expected the full schema, got {} tables", table_count);

    // The admin seed is idempotent
    runner.seed_initial_data().await.expect("First seed failed");
    runner.seed_initial_data().await.expect("Second seed failed");

    let admin_count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = 'admin@kairos.edu.co'")
            .fetch_one(&pool)
            .await
            .expect("Failed to count admins");
    assert_eq!(admin_count, 1);

    // Duplicate student documents are rejected by the schema
    let insert_student = "INSERT INTO students \
         (name, last_name, document_type, document_number, birth_date, gender) \
         VALUES ('Ana', 'Ruiz', 'ti', 'doc-1', '2014-01-01', 'female')";

    sqlx::query(insert_student)
        .execute(&pool)
        .await
        .expect("First student insert failed");

    let duplicate = sqlx::query(insert_student).execute(&pool).await;
    let constraint = duplicate
        .expect_err("Duplicate document should be rejected")
        .as_database_error()
        .and_then(|db| db.constraint().map(str::to_string));
    assert_eq!(constraint.as_deref(), Some("uq_students_document"));

    // The capacity check constraint holds even for direct writes
    let program_id: Uuid = sqlx::query_scalar(
        "INSERT INTO academic_programs (name, monthly_fee) VALUES ('Violín', 180000) \
         RETURNING program_id",
    )
    .fetch_one(&pool)
    .await
    .expect("Failed to insert program");

    let overfull = sqlx::query(
        "INSERT INTO schedules \
         (program_id, days_of_week, start_time, end_time, teacher_name, max_students, enrolled_count) \
         VALUES ($1, '{saturday}', '09:00', '11:00', 'Laura Gómez', 5, 6)",
    )
    .bind(program_id)
    .execute(&pool)
    .await;
    assert!(overfull.is_err(), "enrolled_count above max_students must not persist");
}
