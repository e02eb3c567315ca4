use anyhow::Context;
use chrono::NaiveDate;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::models::GradeRecord;

pub async fn init_db(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

pub async fn seed(pool: &PgPool) -> anyhow::Result<()> {
    let students = vec![
        (
            Uuid::parse_str("7c1f4a9e-5b30-4a91-9c57-2f4d8b6a1e03")?,
            "CS-2021-001",
            "Nadeesha Perera",
            "2021",
        ),
        (
            Uuid::parse_str("2e8b61d4-0f7a-4c26-b5d9-84a3c91f7b52")?,
            "CS-2021-002",
            "Tharindu Silva",
            "2021",
        ),
        (
            Uuid::parse_str("a94d3c70-6e18-4f52-8d2b-c15f09e74a86")?,
            "CS-2022-014",
            "Ishara Fernando",
            "2022",
        ),
    ];

    for (id, index_no, name, batch) in students {
        sqlx::query(
            r#"
            INSERT INTO student_records.students (id, index_no, full_name, batch)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (index_no) DO UPDATE
            SET full_name = EXCLUDED.full_name, batch = EXCLUDED.batch
            RETURNING id
            "#,
        )
        .bind(id)
        .bind(index_no)
        .bind(name)
        .bind(batch)
        .fetch_one(pool)
        .await?;
    }

    let modules = vec![
        ("CS1040", "Program Construction", "Y1S1", 3.0),
        ("CS1060", "Data Structures", "Y1S2", 3.0),
        ("MA1014", "Discrete Mathematics", "Y1S1", 2.0),
    ];

    for (code, title, semester, credits) in modules {
        sqlx::query(
            r#"
            INSERT INTO student_records.modules (id, code, title, semester, credits)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (code) DO UPDATE
            SET title = EXCLUDED.title, semester = EXCLUDED.semester,
                credits = EXCLUDED.credits
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(code)
        .bind(title)
        .bind(semester)
        .bind(credits)
        .execute(pool)
        .await?;
    }

    let grades = vec![
        (
            "seed-001",
            "CS-2021-001",
            "CS1040",
            "A",
            NaiveDate::from_ymd_opt(2024, 6, 30).context("invalid date")?,
        ),
        (
            "seed-002",
            "CS-2021-001",
            "MA1014",
            "B+",
            NaiveDate::from_ymd_opt(2024, 6, 30).context("invalid date")?,
        ),
        (
            "seed-003",
            "CS-2021-002",
            "CS1040",
            "B",
            NaiveDate::from_ymd_opt(2024, 6, 30).context("invalid date")?,
        ),
        (
            "seed-004",
            "CS-2022-014",
            "CS1060",
            "W",
            NaiveDate::from_ymd_opt(2024, 12, 15).context("invalid date")?,
        ),
    ];

    for (source_key, index_no, module_code, letter, recorded_at) in grades {
        let student_id: Uuid = sqlx::query(
            "SELECT id FROM student_records.students WHERE index_no = $1",
        )
        .bind(index_no)
        .fetch_one(pool)
        .await?
        .get("id");

        let module_id: Uuid = sqlx::query(
            "SELECT id FROM student_records.modules WHERE code = $1",
        )
        .bind(module_code)
        .fetch_one(pool)
        .await?
        .get("id");

        sqlx::query(
            r#"
            INSERT INTO student_records.grades
            (id, student_id, module_id, letter, recorded_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(module_id)
        .bind(letter)
        .bind(recorded_at)
        .bind(source_key)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn fetch_grades(
    pool: &PgPool,
    batch: Option<&str>,
    index: Option<&str>,
) -> anyhow::Result<Vec<GradeRecord>> {
    let mut query = String::from(
        "SELECT s.id AS student_id, s.index_no, s.full_name, s.batch, \
         m.code AS module_code, m.title AS module_title, m.credits, \
         g.letter, g.recorded_at \
         FROM student_records.grades g \
         JOIN student_records.students s ON s.id = g.student_id \
         JOIN student_records.modules m ON m.id = g.module_id",
    );

    if batch.is_some() {
        query.push_str(" WHERE s.batch = $1");
    } else if index.is_some() {
        query.push_str(" WHERE s.index_no = $1");
    }

    let mut rows = sqlx::query(&query);

    if let Some(value) = batch {
        rows = rows.bind(value);
    } else if let Some(value) = index {
        rows = rows.bind(value);
    }

    let records = rows.fetch_all(pool).await?;
    let mut grades = Vec::new();

    for row in records {
        grades.push(GradeRecord {
            student_id: row.get("student_id"),
            index_number: row.get("index_no"),
            student_name: row.get("full_name"),
            batch: row.get("batch"),
            module_code: row.get("module_code"),
            module_title: row.get("module_title"),
            credits: row.get("credits"),
            letter_grade: row.get("letter"),
            recorded_at: row.get("recorded_at"),
        });
    }

    Ok(grades)
}

pub async fn import_csv(pool: &PgPool, csv_path: &std::path::Path) -> anyhow::Result<usize> {
    #[derive(serde::Deserialize)]
    struct CsvRow {
        index_number: String,
        full_name: String,
        batch: String,
        module_code: String,
        module_title: String,
        semester: String,
        credits: f64,
        letter_grade: String,
        recorded_at: NaiveDate,
        source_key: Option<String>,
    }

    let mut reader = csv::Reader::from_path(csv_path)?;
    let mut inserted = 0usize;

    for result in reader.deserialize::<CsvRow>() {
        let row = result?;
        let student_id: Uuid = sqlx::query(
            r#"
            INSERT INTO student_records.students
            (id, index_no, full_name, batch)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (index_no) DO UPDATE
            SET full_name = EXCLUDED.full_name, batch = EXCLUDED.batch
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.index_number)
        .bind(&row.full_name)
        .bind(&row.batch)
        .fetch_one(pool)
        .await?
        .get("id");

        let module_id: Uuid = sqlx::query(
            r#"
            INSERT INTO student_records.modules
            (id, code, title, semester, credits)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (code) DO UPDATE
            SET title = EXCLUDED.title, semester = EXCLUDED.semester,
                credits = EXCLUDED.credits
            RETURNING id
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&row.module_code)
        .bind(&row.module_title)
        .bind(&row.semester)
        .bind(row.credits)
        .fetch_one(pool)
        .await?
        .get("id");

        let source_key = row
            .source_key
            .unwrap_or_else(|| format!("import-{}", Uuid::new_v4()));

        let result = sqlx::query(
            r#"
            INSERT INTO student_records.grades
            (id, student_id, module_id, letter, recorded_at, source_key)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (source_key) DO NOTHING
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(student_id)
        .bind(module_id)
        .bind(&row.letter_grade)
        .bind(row.recorded_at)
        .bind(source_key)
        .execute(pool)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    Ok(inserted)
}
