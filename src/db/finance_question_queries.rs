use sqlx::PgPool;
use uuid::Uuid;

use crate::models::FinanceQuestion;

pub async fn create(pool: &PgPool, question: &str, answer: &str) -> Result<FinanceQuestion, sqlx::Error> {
    sqlx::query_as::<_, FinanceQuestion>(
        r#"
        INSERT INTO finance_questions (id, question, answer)
        VALUES ($1, $2, $3)
        RETURNING id, question, answer, created_at
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(question)
    .bind(answer)
    .fetch_one(pool)
    .await
}
