// src/common/migrations.rs
//! Database migration and schema management

use sqlx::SqlitePool;
use std::env;
use tracing::{info, warn};

/// Run all database migrations
///
/// Tables are created if missing. Setting `RESET_DB=true` drops every table
/// first, which wipes all marketplace data.
pub async fn run_migrations(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let should_reset_db = env::var("RESET_DB").unwrap_or_else(|_| "false".to_string()) == "true";

    if should_reset_db {
        warn!("⚠️  RESET_DB=true - Dropping all tables and recreating schema...");
        drop_all_tables(pool).await?;
        info!("✅ Dropped old tables");
    }

    create_account_tables(pool).await?;
    create_marketplace_tables(pool).await?;
    create_social_tables(pool).await?;
    create_system_tables(pool).await?;
    create_indexes(pool).await?;

    info!("✅ Database migration completed successfully!");

    Ok(())
}

async fn drop_all_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    // reverse dependency order
    let tables = [
        "linkhistory",
        "links",
        "short_links",
        "messages",
        "reviews",
        "appointments",
        "contracts",
        "applications",
        "verification_codes",
        "students",
        "tutors",
        "profiles",
        "system_settings",
        "users",
    ];

    for table in tables {
        sqlx::query(&format!("DROP TABLE IF EXISTS {}", table))
            .execute(pool)
            .await?;
    }

    Ok(())
}

async fn execute_all(pool: &SqlitePool, statements: &[&str]) -> Result<(), sqlx::Error> {
    for statement in statements {
        sqlx::query(statement).execute(pool).await?;
    }
    Ok(())
}

async fn create_account_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    execute_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE,
                password_hash TEXT,
                role TEXT NOT NULL CHECK (role IN ('student', 'tutor', 'stranger')),
                is_anonymous INTEGER NOT NULL DEFAULT 0,
                device_fingerprint TEXT,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                id TEXT PRIMARY KEY,
                username TEXT UNIQUE NOT NULL,
                role TEXT NOT NULL,
                primary_area TEXT,
                location TEXT,
                latitude REAL,
                longitude REAL,
                is_online INTEGER NOT NULL DEFAULT 0,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(id) REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS tutors (
                id TEXT PRIMARY KEY,
                basic_info TEXT,
                teaching_details TEXT,
                varsity_infos TEXT,
                varsity_verified INTEGER NOT NULL DEFAULT 0,
                bio TEXT,
                primary_area TEXT,
                location TEXT,
                latitude REAL,
                longitude REAL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(id) REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS students (
                id TEXT PRIMARY KEY,
                basic_info TEXT,
                teaching_details TEXT,
                primary_area TEXT,
                location TEXT,
                latitude REAL,
                longitude REAL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(id) REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS verification_codes (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL,
                email TEXT NOT NULL,
                code TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                consumed INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
        ],
    )
    .await
}

async fn create_marketplace_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    execute_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id TEXT PRIMARY KEY,
                sender_id TEXT NOT NULL,
                receiver_id TEXT NOT NULL,
                message TEXT NOT NULL,
                match_score INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'accepted', 'rejected')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(sender_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY(receiver_id) REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS contracts (
                id TEXT PRIMARY KEY,
                student_id TEXT NOT NULL,
                tutor_id TEXT NOT NULL,
                monthly_fee INTEGER NOT NULL,
                days_per_week INTEGER NOT NULL,
                subjects TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'active', 'rejected', 'terminated')),
                last_action_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(student_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY(tutor_id) REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS appointments (
                id TEXT PRIMARY KEY,
                application_id TEXT NOT NULL UNIQUE,
                student_id TEXT NOT NULL,
                tutor_id TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'scheduled'
                    CHECK (status IN ('scheduled', 'verified', 'completed', 'cancelled')),
                meeting_otp TEXT,
                otp_expires_at TEXT,
                is_verified_onsite INTEGER NOT NULL DEFAULT 0,
                payment_status TEXT NOT NULL DEFAULT 'unpaid'
                    CHECK (payment_status IN ('unpaid', 'pending', 'paid')),
                session_status TEXT NOT NULL DEFAULT 'not_started'
                    CHECK (session_status IN ('not_started', 'in_progress', 'ended')),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(application_id) REFERENCES applications(id) ON DELETE CASCADE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id TEXT PRIMARY KEY,
                reviewer_id TEXT NOT NULL,
                reviewee_id TEXT NOT NULL,
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                comment TEXT,
                is_strike INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                UNIQUE(reviewer_id, reviewee_id),
                FOREIGN KEY(reviewer_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY(reviewee_id) REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
        ],
    )
    .await
}

async fn create_social_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    execute_all(
        pool,
        &[
            r#"
            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                sender_id TEXT NOT NULL,
                receiver_id TEXT NOT NULL,
                content TEXT NOT NULL,
                is_read INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                FOREIGN KEY(sender_id) REFERENCES users(id) ON DELETE CASCADE,
                FOREIGN KEY(receiver_id) REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS short_links (
                slug TEXT PRIMARY KEY,
                target_url TEXT NOT NULL,
                owner_id TEXT,
                hits INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS links (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                slug TEXT UNIQUE NOT NULL,
                title TEXT,
                is_active INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                FOREIGN KEY(owner_id) REFERENCES users(id) ON DELETE CASCADE
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS linkhistory (
                id TEXT PRIMARY KEY,
                link_id TEXT NOT NULL,
                content TEXT NOT NULL,
                sender_fingerprint TEXT,
                created_at TEXT NOT NULL,
                FOREIGN KEY(link_id) REFERENCES links(id) ON DELETE CASCADE
            )
            "#,
        ],
    )
    .await
}

async fn create_system_tables(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS system_settings (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            updated_by TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_indexes(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    execute_all(
        pool,
        &[
            "CREATE INDEX IF NOT EXISTS idx_users_fingerprint ON users(device_fingerprint)",
            "CREATE INDEX IF NOT EXISTS idx_tutors_area ON tutors(primary_area)",
            "CREATE INDEX IF NOT EXISTS idx_applications_receiver ON applications(receiver_id, status)",
            "CREATE INDEX IF NOT EXISTS idx_applications_sender ON applications(sender_id, status)",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_applications_one_pending ON applications(sender_id, receiver_id) WHERE status = 'pending'",
            "CREATE INDEX IF NOT EXISTS idx_contracts_pair ON contracts(student_id, tutor_id, status)",
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_contracts_one_open ON contracts(student_id, tutor_id) WHERE status IN ('pending', 'active')",
            "CREATE INDEX IF NOT EXISTS idx_appointments_student ON appointments(student_id)",
            "CREATE INDEX IF NOT EXISTS idx_appointments_tutor ON appointments(tutor_id)",
            "CREATE INDEX IF NOT EXISTS idx_reviews_reviewee ON reviews(reviewee_id)",
            "CREATE INDEX IF NOT EXISTS idx_messages_pair ON messages(sender_id, receiver_id)",
            "CREATE INDEX IF NOT EXISTS idx_linkhistory_link ON linkhistory(link_id)",
            "CREATE INDEX IF NOT EXISTS idx_verification_user ON verification_codes(user_id)",
        ],
    )
    .await
}


#[cfg(test)]
mod tests {
    use super::test_support::test_pool;

    #[tokio::test]
    async fn test_migrations_are_idempotent() {
        let pool = test_pool().await;
        super::run_migrations(&pool).await.unwrap();

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name",
        )
        .fetch_all(&pool)
        .await
        .unwrap();
        let names: Vec<String> = tables.into_iter().map(|(n,)| n).collect();

        for expected in ["appointments", "contracts", "linkhistory", "profiles", "tutors", "users"] {
            assert!(names.contains(&expected.to_string()), "missing table {}", expected);
        }
    }

    #[tokio::test]
    async fn test_rating_check_constraint() {
        let pool = test_pool().await;
        let result = sqlx::query(
            "INSERT INTO reviews (id, reviewer_id, reviewee_id, rating, created_at) VALUES ('R_1', 'a', 'b', 9, 'now')",
        )
        .execute(&pool)
        .await;
        assert!(result.is_err());
    }
}
