use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use super::models::{Claims, RegisterRequest, Role, UpgradeRequest, User};
use crate::common::dev_mode::{DevModeConfig, DEV_USER_ID};
use crate::common::{
    generate_slug, generate_user_id, now_rfc3339, safe_email_log, ApiError, Validator,
};

#[cfg(not(test))]
const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;
#[cfg(test)]
const BCRYPT_COST: u32 = 4;

const USER_COLUMNS: &str =
    "id, email, password_hash, role, is_anonymous, device_fingerprint, created_at";

/// Sign a session token for the user.
pub fn issue_token(user: &User, secret: &str, ttl_hours: i64) -> Result<String, ApiError> {
    let exp = (Utc::now() + Duration::hours(ttl_hours)).timestamp() as usize;
    let claims = Claims {
        sub: user.id.clone(),
        role: user.role.clone(),
        exp,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| {
        error!(error = %e, user_id = %user.id, "JWT encoding error");
        ApiError::InternalServer("jwt error".to_string())
    })
}

/// Validate a session token and return its claims
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        warn!(error = %e, "JWT validation failed");
        ApiError::Unauthorized("invalid token".to_string())
    })
}

fn hash_password(password: &str) -> Result<String, ApiError> {
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| {
        error!(error = %e, "Password hashing failed");
        ApiError::InternalServer("password hashing failed".to_string())
    })
}

pub struct AuthService {
    db: SqlitePool,
}

impl AuthService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn find_user(&self, user_id: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = ?",
            USER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, ApiError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = ?",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn ensure_email_free(&self, email: &str) -> Result<(), ApiError> {
        if self.find_by_email(email).await?.is_some() {
            warn!(email = %safe_email_log(email), "Email already registered");
            return Err(ApiError::Conflict("Email is already registered".to_string()));
        }
        Ok(())
    }

    async fn ensure_username_free(&self, username: &str) -> Result<(), ApiError> {
        let taken: Option<(String,)> = sqlx::query_as("SELECT id FROM profiles WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.db)
            .await?;
        if taken.is_some() {
            return Err(ApiError::Conflict("Username is already taken".to_string()));
        }
        Ok(())
    }

    /// Inserts the user, its profile and the empty role details row in one transaction.
    async fn insert_account(
        &self,
        user: &User,
        username: &str,
    ) -> Result<(), ApiError> {
        let mut tx = self.db.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, role, is_anonymous, device_fingerprint, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role)
        .bind(user.is_anonymous)
        .bind(&user.device_fingerprint)
        .bind(&user.created_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query("INSERT INTO profiles (id, username, role, updated_at) VALUES (?, ?, ?, ?)")
            .bind(&user.id)
            .bind(username)
            .bind(&user.role)
            .bind(&user.created_at)
            .execute(&mut *tx)
            .await?;

        insert_details_row(&mut tx, &user.id, user.role(), &user.created_at).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Create a full account with email and password
    pub async fn register(&self, request: &RegisterRequest) -> Result<User, ApiError> {
        request.validate(request).into_result()?;

        let email = request.email.trim().to_lowercase();
        let username = request.username.trim();
        self.ensure_email_free(&email).await?;
        self.ensure_username_free(username).await?;

        let user = User {
            id: generate_user_id(),
            email: Some(email),
            password_hash: Some(hash_password(&request.password)?),
            role: request.role.trim().to_lowercase(),
            is_anonymous: false,
            device_fingerprint: None,
            created_at: now_rfc3339(),
        };
        self.insert_account(&user, username).await?;

        info!(
            user_id = %user.id,
            email = %safe_email_log(user.email.as_deref().unwrap_or_default()),
            role = %user.role,
            "User registered"
        );
        Ok(user)
    }

    /// Email/password login
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let email = email.trim().to_lowercase();
        let user = self.find_by_email(&email).await?;

        let verified = user
            .as_ref()
            .and_then(|u| u.password_hash.as_deref())
            .map(|hash| bcrypt::verify(password, hash).unwrap_or(false))
            .unwrap_or(false);

        match user {
            Some(user) if verified => {
                info!(user_id = %user.id, "User login successful");
                Ok(user)
            }
            _ => {
                warn!(email = %safe_email_log(&email), "Login failed: invalid credentials");
                Err(ApiError::Unauthorized("Invalid email or password".to_string()))
            }
        }
    }

    /// Anonymous guest session. A known device fingerprint gets its old account back.
    pub async fn guest(&self, device_fingerprint: Option<&str>) -> Result<User, ApiError> {
        let fingerprint = device_fingerprint
            .map(str::trim)
            .filter(|f| !f.is_empty() && f.len() <= 256);

        if let Some(fingerprint) = fingerprint {
            let existing = sqlx::query_as::<_, User>(&format!(
                "SELECT {} FROM users WHERE device_fingerprint = ? AND is_anonymous = 1 ORDER BY created_at ASC LIMIT 1",
                USER_COLUMNS
            ))
            .bind(fingerprint)
            .fetch_optional(&self.db)
            .await?;

            if let Some(user) = existing {
                info!(user_id = %user.id, "Reusing guest account for device fingerprint");
                return Ok(user);
            }
        }

        let user = User {
            id: generate_user_id(),
            email: None,
            password_hash: None,
            role: Role::Stranger.as_str().to_string(),
            is_anonymous: true,
            device_fingerprint: fingerprint.map(str::to_string),
            created_at: now_rfc3339(),
        };
        let username = format!("guest-{}", generate_slug(6));
        self.insert_account(&user, &username).await?;

        info!(user_id = %user.id, username = %username, "Guest account created");
        Ok(user)
    }

    /// Turn a guest account into a full account, keeping its id and data
    pub async fn upgrade(&self, user_id: &str, request: &UpgradeRequest) -> Result<User, ApiError> {
        request.validate(request).into_result()?;

        let user = self
            .find_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
        if !user.is_anonymous {
            return Err(ApiError::BadRequest(
                "Only guest accounts can be upgraded".to_string(),
            ));
        }

        let email = request.email.trim().to_lowercase();
        self.ensure_email_free(&email).await?;
        let role: Role = request
            .role
            .parse()
            .map_err(|e: String| ApiError::BadRequest(e))?;
        let password_hash = hash_password(&request.password)?;
        let now = now_rfc3339();

        let mut tx = self.db.begin().await?;
        sqlx::query(
            "UPDATE users SET email = ?, password_hash = ?, role = ?, is_anonymous = 0 WHERE id = ?",
        )
        .bind(&email)
        .bind(&password_hash)
        .bind(role.as_str())
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        sqlx::query("UPDATE profiles SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(&now)
            .bind(user_id)
            .execute(&mut *tx)
            .await?;
        insert_details_row(&mut tx, user_id, role, &now).await?;
        tx.commit().await?;

        info!(user_id = %user_id, role = %role, "Guest account upgraded");

        self.find_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    /// Make sure the fixed dev-mode account exists so foreign keys hold
    pub async fn ensure_dev_user(&self, config: &DevModeConfig) -> Result<(), ApiError> {
        if self.find_user(DEV_USER_ID).await?.is_some() {
            return Ok(());
        }

        let user = User {
            id: DEV_USER_ID.to_string(),
            email: Some(config.user_email.to_lowercase()),
            password_hash: None,
            role: config.user_role.as_str().to_string(),
            is_anonymous: !config.user_role.is_member(),
            device_fingerprint: None,
            created_at: now_rfc3339(),
        };
        self.insert_account(&user, &config.username).await?;
        info!(user_id = %DEV_USER_ID, role = %config.user_role, "Dev user created");
        Ok(())
    }
}

async fn insert_details_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    user_id: &str,
    role: Role,
    now: &str,
) -> Result<(), sqlx::Error> {
    let sql = match role {
        Role::Tutor => "INSERT OR IGNORE INTO tutors (id, updated_at) VALUES (?, ?)",
        Role::Student => "INSERT OR IGNORE INTO students (id, updated_at) VALUES (?, ?)",
        Role::Stranger => return Ok(()),
    };
    sqlx::query(sql)
        .bind(user_id)
        .bind(now)
        .execute(&mut **tx)
        .await?;
    Ok(())
}
