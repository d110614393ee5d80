// src/contracts/services.rs

use sqlx::SqlitePool;
use tracing::{info, warn};

use super::models::*;
use super::validators::ContractTermsValidator;
use crate::auth::services::AuthService;
use crate::auth::{AuthedUser, Role};
use crate::common::{generate_contract_id, now_rfc3339, to_json_column, ApiError, Validator};

const CONTRACT_COLUMNS: &str = r#"
    id, student_id, tutor_id, monthly_fee, days_per_week, subjects, status,
    last_action_by, created_at, updated_at
"#;

pub struct ContractsService {
    db: SqlitePool,
}

impl ContractsService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    async fn find(&self, id: &str) -> Result<Contract, ApiError> {
        sqlx::query_as::<_, ContractRow>(&format!(
            "SELECT {} FROM contracts WHERE id = ?",
            CONTRACT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .map(Contract::from)
        .ok_or_else(|| ApiError::NotFound("Contract not found".to_string()))
    }

    /// Contract visible to its two parties only.
    pub async fn get(&self, id: &str, user_id: &str) -> Result<Contract, ApiError> {
        let contract = self.find(id).await?;
        if !contract.is_party(user_id) {
            return Err(ApiError::Forbidden(
                "You are not a party to this contract".to_string(),
            ));
        }
        Ok(contract)
    }

    pub async fn list_for_user(&self, user_id: &str) -> Result<Vec<Contract>, ApiError> {
        let rows = sqlx::query_as::<_, ContractRow>(&format!(
            r#"
            SELECT {} FROM contracts
            WHERE student_id = ?1 OR tutor_id = ?1
            ORDER BY updated_at DESC, id
            "#,
            CONTRACT_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Contract::from).collect())
    }

    async fn has_accepted_application(&self, a: &str, b: &str) -> Result<bool, ApiError> {
        let (count,): (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM applications
            WHERE ((sender_id = ?1 AND receiver_id = ?2) OR (sender_id = ?2 AND receiver_id = ?1))
              AND status = 'accepted'
            "#,
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.db)
        .await?;
        Ok(count > 0)
    }

    pub async fn propose(
        &self,
        actor: &AuthedUser,
        request: &ProposeContractRequest,
    ) -> Result<Contract, ApiError> {
        let terms = request.terms();
        ContractTermsValidator.validate(&terms).into_result()?;

        let counterparty_id = request.counterparty_id.trim();
        let counterparty = AuthService::new(self.db.clone())
            .find_user(counterparty_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Counterparty not found".to_string()))?;

        let (student_id, tutor_id) = match (actor.role, counterparty.role()) {
            (Role::Student, Role::Tutor) => (actor.id.as_str(), counterparty_id),
            (Role::Tutor, Role::Student) => (counterparty_id, actor.id.as_str()),
            _ => {
                return Err(ApiError::BadRequest(
                    "Contracts are between a student and a tutor".to_string(),
                ))
            }
        };

        if !self.has_accepted_application(student_id, tutor_id).await? {
            return Err(ApiError::Forbidden(
                "An accepted application is required before proposing a contract".to_string(),
            ));
        }

        let open: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT id FROM contracts
            WHERE student_id = ? AND tutor_id = ? AND status IN ('pending', 'active')
            "#,
        )
        .bind(student_id)
        .bind(tutor_id)
        .fetch_optional(&self.db)
        .await?;
        if let Some((existing,)) = open {
            warn!(contract_id = %existing, "Open contract already exists for pair");
            return Err(ApiError::Conflict(
                "There is already an open contract between you".to_string(),
            ));
        }

        let id = generate_contract_id();
        let now = now_rfc3339();
        let inserted = sqlx::query(
            r#"
            INSERT INTO contracts (id, student_id, tutor_id, monthly_fee, days_per_week, subjects,
                                   status, last_action_by, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 'pending', ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(student_id)
        .bind(tutor_id)
        .bind(terms.monthly_fee)
        .bind(terms.days_per_week)
        .bind(to_json_column(&terms.subjects))
        .bind(&actor.id)
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await;

        if let Err(sqlx::Error::Database(db_err)) = &inserted {
            if db_err.is_unique_violation() {
                return Err(ApiError::Conflict(
                    "There is already an open contract between you".to_string(),
                ));
            }
        }
        inserted?;

        info!(
            contract_id = %id,
            proposed_by = %actor.id,
            monthly_fee = terms.monthly_fee,
            "Contract proposed"
        );
        self.find(&id).await
    }

    /// Loads a pending contract the user may answer: a party who did not
    /// take the last action.
    async fn find_answerable(&self, id: &str, user_id: &str) -> Result<Contract, ApiError> {
        let contract = self.get(id, user_id).await?;
        if contract.status != STATUS_PENDING {
            return Err(ApiError::BadRequest(format!(
                "Contract is {}, not pending",
                contract.status
            )));
        }
        if contract.last_action_by == user_id {
            return Err(ApiError::Forbidden(
                "Waiting for the other party to respond".to_string(),
            ));
        }
        Ok(contract)
    }

    pub async fn counter(
        &self,
        id: &str,
        user_id: &str,
        request: &CounterOfferRequest,
    ) -> Result<Contract, ApiError> {
        if request.is_empty() {
            return Err(ApiError::BadRequest(
                "A counter-offer must change at least one term".to_string(),
            ));
        }
        let contract = self.find_answerable(id, user_id).await?;
        let terms = contract.terms().amended(request).normalized();
        ContractTermsValidator.validate(&terms).into_result()?;

        let result = sqlx::query(
            r#"
            UPDATE contracts
            SET monthly_fee = ?, days_per_week = ?, subjects = ?, last_action_by = ?, updated_at = ?
            WHERE id = ? AND status = 'pending' AND last_action_by != ?
            "#,
        )
        .bind(terms.monthly_fee)
        .bind(terms.days_per_week)
        .bind(to_json_column(&terms.subjects))
        .bind(user_id)
        .bind(now_rfc3339())
        .bind(id)
        .bind(user_id)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::Conflict("Contract changed, reload it".to_string()));
        }

        info!(contract_id = %id, user_id = %user_id, monthly_fee = terms.monthly_fee, "Counter-offer made");
        self.find(id).await
    }

    /// Moves the contract to `to` when it is in `from` and, for pending
    /// contracts, the user did not make the last move.
    async fn transition(
        &self,
        id: &str,
        user_id: &str,
        from: &str,
        to: &str,
    ) -> Result<Contract, ApiError> {
        let result = sqlx::query(
            r#"
            UPDATE contracts SET status = ?, last_action_by = ?, updated_at = ?
            WHERE id = ? AND status = ? AND (status != 'pending' OR last_action_by != ?)
            "#,
        )
        .bind(to)
        .bind(user_id)
        .bind(now_rfc3339())
        .bind(id)
        .bind(from)
        .bind(user_id)
        .execute(&self.db)
        .await?;
        if result.rows_affected() == 0 {
            return Err(ApiError::Conflict("Contract changed, reload it".to_string()));
        }

        info!(contract_id = %id, user_id = %user_id, from = %from, to = %to, "Contract status changed");
        self.find(id).await
    }

    pub async fn accept(&self, id: &str, user_id: &str) -> Result<Contract, ApiError> {
        self.find_answerable(id, user_id).await?;
        self.transition(id, user_id, STATUS_PENDING, STATUS_ACTIVE).await
    }

    pub async fn reject(&self, id: &str, user_id: &str) -> Result<Contract, ApiError> {
        self.find_answerable(id, user_id).await?;
        self.transition(id, user_id, STATUS_PENDING, STATUS_REJECTED).await
    }

    pub async fn terminate(&self, id: &str, user_id: &str) -> Result<Contract, ApiError> {
        let contract = self.get(id, user_id).await?;
        if contract.status != STATUS_ACTIVE {
            return Err(ApiError::BadRequest(
                "Only active contracts can be terminated".to_string(),
            ));
        }
        self.transition(id, user_id, STATUS_ACTIVE, STATUS_TERMINATED).await
    }
}
