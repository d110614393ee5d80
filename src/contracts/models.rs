// src/contracts/models.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::common::parse_json_column;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_ACTIVE: &str = "active";
pub const STATUS_REJECTED: &str = "rejected";
pub const STATUS_TERMINATED: &str = "terminated";

pub const MIN_MONTHLY_FEE: i64 = 500;
pub const MAX_MONTHLY_FEE: i64 = 200_000;
pub const MAX_SUBJECTS: usize = 10;

#[derive(Debug, Clone, FromRow)]
pub struct ContractRow {
    pub id: String,
    pub student_id: String,
    pub tutor_id: String,
    pub monthly_fee: i64,
    pub days_per_week: i64,
    pub subjects: Option<String>,
    pub status: String,
    pub last_action_by: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Contract {
    pub id: String,
    pub student_id: String,
    pub tutor_id: String,
    pub monthly_fee: i64,
    pub days_per_week: i64,
    pub subjects: Vec<String>,
    pub status: String,
    pub last_action_by: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<ContractRow> for Contract {
    fn from(row: ContractRow) -> Self {
        Self {
            subjects: parse_json_column(row.subjects.as_deref(), "subjects"),
            id: row.id,
            student_id: row.student_id,
            tutor_id: row.tutor_id,
            monthly_fee: row.monthly_fee,
            days_per_week: row.days_per_week,
            status: row.status,
            last_action_by: row.last_action_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl Contract {
    pub fn is_party(&self, user_id: &str) -> bool {
        self.student_id == user_id || self.tutor_id == user_id
    }

    pub fn terms(&self) -> ContractTerms {
        ContractTerms {
            monthly_fee: self.monthly_fee,
            days_per_week: self.days_per_week,
            subjects: self.subjects.clone(),
        }
    }
}

/// The negotiable part of a contract
#[derive(Debug, Clone, PartialEq)]
pub struct ContractTerms {
    pub monthly_fee: i64,
    pub days_per_week: i64,
    pub subjects: Vec<String>,
}

impl ContractTerms {
    /// Current terms with the counter-offer's fields applied.
    pub fn amended(&self, counter: &CounterOfferRequest) -> Self {
        Self {
            monthly_fee: counter.monthly_fee.unwrap_or(self.monthly_fee),
            days_per_week: counter.days_per_week.unwrap_or(self.days_per_week),
            subjects: counter
                .subjects
                .clone()
                .unwrap_or_else(|| self.subjects.clone()),
        }
    }

    pub fn normalized(mut self) -> Self {
        self.subjects = self
            .subjects
            .iter()
            .map(|s| s.trim().to_string())
            .collect();
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct ProposeContractRequest {
    pub counterparty_id: String,
    pub monthly_fee: i64,
    pub days_per_week: i64,
    pub subjects: Vec<String>,
}

impl ProposeContractRequest {
    pub fn terms(&self) -> ContractTerms {
        ContractTerms {
            monthly_fee: self.monthly_fee,
            days_per_week: self.days_per_week,
            subjects: self.subjects.clone(),
        }
        .normalized()
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct CounterOfferRequest {
    pub monthly_fee: Option<i64>,
    pub days_per_week: Option<i64>,
    pub subjects: Option<Vec<String>>,
}

impl CounterOfferRequest {
    pub fn is_empty(&self) -> bool {
        self.monthly_fee.is_none() && self.days_per_week.is_none() && self.subjects.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_offer_amends_only_given_fields() {
        let terms = ContractTerms {
            monthly_fee: 6000,
            days_per_week: 3,
            subjects: vec!["Physics".to_string()],
        };
        let amended = terms.amended(&CounterOfferRequest {
            monthly_fee: Some(7500),
            ..Default::default()
        });
        assert_eq!(amended.monthly_fee, 7500);
        assert_eq!(amended.days_per_week, 3);
        assert_eq!(amended.subjects, vec!["Physics".to_string()]);
        assert!(CounterOfferRequest::default().is_empty());
    }
}
