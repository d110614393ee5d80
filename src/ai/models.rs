// src/ai/models.rs

use serde::{Deserialize, Serialize};

use crate::discovery::models::TutorCandidate;
use crate::profiles::student_id::StudentIdInfo;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct AiChatRequest {
    pub messages: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
pub struct AiChatResponse {
    pub reply: String,
    pub model: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendationRequest {
    pub query: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub radius_km: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// One entry of the model's ranking after validation
#[derive(Debug, Clone, PartialEq)]
pub struct RankingEntry {
    pub tutor_id: String,
    pub match_score: u32,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AiMatch {
    pub tutor_id: String,
    pub match_score: u32,
    pub reason: String,
    pub distance_km: Option<f64>,
    pub tutor: TutorCandidate,
}

#[derive(Debug, Serialize, Default)]
pub struct MatchesResponse {
    pub matches: Vec<AiMatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zone: Option<String>,
}

impl MatchesResponse {
    pub fn empty(message: impl Into<String>) -> Self {
        Self {
            matches: Vec::new(),
            message: Some(message.into()),
            zone: None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct IdentifyZoneRequest {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
pub struct IdentifyZoneResponse {
    pub zone: String,
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct BioRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct BioResponse {
    pub bio: String,
}

#[derive(Debug, Deserialize)]
pub struct AnalyzeIdCardRequest {
    pub image_url: String,
}

/// Fields read off a university ID card
#[derive(Debug, Serialize, Default, PartialEq)]
pub struct IdCardResponse {
    pub name: Option<String>,
    pub student_id: Option<String>,
    pub institution: Option<String>,
    pub parsed_student_id: Option<StudentIdInfo>,
}
