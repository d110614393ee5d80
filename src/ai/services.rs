// src/ai/services.rs

use reqwest::{redirect, Client};
use serde_json::Value;
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use url::{Host, Url};

use super::models::*;
use super::parsing::{clean_short_answer, extract_json, parse_ranking};
use super::prompts;
use crate::common::geo::Coordinates;
use crate::common::helpers::normalize_text;
use crate::common::{ApiError, AppState};
use crate::discovery::matching::nearby;
use crate::discovery::models::TutorCandidate;
use crate::discovery::services::DiscoveryService;
use crate::profiles::student_id::parse_student_id;
use crate::services::gemini::{GeminiError, InlineImage};
use crate::services::llm::{ChatMessage, CompletionPurpose, LlmError};
use crate::services::{GeminiService, GeocodingService, LlmService};

pub const CHAT_CATALOG_SIZE: usize = 25;
pub const RANKING_CANDIDATE_CAP: usize = 30;
pub const DEFAULT_RECOMMENDATION_RADIUS_KM: f64 = 10.0;
pub const MAX_ZONE_NAME_CHARS: usize = 60;
pub const MAX_ID_CARD_BYTES: usize = 5 * 1024 * 1024;
const IMAGE_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(20);

impl From<LlmError> for ApiError {
    fn from(e: LlmError) -> Self {
        match e {
            LlmError::NotConfigured => {
                ApiError::ServiceUnavailable("AI assistant is not configured".to_string())
            }
            other => ApiError::ServiceUnavailable(format!("AI assistant unavailable: {}", other)),
        }
    }
}

impl From<GeminiError> for ApiError {
    fn from(e: GeminiError) -> Self {
        match e {
            GeminiError::NotConfigured => {
                ApiError::ServiceUnavailable("Gemini is not configured".to_string())
            }
            other => ApiError::ServiceUnavailable(format!("Gemini unavailable: {}", other)),
        }
    }
}

/// Longest known area that appears in the query, compared after normalising both.
pub fn detect_zone(query: &str, known_areas: &[String]) -> Option<String> {
    let query = normalize_text(query);
    known_areas
        .iter()
        .filter(|area| {
            let area = normalize_text(area);
            !area.is_empty() && query.contains(&area)
        })
        .max_by_key(|area| area.chars().count())
        .cloned()
}

/// Tutors whose primary or preferred area is the zone.
pub fn restrict_to_zone(candidates: Vec<TutorCandidate>, zone: &str) -> Vec<TutorCandidate> {
    let zone = normalize_text(zone);
    candidates
        .into_iter()
        .filter(|tutor| {
            let details = &tutor.details;
            details
                .primary_area
                .iter()
                .chain(details.teaching_details.preferred_areas.iter())
                .any(|area| normalize_text(area) == zone)
        })
        .collect()
}

fn string_value(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("null"))
        .map(str::to_string)
}

/// Maps the vision reply onto the card fields and parses the ID when possible.
pub fn id_card_from_reply(text: &str) -> IdCardResponse {
    let value = match extract_json(text) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "ID card reply had no JSON");
            return IdCardResponse::default();
        }
    };
    let student_id = string_value(&value, "student_id");
    IdCardResponse {
        name: string_value(&value, "name"),
        parsed_student_id: student_id.as_deref().and_then(parse_student_id),
        student_id,
        institution: string_value(&value, "institution"),
    }
}

/// False for loopback, private, link-local, CGNAT and other non-routable addresses.
pub fn is_public_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let [a, b, ..] = v4.octets();
            !(v4.is_private()
                || v4.is_loopback()
                || v4.is_link_local()
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.is_multicast()
                || a == 0
                || (a == 100 && (64..128).contains(&b)))
        }
        IpAddr::V6(v6) => {
            if let Some(v4) = v6.to_ipv4_mapped() {
                return is_public_ip(IpAddr::V4(v4));
            }
            let first = v6.segments()[0];
            !(v6.is_loopback()
                || v6.is_unspecified()
                || v6.is_multicast()
                || (first & 0xfe00) == 0xfc00
                || (first & 0xffc0) == 0xfe80)
        }
    }
}

/// Resolves the image host, requiring every address to be public.
async fn resolve_public_host(url: &Url) -> Result<SocketAddr, ApiError> {
    let rejected = || ApiError::BadRequest("Image URL must point to a public host".to_string());
    let port = url.port_or_known_default().unwrap_or(80);

    let addrs: Vec<SocketAddr> = match url.host() {
        Some(Host::Ipv4(ip)) => vec![SocketAddr::new(IpAddr::V4(ip), port)],
        Some(Host::Ipv6(ip)) => vec![SocketAddr::new(IpAddr::V6(ip), port)],
        Some(Host::Domain(domain)) => tokio::net::lookup_host((domain, port))
            .await
            .map_err(|_| ApiError::BadRequest("Could not resolve image host".to_string()))?
            .collect(),
        None => return Err(rejected()),
    };

    if addrs.is_empty() || addrs.iter().any(|addr| !is_public_ip(addr.ip())) {
        warn!(host = ?url.host_str(), "Image URL resolves to a non-public address");
        return Err(rejected());
    }
    Ok(addrs[0])
}

pub struct AiService {
    db: sqlx::SqlitePool,
    llm: Arc<LlmService>,
    gemini: Arc<GeminiService>,
    geocoding: Arc<GeocodingService>,
}

impl AiService {
    pub fn new(state: &AppState) -> Self {
        Self {
            db: state.db.clone(),
            llm: state.llm_service.clone(),
            gemini: state.gemini_service.clone(),
            geocoding: state.geocoding_service.clone(),
        }
    }

    fn discovery(&self) -> DiscoveryService {
        DiscoveryService::new(self.db.clone())
    }

    pub async fn chat(&self, request: &AiChatRequest) -> Result<AiChatResponse, ApiError> {
        let mut tutors = self.discovery().load_candidates().await?;
        tutors.truncate(CHAT_CATALOG_SIZE);
        let catalog = prompts::tutor_catalog(&tutors, &[]);

        let mut messages = vec![ChatMessage::system(prompts::chat_system_prompt(&catalog))];
        messages.extend(request.messages.iter().map(|turn| ChatMessage {
            role: turn.role.clone(),
            content: turn.content.trim().to_string(),
        }));

        let completion = self
            .llm
            .complete_with_fallback(CompletionPurpose::TutorChat, &messages)
            .await
            .map_err(|e| {
                error!(error = %e, "AI chat failed on both models");
                ApiError::from(e)
            })?;

        info!(model = %completion.model, turns = request.messages.len(), "AI chat answered");
        Ok(AiChatResponse {
            reply: completion.text.trim().to_string(),
            model: completion.model,
        })
    }

    pub async fn recommend(
        &self,
        request: &RecommendationRequest,
    ) -> Result<MatchesResponse, ApiError> {
        let candidates = self.discovery().load_candidates().await?;

        let origin = Coordinates::from_parts(request.latitude, request.longitude);
        let (pool, distances): (Vec<TutorCandidate>, Vec<Option<f64>>) = match origin {
            Some(origin) => {
                let radius = request.radius_km.unwrap_or(DEFAULT_RECOMMENDATION_RADIUS_KM);
                let close = nearby(candidates, origin, radius, RANKING_CANDIDATE_CAP);
                if close.is_empty() {
                    return Ok(MatchesResponse::empty(format!(
                        "No tutors found within {} km",
                        radius
                    )));
                }
                close.into_iter().map(|r| (r.tutor, r.distance_km)).unzip()
            }
            None => candidates
                .into_iter()
                .take(RANKING_CANDIDATE_CAP)
                .map(|t| (t, None))
                .unzip(),
        };

        Ok(self.rank(&request.query, pool, distances, None).await)
    }

    pub async fn search(&self, request: &SearchRequest) -> Result<MatchesResponse, ApiError> {
        let discovery = self.discovery();
        let known_areas = discovery.known_areas().await?;
        let zone = detect_zone(&request.query, &known_areas);

        let mut candidates = discovery.load_candidates().await?;
        if let Some(zone) = &zone {
            candidates = restrict_to_zone(candidates, zone);
            debug!(zone = %zone, candidates = candidates.len(), "Search restricted to zone");
        }
        candidates.truncate(RANKING_CANDIDATE_CAP);

        if candidates.is_empty() {
            let mut response = MatchesResponse::empty(match &zone {
                Some(z) => format!("No tutors registered in {} yet", z),
                None => "No tutors registered yet".to_string(),
            });
            response.zone = zone;
            return Ok(response);
        }

        let distances = vec![None; candidates.len()];
        let mut response = self
            .rank(&request.query, candidates, distances, zone.as_deref())
            .await;
        response.zone = zone;
        Ok(response)
    }

    /// LLM ranking of a prepared pool. Never fails: any problem becomes an
    /// empty result with a message.
    async fn rank(
        &self,
        query: &str,
        pool: Vec<TutorCandidate>,
        distances: Vec<Option<f64>>,
        zone: Option<&str>,
    ) -> MatchesResponse {
        let catalog = prompts::tutor_catalog(&pool, &distances);
        let messages = vec![
            ChatMessage::system(prompts::ranking_system_prompt()),
            ChatMessage::user(prompts::ranking_user_prompt(query, &catalog, zone)),
        ];

        let completion = match self.llm.complete(CompletionPurpose::TutorRanking, &messages).await {
            Ok(completion) => completion,
            Err(e) => {
                warn!(error = %e, candidates = pool.len(), "Tutor ranking call failed");
                return MatchesResponse::empty("AI matching is unavailable right now, try manual search");
            }
        };

        let known_ids: HashSet<String> = pool.iter().map(|t| t.id.clone()).collect();
        let entries = match parse_ranking(&completion.text, &known_ids) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, model = %completion.model, "Unusable ranking reply");
                return MatchesResponse::empty("AI matching returned an unreadable answer, try again");
            }
        };

        let matches: Vec<AiMatch> = entries
            .into_iter()
            .filter_map(|entry| {
                let index = pool.iter().position(|t| t.id == entry.tutor_id)?;
                Some(AiMatch {
                    tutor_id: entry.tutor_id,
                    match_score: entry.match_score,
                    reason: entry.reason,
                    distance_km: distances.get(index).copied().flatten(),
                    tutor: pool[index].clone(),
                })
            })
            .collect();

        info!(candidates = pool.len(), matches = matches.len(), "Tutor ranking complete");
        if matches.is_empty() {
            return MatchesResponse::empty("No suitable tutors found");
        }
        MatchesResponse {
            matches,
            ..Default::default()
        }
    }

    pub async fn identify_zone(
        &self,
        request: &IdentifyZoneRequest,
    ) -> Result<IdentifyZoneResponse, ApiError> {
        let point = Coordinates::new(request.latitude, request.longitude);
        if !point.is_valid() {
            return Err(ApiError::BadRequest("Coordinates are out of range".to_string()));
        }

        let geocode = self.geocoding.reverse(point).await.map_err(|e| {
            error!(error = %e, "Reverse geocoding failed");
            ApiError::ServiceUnavailable("Location lookup is unavailable".to_string())
        })?;

        let known_areas = self.discovery().known_areas().await?;
        let messages = vec![ChatMessage::user(prompts::zone_naming_prompt(
            &geocode.display_name,
            &known_areas,
        ))];

        let named = match self.llm.complete(CompletionPurpose::ZoneNaming, &messages).await {
            Ok(completion) => clean_short_answer(&completion.text, MAX_ZONE_NAME_CHARS),
            Err(e) => {
                warn!(error = %e, "Zone naming failed, using address components");
                None
            }
        };

        let zone = named
            .or_else(|| geocode.address.most_specific_area())
            .ok_or_else(|| ApiError::NotFound("No named area at this location".to_string()))?;

        info!(zone = %zone, "Zone identified");
        Ok(IdentifyZoneResponse {
            zone,
            display_name: geocode.display_name,
        })
    }

    pub async fn generate_bio(&self, request: &BioRequest) -> Result<BioResponse, ApiError> {
        let text = self
            .gemini
            .generate_text(&prompts::bio_prompt(&request.text))
            .await
            .map_err(|e| {
                error!(error = %e, "Bio generation failed");
                ApiError::from(e)
            })?;

        Ok(BioResponse {
            bio: text.trim().to_string(),
        })
    }

    async fn download_image(&self, image_url: &str) -> Result<InlineImage, ApiError> {
        let url = Url::parse(image_url)
            .map_err(|_| ApiError::BadRequest("Invalid image URL".to_string()))?;
        let addr = resolve_public_host(&url).await?;

        // Pinned to the checked address; redirects are not followed
        let mut builder = Client::builder()
            .redirect(redirect::Policy::none())
            .no_proxy()
            .timeout(IMAGE_DOWNLOAD_TIMEOUT);
        if let Some(Host::Domain(domain)) = url.host() {
            builder = builder.resolve(domain, addr);
        }
        let client = builder
            .build()
            .map_err(|e| ApiError::InternalServer(format!("HTTP client error: {}", e)))?;

        let failed = || ApiError::BadRequest("Could not download image".to_string());
        let response = client.get(url).send().await.map_err(|e| {
            warn!(error = %e, "Image download failed");
            failed()
        })?;

        if !response.status().is_success() {
            warn!(status = %response.status(), "Image download returned an error status");
            return Err(failed());
        }
        if response
            .content_length()
            .map(|len| len as usize > MAX_ID_CARD_BYTES)
            .unwrap_or(false)
        {
            return Err(ApiError::BadRequest("Image is larger than 5 MB".to_string()));
        }

        let bytes = response.bytes().await.map_err(|e| {
            warn!(error = %e, "Image download interrupted");
            failed()
        })?;
        if bytes.len() > MAX_ID_CARD_BYTES {
            return Err(ApiError::BadRequest("Image is larger than 5 MB".to_string()));
        }

        let mime_type = sniff_image_type(&bytes)?;
        Ok(InlineImage {
            mime_type,
            data: bytes.to_vec(),
        })
    }

    pub async fn analyze_id_card(
        &self,
        request: &AnalyzeIdCardRequest,
    ) -> Result<IdCardResponse, ApiError> {
        let image = self.download_image(request.image_url.trim()).await?;
        debug!(mime_type = %image.mime_type, bytes = image.data.len(), "ID card image downloaded");

        let reply = self
            .gemini
            .analyze_image_json(prompts::id_card_prompt(), image)
            .await
            .map_err(|e| {
                error!(error = %e, "ID card analysis failed");
                ApiError::from(e)
            })?;

        let card = id_card_from_reply(&reply);
        info!(
            has_student_id = card.student_id.is_some(),
            parsed = card.parsed_student_id.is_some(),
            "ID card analysed"
        );
        Ok(card)
    }
}

/// Image MIME type from magic bytes; anything else is rejected.
pub fn sniff_image_type(bytes: &[u8]) -> Result<String, ApiError> {
    match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {
            Ok(kind.mime_type().to_string())
        }
        Some(kind) => Err(ApiError::BadRequest(format!(
            "Expected an image, got {}",
            kind.mime_type()
        ))),
        None => Err(ApiError::BadRequest("Unrecognised image format".to_string())),
    }
}
