//! Pulling structured data out of free-form model replies.

use serde_json::Value;
use std::collections::HashSet;

use super::models::RankingEntry;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseError {
    #[error("no JSON found in model reply")]
    NoJson,

    #[error("unexpected JSON shape: {0}")]
    UnexpectedShape(String),
}

fn strip_code_fences(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// First JSON array or object in the text. Code fences and surrounding prose
/// are ignored.
pub fn extract_json(text: &str) -> Result<Value, ParseError> {
    let cleaned = strip_code_fences(text);

    for (index, ch) in cleaned.char_indices() {
        if ch != '[' && ch != '{' {
            continue;
        }
        let mut stream = serde_json::Deserializer::from_str(&cleaned[index..]).into_iter::<Value>();
        if let Some(Ok(value)) = stream.next() {
            if value.is_array() || value.is_object() {
                return Ok(value);
            }
        }
    }

    Err(ParseError::NoJson)
}

fn entries_array(value: Value) -> Result<Vec<Value>, ParseError> {
    match value {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => {
            for key in ["matches", "results", "tutors", "recommendations"] {
                if let Some(Value::Array(items)) = map.remove(key) {
                    return Ok(items);
                }
            }
            Err(ParseError::UnexpectedShape(
                "object without a matches array".to_string(),
            ))
        }
        other => Err(ParseError::UnexpectedShape(other.to_string())),
    }
}

fn string_field(entry: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|k| entry.get(*k))
        .find_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
}

fn score_field(entry: &Value) -> Option<f64> {
    ["match_score", "score"]
        .iter()
        .filter_map(|k| entry.get(*k))
        .find_map(|v| match v {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().trim_end_matches('%').parse().ok(),
            _ => None,
        })
}

/// Validates a ranking reply against the candidate ids that were offered.
///
/// Unknown ids are dropped, scores are clamped to 0..=100, repeated ids keep
/// their first entry, and the result is ordered by score (stable).
pub fn parse_ranking(
    text: &str,
    known_ids: &HashSet<String>,
) -> Result<Vec<RankingEntry>, ParseError> {
    let items = entries_array(extract_json(text)?)?;

    let mut seen = HashSet::new();
    let mut entries: Vec<RankingEntry> = items
        .iter()
        .filter_map(|item| {
            let tutor_id = string_field(item, &["tutor_id", "id"])?;
            if !known_ids.contains(&tutor_id) || !seen.insert(tutor_id.clone()) {
                return None;
            }
            let score = score_field(item).unwrap_or(0.0);
            Some(RankingEntry {
                tutor_id,
                match_score: score.round().clamp(0.0, 100.0) as u32,
                reason: string_field(item, &["reason", "explanation"]).unwrap_or_default(),
            })
        })
        .collect();

    entries.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    Ok(entries)
}

/// Cleans a single-line model answer such as a zone name.
pub fn clean_short_answer(text: &str, max_chars: usize) -> Option<String> {
    let line = text
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty() && !l.starts_with("```"))?;
    let cleaned = line
        .trim_start_matches(|c: char| c == '-' || c == '*' || c.is_whitespace())
        .trim_matches(|c: char| c == '"' || c == '\'' || c == '.' || c == '`')
        .trim();
    let cleaned = cleaned
        .strip_prefix("Zone:")
        .or_else(|| cleaned.strip_prefix("zone:"))
        .unwrap_or(cleaned)
        .trim();

    if cleaned.is_empty() || cleaned.chars().count() > max_chars {
        return None;
    }
    Some(cleaned.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> HashSet<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_extract_json_from_fenced_prose() {
        let reply = "Here you go:\n```json\n{\"matches\": [{\"tutor_id\": \"U_A\"}]}\n```\nHope this helps!";
        let value = extract_json(reply).unwrap();
        assert_eq!(value["matches"][0]["tutor_id"], "U_A");
    }

    #[test]
    fn test_extract_json_skips_non_json_brackets() {
        let reply = "Scores [see below]: [{\"id\": \"U_B\", \"score\": 70}]";
        let value = extract_json(reply).unwrap();
        assert!(value.is_array());
        assert_eq!(extract_json("no structure here"), Err(ParseError::NoJson));
    }

    #[test]
    fn test_parse_ranking_drops_unknown_clamps_and_dedupes() {
        let reply = r#"{"matches": [
            {"tutor_id": "U_A", "match_score": 140, "reason": "Teaches physics in Mirpur"},
            {"tutor_id": "U_GHOST", "match_score": 90, "reason": "invented"},
            {"tutor_id": "U_B", "match_score": "65%", "reason": "Close by"},
            {"tutor_id": "U_A", "match_score": 10, "reason": "duplicate"},
            {"tutor_id": "U_C", "match_score": -5}
        ]}"#;
        let entries = parse_ranking(reply, &ids(&["U_A", "U_B", "U_C"])).unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].tutor_id, "U_A");
        assert_eq!(entries[0].match_score, 100);
        assert_eq!(entries[0].reason, "Teaches physics in Mirpur");
        assert_eq!(entries[1].match_score, 65);
        assert_eq!(entries[2].tutor_id, "U_C");
        assert_eq!(entries[2].match_score, 0);
        assert_eq!(entries[2].reason, "");
    }

    #[test]
    fn test_parse_ranking_rejects_wrong_shape() {
        assert!(matches!(
            parse_ranking(r#"{"answer": "U_A"}"#, &ids(&["U_A"])),
            Err(ParseError::UnexpectedShape(_))
        ));
    }

    #[test]
    fn test_clean_short_answer() {
        assert_eq!(clean_short_answer("\"Dhanmondi.\"\n", 60).as_deref(), Some("Dhanmondi"));
        assert_eq!(clean_short_answer("Zone: Mirpur 10", 60).as_deref(), Some("Mirpur 10"));
        assert_eq!(clean_short_answer("   ", 60), None);
        assert_eq!(clean_short_answer(&"x".repeat(80), 60), None);
    }
}
