use once_cell::sync::Lazy;
use regex::Regex;

static SQL_FENCE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```(?:sql|sqlite)?\s*(.*?)\s*```$").unwrap());

static THINK_TAG_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<think>[\s\S]*?</think>|<think\s*/>").unwrap());

/// Normalize a raw model completion into bare SQL text: trims whitespace and
/// removes the markdown fences and reasoning tags some models emit despite
/// the no-formatting instruction. The result is still untrusted.
pub fn clean_sql_response(response: &str) -> String {
    let mut cleaned = THINK_TAG_PATTERN.replace_all(response, "").to_string();
    cleaned = cleaned.trim().to_string();

    if let Some(caps) = SQL_FENCE_PATTERN.captures(&cleaned) {
        cleaned = caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or(cleaned);
    }

    cleaned.trim().to_string()
}
