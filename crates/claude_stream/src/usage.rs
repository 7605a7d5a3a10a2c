use serde::Serialize;

use crate::RawUsage;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InputTokens {
    pub total: u64,
    pub no_cache: u64,
    pub cache_read: u64,
    pub cache_write: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputTokens {
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<u64>,
}

/// Usage breakdown carried by the downstream `finish` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStats {
    pub input_tokens: InputTokens,
    pub output_tokens: OutputTokens,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw: Option<RawUsage>,
}

/// Maps the CLI's raw counters onto [`UsageStats`].
///
/// Input total is the sum of fresh, cache-creation and cache-read input tokens. Absent
/// counters count as zero; absent usage yields all zeros with no raw record.
pub fn normalize_usage(raw: Option<&RawUsage>) -> UsageStats {
    let Some(raw) = raw else {
        return UsageStats::default();
    };

    let fresh = raw.input_tokens.unwrap_or(0);
    let cache_write = raw.cache_creation_input_tokens.unwrap_or(0);
    let cache_read = raw.cache_read_input_tokens.unwrap_or(0);

    UsageStats {
        input_tokens: InputTokens {
            total: fresh.saturating_add(cache_write).saturating_add(cache_read),
            no_cache: fresh,
            cache_read,
            cache_write,
        },
        output_tokens: OutputTokens {
            total: raw.output_tokens.unwrap_or(0),
            text: None,
            reasoning: None,
        },
        raw: Some(raw.clone()),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn sums_cache_counters_into_input_total() {
        let raw: RawUsage = serde_json::from_value(json!({
            "input_tokens": 100,
            "output_tokens": 50,
            "cache_creation_input_tokens": 10,
            "cache_read_input_tokens": 25,
        }))
        .unwrap();
        let usage = normalize_usage(Some(&raw));
        assert_eq!(
            usage.input_tokens,
            InputTokens {
                total: 135,
                no_cache: 100,
                cache_read: 25,
                cache_write: 10,
            }
        );
        assert_eq!(usage.output_tokens.total, 50);
        assert_eq!(usage.raw, Some(raw));
    }

    #[test]
    fn cache_write_and_read_are_reported_separately() {
        let raw: RawUsage = serde_json::from_value(json!({
            "input_tokens": 1000,
            "output_tokens": 500,
            "cache_creation_input_tokens": 200,
            "cache_read_input_tokens": 300,
        }))
        .unwrap();
        let usage = normalize_usage(Some(&raw));
        assert_eq!(
            serde_json::to_value(&usage).unwrap()["inputTokens"],
            json!({"total": 1500, "noCache": 1000, "cacheRead": 300, "cacheWrite": 200})
        );
        assert_eq!(usage.output_tokens.total, 500);
    }

    #[test]
    fn absent_usage_is_all_zero_without_raw() {
        let usage = normalize_usage(None);
        assert_eq!(usage, UsageStats::default());
        assert_eq!(
            serde_json::to_value(&usage).unwrap(),
            json!({
                "inputTokens": {"total": 0, "noCache": 0, "cacheRead": 0, "cacheWrite": 0},
                "outputTokens": {"total": 0},
            })
        );
    }

    #[test]
    fn missing_counters_count_as_zero() {
        let raw: RawUsage = serde_json::from_value(json!({"output_tokens": 7})).unwrap();
        let usage = normalize_usage(Some(&raw));
        assert_eq!(usage.input_tokens.total, 0);
        assert_eq!(usage.output_tokens.total, 7);
        assert!(usage.raw.is_some());
    }
}
