use serde::Deserialize;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IngestLimits {
    /// Upstream lines longer than this are skipped without being buffered.
    pub max_line_bytes: usize,
}

impl Default for IngestLimits {
    fn default() -> Self {
        Self {
            max_line_bytes: 16 * 1024 * 1024,
        }
    }
}

/// Tunables for one translation. Loadable from TOML; every field is optional.
#[derive(Debug, Clone, Eq, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslatorConfig {
    pub limits: IngestLimits,
    /// Above this serialized length, batched tool input snapshots stop producing
    /// incremental `tool-input-delta` events.
    pub max_incremental_input_len: usize,
    /// Tool names that spawn sub-agents. Tools started while exactly one of these is
    /// running are attributed to it.
    pub sub_agent_tool_names: Vec<String>,
    /// Cap on `rawResult` provider metadata. `None` forwards results untruncated.
    pub max_raw_result_chars: Option<usize>,
    /// Forward session and model identifiers from the `system/init` envelope.
    pub emit_response_metadata: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            limits: IngestLimits::default(),
            max_incremental_input_len: 10_000,
            sub_agent_tool_names: vec!["Task".to_string()],
            max_raw_result_chars: None,
            emit_response_metadata: true,
        }
    }
}

impl TranslatorConfig {
    pub fn is_sub_agent(&self, tool_name: &str) -> bool {
        self.sub_agent_tool_names
            .iter()
            .any(|name| name == tool_name)
    }

    pub fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.limits.max_line_bytes = max_line_bytes;
        self
    }

    pub fn with_max_raw_result_chars(mut self, max_chars: usize) -> Self {
        self.max_raw_result_chars = Some(max_chars);
        self
    }

    pub fn with_sub_agent_tool_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_agent_tool_names = names.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: TranslatorConfig = toml::from_str(
            r#"
                max_raw_result_chars = 2048

                [limits]
                max_line_bytes = 4096
            "#,
        )
        .unwrap();
        assert_eq!(config.limits.max_line_bytes, 4096);
        assert_eq!(config.max_raw_result_chars, Some(2048));
        assert_eq!(config.max_incremental_input_len, 10_000);
        assert!(config.is_sub_agent("Task"));
        assert!(config.emit_response_metadata);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<TranslatorConfig>("max_line_byte = 1").is_err());
    }

    #[test]
    fn sub_agent_names_are_replaceable() {
        let config = TranslatorConfig::default().with_sub_agent_tool_names(["Agent"]);
        assert!(config.is_sub_agent("Agent"));
        assert!(!config.is_sub_agent("Task"));
    }
}
