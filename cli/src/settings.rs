use anyhow::Context;
use chat_composer_protocol::Selection;
use url::Url;

use crate::config::FileConfig;

pub const DEFAULT_ENDPOINT: &str = "http://localhost:7777";

/// Values given on the command line (or via environment); each one overrides the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub endpoint: Option<String>,
    pub agent: Option<String>,
    pub team: Option<String>,
    pub session_id: Option<String>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub endpoint: Url,
    pub selection: Selection,
    pub session_id: Option<String>,
    pub dry_run: bool,
}

impl Settings {
    pub fn resolve(overrides: Overrides, file: FileConfig) -> anyhow::Result<Self> {
        let endpoint = overrides
            .endpoint
            .or(file.endpoint)
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        let endpoint =
            Url::parse(&endpoint).with_context(|| format!("invalid endpoint URL: {endpoint}"))?;

        // A selection flag replaces the configured selection as a whole.
        let selection = if overrides.agent.is_some() || overrides.team.is_some() {
            Selection {
                agent: overrides.agent,
                team: overrides.team,
            }
        } else {
            Selection {
                agent: file.agent,
                team: file.team,
            }
        };

        Ok(Self {
            endpoint,
            selection,
            session_id: overrides.session_id,
            dry_run: overrides.dry_run,
        })
    }
}
