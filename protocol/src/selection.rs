use serde::Deserialize;
use serde::Serialize;

/// Which agent and/or team the user currently has selected.
///
/// Empty identifiers are treated the same as absent ones.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
}

/// Destination of a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum RunTarget {
    Agent(String),
    Team(String),
}

impl Selection {
    pub fn agent(id: impl Into<String>) -> Self {
        Self {
            agent: Some(id.into()),
            team: None,
        }
    }

    pub fn team(id: impl Into<String>) -> Self {
        Self {
            agent: None,
            team: Some(id.into()),
        }
    }

    /// Resolve the destination. An agent wins over a team when both are selected.
    pub fn target(&self) -> Option<RunTarget> {
        if let Some(agent) = non_blank(self.agent.as_deref()) {
            return Some(RunTarget::Agent(agent.to_string()));
        }
        non_blank(self.team.as_deref()).map(|team| RunTarget::Team(team.to_string()))
    }

    /// Whether mutating composer operations should be enabled.
    pub fn is_active(&self) -> bool {
        self.target().is_some()
    }
}

fn non_blank(id: Option<&str>) -> Option<&str> {
    id.filter(|id| !id.trim().is_empty())
}

impl RunTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            RunTarget::Agent(_) => "agent",
            RunTarget::Team(_) => "team",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            RunTarget::Agent(id) | RunTarget::Team(id) => id,
        }
    }

    /// Unencoded path segments of the run route, e.g. `["agents", "web-builder", "runs"]`.
    /// The id is always a single segment, whatever characters it contains.
    pub fn path_segments(&self) -> [&str; 3] {
        let collection = match self {
            RunTarget::Agent(_) => "agents",
            RunTarget::Team(_) => "teams",
        };
        [collection, self.id(), "runs"]
    }

    /// Human-readable form of the route, e.g. `agents/web-builder/runs`. Not URL-encoded.
    pub fn runs_path(&self) -> String {
        self.path_segments().join("/")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_selection_is_inactive() {
        assert!(!Selection::default().is_active());
        let blank = Selection {
            agent: Some("  ".to_string()),
            team: Some(String::new()),
        };
        assert_eq!(blank.target(), None);
    }

    #[test]
    fn agent_takes_precedence_over_team() {
        let selection = Selection {
            agent: Some("dev".to_string()),
            team: Some("qa".to_string()),
        };
        assert_eq!(selection.target(), Some(RunTarget::Agent("dev".to_string())));
        assert_eq!(
            Selection::team("qa").target(),
            Some(RunTarget::Team("qa".to_string()))
        );
    }

    #[test]
    fn runs_path_matches_backend_routes() {
        assert_eq!(RunTarget::Agent("a1".to_string()).runs_path(), "agents/a1/runs");
        assert_eq!(RunTarget::Team("t1".to_string()).runs_path(), "teams/t1/runs");
    }

    #[test]
    fn id_stays_one_segment() {
        let target = RunTarget::Team("a/b?c".to_string());
        assert_eq!(target.path_segments(), ["teams", "a/b?c", "runs"]);
        assert_eq!(target.kind(), "team");
        assert_eq!(target.id(), "a/b?c");
    }
}
