use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;

use crate::sentry::Deploy;

pub const MAX_DISPLAYED_ENVIRONMENTS: usize = 3;

/// Environment name to the finish time of the first deploy seen for it.
///
/// Iteration follows first occurrence in the raw deploy list. A later deploy
/// to an environment already present is ignored even if it finished more
/// recently.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnvironmentDeployIndex {
    entries: Vec<(String, Option<DateTime<Utc>>)>,
}

impl EnvironmentDeployIndex {
    pub fn from_deploys(deploys: &[Deploy]) -> Self {
        let mut seen: HashSet<&str> = HashSet::new();
        let entries = deploys
            .iter()
            .filter(|deploy| seen.insert(deploy.environment.as_str()))
            .map(|deploy| (deploy.environment.clone(), deploy.date_finished))
            .collect();
        Self { entries }
    }

    /// Outer `None` when the environment was never deployed to.
    pub fn get(&self, environment: &str) -> Option<Option<DateTime<Utc>>> {
        self.entries
            .iter()
            .find(|(env, _)| env == environment)
            .map(|(_, date)| *date)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<DateTime<Utc>>)> {
        self.entries.iter().map(|(env, date)| (env.as_str(), *date))
    }

    /// The first `limit` environments, in index order.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = (&str, Option<DateTime<Utc>>)> {
        self.iter().take(limit)
    }
}
