use anyhow::{ensure, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::fetch::{FetchCoordinator, FetchState};
use super::view::{CardContent, ViewMode};
use crate::sentry::client::encode_path_segment;
use crate::sentry::ApiClient;

/// Identifies the release a card is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardProps {
    org_id: String,
    project_id: String,
    version: String,
}

impl CardProps {
    pub fn new(org_id: &str, project_id: &str, version: &str) -> Result<Self> {
        ensure!(!org_id.is_empty(), "organization id must not be empty");
        ensure!(!project_id.is_empty(), "project id must not be empty");
        ensure!(!version.is_empty(), "version must not be empty");

        Ok(Self {
            org_id: org_id.to_string(),
            project_id: project_id.to_string(),
            version: version.to_string(),
        })
    }

    pub fn org_id(&self) -> &str {
        &self.org_id
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn release_path(&self) -> String {
        format!(
            "/projects/{}/{}/releases/{}/",
            self.org_id,
            self.project_id,
            encode_path_segment(&self.version)
        )
    }

    pub fn repos_path(&self) -> String {
        format!("/organizations/{}/repos/", self.org_id)
    }

    pub fn deploys_path(&self) -> String {
        format!(
            "/organizations/{}/releases/{}/deploys/",
            self.org_id,
            encode_path_segment(&self.version)
        )
    }
}

/// A release hovercard: what it shows, and whether it is shown at all.
pub struct VersionHoverCard {
    props: CardProps,
    state: FetchState,
    visible: bool,
}

impl VersionHoverCard {
    pub fn new(props: CardProps) -> Self {
        Self {
            props,
            state: FetchState::default(),
            visible: false,
        }
    }

    pub fn props(&self) -> &CardProps {
        &self.props
    }

    pub fn state(&self) -> &FetchState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub async fn load(&mut self, client: Arc<dyn ApiClient>) {
        let coordinator = FetchCoordinator::new(client, self.props.clone());
        self.update(coordinator.fetch().await);
    }

    pub fn update(&mut self, state: FetchState) {
        self.state = state;
    }

    /// Flips visibility. Independent of how far loading has got.
    pub fn toggle(&mut self) -> bool {
        self.visible = !self.visible;
        self.visible
    }

    pub fn content(&self, now: DateTime<Utc>) -> CardContent {
        CardContent::from(ViewMode::resolve(&self.props, &self.state, now))
    }
}
