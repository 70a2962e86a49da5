use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::card::CardProps;
use crate::error::{ApiError, Result};
use crate::sentry::{ApiClient, Deploy, ReleaseSummary};

/// Number of independent requests a card waits on before it stops loading.
pub const REQUEST_COUNT: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Release,
    Repos,
    Deploys,
}

impl Endpoint {
    pub const ALL: [Endpoint; REQUEST_COUNT] =
        [Endpoint::Release, Endpoint::Repos, Endpoint::Deploys];

    pub fn path(self, props: &CardProps) -> String {
        match self {
            Endpoint::Release => props.release_path(),
            Endpoint::Repos => props.repos_path(),
            Endpoint::Deploys => props.deploys_path(),
        }
    }

    fn decode(self, path: &str, value: Value) -> Result<FetchEvent> {
        let event = match self {
            Endpoint::Release => serde_json::from_value(value).map(FetchEvent::Release),
            Endpoint::Repos => {
                serde_json::from_value::<Vec<Value>>(value).map(|repos| FetchEvent::Repos(repos.len()))
            }
            Endpoint::Deploys => serde_json::from_value(value).map(FetchEvent::Deploys),
        };
        event.map_err(|source| ApiError::Decode {
            path: path.to_string(),
            source,
        })
    }
}

/// Outcome of one completed request.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchEvent {
    Release(ReleaseSummary),
    /// Number of repositories connected to the organization.
    Repos(usize),
    Deploys(Vec<Deploy>),
    Failed(Endpoint),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FetchState {
    pub loading: bool,
    pub error: bool,
    pub has_repos: bool,
    pub release: Option<ReleaseSummary>,
    pub deploys: Vec<Deploy>,
    #[serde(skip)]
    completed: usize,
}

impl Default for FetchState {
    fn default() -> Self {
        Self {
            loading: true,
            error: false,
            has_repos: false,
            release: None,
            deploys: Vec::new(),
            completed: 0,
        }
    }
}

impl FetchState {
    pub fn completed(&self) -> usize {
        self.completed
    }

    /// Folds one request completion into a new snapshot.
    ///
    /// `error` never goes back to false, and `loading` drops exactly when the
    /// last of the `REQUEST_COUNT` completions arrives, whatever the order.
    pub fn apply(self, event: FetchEvent) -> Self {
        let mut next = self;
        match event {
            FetchEvent::Release(release) => next.release = Some(release),
            FetchEvent::Repos(count) => next.has_repos = count > 0,
            FetchEvent::Deploys(deploys) => next.deploys = deploys,
            FetchEvent::Failed(_) => next.error = true,
        }

        next.completed += 1;
        if next.completed == REQUEST_COUNT {
            next.loading = false;
        }
        next
    }
}

pub struct FetchCoordinator {
    client: Arc<dyn ApiClient>,
    props: CardProps,
}

impl FetchCoordinator {
    pub fn new(client: Arc<dyn ApiClient>, props: CardProps) -> Self {
        Self { client, props }
    }

    pub async fn fetch(&self) -> FetchState {
        self.fetch_with(|_| {}).await
    }

    /// Fires all requests at once and reports every intermediate snapshot,
    /// in completion order, to `observer`.
    pub async fn fetch_with<F>(&self, mut observer: F) -> FetchState
    where
        F: FnMut(&FetchState),
    {
        let mut pending: FuturesUnordered<_> = Endpoint::ALL
            .into_iter()
            .map(|endpoint| self.request(endpoint))
            .collect();

        let mut state = FetchState::default();
        while let Some(event) = pending.next().await {
            state = state.apply(event);
            debug!(completed = state.completed(), loading = state.loading, "request completed");
            observer(&state);
        }

        info!(
            org = %self.props.org_id(),
            project = %self.props.project_id(),
            version = %self.props.version(),
            error = state.error,
            has_repos = state.has_repos,
            deploys = state.deploys.len(),
            "hovercard data loaded"
        );
        state
    }

    async fn request(&self, endpoint: Endpoint) -> FetchEvent {
        let path = endpoint.path(&self.props);
        let result = match self.client.get(&path).await {
            Ok(value) => endpoint.decode(&path, value),
            Err(err) => Err(err),
        };

        result.unwrap_or_else(|err| {
            warn!(?endpoint, error = %err, "request failed");
            FetchEvent::Failed(endpoint)
        })
    }
}
