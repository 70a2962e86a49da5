use chrono::{DateTime, Utc};
use serde::Serialize;

use super::card::CardProps;
use super::deploys::{EnvironmentDeployIndex, MAX_DISPLAYED_ENVIRONMENTS};
use super::fetch::FetchState;
use super::time_since::time_since;
use super::version::short_version;
use crate::sentry::{Commit, ReleaseSummary};

/// What the card body shows. Exactly one mode applies at a time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ViewMode {
    Loading,
    Error,
    ConnectRepository(RepositoryPrompt),
    Summary(ReleaseCard),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RepositoryPrompt {
    pub title: String,
    pub description: String,
    pub action: String,
    pub link: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReleaseCard {
    pub short_version: String,
    pub new_issues: u64,
    pub commit_count: u64,
    pub author_count: usize,
    pub commits_label: String,
    pub avatars: Vec<String>,
    pub last_commit: Option<LastCommit>,
    /// `None` when the release has never been deployed.
    pub deploys: Option<Vec<DeployRow>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastCommit {
    pub short_id: String,
    pub title: String,
    pub author: Option<String>,
    pub time_since: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeployRow {
    pub environment: String,
    pub time_since: Option<String>,
}

/// Header and body handed to the popup container.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardContent {
    pub header: Option<String>,
    pub body: ViewMode,
}

impl From<ViewMode> for CardContent {
    fn from(body: ViewMode) -> Self {
        let header = match &body {
            ViewMode::Summary(card) => Some(format!("Release {}", card.short_version)),
            _ => None,
        };
        Self { header, body }
    }
}

impl ViewMode {
    /// Precedence: loading, then error, then the missing-repository prompt,
    /// then the populated summary.
    pub fn resolve(props: &CardProps, state: &FetchState, now: DateTime<Utc>) -> Self {
        if state.loading {
            return ViewMode::Loading;
        }
        if state.error {
            return ViewMode::Error;
        }
        if !state.has_repos {
            return ViewMode::ConnectRepository(RepositoryPrompt::for_org(props.org_id()));
        }
        match &state.release {
            Some(release) => {
                ViewMode::Summary(ReleaseCard::build(props.version(), release, state, now))
            }
            None => ViewMode::Error,
        }
    }
}

impl RepositoryPrompt {
    fn for_org(org_id: &str) -> Self {
        Self {
            title: "Releases are better with commit data!".to_string(),
            description: "Connect a repository to see commit info, files changed, and \
                          authors involved in future releases."
                .to_string(),
            action: "Connect a repository".to_string(),
            link: format!("/organizations/{}/repos/", org_id),
        }
    }
}

fn plural(count: u64, one: &str, many: &str) -> String {
    let word = if count == 1 { one } else { many };
    format!("{} {}", count, word)
}

impl ReleaseCard {
    fn build(
        version: &str,
        release: &ReleaseSummary,
        state: &FetchState,
        now: DateTime<Utc>,
    ) -> Self {
        let author_count = release.authors.len();
        let commits_label = format!(
            "{} by {}",
            plural(release.commit_count, "commit", "commits"),
            plural(author_count as u64, "author", "authors")
        );

        let avatars = release
            .authors
            .iter()
            .map(|author| author.label())
            .collect();

        let deploys = if state.deploys.is_empty() {
            None
        } else {
            let index = EnvironmentDeployIndex::from_deploys(&state.deploys);
            let rows = index
                .recent(MAX_DISPLAYED_ENVIRONMENTS)
                .map(|(environment, finished)| DeployRow {
                    environment: environment.to_string(),
                    time_since: finished.map(|date| time_since(date, now)),
                })
                .collect();
            Some(rows)
        };

        Self {
            short_version: short_version(version).to_string(),
            new_issues: release.new_issue_count,
            commit_count: release.commit_count,
            author_count,
            commits_label,
            avatars,
            last_commit: release
                .last_commit
                .as_ref()
                .map(|commit| LastCommit::build(commit, now)),
            deploys,
        }
    }
}

impl LastCommit {
    fn build(commit: &Commit, now: DateTime<Utc>) -> Self {
        Self {
            short_id: commit.short_id().to_string(),
            title: commit.title().to_string(),
            author: commit.author.as_ref().and_then(|a| a.name.clone()),
            time_since: commit.date_created.map(|date| time_since(date, now)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hovercard::fetch::tests::acme_props;
    use crate::hovercard::fetch::{Endpoint, FetchEvent};
    use crate::sentry::types::Author;
    use crate::sentry::Deploy;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 3, 0, 0).unwrap()
    }

    fn release(commit_count: u64, authors: usize) -> ReleaseSummary {
        ReleaseSummary {
            version: "1.2.3".to_string(),
            new_issue_count: 4,
            commit_count,
            authors: (0..authors)
                .map(|i| Author {
                    name: Some(format!("A{}", i)),
                    email: Some(format!("a{}@x.com", i)),
                })
                .collect(),
            last_commit: None,
        }
    }

    fn loaded(release: ReleaseSummary, repos: usize, deploys: Vec<Deploy>) -> FetchState {
        FetchState::default()
            .apply(FetchEvent::Release(release))
            .apply(FetchEvent::Repos(repos))
            .apply(FetchEvent::Deploys(deploys))
    }

    fn deploy(env: &str, date: Option<DateTime<Utc>>) -> Deploy {
        Deploy {
            environment: env.to_string(),
            date_finished: date,
        }
    }

    #[test]
    fn loading_wins_over_everything() {
        let state = FetchState::default().apply(FetchEvent::Failed(Endpoint::Repos));
        assert_eq!(ViewMode::resolve(&acme_props("1.2.3"), &state, now()), ViewMode::Loading);
    }

    #[test]
    fn error_hides_partial_data() {
        let state = FetchState::default()
            .apply(FetchEvent::Release(release(2, 1)))
            .apply(FetchEvent::Repos(1))
            .apply(FetchEvent::Failed(Endpoint::Deploys));

        let content = CardContent::from(ViewMode::resolve(&acme_props("1.2.3"), &state, now()));
        assert_eq!(content.body, ViewMode::Error);
        assert_eq!(content.header, None);
    }

    #[test]
    fn no_repos_prompts_to_connect_one() {
        let state = loaded(release(9, 3), 0, vec![deploy("prod", None)]);

        let content = CardContent::from(ViewMode::resolve(&acme_props("1.2.3"), &state, now()));

        assert_eq!(content.header, None);
        match content.body {
            ViewMode::ConnectRepository(prompt) => {
                assert_eq!(prompt.link, "/organizations/acme/repos/");
                assert_eq!(prompt.action, "Connect a repository");
            }
            other => panic!("unexpected mode {:?}", other),
        }
    }

    #[test]
    fn populated_summary() {
        let state = loaded(
            release(2, 1),
            1,
            vec![
                deploy("prod", Some(Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap())),
                deploy("staging", None),
            ],
        );

        let content = CardContent::from(ViewMode::resolve(&acme_props("1.2.3"), &state, now()));

        assert_eq!(content.header.as_deref(), Some("Release 1.2.3"));
        let ViewMode::Summary(card) = content.body else {
            panic!("expected summary");
        };
        assert_eq!(card.new_issues, 4);
        assert_eq!(card.commits_label, "2 commits by 1 author");
        assert_eq!(card.avatars, vec!["A0 a0@x.com"]);
        assert_eq!(card.last_commit, None);
        assert_eq!(
            card.deploys,
            Some(vec![
                DeployRow {
                    environment: "prod".to_string(),
                    time_since: Some("3 hours ago".to_string()),
                },
                DeployRow {
                    environment: "staging".to_string(),
                    time_since: None,
                },
            ])
        );
    }

    #[test]
    fn singular_and_plural_labels() {
        let props = acme_props("1.2.3");
        let label = |commits, authors| match ViewMode::resolve(
            &props,
            &loaded(release(commits, authors), 1, vec![]),
            now(),
        ) {
            ViewMode::Summary(card) => card.commits_label,
            other => panic!("unexpected mode {:?}", other),
        };

        assert_eq!(label(1, 1), "1 commit by 1 author");
        assert_eq!(label(0, 0), "0 commits by 0 authors");
        assert_eq!(label(5, 2), "5 commits by 2 authors");
    }

    #[test]
    fn no_deploys_hides_the_section() {
        let state = loaded(release(1, 1), 1, vec![]);
        let ViewMode::Summary(card) = ViewMode::resolve(&acme_props("1.2.3"), &state, now())
        else {
            panic!("expected summary");
        };
        assert_eq!(card.deploys, None);
    }

    #[test]
    fn last_commit_block() {
        let mut summary = release(1, 1);
        summary.last_commit = Some(Commit {
            id: "deadbeefcafe".to_string(),
            message: Some("Ship it\n\ndetails".to_string()),
            date_created: Some(Utc.with_ymd_and_hms(2020, 1, 1, 2, 55, 0).unwrap()),
            author: Some(Author {
                name: Some("A0".to_string()),
                email: Some("a0@x.com".to_string()),
            }),
        });
        let state = loaded(summary, 1, vec![]);

        let ViewMode::Summary(card) = ViewMode::resolve(&acme_props("1.2.3"), &state, now())
        else {
            panic!("expected summary");
        };
        assert_eq!(
            card.last_commit,
            Some(LastCommit {
                short_id: "deadbee".to_string(),
                title: "Ship it".to_string(),
                author: Some("A0".to_string()),
                time_since: Some("5 minutes ago".to_string()),
            })
        );
    }

    #[test]
    fn header_uses_short_version() {
        let props = acme_props("com.example.app-2.0.0");
        let state = loaded(release(1, 1), 1, vec![]);
        let content = CardContent::from(ViewMode::resolve(&props, &state, now()));
        assert_eq!(content.header.as_deref(), Some("Release 2.0.0"));
    }
}
