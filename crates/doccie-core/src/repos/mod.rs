// SPDX-License-Identifier: Apache-2.0

//! Repositories visible to the signed-in user.
//!
//! The backend listing is the source of truth for `is_active` and
//! `backend_path`. Every [`RepositoryDirectory`] starts from a fresh fetch;
//! changes made through a detail controller are local to that controller.

pub mod detail;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, instrument};

use crate::api::endpoints;
use crate::auth::AuthGateway;
use crate::error::DoccieError;
use crate::notify::Notifier;

/// A repository as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    /// Provider repository id.
    pub id: u64,
    /// Short name.
    pub name: String,
    /// `owner/name`.
    pub full_name: String,
    /// Whether the backend monitors this repository via a webhook.
    #[serde(default, deserialize_with = "bool_or_string")]
    pub is_active: bool,
    /// Directory inside the repository that holds the backend code.
    #[serde(default)]
    pub backend_path: Option<String>,
}

impl Repository {
    /// Monitoring status.
    #[must_use]
    pub fn status(&self) -> RepoStatus {
        if self.is_active {
            RepoStatus::Active
        } else {
            RepoStatus::Inactive
        }
    }
}

/// The backend stores `is_active` as text and may send `"true"` instead of `true`.
fn bool_or_string<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Bool(bool),
        Text(String),
        Int(i64),
        Null(()),
    }

    Ok(match Raw::deserialize(de)? {
        Raw::Bool(value) => value,
        Raw::Text(text) => matches!(text.trim().to_ascii_lowercase().as_str(), "true" | "1"),
        Raw::Int(value) => value != 0,
        Raw::Null(()) => false,
    })
}

/// Monitoring status of a repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoStatus {
    /// Monitored.
    Active,
    /// Not monitored.
    Inactive,
}

impl fmt::Display for RepoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoStatus::Active => write!(f, "active"),
            RepoStatus::Inactive => write!(f, "inactive"),
        }
    }
}

/// Set of statuses a listing is filtered to. Both are selected by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusSet {
    active: bool,
    inactive: bool,
}

impl Default for StatusSet {
    fn default() -> Self {
        Self::all()
    }
}

impl StatusSet {
    /// Both statuses.
    #[must_use]
    pub fn all() -> Self {
        Self {
            active: true,
            inactive: true,
        }
    }

    /// No status. Nothing matches.
    #[must_use]
    pub fn none() -> Self {
        Self {
            active: false,
            inactive: false,
        }
    }

    /// A single status.
    #[must_use]
    pub fn only(status: RepoStatus) -> Self {
        Self::none().with(status)
    }

    /// Adds a status to the set.
    #[must_use]
    pub fn with(mut self, status: RepoStatus) -> Self {
        match status {
            RepoStatus::Active => self.active = true,
            RepoStatus::Inactive => self.inactive = true,
        }
        self
    }

    /// Builds a set from a list; an empty list means all statuses.
    #[must_use]
    pub fn from_statuses(statuses: &[RepoStatus]) -> Self {
        if statuses.is_empty() {
            return Self::all();
        }
        statuses
            .iter()
            .fold(Self::none(), |set, status| set.with(*status))
    }

    /// Returns `true` if `status` is selected.
    #[must_use]
    pub fn contains(&self, status: RepoStatus) -> bool {
        match status {
            RepoStatus::Active => self.active,
            RepoStatus::Inactive => self.inactive,
        }
    }
}

/// Search text plus status selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoFilter {
    /// Case-insensitive substring matched against the repository name.
    pub search: String,
    /// Statuses to include.
    pub statuses: StatusSet,
}

impl RepoFilter {
    /// Returns `true` if `repo` passes the filter.
    #[must_use]
    pub fn matches(&self, repo: &Repository) -> bool {
        let needle = self.search.trim().to_lowercase();
        let name_matches = needle.is_empty() || repo.name.to_lowercase().contains(&needle);
        name_matches && self.statuses.contains(repo.status())
    }

    /// Filters `repos`, keeping the original order.
    #[must_use]
    pub fn apply<'a>(&self, repos: &'a [Repository]) -> Vec<&'a Repository> {
        repos.iter().filter(|repo| self.matches(repo)).collect()
    }
}

/// Load state of the repository listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Listing {
    /// Not fetched yet, or a fetch is in flight.
    #[default]
    Loading,
    /// The fetch failed.
    Failed(String),
    /// The backend answered.
    Loaded(Vec<Repository>),
}

/// What the listing page shows for the current filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterView<'a> {
    /// Fetch still running.
    Loading,
    /// Fetch failed with this message.
    Failed(&'a str),
    /// Loaded, but nothing matches the filter.
    NoResults,
    /// Matching repositories, in listing order.
    Matches(Vec<&'a Repository>),
}

/// Identifies a repository by id or by `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoSelector {
    /// Numeric provider id.
    Id(u64),
    /// `owner/name`, compared case-insensitively.
    FullName(String),
}

impl RepoSelector {
    /// Returns `true` if `repo` is the one selected.
    #[must_use]
    pub fn matches(&self, repo: &Repository) -> bool {
        match self {
            RepoSelector::Id(id) => repo.id == *id,
            RepoSelector::FullName(name) => repo.full_name.eq_ignore_ascii_case(name),
        }
    }
}

impl FromStr for RepoSelector {
    type Err = DoccieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<u64>() {
            return Ok(RepoSelector::Id(id));
        }
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(RepoSelector::FullName(s.to_string()))
            }
            _ => Err(DoccieError::validation(format!(
                "Invalid repository '{s}': expected a numeric id or owner/name"
            ))),
        }
    }
}

impl fmt::Display for RepoSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoSelector::Id(id) => write!(f, "#{id}"),
            RepoSelector::FullName(name) => write!(f, "{name}"),
        }
    }
}

/// Fetches every repository visible to the signed-in user. No pagination.
#[instrument(skip(gateway))]
pub async fn list_repositories(gateway: &AuthGateway) -> crate::Result<Vec<Repository>> {
    let repos: Vec<Repository> = gateway.get_json(endpoints::REPO_LIST).await?;
    debug!(count = repos.len(), "Fetched repositories");
    Ok(repos)
}

/// Repository listing page: fetch, filter, select.
pub struct RepositoryDirectory<'a> {
    gateway: &'a AuthGateway,
    notifier: &'a dyn Notifier,
    listing: Listing,
    filter: RepoFilter,
}

impl<'a> RepositoryDirectory<'a> {
    /// Creates an empty directory in the loading state.
    pub fn new(gateway: &'a AuthGateway, notifier: &'a dyn Notifier) -> Self {
        Self {
            gateway,
            notifier,
            listing: Listing::Loading,
            filter: RepoFilter::default(),
        }
    }

    /// Fetches the listing.
    ///
    /// Fetch failures become an error notice and a [`Listing::Failed`] state.
    /// Only session errors are returned, because the caller has to send the
    /// user back to login.
    pub async fn refresh(&mut self) -> crate::Result<()> {
        self.listing = Listing::Loading;
        match list_repositories(self.gateway).await {
            Ok(repos) => {
                self.listing = Listing::Loaded(repos);
                Ok(())
            }
            Err(e) if e.is_session_error() => {
                self.listing = Listing::Failed(e.to_string());
                Err(e)
            }
            Err(e) => {
                self.notifier.error("Failed to fetch repositories");
                self.listing = Listing::Failed(e.to_string());
                Ok(())
            }
        }
    }

    /// Current load state.
    #[must_use]
    pub fn listing(&self) -> &Listing {
        &self.listing
    }

    /// Current filter.
    #[must_use]
    pub fn filter(&self) -> &RepoFilter {
        &self.filter
    }

    /// Replaces the search text.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.filter.search = search.into();
    }

    /// Replaces the status selection.
    pub fn set_statuses(&mut self, statuses: StatusSet) {
        self.filter.statuses = statuses;
    }

    /// Listing as seen through the current filter.
    #[must_use]
    pub fn view(&self) -> FilterView<'_> {
        match &self.listing {
            Listing::Loading => FilterView::Loading,
            Listing::Failed(message) => FilterView::Failed(message),
            Listing::Loaded(repos) => {
                let matches = self.filter.apply(repos);
                if matches.is_empty() {
                    FilterView::NoResults
                } else {
                    FilterView::Matches(matches)
                }
            }
        }
    }

    /// Looks a repository up in the loaded listing, ignoring the filter.
    #[must_use]
    pub fn find(&self, selector: &RepoSelector) -> Option<&Repository> {
        match &self.listing {
            Listing::Loaded(repos) => repos.iter().find(|repo| selector.matches(repo)),
            _ => None,
        }
    }
}
