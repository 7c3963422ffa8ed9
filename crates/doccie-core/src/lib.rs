// SPDX-License-Identifier: Apache-2.0

#![warn(missing_docs)]

//! # Doccie Core
//!
//! Core library for the Doccie client - session lifecycle and backend access
//! for AI-generated repository documentation.
//!
//! This crate provides reusable components for:
//! - GitHub OAuth sign-in through the Doccie backend
//! - Persisted sessions with a single authoritative auth state
//! - Repository listing, filtering and webhook monitoring
//! - Fetching and exporting generated OpenAPI documentation
//! - Configuration management
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use doccie_core::{AuthGateway, SilentNotifier, load_config};
//! use doccie_core::repos::{FilterView, RepositoryDirectory};
//! use anyhow::Result;
//!
//! # async fn example() -> Result<()> {
//! let config = load_config()?;
//! let gateway = AuthGateway::from_config(&config)?;
//!
//! if !gateway.validate_session().await {
//!     println!("Open {} to sign in", gateway.authorization_url()?);
//!     return Ok(());
//! }
//!
//! let mut directory = RepositoryDirectory::new(&gateway, &SilentNotifier);
//! directory.refresh().await?;
//! directory.set_search("api");
//! if let FilterView::Matches(repos) = directory.view() {
//!     for repo in repos {
//!         println!("{} ({})", repo.full_name, repo.status());
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - [`api`] - Backend HTTP client and endpoint paths
//! - [`auth`] - OAuth flow, session validation, protected requests
//! - [`config`] - Configuration loading and paths
//! - [`docs`] - Documentation retrieval and export
//! - [`error`] - Error types
//! - [`notify`] - User notices
//! - [`repos`] - Repository listing and detail controller
//! - [`session`] - Persisted session and auth state

// ============================================================================
// Error Handling
// ============================================================================

pub use error::DoccieError;

/// Convenience Result type for Doccie operations.
///
/// This is equivalent to `std::result::Result<T, DoccieError>`.
pub type Result<T> = std::result::Result<T, DoccieError>;

// ============================================================================
// Configuration
// ============================================================================

pub use config::{
    ApiConfig, AppConfig, OAuthConfig, SessionBackendKind, SessionConfig, UiConfig, config_dir,
    config_file_path, data_dir, load_config,
};

// ============================================================================
// Session and Authentication
// ============================================================================

pub use auth::{AuthGateway, strip_code_param};
pub use session::{AuthState, Credential, Session, SessionStore, UserProfile, open_store};

// ============================================================================
// Repositories
// ============================================================================

pub use repos::detail::{DetailController, NodeKind, RepositoryDetails, TreeNode, Visibility};
pub use repos::{RepoFilter, RepoSelector, RepoStatus, Repository, StatusSet};

// ============================================================================
// Documentation
// ============================================================================

pub use docs::{DocsOutcome, DocsState, DocumentationBundle, ExportFormat};

// ============================================================================
// Notices
// ============================================================================

pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier, SilentNotifier};

// ============================================================================
// Modules
// ============================================================================

pub mod api;
pub mod auth;
pub mod config;
pub mod docs;
pub mod error;
pub mod notify;
pub mod repos;
pub mod session;
