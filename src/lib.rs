//! Client for the Jira REST API.
//!
//! Requests go through [`jira::client::JiraRestClient`], which rejects
//! misuse up front and classifies every response into JSON or a typed
//! [`JiraError`]. The services on [`Jira`] cache the collections they fetch
//! per key (global, project, or project and issue type) for the life of the
//! instance.

pub mod cache;
pub mod config;
pub mod error;
pub mod jira;
pub mod logging;

pub use error::{ErrorKind, JiraError, Result};
pub use jira::Jira;
