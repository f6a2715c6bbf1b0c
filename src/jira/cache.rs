//! Caching implementations for Jira types.

use crate::cache::{CacheKey, Cacheable};

use super::types::{CustomField, IssueType, ProjectComponent};

// ============================================================================
// Cacheable implementations
// ============================================================================

impl Cacheable for CustomField {
  fn cache_id(&self) -> &str {
    &self.id
  }

  fn entity_type() -> &'static str {
    "custom_field"
  }
}

impl Cacheable for IssueType {
  fn cache_id(&self) -> &str {
    &self.id
  }

  fn entity_type() -> &'static str {
    "issue_type"
  }
}

impl Cacheable for ProjectComponent {
  fn cache_id(&self) -> &str {
    &self.id
  }

  fn entity_type() -> &'static str {
    "project_component"
  }
}

// ============================================================================
// Cache key types
// ============================================================================

/// Scope a cached collection belongs to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JiraCacheKey {
  /// Server-wide collection
  Global,
  /// Collection scoped to one project
  Project { project_key: String },
  /// Collection scoped to one issue type of one project
  ProjectIssueType {
    project_key: String,
    issue_type_id: String,
  },
}

impl JiraCacheKey {
  pub fn project(project_key: &str) -> Self {
    Self::Project {
      project_key: project_key.to_string(),
    }
  }

  pub fn project_issue_type(project_key: &str, issue_type_id: &str) -> Self {
    Self::ProjectIssueType {
      project_key: project_key.to_string(),
      issue_type_id: issue_type_id.to_string(),
    }
  }
}

impl CacheKey for JiraCacheKey {
  fn cache_key(&self) -> String {
    match self {
      // Not a valid project key, so it can't collide with one
      Self::Global => "*".to_string(),
      Self::Project { project_key } => project_key.clone(),
      Self::ProjectIssueType {
        project_key,
        issue_type_id,
      } => format!("{}::{}", project_key, issue_type_id),
    }
  }

  fn description(&self) -> String {
    match self {
      Self::Global => "global".to_string(),
      Self::Project { project_key } => format!("project {}", project_key),
      Self::ProjectIssueType {
        project_key,
        issue_type_id,
      } => format!("project {} issue type {}", project_key, issue_type_id),
    }
  }
}
