/// Type metadata of a field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSchema {
  pub field_type: String,
  pub items: Option<String>,
  /// Plugin key of a custom field type
  pub custom: Option<String>,
  pub custom_id: Option<i64>,
}

/// User-defined issue field, id is `customfield_<n>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomField {
  pub id: String,
  pub name: String,
  pub schema: Option<FieldSchema>,
}

/// Issue type available in a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueType {
  pub id: String,
  pub name: String,
  pub description: Option<String>,
  pub subtask: bool,
}

/// Sub-categorization of issues within a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectComponent {
  pub id: String,
  pub name: String,
  pub project_key: String,
  pub description: Option<String>,
  /// Lead user name
  pub lead: Option<String>,
}

/// Payload for creating a component
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectComponentCreationInfo {
  pub name: String,
  pub project_key: String,
  pub description: Option<String>,
  pub lead_user_name: Option<String>,
  /// e.g. "PROJECT_DEFAULT", "COMPONENT_LEAD", "UNASSIGNED"
  pub assignee_type: Option<String>,
}

impl ProjectComponentCreationInfo {
  pub fn new(name: impl Into<String>, project_key: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      project_key: project_key.into(),
      ..Default::default()
    }
  }
}

/// Link from an issue to a resource outside Jira
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLink {
  pub url: String,
  pub title: Option<String>,
  pub summary: Option<String>,
}

/// Filters for custom field lookups. Empty strings count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomFieldFetchOptions {
  pub project_key: Option<String>,
  /// When absent with a project key set, fields of every issue type of the
  /// project are merged
  pub issue_type_id: Option<String>,
}

impl CustomFieldFetchOptions {
  pub fn for_project(project_key: impl Into<String>) -> Self {
    Self {
      project_key: Some(project_key.into()),
      issue_type_id: None,
    }
  }

  pub fn for_issue_type(project_key: impl Into<String>, issue_type_id: impl Into<String>) -> Self {
    Self {
      project_key: Some(project_key.into()),
      issue_type_id: Some(issue_type_id.into()),
    }
  }

  pub fn project_key(&self) -> Option<&str> {
    non_empty(self.project_key.as_deref())
  }

  pub fn issue_type_id(&self) -> Option<&str> {
    non_empty(self.issue_type_id.as_deref())
  }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
  value.filter(|v| !v.is_empty())
}
