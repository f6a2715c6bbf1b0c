//! Serde-deserializable types matching Jira API responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::{Deserialize, Serialize};

use super::types::{
  CustomField, FieldSchema, IssueType, ProjectComponent, ProjectComponentCreationInfo, RemoteLink,
};

// ============================================================================
// Fields
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiFieldSchema {
  #[serde(rename = "type", default)]
  pub field_type: String,
  pub items: Option<String>,
  pub custom: Option<String>,
  #[serde(rename = "customId")]
  pub custom_id: Option<i64>,
}

/// Entry of `GET /field`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiField {
  pub id: String,
  #[serde(default)]
  pub name: String,
  #[serde(default)]
  pub custom: bool,
  pub schema: Option<ApiFieldSchema>,
}

/// Entry of the createmeta `values` array. The field id is under `fieldId`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiCreateMetaField {
  #[serde(rename = "fieldId")]
  pub field_id: String,
  #[serde(default)]
  pub name: String,
  pub schema: Option<ApiFieldSchema>,
}

#[derive(Debug, Deserialize)]
pub struct ApiCreateMetaResponse {
  pub values: Vec<ApiCreateMetaField>,
}

// ============================================================================
// Projects and issue types
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ApiIssueType {
  pub id: String,
  #[serde(default)]
  pub name: String,
  pub description: Option<String>,
  #[serde(default)]
  pub subtask: bool,
}

#[derive(Debug, Deserialize)]
pub struct ApiProject {
  #[serde(rename = "issueTypes", default)]
  pub issue_types: Vec<ApiIssueType>,
}

// ============================================================================
// Components
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiUser {
  pub name: Option<String>,
  #[serde(rename = "displayName")]
  pub display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiComponent {
  pub id: String,
  #[serde(default)]
  pub name: String,
  pub description: Option<String>,
  pub lead: Option<ApiUser>,
}

#[derive(Debug, Serialize)]
pub struct ApiComponentCreateRequest<'a> {
  pub name: &'a str,
  pub project: &'a str,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<&'a str>,
  #[serde(rename = "leadUserName", skip_serializing_if = "Option::is_none")]
  pub lead_user_name: Option<&'a str>,
  #[serde(rename = "assigneeType", skip_serializing_if = "Option::is_none")]
  pub assignee_type: Option<&'a str>,
}

// ============================================================================
// Remote links
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiRemoteLinkObject {
  pub url: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub title: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub summary: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiRemoteLink {
  pub object: ApiRemoteLinkObject,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

const CUSTOM_FIELD_PREFIX: &str = "customfield_";

impl From<ApiFieldSchema> for FieldSchema {
  fn from(schema: ApiFieldSchema) -> Self {
    FieldSchema {
      field_type: schema.field_type,
      items: schema.items,
      custom: schema.custom,
      custom_id: schema.custom_id,
    }
  }
}

impl From<ApiField> for CustomField {
  fn from(field: ApiField) -> Self {
    CustomField {
      id: field.id,
      name: field.name,
      schema: field.schema.map(FieldSchema::from),
    }
  }
}

impl ApiCreateMetaField {
  /// Map `fieldId` to the field id. Non-custom fields yield `None`; every
  /// surviving field is custom by construction.
  pub fn into_custom_field(self) -> Option<CustomField> {
    if !is_custom_field_id(&self.field_id) {
      return None;
    }
    Some(CustomField::from(ApiField {
      id: self.field_id,
      name: self.name,
      custom: true,
      schema: self.schema,
    }))
  }
}

fn is_custom_field_id(id: &str) -> bool {
  id.get(..CUSTOM_FIELD_PREFIX.len())
    .is_some_and(|prefix| prefix.eq_ignore_ascii_case(CUSTOM_FIELD_PREFIX))
}

impl From<ApiIssueType> for IssueType {
  fn from(issue_type: ApiIssueType) -> Self {
    IssueType {
      id: issue_type.id,
      name: issue_type.name,
      description: issue_type.description,
      subtask: issue_type.subtask,
    }
  }
}

impl ApiComponent {
  /// The server omits the owning project, so the caller supplies it.
  pub fn into_component(self, project_key: &str) -> ProjectComponent {
    ProjectComponent {
      id: self.id,
      name: self.name,
      project_key: project_key.to_string(),
      description: self.description,
      lead: self.lead.and_then(|u| u.name.or(u.display_name)),
    }
  }
}

impl<'a> From<&'a ProjectComponentCreationInfo> for ApiComponentCreateRequest<'a> {
  fn from(info: &'a ProjectComponentCreationInfo) -> Self {
    ApiComponentCreateRequest {
      name: &info.name,
      project: &info.project_key,
      description: info.description.as_deref(),
      lead_user_name: info.lead_user_name.as_deref(),
      assignee_type: info.assignee_type.as_deref(),
    }
  }
}

impl From<ApiRemoteLink> for RemoteLink {
  fn from(link: ApiRemoteLink) -> Self {
    RemoteLink {
      url: link.object.url,
      title: link.object.title,
      summary: link.object.summary,
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn test_createmeta_field_maps_field_id() {
    let field: ApiCreateMetaField = serde_json::from_value(json!({
      "fieldId": "customfield_100",
      "name": "Story Points",
      "schema": {"type": "number", "custom": "com.atlassian.jira.plugin.system.customfieldtypes:float", "customId": 100}
    }))
    .unwrap();

    let custom = field.into_custom_field().unwrap();
    assert_eq!(custom.id, "customfield_100");
    assert_eq!(custom.name, "Story Points");
    assert_eq!(custom.schema.unwrap().custom_id, Some(100));
  }

  #[test]
  fn test_createmeta_drops_system_fields() {
    let field: ApiCreateMetaField =
      serde_json::from_value(json!({"fieldId": "summary", "name": "Summary"})).unwrap();
    assert!(field.into_custom_field().is_none());
  }

  #[test]
  fn test_custom_field_prefix_is_case_insensitive() {
    assert!(is_custom_field_id("CustomField_1"));
    assert!(!is_custom_field_id("custom"));
    assert!(!is_custom_field_id("ü"));
  }

  #[test]
  fn test_component_lead_prefers_user_name() {
    let component: ApiComponent = serde_json::from_value(json!({
      "id": "10000",
      "name": "Backend",
      "lead": {"name": "jdoe", "displayName": "J. Doe"}
    }))
    .unwrap();

    let component = component.into_component("TEST");
    assert_eq!(component.project_key, "TEST");
    assert_eq!(component.lead.as_deref(), Some("jdoe"));
  }

  #[test]
  fn test_component_create_request_omits_absent_fields() {
    let info = ProjectComponentCreationInfo::new("Backend", "TEST");
    let body = serde_json::to_value(ApiComponentCreateRequest::from(&info)).unwrap();
    assert_eq!(body, json!({"name": "Backend", "project": "TEST"}));
  }
}
