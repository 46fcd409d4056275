//! Transformation functions for Jira API responses

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::adf::render_markdown;

/// Statuses treated as closed when listing assigned tickets.
const CLOSED_STATUSES: [&str; 3] = ["Done", "Cancelled", "Closed"];

/// Search response from the Jira API (offset-based pagination)
#[derive(Debug, Deserialize, Clone)]
pub struct JiraSearchResponse {
    #[serde(default)]
    pub issues: Vec<JiraIssueResponse>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    #[serde(rename = "startAt")]
    pub start_at: Option<u64>,
    #[serde(default)]
    #[serde(rename = "maxResults")]
    pub max_results: Option<u64>,
}

/// Jira issue response from API
#[derive(Debug, Deserialize, Clone)]
pub struct JiraIssueResponse {
    pub key: String,
    #[serde(default)]
    pub fields: JiraIssueFields,
}

/// Fields from Jira issue
#[derive(Debug, Deserialize, Clone, Default)]
pub struct JiraIssueFields {
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub status: Option<JiraStatus>,
    #[serde(default)]
    pub priority: Option<JiraPriority>,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
}

/// Jira status field
#[derive(Debug, Deserialize, Clone)]
pub struct JiraStatus {
    pub name: String,
}

/// Jira priority field
#[derive(Debug, Deserialize, Clone)]
pub struct JiraPriority {
    #[serde(default)]
    pub name: String,
}

/// Comments page from the Jira API
#[derive(Debug, Deserialize, Clone)]
pub struct JiraCommentsResponse {
    #[serde(default)]
    pub comments: Vec<JiraCommentResponse>,
    #[serde(default)]
    pub total: Option<u64>,
    #[serde(default)]
    #[serde(rename = "startAt")]
    pub start_at: Option<u64>,
    #[serde(default)]
    #[serde(rename = "maxResults")]
    pub max_results: Option<u64>,
}

/// A single comment as returned by the Jira API
#[derive(Debug, Deserialize, Clone)]
pub struct JiraCommentResponse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub author: Option<JiraAuthor>,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub updated: Option<String>,
    /// Comment body; an ADF document when present.
    #[serde(default)]
    pub body: Option<Value>,
}

/// Jira user reference
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct JiraAuthor {
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
    #[serde(rename = "accountId", default)]
    pub account_id: Option<String>,
}

/// An entry of the /rest/api/3/field catalog
#[derive(Debug, Deserialize, Clone)]
pub struct JiraField {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// Output structure for an assigned ticket
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TicketOutput {
    pub key: String,
    pub title: Option<String>,
    pub url: String,
    pub status: Option<String>,
    pub priority: Option<String>,
    pub labels: Vec<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Output structure for a rendered comment
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CommentOutput {
    pub id: Option<String>,
    pub author: AuthorOutput,
    pub created: Option<String>,
    pub updated: Option<String>,
    pub body_markdown: String,
}

/// Output structure for a comment author
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct AuthorOutput {
    pub display_name: Option<String>,
    pub account_id: Option<String>,
}

/// Output structure for a ticket's description details
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct DescriptionOutput {
    pub key: Option<String>,
    pub url: String,
    pub description_markdown: String,
    pub acceptance_criteria_markdown: String,
    pub labels: Vec<String>,
    pub parent: Option<ParentOutput>,
    pub status: Option<String>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

/// Output structure for a parent ticket reference
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ParentOutput {
    pub key: Option<String>,
    pub title: Option<String>,
    pub url: Option<String>,
}

/// Convert one search page to ticket outputs.
///
/// Issues whose status is Done, Cancelled, or Closed are dropped; browse
/// URLs are built from the configured base URL.
///
/// # Arguments
/// * `response` - One page of the Jira search response
/// * `base_url` - Site base URL, without a trailing slash
///
/// # Returns
/// * `Vec<TicketOutput>` - Open tickets from this page
pub fn transform_search_page(response: JiraSearchResponse, base_url: &str) -> Vec<TicketOutput> {
    response
        .issues
        .into_iter()
        .filter_map(|issue| {
            let fields = issue.fields;
            let status = fields.status.map(|s| s.name);
            if status
                .as_deref()
                .is_some_and(|name| CLOSED_STATUSES.contains(&name))
            {
                return None;
            }
            let url = format!("{base_url}/browse/{}", issue.key);
            Some(TicketOutput {
                key: issue.key,
                title: fields.summary,
                url,
                status,
                priority: fields.priority.map(|p| p.name),
                labels: fields.labels,
                created_at: fields.created,
                updated_at: fields.updated,
            })
        })
        .collect()
}

/// Sort tickets most recently updated first; tickets without an update
/// timestamp sort last.
pub fn sort_tickets_by_updated(tickets: &mut [TicketOutput]) {
    tickets.sort_by(|a, b| {
        let a_key = a.updated_at.as_deref().unwrap_or("");
        let b_key = b.updated_at.as_deref().unwrap_or("");
        b_key.cmp(a_key)
    });
}

/// Convert one comments page to comment outputs, rendering each ADF body
/// to Markdown.
pub fn transform_comments_page(page: JiraCommentsResponse) -> Vec<CommentOutput> {
    page.comments
        .into_iter()
        .map(|comment| CommentOutput {
            id: comment.id,
            author: AuthorOutput {
                display_name: comment
                    .author
                    .as_ref()
                    .and_then(|a| a.display_name.clone()),
                account_id: comment.author.as_ref().and_then(|a| a.account_id.clone()),
            },
            created: comment.created,
            updated: comment.updated,
            body_markdown: render_markdown(comment.body.as_ref()),
        })
        .collect()
}

/// Convert a raw issue response into description details.
///
/// Works on the raw JSON because the acceptance criteria field id is only
/// known at runtime.
///
/// # Arguments
/// * `data` - The raw issue response from the Jira API
/// * `base_url` - Site base URL, without a trailing slash
/// * `issue_key` - The requested issue key (used for the browse URL)
/// * `acceptance_field_id` - Custom field id for acceptance criteria, if discovered
///
/// # Returns
/// * `DescriptionOutput` - Rendered description and ticket metadata
pub fn transform_description_response(
    data: &Value,
    base_url: &str,
    issue_key: &str,
    acceptance_field_id: Option<&str>,
) -> DescriptionOutput {
    let fields = data.get("fields").unwrap_or(&Value::Null);

    let parent = fields.get("parent");
    let parent_key = parent.and_then(|p| p.get("key")).and_then(Value::as_str);
    let parent_fields = parent.and_then(|p| p.get("fields"));
    let has_parent_fields = parent_fields
        .and_then(Value::as_object)
        .is_some_and(|m| !m.is_empty());
    let parent_out = if parent_key.is_some() || has_parent_fields {
        Some(ParentOutput {
            key: parent_key.map(str::to_string),
            title: parent_fields
                .and_then(|f| f.get("summary"))
                .and_then(Value::as_str)
                .map(str::to_string),
            url: parent_key.map(|key| format!("{base_url}/browse/{key}")),
        })
    } else {
        None
    };

    DescriptionOutput {
        key: data.get("key").and_then(Value::as_str).map(str::to_string),
        url: format!("{base_url}/browse/{issue_key}"),
        description_markdown: render_markdown(fields.get("description")),
        acceptance_criteria_markdown: render_markdown(
            acceptance_field_id.and_then(|id| fields.get(id)),
        ),
        labels: fields
            .get("labels")
            .and_then(Value::as_array)
            .map(|labels| {
                labels
                    .iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
        parent: parent_out,
        status: fields
            .get("status")
            .and_then(|s| s.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string),
        created_at: fields
            .get("created")
            .and_then(Value::as_str)
            .map(str::to_string),
        updated_at: fields
            .get("updated")
            .and_then(Value::as_str)
            .map(str::to_string),
    }
}

/// Locate the "Acceptance Criteria" custom field in the field catalog.
///
/// An exact name match (case-insensitive, whitespace-trimmed) wins over a
/// substring match.
pub fn find_acceptance_criteria_field(fields: &[JiraField]) -> Option<String> {
    const TARGET: &str = "acceptance criteria";

    for field in fields {
        if let Some(name) = &field.name {
            if name.trim().eq_ignore_ascii_case(TARGET) {
                return field.id.clone();
            }
        }
    }

    for field in fields {
        if let Some(name) = &field.name {
            if name.trim().to_lowercase().contains(TARGET) {
                return field.id.clone();
            }
        }
    }

    None
}

/// Find the first Jira issue key in free text, e.g. a bare key or a
/// browse URL.
pub fn extract_issue_key(input: &str) -> Option<String> {
    let re = regex::Regex::new(r"\b([A-Z][A-Z0-9]+-\d+)\b").unwrap();
    re.captures(input).map(|captures| captures[1].to_string())
}

/// Compute the next startAt offset for offset-based pagination, or `None`
/// when the last page has been reached. A response without a total is
/// treated as final.
pub fn next_page_offset(start_at: u64, max_results: u64, total: Option<u64>) -> Option<u64> {
    match total {
        Some(total) if start_at + max_results < total => Some(start_at + max_results),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn issue(key: &str, summary: &str, status: &str, updated: Option<&str>) -> JiraIssueResponse {
        JiraIssueResponse {
            key: key.to_string(),
            fields: JiraIssueFields {
                summary: Some(summary.to_string()),
                status: Some(JiraStatus {
                    name: status.to_string(),
                }),
                priority: Some(JiraPriority {
                    name: "Medium".to_string(),
                }),
                labels: vec!["backend".to_string()],
                created: Some("2024-01-01T10:00:00Z".to_string()),
                updated: updated.map(str::to_string),
            },
        }
    }

    fn search_page(issues: Vec<JiraIssueResponse>) -> JiraSearchResponse {
        JiraSearchResponse {
            issues,
            total: Some(1),
            start_at: Some(0),
            max_results: Some(100),
        }
    }

    #[test]
    fn test_transform_search_page_basic() {
        let page = search_page(vec![issue(
            "PROJ-1",
            "Fix login",
            "In Progress",
            Some("2024-02-01T10:00:00Z"),
        )]);

        let tickets = transform_search_page(page, "https://example.atlassian.net");

        assert_eq!(tickets.len(), 1);
        let ticket = &tickets[0];
        assert_eq!(ticket.key, "PROJ-1");
        assert_eq!(ticket.title, Some("Fix login".to_string()));
        assert_eq!(ticket.url, "https://example.atlassian.net/browse/PROJ-1");
        assert_eq!(ticket.status, Some("In Progress".to_string()));
        assert_eq!(ticket.priority, Some("Medium".to_string()));
        assert_eq!(ticket.labels, vec!["backend"]);
    }

    #[test]
    fn test_transform_search_page_filters_closed_statuses() {
        let page = search_page(vec![
            issue("PROJ-1", "Open one", "In Progress", None),
            issue("PROJ-2", "Done one", "Done", None),
            issue("PROJ-3", "Cancelled one", "Cancelled", None),
            issue("PROJ-4", "Closed one", "Closed", None),
        ]);

        let tickets = transform_search_page(page, "https://example.atlassian.net");

        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].key, "PROJ-1");
    }

    #[test]
    fn test_transform_search_page_missing_status_kept() {
        let mut bare = issue("PROJ-9", "No status", "x", None);
        bare.fields.status = None;
        let tickets =
            transform_search_page(search_page(vec![bare]), "https://example.atlassian.net");

        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].status, None);
    }

    #[test]
    fn test_sort_tickets_by_updated() {
        let page = search_page(vec![
            issue("PROJ-1", "older", "Open", Some("2024-01-01T00:00:00Z")),
            issue("PROJ-2", "newest", "Open", Some("2024-03-01T00:00:00Z")),
            issue("PROJ-3", "no timestamp", "Open", None),
            issue("PROJ-4", "middle", "Open", Some("2024-02-01T00:00:00Z")),
        ]);
        let mut tickets = transform_search_page(page, "https://example.atlassian.net");

        sort_tickets_by_updated(&mut tickets);

        let keys: Vec<&str> = tickets.iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["PROJ-2", "PROJ-4", "PROJ-1", "PROJ-3"]);
    }

    #[test]
    fn test_transform_comments_page_renders_body() {
        let page = JiraCommentsResponse {
            comments: vec![JiraCommentResponse {
                id: Some("1000".to_string()),
                author: Some(JiraAuthor {
                    display_name: Some("Jane".to_string()),
                    account_id: Some("abc123".to_string()),
                }),
                created: Some("2024-01-01T12:00:00Z".to_string()),
                updated: Some("2024-01-01T12:30:00Z".to_string()),
                body: Some(json!({
                    "type": "doc",
                    "version": 1,
                    "content": [
                        {"type": "paragraph", "content": [
                            {"type": "text", "text": "Looks ", "marks": []},
                            {"type": "text", "text": "good", "marks": [{"type": "strong"}]},
                        ]}
                    ]
                })),
            }],
            total: Some(1),
            start_at: Some(0),
            max_results: Some(100),
        };

        let comments = transform_comments_page(page);

        assert_eq!(comments.len(), 1);
        let comment = &comments[0];
        assert_eq!(comment.id, Some("1000".to_string()));
        assert_eq!(comment.author.display_name, Some("Jane".to_string()));
        assert_eq!(comment.author.account_id, Some("abc123".to_string()));
        assert_eq!(comment.body_markdown, "Looks **good**");
    }

    #[test]
    fn test_transform_comments_page_missing_body() {
        let page = JiraCommentsResponse {
            comments: vec![JiraCommentResponse {
                id: None,
                author: None,
                created: None,
                updated: None,
                body: None,
            }],
            total: None,
            start_at: None,
            max_results: None,
        };

        let comments = transform_comments_page(page);

        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].body_markdown, "");
        assert_eq!(comments[0].author.display_name, None);
    }

    #[test]
    fn test_transform_description_response_full() {
        let data = json!({
            "key": "PROJ-42",
            "fields": {
                "description": {
                    "type": "doc",
                    "version": 1,
                    "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "The body"}]}
                    ]
                },
                "customfield_10100": {
                    "type": "doc",
                    "version": 1,
                    "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "Must work"}]}
                    ]
                },
                "labels": ["backend", "api"],
                "status": {"name": "In Progress"},
                "created": "2024-01-01T10:00:00Z",
                "updated": "2024-01-02T10:00:00Z",
                "parent": {
                    "key": "PROJ-10",
                    "fields": {"summary": "The epic"}
                }
            }
        });

        let output = transform_description_response(
            &data,
            "https://example.atlassian.net",
            "PROJ-42",
            Some("customfield_10100"),
        );

        assert_eq!(output.key, Some("PROJ-42".to_string()));
        assert_eq!(output.url, "https://example.atlassian.net/browse/PROJ-42");
        assert_eq!(output.description_markdown, "The body");
        assert_eq!(output.acceptance_criteria_markdown, "Must work");
        assert_eq!(output.labels, vec!["backend", "api"]);
        assert_eq!(output.status, Some("In Progress".to_string()));

        let parent = output.parent.expect("parent should be present");
        assert_eq!(parent.key, Some("PROJ-10".to_string()));
        assert_eq!(parent.title, Some("The epic".to_string()));
        assert_eq!(
            parent.url,
            Some("https://example.atlassian.net/browse/PROJ-10".to_string())
        );
    }

    #[test]
    fn test_transform_description_response_minimal() {
        let data = json!({"key": "PROJ-7", "fields": {}});

        let output =
            transform_description_response(&data, "https://example.atlassian.net", "PROJ-7", None);

        assert_eq!(output.description_markdown, "");
        assert_eq!(output.acceptance_criteria_markdown, "");
        assert!(output.labels.is_empty());
        assert_eq!(output.parent, None);
        assert_eq!(output.status, None);
    }

    #[test]
    fn test_transform_description_response_without_acceptance_field() {
        // Field id present in the response but not requested.
        let data = json!({
            "key": "PROJ-8",
            "fields": {
                "customfield_10100": {
                    "type": "doc",
                    "version": 1,
                    "content": [
                        {"type": "paragraph", "content": [{"type": "text", "text": "hidden"}]}
                    ]
                }
            }
        });

        let output =
            transform_description_response(&data, "https://example.atlassian.net", "PROJ-8", None);

        assert_eq!(output.acceptance_criteria_markdown, "");
    }

    #[test]
    fn test_find_acceptance_criteria_field_exact_match_wins() {
        let fields = vec![
            JiraField {
                id: Some("customfield_20000".to_string()),
                name: Some("Legacy Acceptance Criteria Notes".to_string()),
            },
            JiraField {
                id: Some("customfield_10100".to_string()),
                name: Some("Acceptance Criteria".to_string()),
            },
        ];

        assert_eq!(
            find_acceptance_criteria_field(&fields),
            Some("customfield_10100".to_string())
        );
    }

    #[test]
    fn test_find_acceptance_criteria_field_substring_fallback() {
        let fields = vec![
            JiraField {
                id: Some("customfield_1".to_string()),
                name: Some("Story Points".to_string()),
            },
            JiraField {
                id: Some("customfield_2".to_string()),
                name: Some("Acceptance criteria (legacy)".to_string()),
            },
        ];

        assert_eq!(
            find_acceptance_criteria_field(&fields),
            Some("customfield_2".to_string())
        );
    }

    #[test]
    fn test_find_acceptance_criteria_field_none() {
        let fields = vec![JiraField {
            id: Some("customfield_1".to_string()),
            name: Some("Story Points".to_string()),
        }];

        assert_eq!(find_acceptance_criteria_field(&fields), None);
    }

    #[test]
    fn test_extract_issue_key_from_plain_key() {
        assert_eq!(extract_issue_key("ABC-123"), Some("ABC-123".to_string()));
    }

    #[test]
    fn test_extract_issue_key_from_browse_url() {
        assert_eq!(
            extract_issue_key("https://example.atlassian.net/browse/ABC-123"),
            Some("ABC-123".to_string())
        );
    }

    #[test]
    fn test_extract_issue_key_not_found() {
        assert_eq!(extract_issue_key("no key here"), None);
        assert_eq!(extract_issue_key("abc-123"), None);
    }

    #[test]
    fn test_next_page_offset() {
        // More pages remain.
        assert_eq!(next_page_offset(0, 100, Some(250)), Some(100));
        assert_eq!(next_page_offset(100, 100, Some(250)), Some(200));
        // Final page.
        assert_eq!(next_page_offset(200, 100, Some(250)), None);
        assert_eq!(next_page_offset(0, 100, Some(100)), None);
        // No total reported: treat as final.
        assert_eq!(next_page_offset(0, 100, None), None);
    }
}
