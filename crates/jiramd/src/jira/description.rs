use colored::Colorize;
use serde::{Deserialize, Serialize};

use jiramd_core::jira::{
    extract_issue_key, find_acceptance_criteria_field, transform_description_response,
    DescriptionOutput, JiraField,
};

use crate::jira::{create_authenticated_client, AtlassianConfig};
use crate::prelude::{println, *};

/// Issue fields always requested for the description view.
const DESCRIPTION_FIELDS: [&str; 6] = [
    "description",
    "labels",
    "parent",
    "status",
    "created",
    "updated",
];

/// Options for fetching a ticket's description
#[derive(Debug, clap::Args, Serialize, Deserialize, Clone)]
#[command(after_help = "EXAMPLES:
  # By issue key:
  jiramd description ABC-123

  # By browse URL, as JSON:
  jiramd description https://example.atlassian.net/browse/ABC-123 --json

NOTES:
  - Acceptance criteria are included when the site has a custom field
    named \"Acceptance Criteria\"")]
pub struct DescriptionOptions {
    /// Issue key or browse URL (e.g., "PROJ-123")
    #[clap(env = "JIRA_ISSUE_KEY")]
    pub ticket: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Discover the acceptance criteria custom field id, if the site has one.
async fn acceptance_criteria_field_id(
    client: &reqwest::Client,
    base_url: &str,
) -> Result<Option<String>> {
    let url = format!("{base_url}/rest/api/3/field");

    let response = client
        .get(&url)
        .send()
        .await
        .map_err(|e| eyre!("Failed to fetch Jira field catalog: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(eyre!(
            "Failed to fetch Jira field catalog [{}]: {}",
            status,
            body
        ));
    }

    let fields: Vec<JiraField> = response
        .json()
        .await
        .map_err(|e| eyre!("Failed to parse Jira field catalog: {}", e))?;

    Ok(find_acceptance_criteria_field(&fields))
}

/// Public data function - used by the CLI handler
pub async fn get_description_data(issue_key: &str) -> Result<DescriptionOutput> {
    let config = AtlassianConfig::from_env()?;
    let client = create_authenticated_client(&config)?;
    let base_url = config.base_url.trim_end_matches('/').to_string();

    let acceptance_field_id = acceptance_criteria_field_id(&client, &base_url).await?;

    let mut fields: Vec<&str> = DESCRIPTION_FIELDS.to_vec();
    if let Some(id) = &acceptance_field_id {
        fields.push(id);
    }
    let joined_fields = fields.join(",");

    let url = format!(
        "{base_url}/rest/api/3/issue/{}",
        urlencoding::encode(issue_key)
    );

    let response = client
        .get(&url)
        .query(&[("fields", joined_fields.as_str())])
        .send()
        .await
        .map_err(|e| eyre!("Failed to send request to Jira: {}", e))?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(eyre!("Failed to fetch Jira issue [{}]: {}", status, body));
    }

    let data: serde_json::Value = response
        .json()
        .await
        .map_err(|e| eyre!("Failed to parse Jira issue response: {}", e))?;

    Ok(transform_description_response(
        &data,
        &base_url,
        issue_key,
        acceptance_field_id.as_deref(),
    ))
}

/// Handle the description command
pub async fn handler(options: DescriptionOptions) -> Result<()> {
    let issue_key = extract_issue_key(&options.ticket)
        .ok_or_else(|| eyre!("Could not find a Jira issue key in: {}", options.ticket))?;

    let output = get_description_data(&issue_key).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    println!(
        "\n{} - {}\n",
        output.key.as_deref().unwrap_or(&issue_key).bold().cyan(),
        output.url.bright_black()
    );

    if let Some(status) = &output.status {
        println!("{}: {}", "Status".bold().cyan(), status.green());
    }

    if !output.labels.is_empty() {
        println!(
            "{}: {}",
            "Labels".bold().cyan(),
            output.labels.join(", ").bright_green()
        );
    }

    if let Some(parent) = &output.parent {
        println!(
            "{}: {} {}",
            "Parent".bold().cyan(),
            parent.key.as_deref().unwrap_or("?").bright_white(),
            parent.title.as_deref().unwrap_or("")
        );
    }

    if !output.description_markdown.is_empty() {
        println!("\n{}:", "Description".bold().cyan());
        println!("{}", output.description_markdown);
    }

    if !output.acceptance_criteria_markdown.is_empty() {
        println!("\n{}:", "Acceptance Criteria".bold().cyan());
        println!("{}", output.acceptance_criteria_markdown);
    }

    Ok(())
}
