use colored::Colorize;
use serde::{Deserialize, Serialize};

use jiramd_core::jira::{
    extract_issue_key, next_page_offset, transform_comments_page, CommentOutput,
    JiraCommentsResponse,
};

use crate::jira::{create_authenticated_client, AtlassianConfig};
use crate::prelude::{println, *};

/// Options for fetching ticket comments
#[derive(Debug, clap::Args, Serialize, Deserialize, Clone)]
#[command(after_help = "EXAMPLES:
  # By issue key:
  jiramd comments ABC-123

  # By browse URL, as JSON:
  jiramd comments https://example.atlassian.net/browse/ABC-123 --json")]
pub struct CommentsOptions {
    /// Issue key or browse URL (e.g., "PROJ-123")
    #[clap(env = "JIRA_ISSUE_KEY")]
    pub ticket: String,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Public data function - fetches every comment page for the issue and
/// renders each body to Markdown.
pub async fn list_comments_data(issue_key: &str) -> Result<Vec<CommentOutput>> {
    let config = AtlassianConfig::from_env()?;
    let client = create_authenticated_client(&config)?;
    let base_url = config.base_url.trim_end_matches('/').to_string();

    let mut comments = Vec::new();
    let mut start_at: u64 = 0;
    let mut max_results: u64 = 100;

    loop {
        let url = format!(
            "{base_url}/rest/api/3/issue/{}/comment?startAt={start_at}&maxResults={max_results}",
            urlencoding::encode(issue_key)
        );

        let response = client
            .get(&url)
            .send()
            .await
            .map_err(|e| eyre!("Failed to send request for Jira comments: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(eyre!("Failed to fetch Jira comments [{}]: {}", status, body));
        }

        let page: JiraCommentsResponse = response
            .json()
            .await
            .map_err(|e| eyre!("Failed to parse Jira comments: {}", e))?;

        start_at = page.start_at.unwrap_or(start_at);
        max_results = page.max_results.unwrap_or(max_results);
        let total = page.total;

        comments.extend(transform_comments_page(page));

        match next_page_offset(start_at, max_results, total) {
            Some(next) => start_at = next,
            None => break,
        }
    }

    Ok(comments)
}

/// Handle the comments command
pub async fn handler(options: CommentsOptions) -> Result<()> {
    let issue_key = extract_issue_key(&options.ticket)
        .ok_or_else(|| eyre!("Could not find a Jira issue key in: {}", options.ticket))?;

    let comments = list_comments_data(&issue_key).await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&comments)?);
        return Ok(());
    }

    if comments.is_empty() {
        println!("No comments on {}.", issue_key.bold().cyan());
        return Ok(());
    }

    println!(
        "{} comment(s) on {}:\n",
        comments.len(),
        issue_key.bold().cyan()
    );

    for (index, comment) in comments.iter().enumerate() {
        let index_str = format!("{}.", index + 1).green().to_string();
        let timestamp_str = format!("[{}]", comment.created.as_deref().unwrap_or("unknown"))
            .blue()
            .to_string();
        let author_str = comment
            .author
            .display_name
            .as_deref()
            .unwrap_or("Unknown")
            .magenta()
            .to_string();

        println!("{} {} {}", index_str, timestamp_str, author_str);
        println!("{}\n", comment.body_markdown);
    }

    Ok(())
}
