use colored::Colorize;
use serde::{Deserialize, Serialize};

use jiramd_core::jira::{
    next_page_offset, sort_tickets_by_updated, transform_search_page, JiraSearchResponse,
    TicketOutput,
};

use crate::jira::{create_authenticated_client, AtlassianConfig};
use crate::prelude::{println, *};

/// JQL used to list the current user's tickets.
const ASSIGNED_JQL: &str = "assignee = currentUser() order by updated DESC";

/// Fields requested for the ticket list.
const SEARCH_FIELDS: [&str; 6] = [
    "summary", "status", "priority", "labels", "created", "updated",
];

/// Options for listing assigned tickets
#[derive(Debug, clap::Args, Serialize, Deserialize, Clone)]
#[command(after_help = "EXAMPLES:
  # List your open tickets:
  jiramd tickets

  # Same, as JSON for scripting:
  jiramd tickets --json

NOTES:
  - Requires ATLASSIAN_BASE_URL, ATLASSIAN_EMAIL, and ATLASSIAN_API_TOKEN
  - Tickets with status Done, Cancelled, or Closed are skipped
  - Results are sorted by most recent update")]
pub struct TicketsOptions {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Request shape for the search endpoint. Jira deployments disagree on
/// which shape /rest/api/3/search/jql accepts, so page requests fall back
/// across these in order.
#[derive(Debug, Clone, Copy, PartialEq)]
enum SearchMode {
    PostObject,
    PostString,
    Get,
}

async fn search_page(
    client: &reqwest::Client,
    base_url: &str,
    start_at: u64,
    max_results: u64,
    mode: SearchMode,
) -> Result<JiraSearchResponse> {
    let url = format!("{base_url}/rest/api/3/search/jql");
    let fields = SEARCH_FIELDS.join(",");
    let start_at_str = start_at.to_string();
    let max_results_str = max_results.to_string();

    let request = match mode {
        SearchMode::PostObject => client.post(&url).json(&serde_json::json!({
            "jql": {"query": ASSIGNED_JQL},
            "fields": SEARCH_FIELDS,
            "startAt": start_at,
            "maxResults": max_results,
        })),
        SearchMode::PostString => client.post(&url).json(&serde_json::json!({
            "jql": ASSIGNED_JQL,
            "fields": SEARCH_FIELDS,
            "startAt": start_at,
            "maxResults": max_results,
        })),
        SearchMode::Get => client.get(&url).query(&[
            ("jql", ASSIGNED_JQL),
            ("fields", fields.as_str()),
            ("startAt", start_at_str.as_str()),
            ("maxResults", max_results_str.as_str()),
        ]),
    };

    let response = request
        .send()
        .await
        .map_err(|e| eyre!("Failed to send request to Jira: {}", e))?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(Error::Api { status, url, body }.into());
    }

    let body_text = response
        .text()
        .await
        .map_err(|e| eyre!("Failed to read response body: {}", e))?;

    serde_json::from_str(&body_text).map_err(|e| eyre!("Failed to parse Jira response: {}", e))
}

/// Try each request mode in turn. HTTP 400/405 means the deployment
/// rejects that shape, so the next mode is tried; other failures abort.
async fn search_page_with_fallback(
    client: &reqwest::Client,
    base_url: &str,
    start_at: u64,
    max_results: u64,
) -> Result<(JiraSearchResponse, SearchMode)> {
    const MODES: [SearchMode; 3] = [
        SearchMode::PostObject,
        SearchMode::PostString,
        SearchMode::Get,
    ];

    let mut last_error = None;
    for mode in MODES {
        match search_page(client, base_url, start_at, max_results, mode).await {
            Ok(page) => return Ok((page, mode)),
            Err(err) => {
                let retryable = matches!(
                    err.downcast_ref::<Error>(),
                    Some(Error::Api {
                        status: 400 | 405,
                        ..
                    })
                );
                if !retryable {
                    return Err(err);
                }
                last_error = Some(err);
            }
        }
    }
    Err(last_error.unwrap_or_else(|| eyre!("No search request mode succeeded")))
}

/// Public data function - fetches every page of the current user's open
/// tickets, most recently updated first.
pub async fn list_tickets_data() -> Result<Vec<TicketOutput>> {
    let config = AtlassianConfig::from_env()?;
    let client = create_authenticated_client(&config)?;

    // Handle base_url that may or may not have trailing slash
    let base_url = config.base_url.trim_end_matches('/').to_string();

    let mut tickets: Vec<TicketOutput> = Vec::new();
    let mut start_at: u64 = 0;
    let mut max_results: u64 = 100;
    // The mode that worked for the first page is reused for the rest.
    let mut mode: Option<SearchMode> = None;

    loop {
        let page = match mode {
            Some(mode) => search_page(&client, &base_url, start_at, max_results, mode).await?,
            None => {
                let (page, selected) =
                    search_page_with_fallback(&client, &base_url, start_at, max_results).await?;
                mode = Some(selected);
                page
            }
        };

        start_at = page.start_at.unwrap_or(start_at);
        max_results = page.max_results.unwrap_or(max_results);
        let total = page.total;

        tickets.extend(transform_search_page(page, &base_url));

        match next_page_offset(start_at, max_results, total) {
            Some(next) => start_at = next,
            None => break,
        }
    }

    sort_tickets_by_updated(&mut tickets);
    Ok(tickets)
}

/// Handle the tickets command
pub async fn handler(options: TicketsOptions) -> Result<()> {
    let tickets = list_tickets_data().await?;

    if options.json {
        println!("{}", serde_json::to_string_pretty(&tickets)?);
        return Ok(());
    }

    println!("Found {} open ticket(s):\n", tickets.len());

    if tickets.is_empty() {
        return Ok(());
    }

    let mut table = new_table();
    table.add_row(prettytable::row![
        "Key", "Title", "Status", "Priority", "Labels"
    ]);

    for ticket in &tickets {
        table.add_row(prettytable::row![
            ticket.key.bold().cyan(),
            ticket.title.as_deref().unwrap_or(""),
            ticket.status.as_deref().unwrap_or("").green(),
            ticket.priority.as_deref().unwrap_or("").bright_yellow(),
            ticket.labels.join(", ").bright_green()
        ]);
    }

    table.printstd();

    Ok(())
}
