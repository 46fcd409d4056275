//! Core library for jiramd
//!
//! This crate implements the **Functional Core** of the jiramd application,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! - **`jiramd_core`** (this crate): Pure transformation functions with zero I/O
//! - **`jiramd`**: I/O operations and orchestration (the Imperative Shell)
//!
//! All functions in this crate adhere to these principles:
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O operations, no external state mutations
//! - **Testable**: Can be tested with simple fixture data, no mocking required
//!
//! # Module Organization
//!
//! - [`adf`]: Rendering of Atlassian Document Format trees to Markdown
//! - [`jira`]: Transformations for Jira API response data

pub mod adf;
pub mod jira;
