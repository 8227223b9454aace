//! Adapter between Jira and a tracker-neutral issue model.
//!
//! [`tracker::IssueTracker`] fetches and searches issues of one project and
//! hands out [`model::issue::Issue`] values that are edited locally and
//! written back with `save`. The HTTP side lives behind
//! [`providers::IssueClient`].

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod providers;
pub mod tracker;
pub mod util;
