use std::sync::Arc;

use anyhow::{bail, Context, Result};

use crate::config::{ConfigProvider, FileConfig};
use crate::model::issue::{parse_issue_id, Issue};
use crate::providers::jira::JiraClient;
use crate::tracker::IssueTracker;

#[derive(Debug, PartialEq)]
pub enum Command {
    Get { key: String },
    Find { keywords: Vec<String>, only_open: bool },
    Url { key: String },
    SearchUrl { keywords: Vec<String>, only_open: bool },
    Comment { key: String, text: String },
    Status { key: String, status: String, comment: Option<String> },
    Label { key: String, add: Vec<String>, remove: Vec<String> },
    New { title: String, description: Option<String> },
    Help,
}

pub async fn run(args: &[String]) -> Result<()> {
    match parse_args(args)? {
        Command::Help => {
            print_help();
            Ok(())
        }
        command => execute(command, &open_tracker()?).await,
    }
}

fn open_tracker() -> Result<IssueTracker> {
    let config = FileConfig::from_default_location();
    let jira = config
        .get()
        .context("Add a [jira] section to ~/.issuebridge/config.toml")?;
    let client = Arc::new(JiraClient::from_config(&jira));
    Ok(IssueTracker::new(client, Arc::new(config), jira.project.clone())
        .with_max_results(jira.max_results))
}

async fn execute(command: Command, tracker: &IssueTracker) -> Result<()> {
    match command {
        Command::Get { key } => {
            let issue = fetch(tracker, &key).await?;
            print_issue(&issue);
            println!("  {}", tracker.issue_url(&key)?);
        }
        Command::Find { keywords, only_open } => {
            for issue in tracker.find_issues(&keywords, only_open).await? {
                println!(
                    "{}  [{}]  {}",
                    issue.key().unwrap_or_default(),
                    issue.status,
                    issue.title
                );
            }
        }
        Command::Url { key } => println!("{}", tracker.issue_url(&key)?),
        Command::SearchUrl { keywords, only_open } => {
            println!("{}", tracker.find_issues_url(&keywords, only_open)?)
        }
        Command::Comment { key, text } => {
            let mut issue = fetch(tracker, &key).await?;
            issue.save(Some(text.as_str())).await?;
            println!("Commented on {key}");
        }
        Command::Status { key, status, comment } => {
            let mut issue = fetch(tracker, &key).await?;
            issue.status = status;
            issue.save(comment.as_deref()).await?;
            println!("{key} is now {}", issue.status);
        }
        Command::Label { key, add, remove } => {
            let mut issue = fetch(tracker, &key).await?;
            for label in &add {
                issue.labels.add(label);
            }
            for label in &remove {
                issue.labels.remove(label);
            }
            issue.save(None).await?;
            println!("{key} labels: {}", issue.labels.to_sorted_vec().join(", "));
        }
        Command::New { title, description } => {
            let mut issue = tracker.new_issue();
            issue.title = title;
            issue.body = description.unwrap_or_default();
            issue.save(None).await?;
            let key = issue.key().unwrap_or_default();
            println!("Created {key}: {}", issue.title);
            println!("  {}", tracker.issue_url(key)?);
        }
        Command::Help => print_help(),
    }

    Ok(())
}

async fn fetch(tracker: &IssueTracker, key: &str) -> Result<Issue> {
    match tracker.get_issue(key).await? {
        Some(issue) => Ok(issue),
        None => bail!("Issue {key} not found in {}", tracker.project()),
    }
}

fn print_issue(issue: &Issue) {
    println!("{}  {}", issue.key().unwrap_or_default(), issue.title);
    println!("  Status:     {}", issue.status);
    println!("  Assignee:   {}", issue.assignee);
    println!("  Reporter:   {}", issue.reporter);
    if !issue.labels.is_empty() {
        println!("  Labels:     {}", issue.labels.to_sorted_vec().join(", "));
    }
    if !issue.components.is_empty() {
        println!("  Components: {}", issue.components.to_sorted_vec().join(", "));
    }
    if !issue.ccs.is_empty() {
        println!("  CCs:        {}", issue.ccs.to_sorted_vec().join(", "));
    }
    if let Some(closed) = issue.closed_time() {
        println!("  Closed:     {}", closed.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    if !issue.body.is_empty() {
        println!();
        println!("{}", issue.body);
    }
}

fn parse_key(args: &[String], usage: &str) -> Result<String> {
    let Some(key) = args.first() else {
        bail!("Usage: {usage}");
    };
    parse_issue_id(key)?;
    Ok(key.clone())
}

/// Split `--open` out of the keyword list.
fn parse_keywords(args: &[String], usage: &str) -> Result<(Vec<String>, bool)> {
    let only_open = args.iter().any(|a| a == "--open");
    let keywords: Vec<String> = args.iter().filter(|a| *a != "--open").cloned().collect();
    if keywords.is_empty() {
        bail!("Usage: {usage}");
    }
    Ok((keywords, only_open))
}

/// Take the value following `flags` out of `args`, returning the rest.
fn take_flag(args: &[String], flags: &[&str]) -> Result<(Vec<String>, Option<String>)> {
    let mut rest = Vec::new();
    let mut value = None;
    let mut i = 0;
    while i < args.len() {
        if flags.contains(&args[i].as_str()) {
            i += 1;
            match args.get(i) {
                Some(v) => value = Some(v.clone()),
                None => bail!("Missing value for {} flag", flags.join("/")),
            }
        } else {
            rest.push(args[i].clone());
        }
        i += 1;
    }
    Ok((rest, value))
}

pub fn parse_args(args: &[String]) -> Result<Command> {
    let Some((command, rest)) = args.split_first() else {
        return Ok(Command::Help);
    };

    let command = match command.as_str() {
        "get" => Command::Get {
            key: parse_key(rest, "issuebridge get <KEY>")?,
        },
        "url" => Command::Url {
            key: parse_key(rest, "issuebridge url <KEY>")?,
        },
        "find" => {
            let (keywords, only_open) = parse_keywords(rest, "issuebridge find [--open] <keywords>")?;
            Command::Find { keywords, only_open }
        }
        "search-url" => {
            let (keywords, only_open) =
                parse_keywords(rest, "issuebridge search-url [--open] <keywords>")?;
            Command::SearchUrl { keywords, only_open }
        }
        "comment" => {
            let key = parse_key(rest, "issuebridge comment <KEY> <text>")?;
            let text = rest[1..].join(" ");
            if text.trim().is_empty() {
                bail!("Comment text cannot be empty");
            }
            Command::Comment { key, text }
        }
        "status" => {
            let usage = "issuebridge status <KEY> <STATUS> [-c <comment>]";
            let (rest, comment) = take_flag(rest, &["-c", "--comment"])?;
            let key = parse_key(&rest, usage)?;
            let status = rest[1..].join(" ");
            if status.is_empty() {
                bail!("Usage: {usage}");
            }
            let comment = comment.filter(|c| !c.trim().is_empty());
            Command::Status { key, status, comment }
        }
        "label" => {
            let key = parse_key(rest, "issuebridge label <KEY> [+add] [-remove]")?;
            let mut add = Vec::new();
            let mut remove = Vec::new();
            for arg in &rest[1..] {
                if let Some(label) = arg.strip_prefix('+') {
                    add.push(label.to_string());
                } else if let Some(label) = arg.strip_prefix('-') {
                    remove.push(label.to_string());
                } else {
                    bail!("Labels must be prefixed with + or -: {arg}");
                }
            }
            if add.is_empty() && remove.is_empty() {
                bail!("Nothing to change");
            }
            Command::Label { key, add, remove }
        }
        "new" => {
            let (rest, description) = take_flag(rest, &["-d", "--desc", "--description"])?;
            let title = rest.join(" ");
            if title.is_empty() {
                bail!("Issue title cannot be empty");
            }
            Command::New { title, description }
        }
        "help" | "-h" | "--help" => Command::Help,
        other => bail!("Unknown command '{other}'. Run `issuebridge help` for usage."),
    };
    Ok(command)
}

pub fn print_help() {
    println!("issuebridge: work with Jira issues from the terminal\n");
    println!("USAGE:");
    println!("  issuebridge get <KEY>                        Show an issue");
    println!("  issuebridge find [--open] <keywords>         Search the project");
    println!("  issuebridge url <KEY>                        Print the issue link");
    println!("  issuebridge search-url [--open] <keywords>   Print a search link");
    println!("  issuebridge comment <KEY> <text>             Add a comment");
    println!("  issuebridge status <KEY> <STATUS> [-c text]  Move an issue to a status");
    println!("  issuebridge label <KEY> [+add] [-remove]     Edit labels");
    println!("  issuebridge new <title> [-d <description>]   Create an issue");
    println!();
    println!("Settings are read from ~/.issuebridge/config.toml (override with ISSUEBRIDGE_CONFIG).");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(strs: &[&str]) -> Vec<String> {
        strs.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_args_is_help() {
        assert_eq!(parse_args(&args(&[])).unwrap(), Command::Help);
    }

    #[test]
    fn parse_get() {
        assert_eq!(
            parse_args(&args(&["get", "VSEC-3112"])).unwrap(),
            Command::Get {
                key: "VSEC-3112".into()
            }
        );
    }

    #[test]
    fn get_rejects_bad_key() {
        let err = parse_args(&args(&["get", "VSEC"])).unwrap_err();
        assert!(err.to_string().contains("Invalid issue key"));
    }

    #[test]
    fn get_without_key_shows_usage() {
        let err = parse_args(&args(&["get"])).unwrap_err();
        assert!(err.to_string().contains("Usage"));
    }

    #[test]
    fn parse_find_with_open_flag() {
        assert_eq!(
            parse_args(&args(&["find", "heap", "--open", "overflow"])).unwrap(),
            Command::Find {
                keywords: vec!["heap".into(), "overflow".into()],
                only_open: true
            }
        );
    }

    #[test]
    fn search_url_requires_keywords() {
        assert!(parse_args(&args(&["search-url", "--open"])).is_err());
    }

    #[test]
    fn parse_comment_joins_words() {
        assert_eq!(
            parse_args(&args(&["comment", "VSEC-1", "looks", "fixed"])).unwrap(),
            Command::Comment {
                key: "VSEC-1".into(),
                text: "looks fixed".into()
            }
        );
    }

    #[test]
    fn parse_status_with_comment() {
        assert_eq!(
            parse_args(&args(&["status", "VSEC-1", "-c", "verified", "In", "Progress"])).unwrap(),
            Command::Status {
                key: "VSEC-1".into(),
                status: "In Progress".into(),
                comment: Some("verified".into())
            }
        );
    }

    #[test]
    fn parse_status_drops_blank_comment() {
        assert_eq!(
            parse_args(&args(&["status", "VSEC-1", "Closed", "-c", ""])).unwrap(),
            Command::Status {
                key: "VSEC-1".into(),
                status: "Closed".into(),
                comment: None
            }
        );
    }

    #[tokio::test]
    async fn help_runs_without_config() {
        assert!(run(&args(&["help"])).await.is_ok());
        assert!(run(&args(&[])).await.is_ok());
    }

    #[test]
    fn parse_status_missing_comment_value() {
        let err = parse_args(&args(&["status", "VSEC-1", "Closed", "-c"])).unwrap_err();
        assert!(err.to_string().contains("Missing value"));
    }

    #[test]
    fn parse_label_changes() {
        assert_eq!(
            parse_args(&args(&["label", "VSEC-1", "+Security", "-stale"])).unwrap(),
            Command::Label {
                key: "VSEC-1".into(),
                add: vec!["Security".into()],
                remove: vec!["stale".into()]
            }
        );
    }

    #[test]
    fn label_requires_prefix() {
        assert!(parse_args(&args(&["label", "VSEC-1", "Security"])).is_err());
    }

    #[test]
    fn parse_new_with_description() {
        assert_eq!(
            parse_args(&args(&["new", "Crash", "on", "start", "-d", "stack attached"])).unwrap(),
            Command::New {
                title: "Crash on start".into(),
                description: Some("stack attached".into())
            }
        );
    }

    #[test]
    fn new_requires_title() {
        let err = parse_args(&args(&["new", "-d", "text"])).unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn unknown_command_fails() {
        assert!(parse_args(&args(&["frobnicate"])).is_err());
    }
}
