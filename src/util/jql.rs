//! Translation of free-text keywords into JQL and Jira search links.

/// Characters with special meaning in JQL text searches. They cannot be
/// searched for, so they are dropped from keywords.
pub const RESERVED_CHARACTERS: &[char] = &[
    '+', '-', '&', '|', '!', '(', ')', '{', '}', '[', ']', '^', '~', '*', '?', '\\', ':',
];

/// Replace reserved characters with spaces and collapse whitespace.
pub fn strip_reserved(keyword: &str) -> String {
    keyword
        .replace(RESERVED_CHARACTERS, " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Cleaned keywords joined by single spaces, with quotes escaped for use
/// inside a JQL string literal.
pub fn search_text<S: AsRef<str>>(keywords: &[S]) -> String {
    keywords
        .iter()
        .map(|k| strip_reserved(k.as_ref()))
        .filter(|k| !k.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .replace('"', "\\\"")
}

pub fn build_query<S: AsRef<str>>(project: &str, keywords: &[S], only_open: bool) -> String {
    let mut jql = format!("project = {project}");
    let text = search_text(keywords);
    if !text.is_empty() {
        jql.push_str(&format!(" AND text ~ \"{text}\""));
    }
    if only_open {
        jql.push_str(" AND resolution = Unresolved");
    }
    jql
}

/// Link to Jira's issue navigator showing the results of the keyword search.
pub fn build_search_url<S: AsRef<str>>(
    base_url: &str,
    project: &str,
    keywords: &[S],
    only_open: bool,
) -> String {
    format!(
        "{}/issues/?jql={}",
        base_url.trim_end_matches('/'),
        build_query(project, keywords, only_open)
    )
}
