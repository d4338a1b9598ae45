//! SQL text normalization.
//!
//! Raw SQL bodies arrive with comments, indentation and blank lines; the
//! extractor wants a canonical statement sequence. Normalization strips
//! single-line (`--`) and block (`/* */`) comments, trims every line, drops
//! the lines left empty, and splits the remainder on the `;` statement
//! terminator. Statements stay opaque strings beyond that.

use regex::Regex;

/// Remove `-- ...` line comments and `/* ... */` block comments.
pub fn remove_comments(sql: &str) -> String {
    let without_line_comments = sql
        .lines()
        .map(|line| line.split("--").next().unwrap_or(""))
        .collect::<Vec<_>>()
        .join("\n");
    let block_comment = Regex::new(r"/\*[^*/]*\*/").expect("hardcoded pattern");
    block_comment.replace_all(&without_line_comments, "").into_owned()
}

/// Strip comments, trim each line and drop the blank ones.
pub fn normalize(sql: &str) -> String {
    remove_comments(sql)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Split normalized SQL into trimmed, non-empty statements.
pub fn split_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|stmt| !stmt.is_empty())
        .collect()
}
