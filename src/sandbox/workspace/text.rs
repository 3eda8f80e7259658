//! Text shaping for workspace payloads.

use super::SearchMatch;

const TABLE_HEADER: &str = "| Line | Code |\n|---:|:---|\n";

/// Render `text` as a Markdown table with 1-based line numbers.
///
/// Trailing whitespace is dropped from each line and `|` is escaped so the
/// table stays well-formed.
pub(super) fn annotate(text: &str) -> String {
    let mut table = String::from(TABLE_HEADER);
    for (index, line) in text.lines().enumerate() {
        let code = line.trim_end().replace('|', "\\|");
        table.push_str(&format!("| {} | {code} |\n", index + 1));
    }
    table
}

/// Parse `grep -n` output of the form `file:line:content`.
///
/// Lines with fewer than three fields or a non-numeric line number are
/// skipped. A leading `./` is removed from file names.
pub(super) fn parse_matches(output: &str) -> Vec<SearchMatch> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.splitn(3, ':');
            let file = fields.next()?;
            let number = fields.next()?.parse::<u64>().ok()?;
            let content = fields.next()?;
            Some(SearchMatch {
                file: String::from(file.strip_prefix("./").unwrap_or(file)),
                line: number,
                content: String::from(content.trim()),
            })
        })
        .collect()
}
