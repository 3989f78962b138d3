use regex::Regex;
use std::collections::HashSet;
use tracing::warn;

const MARK_OPEN: &str = "<mark class=\"kw\">";
const MARK_CLOSE: &str = "</mark>";

/// Escape the five HTML-significant characters.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Trim, drop blanks, de-duplicate (first occurrence wins) and order the
/// search terms longest first. Equal lengths keep their input order.
pub fn normalize_terms<I, S>(terms: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen = HashSet::new();
    let mut list: Vec<String> = terms
        .into_iter()
        .map(|t| t.as_ref().trim().to_string())
        .filter(|t| !t.is_empty())
        .filter(|t| seen.insert(t.clone()))
        .collect();
    list.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    list
}

/// Render `text` as escaped markup with every term occurrence wrapped in
/// `<mark class="kw">`.
///
/// Matching is literal and case-sensitive. The terms are tried longest first
/// in a single left-to-right scan, so "battery life" wins over "battery" at
/// the same position and no character takes part in two matches.
pub fn highlight_html<I, S>(text: &str, terms: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let escaped = escape_html(text);
    let list = normalize_terms(terms);
    if list.is_empty() {
        return escaped;
    }

    let pattern = list
        .iter()
        .map(|t| regex::escape(&escape_html(t)))
        .collect::<Vec<_>>()
        .join("|");

    let re = match Regex::new(&pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!(error = %e, terms = list.len(), "highlight pattern rejected");
            return escaped;
        }
    };

    re.replace_all(&escaped, |caps: &regex::Captures| {
        format!("{MARK_OPEN}{}{MARK_CLOSE}", &caps[0])
    })
    .into_owned()
}
