//! Space-separated handle lists: `1 2 5 to 9 "beams"`.

use crate::{Handle, RecordError, Result};

/// Longest `a to b` range accepted, in handles.
pub const MAX_RANGE_LEN: u32 = 1_000_000;

/// Parses a handle list. Quoted names are resolved through `lookup`, which
/// typically issues a secondary query for the named list definition.
pub fn parse_handle_list<F>(text: &str, mut lookup: F) -> Result<Vec<Handle>>
where
    F: FnMut(&str) -> Option<Vec<Handle>>,
{
    let tokens = tokenize(text)?;
    let malformed = || RecordError::HandleList(text.to_string());
    let mut handles = Vec::<Handle>::new();
    let mut i = 0usize;

    while i < tokens.len() {
        let token = tokens[i].as_str();
        if let Some(name) = token.strip_prefix('"') {
            let name = name.strip_suffix('"').ok_or_else(malformed)?;
            let listed = lookup(name).ok_or_else(|| RecordError::UnknownList(name.to_string()))?;
            handles.extend(listed);
            i += 1;
            continue;
        }

        let first = token.parse::<Handle>().map_err(|_| malformed())?;
        if tokens
            .get(i + 1)
            .is_some_and(|t| t.eq_ignore_ascii_case("to"))
        {
            let last = tokens
                .get(i + 2)
                .and_then(|t| t.parse::<Handle>().ok())
                .ok_or_else(malformed)?;
            if last < first || last.0 - first.0 >= MAX_RANGE_LEN {
                return Err(malformed());
            }
            handles.extend((first.0..=last.0).map(Handle));
            i += 3;
        } else {
            handles.push(first);
            i += 1;
        }
    }

    let mut seen = std::collections::HashSet::new();
    handles.retain(|h| seen.insert(*h));
    Ok(handles)
}

/// Formats handles, collapsing ascending runs of three or more into `a to b`.
pub fn format_handle_list(handles: &[Handle]) -> String {
    let mut parts = Vec::<String>::new();
    let mut i = 0usize;
    while i < handles.len() {
        let mut j = i;
        while j + 1 < handles.len() && handles[j + 1].0 == handles[j].0 + 1 {
            j += 1;
        }
        if j - i >= 2 {
            parts.push(format!("{} to {}", handles[i], handles[j]));
        } else {
            parts.extend(handles[i..=j].iter().map(Handle::to_string));
        }
        i = j + 1;
    }
    parts.join(" ")
}

fn tokenize(text: &str) -> Result<Vec<String>> {
    let mut tokens = Vec::<String>::new();
    let mut current = String::new();
    let mut quoted = false;

    for ch in text.trim().chars() {
        match ch {
            '"' => {
                current.push(ch);
                if quoted {
                    tokens.push(std::mem::take(&mut current));
                }
                quoted = !quoted;
            }
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if quoted {
        return Err(RecordError::HandleList(text.to_string()));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_lists(_: &str) -> Option<Vec<Handle>> {
        None
    }

    #[test]
    fn parses_plain_handles_and_ranges() {
        let handles = parse_handle_list("1 3 5 to 7", no_lists).unwrap();
        let raw: Vec<u32> = handles.iter().map(|h| h.0).collect();
        assert_eq!(raw, vec![1, 3, 5, 6, 7]);
    }

    #[test]
    fn resolves_named_lists_through_lookup() {
        let mut asked = Vec::new();
        let handles = parse_handle_list("2 \"top chord\"", |name| {
            asked.push(name.to_string());
            Some(vec![Handle(10), Handle(2), Handle(11)])
        })
        .unwrap();
        assert_eq!(asked, vec!["top chord".to_string()]);
        assert_eq!(handles, vec![Handle(2), Handle(10), Handle(11)]);
    }

    #[test]
    fn unknown_named_list_is_reported() {
        let err = parse_handle_list("\"missing\"", no_lists).unwrap_err();
        assert_eq!(err, RecordError::UnknownList("missing".to_string()));
    }

    #[test]
    fn rejects_malformed_lists() {
        assert!(parse_handle_list("1 to", no_lists).is_err());
        assert!(parse_handle_list("5 to 2", no_lists).is_err());
        assert!(parse_handle_list("1 beam", no_lists).is_err());
        assert!(parse_handle_list("\"open", no_lists).is_err());
    }

    #[test]
    fn rejects_oversized_ranges() {
        let err = parse_handle_list("1 to 4000000000", no_lists).unwrap_err();
        assert_eq!(err, RecordError::HandleList("1 to 4000000000".to_string()));
        let last = MAX_RANGE_LEN;
        let handles = parse_handle_list(&format!("1 to {last}"), no_lists).unwrap();
        assert_eq!(handles.len(), MAX_RANGE_LEN as usize);
    }

    #[test]
    fn formats_runs_as_ranges() {
        let handles: Vec<Handle> = [1, 2, 3, 4, 7, 9, 10].into_iter().map(Handle).collect();
        assert_eq!(format_handle_list(&handles), "1 to 4 7 9 10");
        let back = parse_handle_list(&format_handle_list(&handles), no_lists).unwrap();
        assert_eq!(back, handles);
    }
}
