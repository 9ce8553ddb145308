//! Statement shape classification.
//!
//! Three fixed grammars, matched case-insensitively and whitespace/newline
//! tolerantly — no general parser, no regex engine:
//!
//!   CREATE TABLE <name>(<col>, <col>, …)
//!   INSERT INTO <name>(<col>, …) VALUES(<val>, …)
//!   … FROM <table-and-predicate-remainder>
//!
//! Classification is exclusive with precedence CREATE → INSERT → SELECT.
//! A statement matching no shape is `Unrecognized`, never an error.

/// Tagged parse result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Create {
        table: String,
        columns: Vec<String>,
    },
    Insert {
        table: String,
        columns: Vec<String>,
        values: Vec<String>,
    },
    Select {
        /// Everything after FROM: table name plus any predicate remainder.
        source: String,
    },
    Unrecognized,
}

/// Classify one raw statement. A single trailing `;` is stripped first.
pub fn parse(raw: &str) -> Statement {
    let stmt = raw.trim().trim_end_matches(';').trim();

    if let Some(parsed) = parse_create(stmt) {
        return parsed;
    }
    if let Some(parsed) = parse_insert(stmt) {
        return parsed;
    }
    if let Some(parsed) = parse_select(stmt) {
        return parsed;
    }
    Statement::Unrecognized
}

fn parse_create(stmt: &str) -> Option<Statement> {
    let rest = eat_keyword(stmt, "CREATE")?;
    let rest = eat_keyword(rest, "TABLE")?;
    let rest = rest.trim();

    let open = rest.find('(')?;
    let close = rest.rfind(')')?;
    if close != rest.len() - 1 || close < open {
        return None;
    }

    let table = rest[..open].trim();
    if !is_identifier(table) {
        return None;
    }

    Some(Statement::Create {
        table: table.to_string(),
        columns: split_list(&rest[open + 1..close]),
    })
}

fn parse_insert(stmt: &str) -> Option<Statement> {
    let rest = eat_keyword(stmt, "INSERT")?;
    let rest = eat_keyword(rest, "INTO")?;
    let rest = rest.trim();

    let open = rest.find('(')?;
    let table = rest[..open].trim();
    if !is_identifier(table) {
        return None;
    }

    let after_table = &rest[open + 1..];
    let close = after_table.find(')')?;
    let columns = split_list(&after_table[..close]);

    let rest = eat_keyword(&after_table[close + 1..], "VALUES")?;
    let rest = rest.trim();
    if !rest.starts_with('(') || !rest.ends_with(')') {
        return None;
    }

    Some(Statement::Insert {
        table: table.to_string(),
        columns,
        values: split_list(&rest[1..rest.len() - 1]),
    })
}

fn parse_select(stmt: &str) -> Option<Statement> {
    let source = find_after_keyword(stmt, "FROM")?;
    Some(Statement::Select {
        source: source.trim().to_string(),
    })
}

/// Consume a leading keyword (case-insensitive, surrounding whitespace
/// tolerated) and return the remainder. The keyword must end at a word
/// boundary.
fn eat_keyword<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    let trimmed = input.trim_start();
    if trimmed.len() < keyword.len() || !trimmed.is_char_boundary(keyword.len()) {
        return None;
    }
    let (head, rest) = trimmed.split_at(keyword.len());
    if !head.eq_ignore_ascii_case(keyword) {
        return None;
    }
    match rest.chars().next() {
        Some(c) if is_word_char(c) => None,
        _ => Some(rest),
    }
}

/// Find a keyword anywhere in the statement (word-bounded, case-insensitive)
/// and return everything after it.
fn find_after_keyword<'a>(input: &'a str, keyword: &str) -> Option<&'a str> {
    let bytes = input.as_bytes();
    for start in 0..input.len().saturating_sub(keyword.len() - 1) {
        if !input.is_char_boundary(start) {
            continue;
        }
        let end = start + keyword.len();
        if !input.is_char_boundary(end) {
            continue;
        }
        if !input[start..end].eq_ignore_ascii_case(keyword) {
            continue;
        }
        let before_ok = start == 0 || !is_word_char(bytes[start - 1] as char);
        let after_ok = end == input.len() || !is_word_char(bytes[end] as char);
        if before_ok && after_ok {
            return Some(&input[end..]);
        }
    }
    None
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_word_char)
}

fn split_list(inner: &str) -> Vec<String> {
    inner
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}
