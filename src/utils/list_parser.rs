//! Literal list parsing for user-supplied config cells.
//!
//! Accepts `[a, b]`, `(a, b)` or bare `a, b` / `a; b`. Items may be single or
//! double quoted. Nothing is ever evaluated: anything that is not a plain
//! literal is rejected with a message.

/// Splits a list literal into trimmed, unquoted items.
pub fn parse_string_list(raw: &str) -> Result<Vec<String>, String> {
    let body = strip_brackets(raw.trim())?;
    let mut items = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut closed_quote = false;

    for c in body.chars() {
        match quote {
            Some(q) if c == q => {
                quote = None;
                closed_quote = true;
            }
            Some(_) => current.push(c),
            None => match c {
                _ if closed_quote && c.is_whitespace() => {}
                '\'' | '"' => {
                    if closed_quote || !current.trim().is_empty() {
                        return Err(format!("unexpected quote in list item near '{}'", current));
                    }
                    current.clear();
                    quote = Some(c);
                }
                ',' | ';' => {
                    push_item(&mut items, &mut current, closed_quote);
                    closed_quote = false;
                }
                _ if closed_quote => {
                    return Err(format!("text after closing quote in list item '{}'", current));
                }
                '[' | ']' | '(' | ')' | '{' | '}' | '\\' => {
                    return Err(format!("unsupported character '{}' in list", c));
                }
                _ => current.push(c),
            },
        }
    }

    if quote.is_some() {
        return Err("unterminated quote in list".to_string());
    }
    push_item(&mut items, &mut current, closed_quote);
    Ok(items)
}

/// Parses a list of finite floats, e.g. `0, 0.02, 0.05` or `[0, 0.1]`.
pub fn parse_float_list(raw: &str) -> Result<Vec<f64>, String> {
    parse_string_list(raw)?
        .into_iter()
        .map(|item| {
            item.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| format!("'{}' is not a finite number", item))
        })
        .collect()
}

fn strip_brackets(raw: &str) -> Result<&str, String> {
    let pairs = [('[', ']'), ('(', ')')];
    for (open, close) in pairs {
        if let Some(inner) = raw.strip_prefix(open) {
            return inner
                .strip_suffix(close)
                .ok_or_else(|| format!("list opened with '{}' but not closed with '{}'", open, close));
        }
    }
    Ok(raw)
}

fn push_item(items: &mut Vec<String>, current: &mut String, was_quoted: bool) {
    let item = if was_quoted {
        current.clone()
    } else {
        current.trim().to_string()
    };
    // Empty unquoted items come from trailing separators or "[]".
    if was_quoted || !item.is_empty() {
        items.push(item);
    }
    current.clear();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_style_string_list() {
        let items = parse_string_list("['iPhone', \"Mac, Pro\", 'Vision Pro']").unwrap();
        assert_eq!(items, vec!["iPhone", "Mac, Pro", "Vision Pro"]);
    }

    #[test]
    fn test_bare_and_empty_lists() {
        assert_eq!(parse_string_list("Model 3; Cybertruck").unwrap(), vec!["Model 3", "Cybertruck"]);
        assert!(parse_string_list("[]").unwrap().is_empty());
        assert!(parse_string_list("").unwrap().is_empty());
    }

    #[test]
    fn test_rejects_code_like_input() {
        assert!(parse_string_list("__import__('os').system('ls')").is_err());
        assert!(parse_string_list("['a'").is_err());
        assert!(parse_string_list("['a' + 'b']").is_err());
        assert!(parse_string_list("'unterminated").is_err());
    }

    #[test]
    fn test_float_list() {
        assert_eq!(parse_float_list("0, 0.02,0.05,").unwrap(), vec![0.0, 0.02, 0.05]);
        assert_eq!(parse_float_list("[0.1]").unwrap(), vec![0.1]);
        assert!(parse_float_list("0.1, abc").is_err());
        assert!(parse_float_list("inf").is_err());
    }
}
