//! Quoting of user-entered text for the task command line
//!
//! Arguments are wrapped in double quotes and embedded double quotes are
//! backslash-escaped. Nothing else is escaped: literal backslashes pass through
//! as-is, and on the shell path `$` and backticks are still expanded by `sh`.

/// Wrap one argument in double quotes, escaping embedded `"`
pub fn sanitize_single_argument(input: &str) -> String {
    format!("\"{}\"", input.replace('"', "\\\""))
}

/// Quote each token independently and join with single spaces
pub fn sanitize_arguments<S: AsRef<str>>(tokens: &[S]) -> String {
    tokens
        .iter()
        .map(|t| sanitize_single_argument(t.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Tokenize free-form user text and re-quote it as a single shell-safe string
pub fn sanitize(input: &str) -> String {
    sanitize_arguments(&tokenize(input))
}

/// Split user text into arguments
///
/// Spaces outside quotes separate tokens and runs of spaces collapse. A `"`
/// toggles quoted mode and is not kept; an explicitly quoted empty string
/// (`""`) still yields an empty token. Outside quotes a backslash escapes the
/// next character and the escape is kept verbatim, so `\"` stays `\"` and
/// `\ ` keeps the space inside the token. An unterminated quote runs to the end
/// of input and a trailing lone backslash is dropped.
pub fn tokenize(input: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut started = false;
    let mut quoted = false;
    let mut escaped = false;

    for ch in input.chars() {
        if escaped {
            current.push('\\');
            current.push(ch);
            started = true;
            escaped = false;
            continue;
        }

        match ch {
            ' ' if !quoted => {
                if started {
                    args.push(std::mem::take(&mut current));
                    started = false;
                }
            }
            '"' => {
                quoted = !quoted;
                started = true;
            }
            '\\' if !quoted => escaped = true,
            _ => {
                current.push(ch);
                started = true;
            }
        }
    }

    if started {
        args.push(current);
    }

    args
}
