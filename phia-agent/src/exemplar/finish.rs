//! Best-effort recovery of a printed final answer from exemplar code.

const LITERAL_FORMS: [(&str, &str); 3] = [
    ("print(\"\"\"", "\"\"\")"),
    ("print('", "')"),
    ("print(\"", "\")"),
];

/// Returns `None` when the code prints nothing. Otherwise the first printed
/// literal by form priority (triple-quoted, single-quoted, double-quoted), or
/// the whole code when no literal form matches.
pub fn extract_printed_answer(code: &str) -> Option<String> {
    if !code.contains("print(") {
        return None;
    }

    for (open, close) in LITERAL_FORMS {
        if !(code.contains(open) && code.contains(close)) {
            continue;
        }
        // Segment between the first and second opening, cut at its last close.
        let Some(segment) = code.split(open).nth(1) else {
            continue;
        };
        let answer = match segment.rsplit_once(close) {
            Some((before, _)) => before,
            None => segment,
        };
        return Some(answer.to_string());
    }

    Some(code.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_quoted_literal() {
        assert_eq!(
            extract_printed_answer("print('Your answer is 7')").as_deref(),
            Some("Your answer is 7")
        );
    }

    #[test]
    fn triple_quoted_literal_wins_over_double_quoted() {
        let code = "x = 1\nprint(\"\"\"Line one\nLine \"two\"\"\"\")";
        assert_eq!(
            extract_printed_answer(code).as_deref(),
            Some("Line one\nLine \"two\"")
        );
    }

    #[test]
    fn double_quoted_literal() {
        assert_eq!(
            extract_printed_answer("print(\"It's fine\")").as_deref(),
            Some("It's fine")
        );
    }

    #[test]
    fn computed_output_falls_back_to_whole_code() {
        let code = "print(summary_df['steps'].mean())";
        assert_eq!(extract_printed_answer(code).as_deref(), Some(code));
    }

    #[test]
    fn code_without_print_yields_nothing() {
        assert_eq!(extract_printed_answer("summary_df.describe()"), None);
    }
}
