//! Turns raw model text into a thought and an action.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use phia_core::{Action, ArgumentFormat};
use phia_prompt::{ACT_LABEL, FINISH_LABEL, OBSERVE_LABEL, QUESTION_LABEL, THOUGHT_LABEL};
use regex::Regex;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("could not parse action '{raw}': {reason}")]
pub struct ActionParseError {
    pub raw: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ModelTurn {
    Act {
        thought: Option<String>,
        action: Result<Action, ActionParseError>,
    },
    Finish {
        thought: Option<String>,
        answer: String,
    },
    /// Neither an action nor a final answer.
    Thought { thought: String },
}

fn label(name: &str) -> String {
    format!("{name}:")
}

pub fn parse_model_output(text: &str) -> ModelTurn {
    let text = text.trim_start();
    let thought_label = label(THOUGHT_LABEL);
    let body = text.strip_prefix(thought_label.as_str()).unwrap_or(text);

    let act_label = label(ACT_LABEL);
    let finish_label = label(FINISH_LABEL);
    let act_at = body.find(&act_label);
    let finish_at = body.find(&finish_label);

    match (act_at, finish_at) {
        (Some(act), finish) if finish.map_or(true, |finish| act < finish) => {
            let rest = &body[act + act_label.len()..];
            let end = next_marker(rest, &[OBSERVE_LABEL, THOUGHT_LABEL, FINISH_LABEL, QUESTION_LABEL]);
            ModelTurn::Act {
                thought: clean(&body[..act]),
                action: parse_action(&rest[..end]),
            }
        }
        (_, Some(finish)) => {
            let rest = &body[finish + finish_label.len()..];
            let end = next_marker(rest, &[OBSERVE_LABEL, QUESTION_LABEL, THOUGHT_LABEL, ACT_LABEL]);
            ModelTurn::Finish {
                thought: clean(&body[..finish]),
                answer: rest[..end].trim().to_string(),
            }
        }
        _ => ModelTurn::Thought {
            thought: body.trim().to_string(),
        },
    }
}

fn clean(text: &str) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        None
    } else {
        Some(text.to_string())
    }
}

fn next_marker(text: &str, markers: &[&str]) -> usize {
    markers
        .iter()
        .filter_map(|marker| text.find(marker))
        .min()
        .unwrap_or(text.len())
}

fn fenced_block() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)^```([A-Za-z_][A-Za-z0-9_]*)?[^\n]*\n(.*?)\n?[ \t]*```")
            .expect("fenced block pattern is valid")
    })
}

fn call_head() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^([A-Za-z_][A-Za-z0-9_]*)\s*\(").expect("call pattern is valid")
    })
}

/// Byte offset of the `)` closing the call, skipping string literals and
/// nested brackets.
fn closing_paren(text: &str) -> Option<usize> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut depth = 0usize;
    let mut i = 0;
    while let Some(&(at, ch)) = chars.get(i) {
        match ch {
            '\'' | '"' => {
                i = skip_string(&chars, i)?;
                continue;
            }
            '(' | '[' | '{' => depth += 1,
            ')' if depth == 0 => return Some(at),
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
        i += 1;
    }
    None
}

/// Index just past the literal opening at `start`, or `None` if it never closes.
fn skip_string(chars: &[(usize, char)], start: usize) -> Option<usize> {
    let quote = chars[start].1;
    let is_quote = |i: usize| chars.get(i).map(|&(_, ch)| ch) == Some(quote);
    let delimiter = if is_quote(start + 1) && is_quote(start + 2) { 3 } else { 1 };
    let mut i = start + delimiter;
    while let Some(&(_, ch)) = chars.get(i) {
        if ch == '\\' {
            i += 2;
            continue;
        }
        if ch == quote && (1..delimiter).all(|offset| is_quote(i + offset)) {
            return Some(i + delimiter);
        }
        i += 1;
    }
    None
}

/// Prose wrapped in one pair of quotes that the lexer could not read, such as
/// `'you're fine'`.
fn unquote_prose(text: &str) -> &str {
    for quote in ["\"\"\"", "'''", "\"", "'"] {
        if text.len() >= 2 * quote.len() && text.starts_with(quote) && text.ends_with(quote) {
            return &text[quote.len()..text.len() - quote.len()];
        }
    }
    text
}

/// Accepts a fenced block tagged with the tool name, or a call expression
/// `name(args, key=value)`.
pub fn parse_action(text: &str) -> Result<Action, ActionParseError> {
    let text = text.trim();
    let error = |reason: &str| ActionParseError {
        raw: text.to_string(),
        reason: reason.to_string(),
    };

    if text.is_empty() {
        return Err(error("empty action"));
    }

    if let Some(caps) = fenced_block().captures(text) {
        let Some(tool) = caps.get(1) else {
            return Err(error("fenced block has no tool name"));
        };
        let code = caps.get(2).map_or("", |m| m.as_str());
        return Ok(Action::code(tool.as_str(), code));
    }

    if let Some(caps) = call_head().captures(text) {
        let name = &caps[1];
        let rest = &text[caps[0].len()..];
        let inner = match closing_paren(rest) {
            Some(end) => {
                let trailing = rest[end + 1..].trim();
                if !trailing.is_empty() {
                    tracing::debug!(tool = name, trailing, "ignoring text after call");
                }
                &rest[..end]
            }
            // A stray quote hides the real closing paren; take the last one.
            None => match rest.rfind(')') {
                Some(end) => &rest[..end],
                None => return Err(error("call expression is never closed")),
            },
        };
        let (args, kwargs) = match CallLexer::new(inner).arguments() {
            Ok(parsed) => parsed,
            // Unquoted prose is taken whole as the single argument.
            Err(_) => (
                vec![unquote_prose(inner.trim()).to_string()],
                BTreeMap::new(),
            ),
        };
        return Ok(Action {
            tool_name: name.to_string(),
            args,
            kwargs,
            format: ArgumentFormat::Python,
        });
    }

    Err(error("expected a fenced block or a call expression"))
}

struct CallLexer {
    chars: Vec<char>,
    pos: usize,
}

type CallArguments = (Vec<String>, BTreeMap<String, String>);

impl CallLexer {
    fn new(input: &str) -> Self {
        Self {
            chars: input.chars().collect(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn at(&self, pattern: &str) -> bool {
        pattern
            .chars()
            .enumerate()
            .all(|(offset, ch)| self.chars.get(self.pos + offset) == Some(&ch))
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.pos += 1;
        }
    }

    fn arguments(mut self) -> Result<CallArguments, String> {
        let mut args = Vec::new();
        let mut kwargs = BTreeMap::new();
        loop {
            self.skip_whitespace();
            if self.peek().is_none() {
                break;
            }
            let keyword = self.keyword();
            let value = self.value()?;
            match keyword {
                Some(key) => {
                    kwargs.insert(key, value);
                }
                None if !kwargs.is_empty() => {
                    return Err("positional argument follows keyword argument".to_string());
                }
                None => args.push(value),
            }
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some(',') => self.pos += 1,
                Some(other) => return Err(format!("unexpected character '{other}'")),
            }
        }
        Ok((args, kwargs))
    }

    fn keyword(&mut self) -> Option<String> {
        let start = self.pos;
        let mut end = start;
        while self
            .chars
            .get(end)
            .is_some_and(|ch| ch.is_alphanumeric() || *ch == '_')
        {
            end += 1;
        }
        if end == start || self.chars[start].is_ascii_digit() {
            return None;
        }
        let mut eq = end;
        while self.chars.get(eq).is_some_and(|ch| ch.is_whitespace()) {
            eq += 1;
        }
        if self.chars.get(eq) == Some(&'=') && self.chars.get(eq + 1) != Some(&'=') {
            self.pos = eq + 1;
            self.skip_whitespace();
            Some(self.chars[start..end].iter().collect())
        } else {
            None
        }
    }

    fn value(&mut self) -> Result<String, String> {
        match self.peek() {
            Some('\'') | Some('"') => self.string(),
            Some(_) => self.bare(),
            None => Err("missing value".to_string()),
        }
    }

    fn string(&mut self) -> Result<String, String> {
        let quote = self.chars[self.pos];
        let triple: String = [quote; 3].iter().collect();
        let delimiter = if self.at(&triple) { 3 } else { 1 };
        self.pos += delimiter;

        let mut out = String::new();
        loop {
            let Some(ch) = self.peek() else {
                return Err("unterminated string literal".to_string());
            };
            if ch == quote && (delimiter == 1 || self.at(&triple)) {
                self.pos += delimiter;
                return Ok(out);
            }
            self.pos += 1;
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            let Some(escaped) = self.peek() else {
                return Err("unterminated escape".to_string());
            };
            self.pos += 1;
            match escaped {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                'r' => out.push('\r'),
                '\\' | '\'' | '"' => out.push(escaped),
                '\n' => {}
                other => {
                    out.push('\\');
                    out.push(other);
                }
            }
        }
    }

    /// Numbers, names and nested expressions, kept as written. Whitespace
    /// between tokens outside brackets means the model wrote prose.
    fn bare(&mut self) -> Result<String, String> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut gap = false;
        let mut prose = false;
        while let Some(ch) = self.peek() {
            if depth == 0 && ch != ',' {
                if ch.is_whitespace() {
                    gap = true;
                } else if gap {
                    prose = true;
                }
            }
            match ch {
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => {
                    depth = depth
                        .checked_sub(1)
                        .ok_or_else(|| "unbalanced brackets".to_string())?;
                }
                ',' if depth == 0 => break,
                '\'' | '"' => {
                    self.string()?;
                    continue;
                }
                _ => {}
            }
            self.pos += 1;
        }
        let token: String = self.chars[start..self.pos].iter().collect();
        let token = token.trim().to_string();
        if prose {
            return Err(format!("unquoted text '{token}'"));
        }
        if depth != 0 {
            return Err("unbalanced brackets".to_string());
        }
        Ok(token)
    }
}
