use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("Unexpected '{found}' on line {line}")]
    UnexpectedCloser { found: char, line: usize },

    #[error("Mismatched '{found}' on line {line}, expected '{expected}'")]
    Mismatched {
        found: char,
        expected: char,
        line: usize,
    },

    #[error("Unclosed '{opener}' opened on line {line}")]
    Unclosed { opener: char, line: usize },

    #[error("Unterminated string starting on line {line}")]
    UnterminatedString { line: usize },

    #[error("Unterminated comment starting on line {line}")]
    UnterminatedComment { line: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    Paren,
    Bracket,
    Brace,
    /// `${` inside a template literal; its `}` resumes the template
    TemplateExpr,
}

impl Frame {
    fn closer(self) -> char {
        match self {
            Frame::Paren => ')',
            Frame::Bracket => ']',
            Frame::Brace | Frame::TemplateExpr => '}',
        }
    }

    fn opener(self) -> char {
        match self {
            Frame::Paren => '(',
            Frame::Bracket => '[',
            Frame::Brace => '{',
            Frame::TemplateExpr => '$',
        }
    }
}

/// Structural JavaScript syntax check.
///
/// Verifies that brackets balance outside of string, template and comment
/// literals and that every literal and block comment is terminated. It does
/// not parse expressions, so it can accept code a real parser would reject.
pub fn check_syntax(code: &str) -> Result<(), SyntaxError> {
    let chars: Vec<char> = code.chars().collect();
    let mut stack: Vec<(Frame, usize)> = Vec::new();
    let mut line = 1;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '\n' => line += 1,
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if chars.get(i + 1) == Some(&'*') => {
                let start = line;
                i += 2;
                loop {
                    match chars.get(i) {
                        None => return Err(SyntaxError::UnterminatedComment { line: start }),
                        Some('*') if chars.get(i + 1) == Some(&'/') => {
                            i += 1;
                            break;
                        }
                        Some('\n') => line += 1,
                        Some(_) => {}
                    }
                    i += 1;
                }
            }
            '\'' | '"' => {
                let start = line;
                i += 1;
                loop {
                    match chars.get(i) {
                        None | Some('\n') => {
                            return Err(SyntaxError::UnterminatedString { line: start })
                        }
                        Some('\\') => i += 1,
                        Some(q) if *q == c => break,
                        Some(_) => {}
                    }
                    i += 1;
                }
            }
            '`' => {
                i = scan_template(&chars, i + 1, &mut line, &mut stack)?;
                continue;
            }
            '(' => stack.push((Frame::Paren, line)),
            '[' => stack.push((Frame::Bracket, line)),
            '{' => stack.push((Frame::Brace, line)),
            ')' | ']' | '}' => match stack.pop() {
                None => return Err(SyntaxError::UnexpectedCloser { found: c, line }),
                Some((frame, _)) if frame.closer() != c => {
                    return Err(SyntaxError::Mismatched {
                        found: c,
                        expected: frame.closer(),
                        line,
                    })
                }
                Some((Frame::TemplateExpr, _)) => {
                    i = scan_template(&chars, i + 1, &mut line, &mut stack)?;
                    continue;
                }
                Some(_) => {}
            },
            _ => {}
        }
        i += 1;
    }

    match stack.pop() {
        Some((frame, opened_on)) => Err(SyntaxError::Unclosed {
            opener: frame.opener(),
            line: opened_on,
        }),
        None => Ok(()),
    }
}

/// Scans template text from `i` up to the closing backtick or the next `${`.
/// Returns the index to resume scanning code from.
fn scan_template(
    chars: &[char],
    mut i: usize,
    line: &mut usize,
    stack: &mut Vec<(Frame, usize)>,
) -> Result<usize, SyntaxError> {
    let start = *line;
    loop {
        match chars.get(i) {
            None => return Err(SyntaxError::UnterminatedString { line: start }),
            Some('\\') => i += 1,
            Some('`') => return Ok(i + 1),
            Some('$') if chars.get(i + 1) == Some(&'{') => {
                stack.push((Frame::TemplateExpr, *line));
                return Ok(i + 2);
            }
            Some('\n') => *line += 1,
            Some(_) => {}
        }
        i += 1;
    }
}
