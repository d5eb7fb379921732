use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

use crate::game::GameError;

/// One test case: positional arguments and the expected return value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    pub input: serde_json::Value,
    pub expected: serde_json::Value,
}

/// Everything a runner needs to judge a submission. Pinned when the
/// submission arrives so later room changes cannot affect the verdict.
#[derive(Debug, Clone)]
pub struct TestSuite {
    pub function_name: String,
    pub reference_solution: String,
    pub cases: Vec<TestCase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub input: serde_json::Value,
    pub expected: serde_json::Value,
    pub actual: Option<serde_json::Value>,
    pub passed: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestReport {
    pub all_passed: bool,
    pub results: Vec<TestResult>,
}

impl TestReport {
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn total_count(&self) -> usize {
        self.results.len()
    }

    fn from_results(results: Vec<TestResult>) -> Self {
        Self {
            all_passed: !results.is_empty() && results.iter().all(|r| r.passed),
            results,
        }
    }
}

/// Runs a candidate solution against a test suite.
///
/// Implementations must isolate each invocation; nothing may leak between
/// test cases or between players.
#[async_trait]
pub trait TestRunner: Send + Sync {
    async fn run_tests(&self, candidate: &str, suite: &TestSuite) -> TestReport;
}

/// Judges a submission by comparing it with the reference solution,
/// ignoring indentation and blank lines.
pub struct ReferenceRunner;

impl ReferenceRunner {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReferenceRunner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TestRunner for ReferenceRunner {
    async fn run_tests(&self, candidate: &str, suite: &TestSuite) -> TestReport {
        let failure = match extract_function_name(candidate) {
            None => Some("No valid function definition found".to_string()),
            Some(name) if name != suite.function_name => {
                Some(format!("Expected function {}, found {}", suite.function_name, name))
            }
            Some(_) if normalize_code(candidate) != normalize_code(&suite.reference_solution) => {
                Some("Output differs from the reference solution".to_string())
            }
            Some(_) => None,
        };

        let results = suite
            .cases
            .iter()
            .map(|case| TestResult {
                input: case.input.clone(),
                expected: case.expected.clone(),
                actual: failure.is_none().then(|| case.expected.clone()),
                passed: failure.is_none(),
                error: failure.clone(),
            })
            .collect();

        TestReport::from_results(results)
    }
}

/// Outcome of the static pre-check
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SafetyCheck {
    pub safe: bool,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Copy)]
enum Follow {
    /// Identifier must end at a word boundary
    Word,
    /// Identifier must be followed by `(`, optionally after whitespace
    Call,
    /// Identifier must be followed by whitespace
    Whitespace,
}

struct DeniedPattern {
    ident: &'static str,
    follow: Follow,
}

const DENYLIST: &[DeniedPattern] = &[
    DeniedPattern { ident: "require", follow: Follow::Call },
    DeniedPattern { ident: "import", follow: Follow::Whitespace },
    DeniedPattern { ident: "process", follow: Follow::Word },
    DeniedPattern { ident: "global", follow: Follow::Word },
    DeniedPattern { ident: "eval", follow: Follow::Call },
    DeniedPattern { ident: "Function", follow: Follow::Call },
    DeniedPattern { ident: "__dirname", follow: Follow::Word },
    DeniedPattern { ident: "__filename", follow: Follow::Word },
    DeniedPattern { ident: "setTimeout", follow: Follow::Word },
    DeniedPattern { ident: "setInterval", follow: Follow::Word },
    DeniedPattern { ident: "setImmediate", follow: Follow::Word },
    DeniedPattern { ident: "fetch", follow: Follow::Word },
    DeniedPattern { ident: "XMLHttpRequest", follow: Follow::Word },
    DeniedPattern { ident: "WebSocket", follow: Follow::Word },
];

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

impl DeniedPattern {
    fn matches(&self, code: &str) -> bool {
        code.match_indices(self.ident).any(|(start, _)| {
            let before_ok = code[..start]
                .chars()
                .next_back()
                .map_or(true, |c| !is_word_char(c));
            let rest = &code[start + self.ident.len()..];
            let after_ok = match self.follow {
                Follow::Word => rest.chars().next().map_or(true, |c| !is_word_char(c)),
                Follow::Call => rest.trim_start().starts_with('('),
                Follow::Whitespace => rest.chars().next().is_some_and(char::is_whitespace),
            };
            before_ok && after_ok
        })
    }

    fn describe(&self) -> String {
        match self.follow {
            Follow::Call => format!("Dangerous pattern detected: {}(", self.ident),
            _ => format!("Dangerous pattern detected: {}", self.ident),
        }
    }
}

/// Rejects code reaching for process, globals, dynamic eval, network or timers
pub fn check_safety(code: &str) -> SafetyCheck {
    let issues: Vec<String> = DENYLIST
        .iter()
        .filter(|pattern| pattern.matches(code))
        .map(DeniedPattern::describe)
        .collect();

    SafetyCheck {
        safe: issues.is_empty(),
        issues,
    }
}

fn read_ident(s: &str) -> Option<(&str, &str)> {
    let end = s
        .char_indices()
        .find(|(_, c)| !(is_word_char(*c) || *c == '$'))
        .map_or(s.len(), |(i, _)| i);
    (end > 0).then(|| (&s[..end], &s[end..]))
}

/// Name of the first function defined in `code`, either
/// `function name(` or `const|let|var name = function|(`.
pub fn extract_function_name(code: &str) -> Option<String> {
    for (start, _) in code.match_indices("function") {
        let rest = &code[start + "function".len()..];
        if !rest.starts_with(char::is_whitespace) {
            continue;
        }
        if let Some((name, after)) = read_ident(rest.trim_start()) {
            if after.trim_start().starts_with('(') {
                return Some(name.to_string());
            }
        }
    }

    for keyword in ["const", "let", "var"] {
        for (start, _) in code.match_indices(keyword) {
            let rest = &code[start + keyword.len()..];
            if !rest.starts_with(char::is_whitespace) {
                continue;
            }
            if let Some((name, after)) = read_ident(rest.trim_start()) {
                if let Some(value) = after.trim_start().strip_prefix('=') {
                    let value = value.trim_start();
                    if value.starts_with("function") || value.starts_with('(') {
                        return Some(name.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Trims every line and drops blank ones
pub fn normalize_code(code: &str) -> String {
    code.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Static pre-check followed by a time-boxed test run
pub async fn validate_submission(
    runner: &dyn TestRunner,
    candidate: &str,
    suite: &TestSuite,
    budget: Duration,
) -> Result<TestReport, GameError> {
    let safety = check_safety(candidate);
    if !safety.safe {
        warn!(issues = ?safety.issues, "Submission rejected by safety check");
        return Err(GameError::UnsafeCode(safety.issues.join("; ")));
    }

    match tokio::time::timeout(budget, runner.run_tests(candidate, suite)).await {
        Ok(report) => {
            debug!(
                passed = report.passed_count(),
                total = report.total_count(),
                "Submission validated"
            );
            Ok(report)
        }
        Err(_) => {
            warn!(budget_ms = budget.as_millis() as u64, "Submission validation timed out");
            Err(GameError::ValidationTimeout)
        }
    }
}
