use rand::seq::IndexedRandom;
use rand::Rng;
use serde_json::json;

use crate::collab::TestCase;
use crate::room::{KnownBug, RoundArtifact};

/// One way the saboteur's starting code can be broken
#[derive(Debug, Clone)]
pub struct BugVariant {
    pub bugged_code: &'static str,
    pub description: &'static str,
    /// Source fragment that is present only while the bug is
    pub signature: &'static str,
}

#[derive(Debug, Clone)]
pub struct Challenge {
    pub id: u32,
    pub title: &'static str,
    pub language: &'static str,
    pub function_name: &'static str,
    pub correct_code: &'static str,
    pub bugs: Vec<BugVariant>,
    pub test_cases: Vec<TestCase>,
}

impl Challenge {
    /// Builds the round artifact that starts from `bug`
    pub fn artifact(&self, bug: &BugVariant) -> RoundArtifact {
        RoundArtifact {
            challenge_id: self.id,
            title: self.title.to_string(),
            language: self.language.to_string(),
            function_name: self.function_name.to_string(),
            correct_code: self.correct_code.to_string(),
            starting_code: bug.bugged_code.to_string(),
            bug_description: bug.description.to_string(),
            known_bugs: self
                .bugs
                .iter()
                .map(|b| KnownBug {
                    signature: b.signature.to_string(),
                    description: b.description.to_string(),
                })
                .collect(),
            test_cases: self.test_cases.clone(),
            last_known_text: bug.bugged_code.to_string(),
        }
    }
}

fn case(input: serde_json::Value, expected: serde_json::Value) -> TestCase {
    TestCase { input, expected }
}

/// The code challenges a round can be played on
pub struct ChallengeCatalog {
    challenges: Vec<Challenge>,
}

impl ChallengeCatalog {
    pub fn new(challenges: Vec<Challenge>) -> Self {
        Self { challenges }
    }

    pub fn challenges(&self) -> &[Challenge] {
        &self.challenges
    }

    /// Picks a random challenge and a random bug variant of it
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<RoundArtifact> {
        let challenge = self.challenges.choose(rng)?;
        let bug = challenge.bugs.choose(rng)?;
        Some(challenge.artifact(bug))
    }
}

impl Default for ChallengeCatalog {
    fn default() -> Self {
        Self::new(vec![sum_array(), find_max(), reverse_string()])
    }
}

fn sum_array() -> Challenge {
    Challenge {
        id: 1,
        title: "Array Sum Function",
        language: "javascript",
        function_name: "sumArray",
        correct_code: r#"function sumArray(arr) {
  let sum = 0;
  for (let i = 0; i < arr.length; i++) {
    sum += arr[i];
  }
  return sum;
}"#,
        bugs: vec![
            BugVariant {
                bugged_code: r#"function sumArray(arr) {
  let sum = 0;
  for (let i = 0; i <= arr.length; i++) {
    sum += arr[i];
  }
  return sum;
}"#,
                description: "Off-by-one error: i <= arr.length should be i < arr.length",
                signature: "i <= arr.length",
            },
            BugVariant {
                bugged_code: r#"function sumArray(arr) {
  let sum = 1;
  for (let i = 0; i < arr.length; i++) {
    sum += arr[i];
  }
  return sum;
}"#,
                description: "Wrong initialization: sum should start at 0, not 1",
                signature: "let sum = 1;",
            },
            BugVariant {
                bugged_code: r#"function sumArray(arr) {
  let sum = 0;
  for (let i = 1; i < arr.length; i++) {
    sum += arr[i];
  }
  return sum;
}"#,
                description: "Skipping first element: i should start at 0, not 1",
                signature: "let i = 1; i < arr.length",
            },
        ],
        test_cases: vec![
            case(json!([[1, 2, 3, 4]]), json!(10)),
            case(json!([[]]), json!(0)),
            case(json!([[5]]), json!(5)),
            case(json!([[-1, 1, -2, 2]]), json!(0)),
        ],
    }
}

fn find_max() -> Challenge {
    Challenge {
        id: 2,
        title: "Find Maximum Value",
        language: "javascript",
        function_name: "findMax",
        correct_code: r#"function findMax(numbers) {
  if (numbers.length === 0) return null;
  let max = numbers[0];
  for (let i = 1; i < numbers.length; i++) {
    if (numbers[i] > max) {
      max = numbers[i];
    }
  }
  return max;
}"#,
        bugs: vec![
            BugVariant {
                bugged_code: r#"function findMax(numbers) {
  if (numbers.length === 0) return null;
  let max = 0;
  for (let i = 1; i < numbers.length; i++) {
    if (numbers[i] > max) {
      max = numbers[i];
    }
  }
  return max;
}"#,
                description: "Wrong initialization: max should be numbers[0], not 0",
                signature: "let max = 0;",
            },
            BugVariant {
                bugged_code: r#"function findMax(numbers) {
  if (numbers.length === 0) return null;
  let max = numbers[0];
  for (let i = 1; i < numbers.length; i++) {
    if (numbers[i] >= max) {
      max = numbers[i];
    }
  }
  return max;
}"#,
                description: "Wrong comparison: should be >, not >=",
                signature: "numbers[i] >= max",
            },
            BugVariant {
                bugged_code: r#"function findMax(numbers) {
  if (numbers.length === 0) return null;
  let max = numbers[0];
  for (let i = 0; i < numbers.length; i++) {
    if (numbers[i] > max) {
      max = numbers[i];
    }
  }
  return max;
}"#,
                description: "Redundant comparison: loop should start at i = 1",
                signature: "for (let i = 0; i < numbers.length",
            },
        ],
        test_cases: vec![
            case(json!([[3, 7, 2]]), json!(7)),
            case(json!([[-5, -2, -9]]), json!(-2)),
            case(json!([[]]), json!(null)),
            case(json!([[4]]), json!(4)),
        ],
    }
}

fn reverse_string() -> Challenge {
    Challenge {
        id: 3,
        title: "String Reversal",
        language: "javascript",
        function_name: "reverseString",
        correct_code: r#"function reverseString(str) {
  let reversed = '';
  for (let i = str.length - 1; i >= 0; i--) {
    reversed += str[i];
  }
  return reversed;
}"#,
        bugs: vec![
            BugVariant {
                bugged_code: r#"function reverseString(str) {
  let reversed = '';
  for (let i = str.length; i >= 0; i--) {
    reversed += str[i];
  }
  return reversed;
}"#,
                description: "Off-by-one: i should start at str.length - 1, not str.length",
                signature: "let i = str.length;",
            },
            BugVariant {
                bugged_code: r#"function reverseString(str) {
  let reversed = '';
  for (let i = str.length - 1; i > 0; i--) {
    reversed += str[i];
  }
  return reversed;
}"#,
                description: "Missing last character: condition should be i >= 0, not i > 0",
                signature: "i > 0;",
            },
        ],
        test_cases: vec![
            case(json!(["hello"]), json!("olleh")),
            case(json!([""]), json!("")),
            case(json!(["a"]), json!("a")),
        ],
    }
}
