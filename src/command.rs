use serde::{Deserialize, Serialize};
use std::fmt;

/// Rover action, one per command letter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Forward,
    Backward,
    Left,
    Right,
    Stop,
    Heading,
}

impl Action {
    /// Numeric code written to the `action` variable
    pub fn code(&self) -> f64 {
        match self {
            Action::Stop => 0.0,
            Action::Forward => 1.0,
            Action::Backward => 2.0,
            Action::Left => 3.0,
            Action::Right => 4.0,
            Action::Heading => 5.0,
        }
    }

    /// Command letter as entered by the operator
    pub fn letter(&self) -> char {
        match self {
            Action::Forward => 'F',
            Action::Backward => 'B',
            Action::Left => 'L',
            Action::Right => 'R',
            Action::Stop => 'S',
            Action::Heading => 'H',
        }
    }

    fn from_letter(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'F' => Some(Action::Forward),
            'B' => Some(Action::Backward),
            'L' => Some(Action::Left),
            'R' => Some(Action::Right),
            'S' => Some(Action::Stop),
            'H' => Some(Action::Heading),
            _ => None,
        }
    }

    /// True for commands that drive the motors for a duration
    pub fn is_movement(&self) -> bool {
        !matches!(self, Action::Stop | Action::Heading)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Forward => "forward",
            Action::Backward => "backward",
            Action::Left => "left",
            Action::Right => "right",
            Action::Stop => "stop",
            Action::Heading => "heading",
        };
        write!(f, "{}", name)
    }
}

/// One parsed operator command
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub action: Action,
    /// Duration in seconds for movement, target angle for heading
    pub value: f64,
}

impl Command {
    /// Human-readable line for the plan log, e.g. `forward (F2) - 2 seconds`
    pub fn describe(&self) -> String {
        let value_text = if self.action == Action::Heading {
            if self.value == -1.0 {
                "disabled".to_string()
            } else {
                format!("{}°", self.value)
            }
        } else {
            format!("{} seconds", self.value)
        };
        format!(
            "{} ({}{}) - {}",
            self.action,
            self.action.letter(),
            self.value,
            value_text
        )
    }
}

/// Parse an operator command string into an ordered command list.
///
/// Tokens are comma-separated, each a command letter with an optional
/// trailing number. Parsing is total: unknown letters degrade to Stop and
/// non-positive movement durations degrade to 1.0 so a typo never aborts
/// the rest of the batch. Heading values are not range-checked here; the
/// sequencer clamps them at dispatch.
pub fn parse(raw: &str) -> Vec<Command> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(parse_token)
        .collect()
}

fn parse_token(token: &str) -> Command {
    let action = token
        .chars()
        .next()
        .filter(|c| c.is_ascii_alphabetic())
        .and_then(Action::from_letter)
        .unwrap_or(Action::Stop);

    let default_value = if action == Action::Heading { 0.0 } else { 1.0 };

    // An overlong literal parses to infinity; degrade it like any other typo
    let mut value = match trailing_number(token) {
        Some(v) if v.is_finite() => v,
        _ => default_value,
    };

    if action != Action::Heading && value <= 0.0 {
        value = 1.0;
    }

    Command { action, value }
}

/// Extract a trailing integer or decimal literal, e.g. `12`, `3.5`, `.5`
fn trailing_number(token: &str) -> Option<f64> {
    let tail: String = token
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit() || *c == '.')
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();

    if tail.is_empty() || tail.chars().all(|c| c == '.') {
        return None;
    }
    tail.parse().ok()
}
