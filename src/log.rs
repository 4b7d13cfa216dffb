use serde_json::Value;

/// One line in the operator-facing activity log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub text: String,
    pub is_error: bool,
}

/// Append-only record of issued commands and remote responses.
///
/// Pure projection for the operator: appending never fails and has no
/// effect on sequencing. Cleared at the start of each submission.
#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: Vec<LogEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all entries, at the start of a new submission
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Record a planned command line
    pub fn append_command(&mut self, text: impl Into<String>) {
        self.entries.push(LogEntry {
            text: text.into(),
            is_error: false,
        });
    }

    /// Record a titled remote response or status note.
    /// Structured payloads are rendered as indented JSON.
    pub fn append_response(&mut self, title: &str, payload: &Value, is_error: bool) {
        let rendered = match payload {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string()),
        };
        let text = if rendered.is_empty() {
            title.to_string()
        } else {
            format!("{}: {}", title, rendered)
        };
        self.entries.push(LogEntry { text, is_error });
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full log as display text, one entry per line, error lines marked
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| {
                if e.is_error {
                    format!("[error] {}", e.text)
                } else {
                    e.text.clone()
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
