//! Operator log ring buffer

use chrono::Local;
use std::collections::VecDeque;

use crate::config::DEFAULT_LOG_LIMIT;

/// Timestamped log lines, bounded to the most recent `limit` entries
#[derive(Debug, Clone)]
pub struct LogBuffer {
    lines: VecDeque<String>,
    limit: usize,
}

impl Default for LogBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_LIMIT)
    }
}

impl LogBuffer {
    /// Create a buffer keeping at most `limit` lines (minimum one)
    pub fn new(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            lines: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Append a line stamped with local wall-clock time
    pub fn push(&mut self, message: &str) {
        let stamp = Local::now().format("%H:%M:%S");
        self.push_raw(format!("[{stamp}] {message}"));
    }

    /// Append a preformatted line
    pub fn push_raw(&mut self, line: String) {
        while self.lines.len() >= self.limit {
            self.lines.pop_front();
        }
        self.lines.push_back(line);
    }

    /// Maximum number of lines kept
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Replace the buffer with nothing
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Number of lines held
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Check if no line has been logged since the last clear
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines oldest first
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    /// Owned snapshot for publishing
    pub fn snapshot(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_eviction() {
        let mut log = LogBuffer::new(3);
        for i in 0..5 {
            log.push_raw(format!("line {i}"));
        }
        assert_eq!(log.snapshot(), vec!["line 2", "line 3", "line 4"]);
    }

    #[test]
    fn test_push_is_timestamped() {
        let mut log = LogBuffer::new(10);
        log.push("Connected");
        let line = log.lines().next().unwrap();
        assert!(line.starts_with('['));
        assert!(line.ends_with("] Connected"));
    }

    #[test]
    fn test_zero_limit_keeps_one_line() {
        let mut log = LogBuffer::new(0);
        assert_eq!(log.limit(), 1);
        log.push_raw("a".into());
        log.push_raw("b".into());
        assert_eq!(log.snapshot(), vec!["b"]);

        log.clear();
        assert!(log.is_empty());
        assert_eq!(log.len(), 0);
    }
}
