use crate::fragment::TableFragment;
use serde_json::{Map, Value, json};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex};

#[derive(Clone)]
pub(crate) struct DebugLogger {
    inner: Arc<Mutex<DebugState>>,
}

struct DebugState {
    writer: BufWriter<File>,
    counters: HashMap<String, u64>,
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct PageBreakEvent<'a> {
    pub block_id: &'a str,
    pub reason: &'a str,
    pub page_number: usize,
    pub column_index: usize,
    pub next_row: usize,
}

impl DebugLogger {
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let file = File::create(path)?;
        Ok(Self {
            inner: Arc::new(Mutex::new(DebugState {
                writer: BufWriter::new(file),
                counters: HashMap::new(),
            })),
        })
    }

    fn write_line(&self, line: &Value) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = writeln!(state.writer, "{line}");
        }
    }

    pub fn log_page_break(&self, event: PageBreakEvent<'_>) {
        self.write_line(&json!({
            "type": "table.page_break",
            "block_id": event.block_id,
            "reason": event.reason,
            "page": event.page_number,
            "column": event.column_index,
            "next_row": event.next_row,
        }));
        self.increment(&format!("table.page_break.{}", event.reason), 1);
    }

    pub fn log_fragment(&self, fragment: &TableFragment, page_number: usize) {
        self.write_line(&json!({
            "type": "table.fragment",
            "block_id": fragment.block_id,
            "page": page_number,
            "from_row": fragment.from_row,
            "to_row": fragment.to_row,
            "repeat_header_count": fragment.repeat_header_count,
            "y": fragment.y.to_f64(),
            "height": fragment.height.to_f64(),
            "partial": fragment.partial_row.is_some(),
        }));
        self.increment("table.fragment.emitted", 1);
    }

    pub fn increment(&self, key: &str, amount: u64) {
        if let Ok(mut state) = self.inner.lock() {
            let entry = state.counters.entry(key.to_string()).or_insert(0);
            *entry = entry.saturating_add(amount);
        }
    }

    /// Writes the counters gathered so far, sorted by key, and resets them.
    pub fn emit_summary(&self, context: &str) {
        if let Ok(mut state) = self.inner.lock() {
            let mut counters: Vec<(String, u64)> = state.counters.drain().collect();
            counters.sort_by(|a, b| a.0.cmp(&b.0));
            let counts: Map<String, Value> = counters
                .into_iter()
                .map(|(key, value)| (key, Value::from(value)))
                .collect();
            let line = json!({
                "type": "debug.summary",
                "context": context,
                "counts": counts,
            });
            let _ = writeln!(state.writer, "{line}");
        }
    }

    pub fn flush(&self) {
        if let Ok(mut state) = self.inner.lock() {
            let _ = state.writer.flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragment::{FragmentKind, FragmentMetadata};
    use crate::types::Pt;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_log_path(tag: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        std::env::temp_dir().join(format!(
            "tablebreak_{tag}_{}_{}.jsonl",
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn page_breaks_are_logged_and_counted() {
        let path = temp_log_path("debug");
        let logger = DebugLogger::new(&path).expect("create logger");
        logger.log_page_break(PageBreakEvent {
            block_id: "tbl \"1\"",
            reason: "rows_remaining",
            page_number: 1,
            column_index: 0,
            next_row: 10,
        });
        logger.emit_summary("test");
        logger.flush();

        let text = std::fs::read_to_string(&path).expect("read log");
        let lines: Vec<Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).expect("valid json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "table.page_break");
        assert_eq!(lines[0]["block_id"], "tbl \"1\"");
        assert_eq!(lines[0]["next_row"], 10);
        assert_eq!(lines[1]["counts"]["table.page_break.rows_remaining"], 1);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn fragment_lines_keep_control_characters_in_block_ids() {
        let path = temp_log_path("fragment");
        let logger = DebugLogger::new(&path).expect("create logger");
        let fragment = TableFragment {
            kind: FragmentKind::Table,
            block_id: "tbl\n\"2\"\t\\x".to_string(),
            from_row: 3,
            to_row: 7,
            x: Pt::ZERO,
            y: Pt::from_f64(12.5),
            width: Pt::from_i32(100),
            height: Pt::from_i32(80),
            repeat_header_count: 1,
            continues_on_next: true,
            continues_from_prev: true,
            partial_row: None,
            metadata: FragmentMetadata::default(),
        };
        logger.log_fragment(&fragment, 2);
        logger.increment("extra", 4);
        logger.emit_summary("fragment \"ctx\"");
        logger.flush();

        let text = std::fs::read_to_string(&path).expect("read log");
        let lines: Vec<Value> = text
            .lines()
            .map(|line| serde_json::from_str(line).expect("valid json line"))
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["type"], "table.fragment");
        assert_eq!(lines[0]["block_id"], "tbl\n\"2\"\t\\x");
        assert_eq!(lines[0]["page"], 2);
        assert_eq!(lines[0]["to_row"], 7);
        assert_eq!(lines[0]["y"], 12.5);
        assert_eq!(lines[0]["partial"], false);
        assert_eq!(lines[1]["context"], "fragment \"ctx\"");
        assert_eq!(lines[1]["counts"]["extra"], 4);
        assert_eq!(lines[1]["counts"]["table.fragment.emitted"], 1);
        let _ = std::fs::remove_file(&path);
    }
}
