use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

/// Per-day scheduled messages, built once at startup and read-only after.
///
/// The source is line-oriented: `<day>,<message>[,<ignored trailing>]`.
/// Lines whose day is not an integer are skipped; duplicate days keep the
/// last occurrence.
#[derive(Debug, Default, Clone)]
pub struct MotdTable {
    entries: BTreeMap<i64, String>,
}

impl MotdTable {
    /// Load a table from a message file on disk.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::parse(&text))
    }

    /// Parse message lines, silently dropping malformed ones.
    pub fn parse(text: &str) -> Self {
        let mut entries = BTreeMap::new();
        for line in text.lines() {
            let Some((day, rest)) = line.split_once(',') else {
                continue;
            };
            let Ok(day) = day.trim().parse::<i64>() else {
                debug!(line, "skipping message line with non-numeric day");
                continue;
            };
            // Everything up to an optional second comma is the message.
            let message = match rest.split_once(',') {
                Some((message, _)) => message,
                None => rest,
            };
            entries.insert(day, message.to_string());
        }
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Find the message for `day`.
    ///
    /// In fresh-only mode only an exact match counts; otherwise the entry
    /// with the greatest key at or below `day` applies, so a message keeps
    /// being announced until a later-keyed one supersedes it.
    pub fn lookup(&self, day: i64, fresh_only: bool) -> Option<&str> {
        if fresh_only {
            self.entries.get(&day).map(String::as_str)
        } else {
            self.entries
                .range(..=day)
                .next_back()
                .map(|(_, message)| message.as_str())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MotdTable {
        MotdTable::parse("1,A\n5,B\n")
    }

    #[test]
    fn persisting_lookup_uses_greatest_key_at_or_below() {
        let table = table();
        assert_eq!(table.lookup(0, false), None);
        assert_eq!(table.lookup(1, false), Some("A"));
        assert_eq!(table.lookup(3, false), Some("A"));
        assert_eq!(table.lookup(5, false), Some("B"));
        assert_eq!(table.lookup(100, false), Some("B"));
    }

    #[test]
    fn fresh_lookup_requires_exact_day() {
        let table = table();
        assert_eq!(table.lookup(3, true), None);
        assert_eq!(table.lookup(5, true), Some("B"));
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let table = MotdTable::parse("notanumber,hello\n7,Hi there\nno comma at all\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(7, true), Some("Hi there"));
    }

    #[test]
    fn trailing_field_after_second_comma_is_ignored() {
        let table = MotdTable::parse("3,keep this,drop this\n");
        assert_eq!(table.lookup(3, true), Some("keep this"));
    }

    #[test]
    fn duplicate_days_last_writer_wins() {
        let table = MotdTable::parse("2,first\n2,second\n");
        assert_eq!(table.len(), 1);
        assert_eq!(table.lookup(2, true), Some("second"));
    }

    #[test]
    fn loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("motds.csv");
        std::fs::write(&path, "0,welcome\n10,double digits\n").unwrap();

        let table = MotdTable::load(&path).unwrap();
        assert_eq!(table.lookup(4, false), Some("welcome"));
        assert!(MotdTable::load(&dir.path().join("missing.csv")).is_err());
    }
}
