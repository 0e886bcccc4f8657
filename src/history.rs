// src/history.rs
use crate::error::{StoreError, StoreResult};
use crate::models::PasswordRecord;
use chrono::NaiveDate;
use log;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Password history persisted as a JSON array in a single file.
///
/// Every operation goes back to the file: there is no cached copy, and
/// no locking. Two processes appending at once race and the later write wins.
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        HistoryStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the whole history. A missing, unreadable or malformed file
    /// is treated as an empty history; odd fields inside an otherwise valid
    /// array are kept (see `PasswordRecord`).
    pub fn load(&self) -> Vec<PasswordRecord> {
        if !self.path.exists() {
            log::info!("History file {:?} not found, starting with an empty history", self.path);
            return Vec::new();
        }
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                log::warn!("Failed to read history file {:?}: {}. Using an empty history.", self.path, e);
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<PasswordRecord>>(&content) {
            Ok(records) => {
                log::info!("Loaded {} history records from {:?}", records.len(), self.path);
                records
            }
            Err(e) => {
                log::warn!("Failed to parse history file {:?}: {}. Using an empty history.", self.path, e);
                Vec::new()
            }
        }
    }

    /// Overwrites the file with `records`.
    pub fn save(&self, records: &[PasswordRecord]) -> StoreResult<()> {
        let json = serde_json::to_string_pretty(records).map_err(|e| {
            let msg = format!("JSON serialization failed: {}", e);
            log::error!("save: {}", msg);
            StoreError::Serialization(msg)
        })?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|e| {
                log::error!("Failed to open history file {:?} for writing: {:?}", self.path, e);
                StoreError::Io(e)
            })?;
        file.write_all(json.as_bytes()).map_err(|e| {
            log::error!("Failed to write history file {:?}: {:?}", self.path, e);
            e
        })?;

        log::info!("Saved {} history records to {:?}", records.len(), self.path);
        Ok(())
    }

    /// Reloads the file, appends one record and writes everything back.
    pub fn append(&self, password: &str, timestamp: &str) -> StoreResult<PasswordRecord> {
        let mut records = self.load();
        let record = PasswordRecord::new(password.to_string(), timestamp.to_string());
        records.push(record.clone());
        self.save(&records)?;
        Ok(record)
    }

    pub fn clear(&self) -> StoreResult<()> {
        log::info!("Clearing history file {:?}", self.path);
        self.save(&[])
    }
}

/// Records dated on or after `threshold`, in their original order.
/// Records whose time doesn't parse are left out.
pub fn filter_from(records: &[PasswordRecord], threshold: NaiveDate) -> Vec<PasswordRecord> {
    records
        .iter()
        .filter(|r| r.date().map_or(false, |d| d >= threshold))
        .cloned()
        .collect()
}

/// Newest first, comparing the raw time strings.
pub fn sorted_by_time_descending(records: &[PasswordRecord]) -> Vec<PasswordRecord> {
    let mut sorted = records.to_vec();
    sorted.sort_by(|a, b| b.time.cmp(&a.time));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(password: &str, time: &str) -> PasswordRecord {
        PasswordRecord::new(password.to_string(), time.to_string())
    }

    fn sample_records() -> Vec<PasswordRecord> {
        vec![
            record("first", "2024-01-01 10:00:00"),
            record("second", "2024-03-15 08:30:00"),
            record("broken", "yesterday"),
            record("third", "2023-12-31 23:59:59"),
            record("fourth", "2024-03-15 08:30:00"),
        ]
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("password_history.json"));
        assert!(store.load().is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn test_load_malformed_file_is_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("password_history.json");
        for content in ["", "{not json", "{\"password\":\"x\",\"time\":\"y\"}", "[1, 2]", "[{\"password\":\"x\""] {
            fs::write(&path, content).unwrap();
            assert!(HistoryStore::new(&path).load().is_empty(), "content {:?}", content);
        }
    }

    #[test]
    fn test_save_then_load_preserves_order() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("password_history.json"));
        let records = sample_records();
        store.save(&records).unwrap();
        assert_eq!(store.load(), records);
    }

    #[test]
    fn test_save_writes_pretty_utf8_json() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("password_history.json"));
        store.save(&[record("mật khẩu", "2024-01-01 10:00:00")]).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert!(content.contains("mật khẩu"));
        assert!(content.contains("\n  {"));
        let value: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(value[0]["password"], "mật khẩu");
        assert_eq!(value[0]["time"], "2024-01-01 10:00:00");
    }

    #[test]
    fn test_append_and_clear_lifecycle() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("password_history.json"));
        assert!(store.load().is_empty());

        let appended = store.append("Ab1!", "2024-01-01 10:00:00").unwrap();
        assert_eq!(appended, record("Ab1!", "2024-01-01 10:00:00"));
        assert_eq!(store.load(), vec![record("Ab1!", "2024-01-01 10:00:00")]);

        store.clear().unwrap();
        assert!(store.path().exists());
        assert!(store.load().is_empty());
        assert_eq!(fs::read_to_string(store.path()).unwrap().trim(), "[]");
    }

    #[test]
    fn test_append_allows_duplicates() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("password_history.json"));
        store.append("same", "2024-01-01 10:00:00").unwrap();
        store.append("same", "2024-01-01 10:00:00").unwrap();
        assert_eq!(store.load().len(), 2);
    }

    #[test]
    fn test_append_picks_up_external_edits() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("password_history.json");
        let store = HistoryStore::new(&path);
        store.append("mine", "2024-01-01 10:00:00").unwrap();

        // Another writer replaces the file between our saves.
        HistoryStore::new(&path).save(&[record("theirs", "2024-02-02 12:00:00")]).unwrap();

        store.append("mine again", "2024-03-03 09:00:00").unwrap();
        let passwords: Vec<String> = store.load().into_iter().map(|r| r.password).collect();
        assert_eq!(passwords, vec!["theirs", "mine again"]);
    }

    #[test]
    fn test_append_over_malformed_file_starts_fresh() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("password_history.json");
        fs::write(&path, "garbage").unwrap();
        let store = HistoryStore::new(&path);
        store.append("Ab1!", "2024-01-01 10:00:00").unwrap();
        assert_eq!(store.load(), vec![record("Ab1!", "2024-01-01 10:00:00")]);
    }

    #[test]
    fn test_append_preserves_records_with_bad_time_field() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("password_history.json");
        fs::write(
            &path,
            r#"[{"password":"keep1","time":"2024-01-01 10:00:00"},{"password":"keep2","time":null},{"password":"keep3"}]"#,
        )
        .unwrap();
        let store = HistoryStore::new(&path);
        assert_eq!(store.load().len(), 3);

        store.append("new", "2024-02-01 10:00:00").unwrap();
        let records = store.load();
        let passwords: Vec<&str> = records.iter().map(|r| r.password.as_str()).collect();
        assert_eq!(passwords, vec!["keep1", "keep2", "keep3", "new"]);

        // Odd times stay in the file but never pass the date filter.
        let filtered = filter_from(&records, date(1970, 1, 1));
        let passwords: Vec<&str> = filtered.iter().map(|r| r.password.as_str()).collect();
        assert_eq!(passwords, vec!["keep1", "new"]);
    }

    #[test]
    fn test_append_keeps_unknown_keys() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("password_history.json");
        fs::write(&path, r#"[{"password":"x","time":"2024-01-01 10:00:00","label":"mail"}]"#).unwrap();
        HistoryStore::new(&path).append("y", "2024-01-02 10:00:00").unwrap();

        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value[0]["label"], "mail");
        assert_eq!(value[1]["password"], "y");
        assert!(value[1].get("label").is_none());
    }

    #[test]
    fn test_save_to_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let store = HistoryStore::new(dir.path().join("missing").join("password_history.json"));
        match store.append("Ab1!", "2024-01-01 10:00:00") {
            Err(StoreError::Io(_)) => {}
            other => panic!("Expected Io error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_time_is_kept_but_not_filtered() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("password_history.json");
        fs::write(&path, r#"[{"password":"x","time":"not-a-date"}]"#).unwrap();
        let records = HistoryStore::new(&path).load();
        assert_eq!(records, vec![record("x", "not-a-date")]);

        for threshold in [date(1970, 1, 1), date(2024, 1, 1), date(2999, 12, 31)] {
            assert!(filter_from(&records, threshold).is_empty());
        }
    }

    #[test]
    fn test_filter_from_is_inclusive_and_ordered() {
        let records = sample_records();
        let filtered = filter_from(&records, date(2024, 1, 1));
        let passwords: Vec<&str> = filtered.iter().map(|r| r.password.as_str()).collect();
        assert_eq!(passwords, vec!["first", "second", "fourth"]);

        for r in &records {
            let kept = filtered.contains(r);
            match r.date() {
                Some(d) => assert_eq!(kept, d >= date(2024, 1, 1)),
                None => assert!(!kept),
            }
        }
    }

    #[test]
    fn test_filter_from_future_date_is_empty() {
        assert!(filter_from(&sample_records(), date(2030, 1, 1)).is_empty());
    }

    #[test]
    fn test_sorted_by_time_descending() {
        let records = sample_records();
        let sorted = sorted_by_time_descending(&records);
        let times: Vec<&str> = sorted.iter().map(|r| r.time.as_str()).collect();
        assert_eq!(
            times,
            vec![
                "yesterday",
                "2024-03-15 08:30:00",
                "2024-03-15 08:30:00",
                "2024-01-01 10:00:00",
                "2023-12-31 23:59:59",
            ]
        );
        // Equal times keep their relative order.
        assert_eq!(sorted[1].password, "second");
        assert_eq!(sorted[2].password, "fourth");
    }

    #[test]
    fn test_sorted_is_idempotent_permutation() {
        let records = sample_records();
        let once = sorted_by_time_descending(&records);
        let twice = sorted_by_time_descending(&once);
        assert_eq!(once, twice);

        let mut a = records.clone();
        let mut b = once.clone();
        a.sort_by(|x, y| (&x.time, &x.password).cmp(&(&y.time, &y.password)));
        b.sort_by(|x, y| (&x.time, &x.password).cmp(&(&y.time, &y.password)));
        assert_eq!(a, b);
    }
}
