//! Dashboard view of the ledger.
//!
//! The dashboard lists stored evidence newest first, with a count. Photos are
//! summarised by a short fingerprint instead of being printed.

use std::fmt::{Display, Write as _};

use chrono::{Local, TimeZone};
use serde::Serialize;

use crate::evidence::{EvidenceRecord, Location};
use crate::photo;

/// Text shown when the ledger holds no records.
pub const EMPTY_STATE: &str = "No evidence recorded";

/// One row of the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardEntry {
    /// Record id.
    pub id: i64,
    /// Inspected node.
    pub node_id: String,
    /// Evidence type.
    pub kind: String,
    /// Capture date, `YYYY-MM-DD`.
    pub date: String,
    /// Capture time, `HH:MM`.
    pub time: String,
    /// Capture position.
    pub location: Location,
    /// Photo fingerprint, if a photo is present.
    pub photo: Option<String>,
}

/// The rendered state of the dashboard screen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    /// Number of stored records.
    pub count: usize,
    /// Entries, newest first.
    pub entries: Vec<DashboardEntry>,
}

impl DashboardView {
    /// Build the view in the local time zone.
    #[must_use]
    pub fn build(records: &[EvidenceRecord]) -> Self {
        Self::build_in(records, &Local)
    }

    /// Build the view, formatting dates in `tz`.
    #[must_use]
    pub fn build_in<Tz>(records: &[EvidenceRecord], tz: &Tz) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        let entries = records
            .iter()
            .rev()
            .map(|record| {
                let local = record.timestamp.with_timezone(tz);
                DashboardEntry {
                    id: record.id,
                    node_id: record.node_id.clone(),
                    kind: record.kind.clone(),
                    date: local.format("%Y-%m-%d").to_string(),
                    time: local.format("%H:%M").to_string(),
                    location: record.location,
                    photo: (!record.photo.is_empty()).then(|| photo::fingerprint(&record.photo)),
                }
            })
            .collect();

        Self {
            count: records.len(),
            entries,
        }
    }

    /// Check whether there is nothing to list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render as a compact list, one record per two lines.
    #[must_use]
    pub fn render_plain(&self) -> String {
        let mut out = format!("Evidence: {}\n", self.count);
        if self.is_empty() {
            let _ = writeln!(out, "{EMPTY_STATE}");
            return out;
        }

        for entry in &self.entries {
            let _ = writeln!(out, "\n{}", entry.node_id);
            let _ = writeln!(
                out,
                "  {} \u{2022} {} {}  {}",
                entry.kind,
                entry.date,
                entry.time,
                entry.photo.as_deref().unwrap_or("no image")
            );
        }
        out
    }

    /// Render as an aligned table.
    #[must_use]
    pub fn render_table(&self) -> String {
        if self.is_empty() {
            return format!("{EMPTY_STATE}\n");
        }

        let node_width = self
            .entries
            .iter()
            .map(|e| e.node_id.chars().count())
            .max()
            .unwrap_or(0)
            .max("NODE".len());
        let kind_width = self
            .entries
            .iter()
            .map(|e| e.kind.chars().count())
            .max()
            .unwrap_or(0)
            .max("TYPE".len());

        let mut out = format!(
            "{:<13}  {:<node_width$}  {:<kind_width$}  {:<16}  {:<28}  PHOTO\n",
            "ID", "NODE", "TYPE", "CAPTURED", "LOCATION"
        );
        for entry in &self.entries {
            let _ = writeln!(
                out,
                "{:<13}  {:<node_width$}  {:<kind_width$}  {:<16}  {:<28}  {}",
                entry.id,
                entry.node_id,
                entry.kind,
                format!("{} {}", entry.date, entry.time),
                entry.location.to_string(),
                entry.photo.as_deref().unwrap_or("-")
            );
        }
        let _ = writeln!(out, "\n{} record(s)", self.count);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::EvidenceKind;
    use chrono::Utc;

    fn record(id: i64, node: &str) -> EvidenceRecord {
        let mut record = EvidenceRecord::created_at(
            Utc.with_ymd_and_hms(2024, 5, 2, 14, 7, 0).unwrap(),
            node,
            EvidenceKind::Maintenance,
            "data:image/png;base64,AAAA".to_string(),
            Location::at(-12.0464, -77.0428),
        );
        record.id = id;
        record
    }

    #[test]
    fn test_empty_dashboard() {
        let view = DashboardView::build(&[]);

        assert_eq!(view.count, 0);
        assert!(view.is_empty());
        assert!(view.render_plain().contains(EMPTY_STATE));
        assert!(view.render_table().contains(EMPTY_STATE));
    }

    #[test]
    fn test_entries_newest_first() {
        let records = vec![record(1, "A"), record(2, "B"), record(3, "C")];
        let view = DashboardView::build_in(&records, &Utc);

        assert_eq!(view.count, 3);
        let ids: Vec<i64> = view.entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }

    #[test]
    fn test_entry_formatting() {
        let view = DashboardView::build_in(&[record(1, "NODE-9")], &Utc);
        let entry = &view.entries[0];

        assert_eq!(entry.date, "2024-05-02");
        assert_eq!(entry.time, "14:07");
        assert_eq!(entry.kind, "maintenance");
        assert_eq!(
            entry.photo.as_deref(),
            Some(photo::fingerprint("data:image/png;base64,AAAA").as_str())
        );
    }

    #[test]
    fn test_missing_photo() {
        let mut r = record(1, "NODE-9");
        r.photo = String::new();
        let view = DashboardView::build_in(&[r], &Utc);

        assert!(view.entries[0].photo.is_none());
        assert!(view.render_plain().contains("no image"));
    }

    #[test]
    fn test_render_plain() {
        let view = DashboardView::build_in(&[record(1, "A"), record(2, "B")], &Utc);
        let text = view.render_plain();

        assert!(text.starts_with("Evidence: 2\n"));
        let b = text.find("\nB\n").unwrap();
        let a = text.find("\nA\n").unwrap();
        assert!(b < a);
        assert!(text.contains("maintenance \u{2022} 2024-05-02 14:07"));
    }

    #[test]
    fn test_render_table() {
        let view = DashboardView::build_in(&[record(1, "NODE-1")], &Utc);
        let table = view.render_table();

        assert!(table.starts_with("ID"));
        assert!(table.contains("NODE-1"));
        assert!(table.contains("Lat -12.0464, Lon -77.0428"));
        assert!(table.contains("1 record(s)"));
    }

    #[test]
    fn test_serializes_to_json() {
        let view = DashboardView::build_in(&[record(1, "NODE-1")], &Utc);
        let value = serde_json::to_value(&view).unwrap();

        assert_eq!(value["count"], 1);
        assert_eq!(value["entries"][0]["node_id"], "NODE-1");
    }
}
