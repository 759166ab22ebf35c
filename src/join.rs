//! Attach session metadata to timing records.
//!
//! Rows that cannot be placed in the catalog (missing or unknown session,
//! blank title or performer, unreadable offset) are dropped with a `RowWarning`.

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::models::{JoinedEntry, RowWarning, Session, TimingRecord};

/// Surviving entries plus one warning per dropped row.
#[derive(Debug, Default)]
pub struct JoinOutcome {
    pub entries: Vec<JoinedEntry>,
    pub warnings: Vec<RowWarning>,
}

/// Parse `[[H:]M:]S` into whole seconds.
/// Only the leading field may exceed 59 ("75:30" is fine, "1:75:30" is not).
pub fn parse_offset(offset: &str) -> Option<u32> {
    let parts: Vec<&str> = offset.trim().split(':').collect();
    if parts.is_empty() || parts.len() > 3 {
        return None;
    }

    let mut total: u32 = 0;
    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let value: u32 = part.parse().ok()?;
        if i > 0 && value >= 60 {
            return None;
        }
        total = total.checked_mul(60)?.checked_add(value)?;
    }
    Some(total)
}

fn check_record(
    timing: &TimingRecord,
    sessions: &FxHashMap<i64, &Session>,
) -> Result<JoinedEntry, RowWarning> {
    let session_id = timing.session_id.ok_or(RowWarning::MissingSession {
        timing_id: timing.id,
    })?;
    let session = sessions
        .get(&session_id)
        .ok_or(RowWarning::UnknownSession {
            timing_id: timing.id,
            session_id,
        })?;
    if timing.title.trim().is_empty() {
        return Err(RowWarning::EmptyTitle {
            timing_id: timing.id,
        });
    }
    if timing.performer.trim().is_empty() {
        return Err(RowWarning::EmptyPerformer {
            timing_id: timing.id,
        });
    }
    let offset_sec = parse_offset(&timing.offset).ok_or_else(|| RowWarning::InvalidOffset {
        timing_id: timing.id,
        offset: timing.offset.clone(),
    })?;

    Ok(JoinedEntry {
        session: (*session).clone(),
        timing: timing.clone(),
        offset_sec,
    })
}

/// Join every timing record to its session.
/// If the session log repeats an ID, the first row for that ID is used.
pub fn join(sessions: &[Session], timings: &[TimingRecord]) -> JoinOutcome {
    let mut by_id: FxHashMap<i64, &Session> = FxHashMap::default();
    for session in sessions {
        by_id.entry(session.id).or_insert(session);
    }

    let mut outcome = JoinOutcome {
        entries: Vec::with_capacity(timings.len()),
        warnings: Vec::new(),
    };
    for timing in timings {
        match check_record(timing, &by_id) {
            Ok(entry) => outcome.entries.push(entry),
            Err(warning) => {
                warn!("dropping row: {}", warning);
                outcome.warnings.push(warning);
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn session(id: i64) -> Session {
        Session {
            id,
            date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            title: format!("live {}", id),
            url: format!("https://youtu.be/{}", id),
        }
    }

    fn timing(id: i64, session_id: i64, offset: &str, title: &str, performer: &str) -> TimingRecord {
        TimingRecord {
            id,
            session_id: Some(session_id),
            offset: offset.to_string(),
            title: title.to_string(),
            performer: performer.to_string(),
        }
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(parse_offset("1:02:03"), Some(3723));
        assert_eq!(parse_offset("02:03"), Some(123));
        assert_eq!(parse_offset("75:30"), Some(4530));
        assert_eq!(parse_offset("45"), Some(45));
        assert_eq!(parse_offset(" 0:00 "), Some(0));
        assert_eq!(parse_offset("1:75:30"), None);
        assert_eq!(parse_offset("1:2:3:4"), None);
        assert_eq!(parse_offset("1::3"), None);
        assert_eq!(parse_offset("a:10"), None);
        assert_eq!(parse_offset("-1:10"), None);
        assert_eq!(parse_offset(""), None);
    }

    #[test]
    fn test_join_attaches_session() {
        let sessions = vec![session(1), session(2)];
        let timings = vec![timing(10, 2, "1:00", "Song", "A")];
        let outcome = join(&sessions, &timings);
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.entries.len(), 1);
        let entry = &outcome.entries[0];
        assert_eq!(Some(entry.session.id), entry.timing.session_id);
        assert_eq!(entry.offset_sec, 60);
        assert_eq!(entry.timestamp_url(), "https://youtu.be/2?t=60s");
    }

    #[test]
    fn test_join_drops_defective_rows() {
        let sessions = vec![session(1)];
        let timings = vec![
            timing(1, 99, "0:10", "Song", "A"),
            timing(2, 1, "0:10", "  ", "A"),
            timing(3, 1, "0:10", "Song", ""),
            timing(4, 1, "later", "Song", "A"),
            timing(5, 1, "0:10", "Song", "A"),
        ];
        let outcome = join(&sessions, &timings);
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.entries[0].timing.id, 5);
        assert_eq!(
            outcome.warnings,
            vec![
                RowWarning::UnknownSession {
                    timing_id: 1,
                    session_id: 99
                },
                RowWarning::EmptyTitle { timing_id: 2 },
                RowWarning::EmptyPerformer { timing_id: 3 },
                RowWarning::InvalidOffset {
                    timing_id: 4,
                    offset: "later".to_string()
                },
            ]
        );
    }

    #[test]
    fn test_join_drops_blank_session_reference() {
        let mut orphan = timing(2, 1, "0:10", "Other", "B");
        orphan.session_id = None;
        let outcome = join(&[session(1)], &[timing(1, 1, "0:05", "Song", "A"), orphan]);
        assert_eq!(outcome.entries.len(), 1);
        assert_eq!(outcome.warnings, vec![RowWarning::MissingSession { timing_id: 2 }]);
    }

    #[test]
    fn test_join_duplicate_session_id_uses_first() {
        let mut second = session(1);
        second.url = "https://youtu.be/other".to_string();
        let sessions = vec![session(1), second];
        let outcome = join(&sessions, &[timing(1, 1, "5", "Song", "A")]);
        assert_eq!(outcome.entries[0].session.url, "https://youtu.be/1");
    }
}
