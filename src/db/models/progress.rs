use serde::{Deserialize, Serialize};
use sqlx::types::Uuid;
use time::OffsetDateTime;
use validator::Validate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type, Serialize, Deserialize)]
#[sqlx(type_name = "progress_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    InProgress,
    Completed,
}

/// One lesson's (or module's) completion state within an enrollment.
#[derive(Debug, Clone, sqlx::FromRow, Serialize, Deserialize)]
pub struct ProgressRecord {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub lesson_id: Option<Uuid>,
    pub module_id: Option<Uuid>,
    pub status: ProgressStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub time_spent_seconds: i32,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Progress record joined with curriculum titles for listings.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct ProgressWithContent {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub lesson_id: Option<Uuid>,
    pub module_id: Option<Uuid>,
    pub status: ProgressStatus,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    pub time_spent_seconds: i32,
    pub lesson_title: Option<String>,
    pub module_title: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecordProgress {
    pub enrollment_id: Uuid,
    pub lesson_id: Option<Uuid>,
    pub module_id: Option<Uuid>,
    pub status: ProgressStatus,
    #[validate(range(min = 0))]
    pub time_spent_seconds: Option<i32>,
}

impl RecordProgress {
    /// A record must point at a lesson or a module.
    pub fn target(&self) -> Option<ProgressTarget> {
        match (self.lesson_id, self.module_id) {
            (Some(lesson_id), _) => Some(ProgressTarget::Lesson(lesson_id)),
            (None, Some(module_id)) => Some(ProgressTarget::Module(module_id)),
            (None, None) => None,
        }
    }
}

/// Natural key of a progress row within its enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressTarget {
    Lesson(Uuid),
    Module(Uuid),
}

/// Percentage of completed records over all records currently present for
/// the enrollment, rounded half-up. An enrollment with no records is 0%.
pub fn progress_percent(completed_count: i64, total_count: i64) -> i32 {
    if total_count <= 0 {
        return 0;
    }
    ((100.0 * completed_count as f64) / total_count as f64).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_rounded_half_up() {
        assert_eq!(progress_percent(1, 3), 33);
        assert_eq!(progress_percent(2, 3), 67);
        assert_eq!(progress_percent(1, 8), 13); // 12.5 rounds up
        assert_eq!(progress_percent(5, 10), 50);
        assert_eq!(progress_percent(10, 10), 100);
    }

    #[test]
    fn percent_of_empty_enrollment_is_zero() {
        assert_eq!(progress_percent(0, 0), 0);
    }

    #[test]
    fn percent_stays_within_bounds() {
        for total in 1..=20i64 {
            for completed in 0..=total {
                let pct = progress_percent(completed, total);
                assert!((0..=100).contains(&pct), "{}/{} -> {}", completed, total, pct);
            }
        }
    }

    #[test]
    fn started_records_are_the_denominator() {
        // Two records exist, both completed: reads as 100% even if the
        // course has more lessons that were never started.
        assert_eq!(progress_percent(2, 2), 100);
    }

    #[test]
    fn target_prefers_lesson_over_module() {
        let lesson = Uuid::new_v4();
        let module = Uuid::new_v4();
        let req = RecordProgress {
            enrollment_id: Uuid::new_v4(),
            lesson_id: Some(lesson),
            module_id: Some(module),
            status: ProgressStatus::Completed,
            time_spent_seconds: None,
        };
        assert_eq!(req.target(), Some(ProgressTarget::Lesson(lesson)));

        let neither = RecordProgress {
            enrollment_id: Uuid::new_v4(),
            lesson_id: None,
            module_id: None,
            status: ProgressStatus::InProgress,
            time_spent_seconds: None,
        };
        assert!(neither.target().is_none());
    }
}
