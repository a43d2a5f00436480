//! crates/staff_dashboard_core/src/stats.rs
//!
//! Derives the display-ready statistics summary from raw `UserStats` and
//! `Activity` records: weekly buckets, averages, and relative-time strings.
//! Everything here is pure; the caller supplies "now" in whatever timezone
//! defines its calendar days, which keeps the bucketing testable.

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::Serialize;

use crate::domain::{Activity, CommandStats, SessionEntry, UserStats};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];

/// The statistics payload the dashboard renders. Numeric time values are
/// pre-formatted as hour strings with one decimal.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSummary {
    pub total_time_spent: String,
    pub research_submissions: i64,
    pub active_days: i64,
    pub average_session_time: String,
    pub last_active: String,
    pub weekly_activity: Vec<DayActivity>,
    pub recent_activities: Vec<ActivityView>,
    pub command_stats: CommandStats,
}

/// Hours logged on one of the trailing seven calendar days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayActivity {
    pub day: String,
    pub hours: f64,
}

/// A recent activity row, with its timestamp rendered relatively.
#[derive(Debug, Clone, Serialize)]
pub struct ActivityView {
    pub id: String,
    pub action: String,
    pub time: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// Renders a timestamp relative to `now`: "just now", "N minutes ago",
/// "1 hour ago", "N hours ago", "1 day ago", "N days ago".
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds();

    if seconds < 60 {
        return "just now".to_string();
    }
    if seconds < 3_600 {
        return format!("{} minutes ago", seconds / 60);
    }
    if seconds < 7_200 {
        return "1 hour ago".to_string();
    }
    if seconds < 86_400 {
        return format!("{} hours ago", seconds / 3_600);
    }
    if seconds < 172_800 {
        return "1 day ago".to_string();
    }
    format!("{} days ago", seconds / 86_400)
}

/// Mean session length in hours with one decimal. The literal "0" when no
/// sessions exist, so the division can never blow up.
pub fn average_session_time(total_minutes: i64, session_count: usize) -> String {
    if session_count == 0 {
        return "0".to_string();
    }
    format!(
        "{:.1}",
        total_minutes as f64 / session_count as f64 / 60.0
    )
}

/// Buckets session minutes into the trailing seven calendar days of `now`'s
/// timezone, oldest first. A session belongs to the day its timestamp falls
/// on, boundaries included, so 23:59:59.999 still counts for that day.
pub fn weekly_activity<Tz: TimeZone>(sessions: &[SessionEntry], now: DateTime<Tz>) -> Vec<DayActivity> {
    (0..7)
        .rev()
        .map(|offset| {
            let day = now.clone() - Duration::days(offset);
            let date = day.date_naive();
            let minutes: i64 = sessions
                .iter()
                .filter(|s| s.date.with_timezone(&day.timezone()).date_naive() == date)
                .map(|s| s.duration)
                .sum();
            DayActivity {
                day: WEEKDAYS[date.weekday().num_days_from_sunday() as usize].to_string(),
                hours: (minutes as f64 / 60.0 * 10.0).round() / 10.0,
            }
        })
        .collect()
}

/// Assembles the full display summary from one user's raw records.
pub fn summarize<Tz: TimeZone>(
    stats: &UserStats,
    recent: &[Activity],
    now: DateTime<Tz>,
) -> StatsSummary {
    let now_utc = now.clone().with_timezone(&Utc);

    StatsSummary {
        total_time_spent: format!("{:.1}", stats.total_time_spent as f64 / 60.0),
        research_submissions: stats.research_submissions,
        active_days: stats.active_days,
        average_session_time: average_session_time(stats.total_time_spent, stats.sessions.len()),
        last_active: time_ago(stats.last_active, now_utc),
        weekly_activity: weekly_activity(&stats.sessions, now),
        recent_activities: recent
            .iter()
            .map(|activity| ActivityView {
                id: activity.id.clone().unwrap_or_default(),
                action: activity.action.clone(),
                time: time_ago(activity.timestamp, now_utc),
                command: activity.command.clone(),
            })
            .collect(),
        command_stats: stats.command_stats.clone(),
    }
}
