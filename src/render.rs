//! Turns reports into Discord embeds.

use std::fmt::Write;

use serenity::all::Timestamp;
use serenity::builder::{CreateEmbed, CreateEmbedFooter};

use crate::attendance::event::EVENT_DATE_FORMAT;
use crate::attendance::points::format_points;
use crate::attendance::report::{LastAttendance, Report, ReportRow};
use crate::attendance::sort::sort_rows;
use crate::attendance::{event_label, AttendanceStatus, SortOrder};
use crate::preferences::{Preferences, ReportType};
use crate::theme::Theme;

/// Discord allows 4096 characters in an embed description.
const DESCRIPTION_LIMIT: usize = 3900;
const CHART_WIDTH: usize = 20;
const CHART_NAME_WIDTH: usize = 14;
const CODE_FENCE: &str = "```";

fn last_attendance_label(last: &LastAttendance, theme: &Theme) -> String {
    match last {
        LastAttendance::Previous { status, points, event_date, .. } => {
            let when = event_date
                .map(|d| format!(" on {}", d.format("%m-%d")))
                .unwrap_or_default();
            match status {
                AttendanceStatus::Present => format!("{} {}{}", theme.icon(*status), format_points(*points), when),
                _ => format!("{}{}", theme.icon(*status), when),
            }
        }
        LastAttendance::NewPlayer => "New Player".to_string(),
        LastAttendance::FirstEvent => "First Event".to_string(),
    }
}

fn row_line(row: &ReportRow, theme: &Theme) -> String {
    let mut line = format!("{} **{}**", theme.icon(row.status), row.player_name);
    if row.status == AttendanceStatus::Present {
        let _ = write!(line, " | {} pts", format_points(row.points));
    }
    if let Some(last) = &row.last_attendance {
        let _ = write!(line, " | last: {}", last_attendance_label(last, theme));
    }
    line
}

/// Joins lines until `limit`, then notes how many were cut.
fn fit_lines(lines: impl ExactSizeIterator<Item = String>, limit: usize) -> String {
    let total = lines.len();
    let mut out = String::new();
    for (shown, line) in lines.enumerate() {
        if out.len() + line.len() + 1 > limit {
            let _ = write!(out, "…and {} more", total - shown);
            break;
        }
        out.push_str(&line);
        out.push('\n');
    }
    out
}

/// One line per player.
pub fn render_text(report: &Report, theme: &Theme, order: SortOrder) -> String {
    let mut rows = report.rows.clone();
    sort_rows(&mut rows, order);

    let lines: Vec<String> = rows.iter().map(|row| row_line(row, theme)).collect();
    fit_lines(lines.into_iter(), DESCRIPTION_LIMIT)
}

/// Horizontal bar chart of present players' points.
pub fn render_chart(report: &Report, theme: &Theme) -> String {
    let mut rows: Vec<ReportRow> = report
        .rows
        .iter()
        .filter(|r| r.status == AttendanceStatus::Present)
        .cloned()
        .collect();
    sort_rows(&mut rows, SortOrder::PointsDesc);

    let max = i128::from(rows.iter().map(|r| r.points).max().unwrap_or(0).max(1));

    let lines: Vec<String> = rows
        .iter()
        .map(|row| {
            let width = (i128::from(row.points) * CHART_WIDTH as i128 / max).clamp(0, CHART_WIDTH as i128) as usize;
            let name: String = row.player_name.chars().take(CHART_NAME_WIDTH).collect();
            format!(
                "{:<name_w$} {:<bar_w$} {}",
                name,
                "█".repeat(width),
                format_points(row.points),
                name_w = CHART_NAME_WIDTH,
                bar_w = CHART_WIDTH,
            )
        })
        .collect();

    if lines.is_empty() {
        return format!("{} Nobody was marked present.", theme.icon(AttendanceStatus::NotRecorded));
    }

    // Both fences and their newlines stay outside the budget.
    let body = fit_lines(lines.into_iter(), DESCRIPTION_LIMIT - 2 * (CODE_FENCE.len() + 1));
    format!("{CODE_FENCE}\n{}\n{CODE_FENCE}", body.trim_end())
}

fn summary_field(report: &Report) -> String {
    let c = &report.counts;
    format!(
        "Present: **{}** | Absent: **{}** | Not recorded: **{}** | Total: **{}**",
        c.present, c.absent, c.not_recorded, c.total_members
    )
}

/// The full report embed in the user's preferred style.
pub fn report_embed(report: &Report, theme: &Theme, prefs: &Preferences) -> CreateEmbed {
    let body = match prefs.report_type {
        ReportType::Text => render_text(report, theme, prefs.sort_order),
        ReportType::Chart => render_chart(report, theme),
    };

    let mut title = format!("{} | {}", report.alliance_name, report.session_name);
    if report.in_progress {
        title.push_str(" (not saved)");
    }

    let event = match report.event_date {
        Some(date) => format!("{} | {}", event_label(report.event_type, report.legion), date.format(EVENT_DATE_FORMAT)),
        None => event_label(report.event_type, report.legion),
    };

    let footer = match &report.session_id {
        Some(sid) => format!("Session {} | sorted by {}", sid, prefs.sort_order.label()),
        None => format!("Sorted by {}", prefs.sort_order.label()),
    };

    CreateEmbed::new()
        .title(title)
        .description(body)
        .field("Event", event, false)
        .field("Summary", summary_field(report), false)
        .color(theme.accent_color)
        .footer(CreateEmbedFooter::new(footer))
        .timestamp(Timestamp::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attendance::report::Counts;
    use crate::attendance::EventType;

    fn report(rows: Vec<ReportRow>) -> Report {
        Report {
            session_id: Some("abc".to_string()),
            session_name: "Joe".to_string(),
            alliance_name: "DNG".to_string(),
            event_type: EventType::CrazyJoe,
            legion: None,
            event_date: None,
            counts: Counts::default(),
            rows,
            in_progress: false,
        }
    }

    fn row(id: i64, name: &str, status: AttendanceStatus, points: i64) -> ReportRow {
        ReportRow {
            player_id: id,
            player_name: name.to_string(),
            status,
            points,
            last_attendance: None,
        }
    }

    #[test]
    fn text_lines_follow_sort_order() {
        let report = report(vec![
            row(1, "Low", AttendanceStatus::Present, 100),
            row(2, "High", AttendanceStatus::Present, 4300),
            row(3, "Gone", AttendanceStatus::Absent, 0),
        ]);
        let text = render_text(&report, &Theme::default(), SortOrder::PointsDesc);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "✅ **High** | 4.3K pts");
        assert_eq!(lines[1], "✅ **Low** | 100 pts");
        assert_eq!(lines[2], "❌ **Gone**");
    }

    #[test]
    fn last_attendance_labels() {
        let theme = Theme::default();
        let mut r = row(1, "A", AttendanceStatus::Present, 10);
        r.last_attendance = Some(LastAttendance::FirstEvent);
        assert!(row_line(&r, &theme).ends_with("last: First Event"));
        r.last_attendance = Some(LastAttendance::NewPlayer);
        assert!(row_line(&r, &theme).ends_with("last: New Player"));
    }

    #[test]
    fn long_reports_are_truncated() {
        let rows = (0..500)
            .map(|i| row(i, &format!("Player number {i}"), AttendanceStatus::Present, i))
            .collect();
        let text = render_text(&report(rows), &Theme::default(), SortOrder::NameAscAll);
        assert!(text.len() <= DESCRIPTION_LIMIT + 32);
        assert!(text.contains("more"));
    }

    #[test]
    fn chart_only_shows_present_players() {
        let report = report(vec![
            row(1, "A", AttendanceStatus::Present, 200),
            row(2, "B", AttendanceStatus::Absent, 0),
        ]);
        let chart = render_chart(&report, &Theme::default());
        assert!(chart.contains(&"█".repeat(CHART_WIDTH)));
        assert!(!chart.contains("B "));

        let empty = render_chart(&report_with_absent_only(), &Theme::default());
        assert!(empty.contains("Nobody was marked present"));
    }

    #[test]
    fn truncated_chart_keeps_its_code_block() {
        let rows = (0..500)
            .map(|i| row(i, &format!("Player number {i}"), AttendanceStatus::Present, 1000 + i))
            .collect();
        let chart = render_chart(&report(rows), &Theme::default());
        assert!(chart.starts_with("```\n"));
        assert!(chart.ends_with("more\n```"));
        assert!(chart.chars().count() <= 4096);
    }

    #[test]
    fn chart_handles_huge_points() {
        let report = report(vec![
            row(1, "Big", AttendanceStatus::Present, i64::MAX),
            row(2, "Small", AttendanceStatus::Present, 1),
        ]);
        let chart = render_chart(&report, &Theme::default());
        assert!(chart.contains(&"█".repeat(CHART_WIDTH)));
        assert!(chart.ends_with("```"));
    }

    fn report_with_absent_only() -> Report {
        report(vec![row(1, "A", AttendanceStatus::Absent, 0)])
    }
}
