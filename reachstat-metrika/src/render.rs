use crate::types::{Report, ReportRow};
use std::io::{self, Write};

/// Column labels shared by the console table and the CSV header.
pub const COLUMNS: [&str; 4] = ["Дата", "Визиты", "Просмотры", "Посетители"];
const TOTAL_LABEL: &str = "ИТОГО";
pub const NO_DATA_TO_DISPLAY: &str = "Нет данных для отображения";

/// Print the report to stdout.
pub fn print_table(report: &Report) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_table(report, &mut out)
}

/// One fixed-width line per day followed by a totals line.
pub fn render_table<W: Write>(report: &Report, out: &mut W) -> io::Result<()> {
    if report.is_empty() {
        writeln!(out, "{NO_DATA_TO_DISPLAY}")?;
        return Ok(());
    }

    let [date, visits, pageviews, users] = COLUMNS;
    writeln!(out, "{date:<12} {visits:<10} {pageviews:<12} {users:<12}")?;
    for ReportRow {
        date,
        visits,
        pageviews,
        users,
    } in &report.rows
    {
        let date = date.to_string();
        writeln!(out, "{date:<12} {visits:<10} {pageviews:<12} {users:<12}")?;
    }
    let totals = report.totals();
    writeln!(
        out,
        "{TOTAL_LABEL:<12} {:<10} {:<12} {:<12}",
        totals.visits, totals.pageviews, totals.users
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn row(d: u32, visits: u64, pageviews: u64, users: u64) -> ReportRow {
        ReportRow {
            date: NaiveDate::from_ymd_opt(2024, 1, d).unwrap(),
            visits,
            pageviews,
            users,
        }
    }

    fn render(report: &Report) -> String {
        let mut buf = Vec::new();
        render_table(report, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn empty_report_prints_placeholder() {
        assert_eq!(render(&Report::default()), "Нет данных для отображения\n");
    }

    #[test]
    fn rows_are_padded_and_totalled() {
        let report = Report {
            rows: vec![row(1, 10, 20, 5), row(2, 1, 2, 1)],
        };
        let text = render(&report);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("Дата         Визиты"));
        assert_eq!(lines[1], "2024-01-01   10         20           5           ");
        assert_eq!(lines[3], "ИТОГО        11         22           6           ");
    }
}
