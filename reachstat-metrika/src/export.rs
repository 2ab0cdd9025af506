//! CSV export of a report.
use crate::render::COLUMNS;
use crate::types::{Report, ReportRow};
use chrono::{Local, NaiveDate};
use reachstat_common::{ReachError, Result};
use std::path::{Path, PathBuf};

pub const NO_DATA_TO_SAVE: &str = "Нет данных для сохранения";

/// `metrika_report_<YYYYmmdd_HHMMSS>.csv` for the current local time.
pub fn default_filename() -> PathBuf {
    PathBuf::from(format!(
        "metrika_report_{}.csv",
        Local::now().format("%Y%m%d_%H%M%S")
    ))
}

/// Write `report` as UTF-8 CSV and return the path written.
///
/// An empty report writes nothing and returns `Ok(None)`.
pub fn save_to_csv(report: &Report, filename: Option<&Path>) -> Result<Option<PathBuf>> {
    if report.is_empty() {
        println!("{NO_DATA_TO_SAVE}");
        return Ok(None);
    }
    let path = filename.map(Path::to_path_buf).unwrap_or_else(default_filename);
    write_csv(report, &path)?;
    tracing::info!(path = %path.display(), rows = report.rows.len(), "metrika.csv.saved");
    println!("\n{}", saved_notice(&path));
    Ok(Some(path))
}

fn write_csv(report: &Report, path: &Path) -> Result<()> {
    let export = |e: csv::Error| ReachError::Export(format!("{}: {e}", path.display()));
    let mut writer = csv::Writer::from_path(path).map_err(export)?;
    writer.write_record(COLUMNS).map_err(export)?;
    for row in &report.rows {
        writer
            .write_record([
                row.date.to_string(),
                row.visits.to_string(),
                row.pageviews.to_string(),
                row.users.to_string(),
            ])
            .map_err(export)?;
    }
    writer
        .flush()
        .map_err(|e| ReachError::Export(format!("{}: {e}", path.display())))
}

/// Line printed after a successful export.
pub fn saved_notice(path: &Path) -> String {
    format!("Данные сохранены в файл: {}", path.display())
}

/// Read back a file produced by [`save_to_csv`].
pub fn read_csv(path: &Path) -> Result<Report> {
    let decode = |e: csv::Error| ReachError::Decode(format!("{}: {e}", path.display()));
    let mut reader = csv::Reader::from_path(path).map_err(decode)?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(decode)?;
        let field = |i: usize| record.get(i).unwrap_or("").trim();
        let count = |i: usize| {
            field(i).parse::<u64>().map_err(|_| {
                ReachError::Decode(format!("bad count '{}' in {}", field(i), path.display()))
            })
        };
        let date = NaiveDate::parse_from_str(field(0), "%Y-%m-%d")
            .map_err(|_| ReachError::Decode(format!("bad date '{}'", field(0))))?;
        rows.push(ReportRow {
            date,
            visits: count(1)?,
            pageviews: count(2)?,
            users: count(3)?,
        });
    }
    Ok(Report { rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Report {
        Report {
            rows: vec![ReportRow {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                visits: 10,
                pageviews: 20,
                users: 5,
            }],
        }
    }

    #[test]
    fn written_file_reads_back_identically() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.csv");
        let written = save_to_csv(&sample(), Some(path.as_path())).unwrap();
        assert_eq!(written.as_deref(), Some(path.as_path()));
        assert_eq!(read_csv(&path).unwrap(), sample());
    }

    #[test]
    fn header_is_russian_utf8() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.csv");
        save_to_csv(&sample(), Some(path.as_path())).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Дата,Визиты,Просмотры,Посетители"));
        assert_eq!(lines.next(), Some("2024-01-01,10,20,5"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn empty_report_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("report.csv");
        assert_eq!(save_to_csv(&Report::default(), Some(path.as_path())).unwrap(), None);
        assert!(!path.exists());
    }

    #[test]
    fn unwritable_path_is_export_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("missing-dir").join("report.csv");
        let err = save_to_csv(&sample(), Some(path.as_path())).unwrap_err();
        assert!(matches!(err, ReachError::Export(_)));
    }

    #[test]
    fn notices_are_russian_like_the_labels() {
        assert_eq!(
            saved_notice(Path::new("out.csv")),
            "Данные сохранены в файл: out.csv"
        );
        assert_eq!(NO_DATA_TO_SAVE, "Нет данных для сохранения");
    }

    #[test]
    fn default_name_has_timestamp_shape() {
        let name = default_filename();
        let name = name.to_str().unwrap();
        assert!(name.starts_with("metrika_report_"));
        assert!(name.ends_with(".csv"));
        assert_eq!(name.len(), "metrika_report_20240101_120000.csv".len());
    }
}
