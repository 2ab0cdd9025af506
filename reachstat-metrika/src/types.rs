use chrono::NaiveDate;
use reachstat_common::{ReachError, Result};
use serde::{Deserialize, Serialize};

// ==============================
// Wire format (stat/v1/data)
// ==============================

#[derive(Debug, Clone, Deserialize)]
pub struct ReportResponse {
    #[serde(default)]
    pub data: Vec<ResponseRow>,
    #[serde(default)]
    pub total_rows: Option<u64>,
    /// Present on some 200 responses when the query was only partly understood.
    #[serde(default)]
    pub errors: Vec<ApiErrorItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseRow {
    pub dimensions: Vec<Dimension>,
    /// Floats on the wire even for counts, in the order the metrics were requested.
    pub metrics: Vec<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Dimension {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorItem {
    #[serde(default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

// ==============================
// Domain
// ==============================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub date: NaiveDate,
    pub visits: u64,
    pub pageviews: u64,
    pub users: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportTotals {
    pub visits: u64,
    pub pageviews: u64,
    pub users: u64,
}

impl ReportTotals {
    pub fn add(&mut self, row: &ReportRow) {
        self.visits += row.visits;
        self.pageviews += row.pageviews;
        self.users += row.users;
    }
}

/// Daily rows in the order the API returned them (sorted by date).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn totals(&self) -> ReportTotals {
        self.rows.iter().fold(ReportTotals::default(), |mut acc, row| {
            acc.add(row);
            acc
        })
    }
}

impl TryFrom<ReportResponse> for Report {
    type Error = ReachError;

    fn try_from(resp: ReportResponse) -> Result<Self> {
        let rows = resp
            .data
            .into_iter()
            .map(ReportRow::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(Report { rows })
    }
}

impl TryFrom<ResponseRow> for ReportRow {
    type Error = ReachError;

    fn try_from(row: ResponseRow) -> Result<Self> {
        let name = row
            .dimensions
            .first()
            .map(|d| d.name.as_str())
            .ok_or_else(|| ReachError::Decode("row without a date dimension".into()))?;
        let date = NaiveDate::parse_from_str(name, "%Y-%m-%d")
            .map_err(|_| ReachError::Decode(format!("row dimension '{name}' is not a date")))?;

        let [visits, pageviews, users] = match row.metrics.as_slice() {
            [a, b, c, ..] => [*a, *b, *c].map(as_count),
            other => {
                return Err(ReachError::Decode(format!(
                    "row {date} has {} metrics, expected 3",
                    other.len()
                )));
            }
        };
        Ok(ReportRow {
            date,
            visits,
            pageviews,
            users,
        })
    }
}

fn as_count(v: f64) -> u64 {
    if v.is_finite() && v > 0.0 {
        v.round() as u64
    } else {
        0
    }
}
