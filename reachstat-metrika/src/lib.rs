//! Yandex.Metrika report fetching.
//!
//! One request per run: validate the counter credentials and the date range,
//! fetch daily visits/pageviews/users for the range, then render a table and
//! export a CSV. See [`client::MetrikaApi::get_report`] for the error mapping.
pub mod client;
pub mod dates;
pub mod export;
pub mod render;
pub mod types;

pub use client::{MetrikaApi, MetrikaCredentials, validate_config};
pub use dates::{DateRange, validate_dates, validate_dates_at};
pub use export::{read_csv, save_to_csv};
pub use render::{print_table, render_table};
pub use types::{Report, ReportRow, ReportTotals};
