//! Age and sex buckets for a set of likers.
//!
//! Both bucket sets are fixed-shape records, so every user lands in exactly one
//! age field and one sex field and a new bucket cannot be added without the
//! compiler pointing at every place that has to handle it.
use crate::vk::types::{Sex, UserInfo};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgeGroup {
    UpTo18,
    From19To35,
    From36To50,
    Over50,
    Unknown,
}

impl AgeGroup {
    pub fn label(self) -> &'static str {
        match self {
            AgeGroup::UpTo18 => "0-18",
            AgeGroup::From19To35 => "19-35",
            AgeGroup::From36To50 => "36-50",
            AgeGroup::Over50 => ">50",
            AgeGroup::Unknown => "unknown",
        }
    }
}

impl Sex {
    pub fn label(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
            Sex::Unknown => "unknown",
        }
    }
}

/// Bucket a VK `bdate` by age in `current_year`.
///
/// Only `D.M.YYYY` dates carry a year; anything else is unknown. Day and month
/// are ignored, so someone born late in the year is counted one year older.
pub fn analyze_age(bdate: Option<&str>, current_year: i32) -> AgeGroup {
    let Some(bdate) = bdate else {
        return AgeGroup::Unknown;
    };
    if bdate.matches('.').count() < 2 {
        return AgeGroup::Unknown;
    }
    let parts: Vec<&str> = bdate.split('.').collect();
    let [_, _, year] = parts.as_slice() else {
        return AgeGroup::Unknown;
    };
    let Some(age) = year
        .trim()
        .parse::<i64>()
        .ok()
        .and_then(|y| i64::from(current_year).checked_sub(y))
    else {
        return AgeGroup::Unknown;
    };
    match age {
        i64::MIN..=18 => AgeGroup::UpTo18,
        19..=35 => AgeGroup::From19To35,
        36..=50 => AgeGroup::From36To50,
        _ => AgeGroup::Over50,
    }
}

/// 2 → male, 1 → female, anything else → unknown.
pub fn analyze_sex(code: i64) -> Sex {
    Sex::from(code)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AgeBuckets {
    #[serde(rename = "0-18")]
    pub up_to_18: u64,
    #[serde(rename = "19-35")]
    pub from_19_to_35: u64,
    #[serde(rename = "36-50")]
    pub from_36_to_50: u64,
    #[serde(rename = ">50")]
    pub over_50: u64,
    pub unknown: u64,
}

impl AgeBuckets {
    pub fn add(&mut self, group: AgeGroup) {
        let slot = match group {
            AgeGroup::UpTo18 => &mut self.up_to_18,
            AgeGroup::From19To35 => &mut self.from_19_to_35,
            AgeGroup::From36To50 => &mut self.from_36_to_50,
            AgeGroup::Over50 => &mut self.over_50,
            AgeGroup::Unknown => &mut self.unknown,
        };
        *slot += 1;
    }

    pub fn rows(&self) -> [(&'static str, u64); 5] {
        [
            (AgeGroup::UpTo18.label(), self.up_to_18),
            (AgeGroup::From19To35.label(), self.from_19_to_35),
            (AgeGroup::From36To50.label(), self.from_36_to_50),
            (AgeGroup::Over50.label(), self.over_50),
            (AgeGroup::Unknown.label(), self.unknown),
        ]
    }

    pub fn total(&self) -> u64 {
        self.rows().iter().map(|(_, n)| n).sum()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SexBuckets {
    pub male: u64,
    pub female: u64,
    pub unknown: u64,
}

impl SexBuckets {
    pub fn add(&mut self, sex: Sex) {
        let slot = match sex {
            Sex::Male => &mut self.male,
            Sex::Female => &mut self.female,
            Sex::Unknown => &mut self.unknown,
        };
        *slot += 1;
    }

    pub fn rows(&self) -> [(&'static str, u64); 3] {
        [
            (Sex::Male.label(), self.male),
            (Sex::Female.label(), self.female),
            (Sex::Unknown.label(), self.unknown),
        ]
    }

    pub fn total(&self) -> u64 {
        self.male + self.female + self.unknown
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Statistics {
    pub post_id: i64,
    pub age: AgeBuckets,
    pub sex: SexBuckets,
}

/// Fold every user into one age bucket and one sex bucket.
pub fn build_statistics(post_id: i64, users: &[UserInfo], current_year: i32) -> Statistics {
    let mut stats = Statistics {
        post_id,
        age: AgeBuckets::default(),
        sex: SexBuckets::default(),
    };
    for user in users {
        stats.age.add(analyze_age(user.bdate.as_deref(), current_year));
        stats.sex.add(user.sex);
    }
    stats
}

/// Share of `count` in `total`, as a percentage. Zero when `total` is zero.
pub fn percentage(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

pub fn print_statistics(stats: &Statistics) -> io::Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    render_statistics(stats, &mut out)
}

pub fn render_statistics<W: Write>(stats: &Statistics, out: &mut W) -> io::Result<()> {
    writeln!(out, "Statistics for post ID: {}", stats.post_id)?;

    writeln!(out, "\nAge statistics:")?;
    render_group(out, &stats.age.rows(), stats.age.total())?;

    writeln!(out, "\nSex statistics:")?;
    render_group(out, &stats.sex.rows(), stats.sex.total())
}

fn render_group<W: Write>(out: &mut W, rows: &[(&str, u64)], total: u64) -> io::Result<()> {
    for (label, count) in rows {
        let pct = percentage(*count, total);
        writeln!(out, "{label:10} | {count:5} | {pct:6.2}%")?;
    }
    Ok(())
}
