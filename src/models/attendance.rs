use chrono::NaiveDate;
use rusqlite::Row;
use serde::{Deserialize, Serialize};

use super::FromSqliteRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttendanceStatus {
    Present,
    #[default]
    Absent,
}

impl AttendanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "present" => AttendanceStatus::Present,
            _ => AttendanceStatus::Absent,
        }
    }

    pub fn toggled(&self) -> Self {
        match self {
            AttendanceStatus::Present => AttendanceStatus::Absent,
            AttendanceStatus::Absent => AttendanceStatus::Present,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: String,
    pub member_id: String,
    pub name: String,
    pub email: String,
    pub date: NaiveDate,
    pub status: AttendanceStatus,
    /// Local `HH:MM`, only set while the member is present.
    pub check_in_time: Option<String>,
}

impl AttendanceRecord {
    pub fn is_present(&self) -> bool {
        self.status == AttendanceStatus::Present
    }
}

impl FromSqliteRow for AttendanceRecord {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let status: String = row.get("status")?;
        Ok(Self {
            id: row.get("id")?,
            member_id: row.get("member_id")?,
            name: row.get("name")?,
            email: row.get("email")?,
            date: row.get("date")?,
            status: AttendanceStatus::parse(&status),
            check_in_time: row.get("check_in_time")?,
        })
    }
}
