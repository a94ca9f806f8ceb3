use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{Room, User};

/// Every booking detail reserves its room for this long, starting at creation.
pub const BOOKING_WINDOW_HOURS: i64 = 3;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DetailStatus {
    Pending,
    Accept,
    Decline,
}

impl DetailStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailStatus::Pending => "pending",
            DetailStatus::Accept => "accept",
            DetailStatus::Decline => "decline",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(DetailStatus::Pending),
            "accept" => Some(DetailStatus::Accept),
            "decline" => Some(DetailStatus::Decline),
            _ => None,
        }
    }
}

/// An approver's verdict on a pending booking detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Decline,
}

impl Decision {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "accept" => Some(Decision::Accept),
            "decline" => Some(Decision::Decline),
            _ => None,
        }
    }

    pub fn status(&self) -> DetailStatus {
        match self {
            Decision::Accept => DetailStatus::Accept,
            Decision::Decline => DetailStatus::Decline,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDetail {
    pub id: String,
    pub booking_id: String,
    pub room: Room,
    pub description: String,
    pub status: DetailStatus,
    pub booking_date: NaiveDateTime,
    pub booking_date_end: NaiveDateTime,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    #[serde(rename = "employee")]
    pub user: User,
    pub booking_details: Vec<BookingDetail>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LineItem {
    pub room_id: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BookingRequest {
    pub booking_details: Vec<LineItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub booking_detail_id: String,
    pub approval: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReportRecipient {
    pub to: String,
}
