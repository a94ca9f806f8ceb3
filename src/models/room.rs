use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Available,
    Booked,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "available",
            RoomStatus::Booked => "booked",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "booked" => RoomStatus::Booked,
            _ => RoomStatus::Available,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub id: String,
    pub description: String,
    pub wifi: String,
    pub sound_system: String,
    pub projector: String,
    pub screen_projector: String,
    pub chairs: String,
    pub tables: String,
    pub sound_proof: String,
    pub smoking_area: String,
    pub television: String,
    pub ac: String,
    pub bathroom: String,
    pub coffee_maker: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: String,
    pub room_type: String,
    pub max_capacity: i64,
    pub facility: Facility,
    pub status: RoomStatus,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewFacility {
    pub description: String,
    pub wifi: String,
    pub sound_system: String,
    pub projector: String,
    pub screen_projector: String,
    pub chairs: String,
    pub tables: String,
    pub sound_proof: String,
    pub smoking_area: String,
    pub television: String,
    pub ac: String,
    pub bathroom: String,
    pub coffee_maker: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewRoom {
    pub room_type: String,
    pub max_capacity: i64,
    pub facility: NewFacility,
    pub status: Option<RoomStatus>,
}

/// Sparse update: `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FacilityPatch {
    pub description: Option<String>,
    pub wifi: Option<String>,
    pub sound_system: Option<String>,
    pub projector: Option<String>,
    pub screen_projector: Option<String>,
    pub chairs: Option<String>,
    pub tables: Option<String>,
    pub sound_proof: Option<String>,
    pub smoking_area: Option<String>,
    pub television: Option<String>,
    pub ac: Option<String>,
    pub bathroom: Option<String>,
    pub coffee_maker: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoomPatch {
    pub room_type: Option<String>,
    pub max_capacity: Option<i64>,
    pub status: Option<RoomStatus>,
    pub facility: Option<FacilityPatch>,
}

impl RoomPatch {
    /// Merges the patch onto `room`. Blank strings and a zero capacity count
    /// as absent, matching what older clients send for "unchanged".
    pub fn apply(&self, room: &mut Room) {
        merge_text(&mut room.room_type, &self.room_type);
        if let Some(capacity) = self.max_capacity.filter(|c| *c != 0) {
            room.max_capacity = capacity;
        }
        if let Some(status) = self.status {
            room.status = status;
        }
        if let Some(facility) = &self.facility {
            facility.apply(&mut room.facility);
        }
    }
}

impl FacilityPatch {
    pub fn apply(&self, facility: &mut Facility) {
        merge_text(&mut facility.description, &self.description);
        merge_text(&mut facility.wifi, &self.wifi);
        merge_text(&mut facility.sound_system, &self.sound_system);
        merge_text(&mut facility.projector, &self.projector);
        merge_text(&mut facility.screen_projector, &self.screen_projector);
        merge_text(&mut facility.chairs, &self.chairs);
        merge_text(&mut facility.tables, &self.tables);
        merge_text(&mut facility.sound_proof, &self.sound_proof);
        merge_text(&mut facility.smoking_area, &self.smoking_area);
        merge_text(&mut facility.television, &self.television);
        merge_text(&mut facility.ac, &self.ac);
        merge_text(&mut facility.bathroom, &self.bathroom);
        merge_text(&mut facility.coffee_maker, &self.coffee_maker);
    }
}

fn merge_text(target: &mut String, value: &Option<String>) {
    if let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty()) {
        *target = v.to_string();
    }
}
