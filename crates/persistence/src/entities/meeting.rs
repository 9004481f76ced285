//! Meeting entities (database row mappings).

use chrono::{DateTime, Utc};
use domain::models::{Meeting, MeetingDetails, MeetingType, UserRef};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "meeting_type", rename_all = "PascalCase")]
pub enum MeetingTypeDb {
    Online,
    Offline,
}

impl From<MeetingTypeDb> for MeetingType {
    fn from(db: MeetingTypeDb) -> Self {
        match db {
            MeetingTypeDb::Online => MeetingType::Online,
            MeetingTypeDb::Offline => MeetingType::Offline,
        }
    }
}

impl From<MeetingType> for MeetingTypeDb {
    fn from(t: MeetingType) -> Self {
        match t {
            MeetingType::Online => MeetingTypeDb::Online,
            MeetingType::Offline => MeetingTypeDb::Offline,
        }
    }
}

/// Meeting row joined with the organizer's name.
#[derive(Debug, Clone, FromRow)]
pub struct MeetingEntity {
    pub id: Uuid,
    pub title: String,
    pub meeting_type: MeetingTypeDb,
    pub topic: String,
    pub location: String,
    pub agenda: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub organized_by: Uuid,
    pub organizer_name: String,
    pub organizer_email: String,
    pub created_at: DateTime<Utc>,
}

impl MeetingEntity {
    pub fn into_meeting(self, participants: Vec<UserRef>) -> Meeting {
        Meeting {
            id: self.id,
            title: self.title,
            meeting_type: self.meeting_type.into(),
            details: MeetingDetails {
                topic: self.topic,
                location: self.location,
                agenda: self.agenda,
            },
            start_time: self.start_time,
            end_time: self.end_time,
            participants,
            organized_by: UserRef {
                email: Some(self.organizer_email),
                ..UserRef::named(self.organized_by, self.organizer_name)
            },
            created_at: self.created_at,
        }
    }
}
