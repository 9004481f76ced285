//! Repository for meetings and participants.

use chrono::{DateTime, Utc};
use domain::models::{Meeting, MeetingType, UserRef};
use sqlx::PgPool;
use std::collections::HashMap;
use uuid::Uuid;

use crate::entities::{MeetingEntity, MeetingTypeDb, UserContactRow};
use crate::metrics::QueryTimer;

const MEETING_SELECT: &str = r#"
    SELECT m.id, m.title, m.meeting_type, m.topic, m.location, m.agenda,
           m.start_time, m.end_time, m.organized_by,
           u.name AS organizer_name, u.email AS organizer_email, m.created_at
    FROM meetings m
    JOIN users u ON u.id = m.organized_by
"#;

#[derive(Debug, Clone)]
pub struct NewMeeting<'a> {
    pub title: &'a str,
    pub meeting_type: MeetingType,
    pub topic: &'a str,
    pub location: &'a str,
    pub agenda: Option<&'a str>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub organized_by: Uuid,
    pub participants: &'a [Uuid],
}

#[derive(Clone)]
pub struct MeetingRepository {
    pool: PgPool,
}

impl MeetingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Meetings the user organizes or attends, earliest first.
    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<Meeting>, sqlx::Error> {
        let timer = QueryTimer::new("list_meetings_for_user");
        let sql = format!(
            r#"{MEETING_SELECT}
            WHERE m.organized_by = $1
               OR EXISTS (
                   SELECT 1 FROM meeting_participants p
                   WHERE p.meeting_id = m.id AND p.user_id = $1
               )
            ORDER BY m.start_time ASC"#
        );
        let meetings = sqlx::query_as::<_, MeetingEntity>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<Uuid> = meetings.iter().map(|m| m.id).collect();
        let mut participants = self.participants_for(&ids).await?;
        timer.record();

        Ok(meetings
            .into_iter()
            .map(|m| {
                let people = participants.remove(&m.id).unwrap_or_default();
                m.into_meeting(people)
            })
            .collect())
    }

    pub async fn find(&self, id: Uuid) -> Result<Option<Meeting>, sqlx::Error> {
        let timer = QueryTimer::new("find_meeting");
        let sql = format!("{MEETING_SELECT} WHERE m.id = $1");
        let meeting = sqlx::query_as::<_, MeetingEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(meeting) = meeting else {
            timer.record();
            return Ok(None);
        };
        let people = self
            .participants_for(&[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        timer.record();
        Ok(Some(meeting.into_meeting(people)))
    }

    /// Inserts the meeting and its participants atomically. Returns the new id.
    pub async fn create(&self, new_meeting: &NewMeeting<'_>) -> Result<Uuid, sqlx::Error> {
        let timer = QueryTimer::new("create_meeting");
        let mut tx = self.pool.begin().await?;

        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO meetings (title, meeting_type, topic, location, agenda,
                                  start_time, end_time, organized_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(new_meeting.title)
        .bind(MeetingTypeDb::from(new_meeting.meeting_type))
        .bind(new_meeting.topic)
        .bind(new_meeting.location)
        .bind(new_meeting.agenda)
        .bind(new_meeting.start_time)
        .bind(new_meeting.end_time)
        .bind(new_meeting.organized_by)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO meeting_participants (meeting_id, user_id)
            SELECT $1, participant FROM UNNEST($2::uuid[]) AS participant
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(new_meeting.participants)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        timer.record();
        Ok(id)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_meeting");
        let result = sqlx::query("DELETE FROM meetings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    async fn participants_for(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<UserRef>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, UserContactRow>(
            r#"
            SELECT p.meeting_id AS owner_id, u.id AS user_id, u.name, u.email
            FROM meeting_participants p
            JOIN users u ON u.id = p.user_id
            WHERE p.meeting_id = ANY($1)
            ORDER BY u.name
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut by_meeting: HashMap<Uuid, Vec<UserRef>> = HashMap::new();
        for row in rows {
            by_meeting.entry(row.owner_id).or_default().push(row.into());
        }
        Ok(by_meeting)
    }
}
