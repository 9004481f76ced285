//! Repository for projects, team membership and suggestions.

use domain::models::{ProjectDetail, ProjectDomain, ProjectStatus, Suggestion, UserRef};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::entities::{
    ProjectDomainDb, ProjectEntity, ProjectStatusDb, SuggestionEntity, UserContactRow,
};
use crate::metrics::QueryTimer;

const PROJECT_SELECT: &str = r#"
    SELECT p.id, p.title, p.description, p.domain, p.lead_id,
           u.name AS lead_name, u.email AS lead_email,
           p.status, p.created_by, p.created_at, p.updated_at
    FROM projects p
    LEFT JOIN users u ON u.id = p.lead_id
"#;

/// Input for project creation.
#[derive(Debug, Clone)]
pub struct NewProject<'a> {
    pub title: &'a str,
    pub description: &'a str,
    pub domain: ProjectDomain,
    pub lead_id: Uuid,
    pub status: ProjectStatus,
    pub created_by: Uuid,
    pub team: &'a [Uuid],
}

/// Partial project update. `team`, when present, replaces the whole team.
#[derive(Debug, Clone, Default)]
pub struct ProjectChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub domain: Option<ProjectDomain>,
    pub lead_id: Option<Uuid>,
    pub status: Option<ProjectStatus>,
    pub team: Option<Vec<Uuid>>,
}

#[derive(Clone)]
pub struct ProjectRepository {
    pool: PgPool,
}

impl ProjectRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Lists all projects with lead, team and suggestions populated.
    pub async fn list(&self) -> Result<Vec<ProjectDetail>, sqlx::Error> {
        let timer = QueryTimer::new("list_projects");
        let sql = format!("{PROJECT_SELECT} ORDER BY p.created_at DESC");
        let projects = sqlx::query_as::<_, ProjectEntity>(&sql)
            .fetch_all(&self.pool)
            .await?;

        let ids: Vec<Uuid> = projects.iter().map(|p| p.id).collect();
        let mut teams = self.teams_for(&ids).await?;
        let mut suggestions = self.suggestions_for(&ids).await?;
        timer.record();

        Ok(projects
            .into_iter()
            .map(|p| {
                let team = teams.remove(&p.id).unwrap_or_default();
                let thread = suggestions.remove(&p.id).unwrap_or_default();
                p.into_detail(team, thread)
            })
            .collect())
    }

    /// Loads the bare project row, used for permission checks.
    pub async fn find(&self, id: Uuid) -> Result<Option<ProjectEntity>, sqlx::Error> {
        let timer = QueryTimer::new("find_project");
        let sql = format!("{PROJECT_SELECT} WHERE p.id = $1");
        let result = sqlx::query_as::<_, ProjectEntity>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await;
        timer.record();
        result
    }

    pub async fn find_detail(&self, id: Uuid) -> Result<Option<ProjectDetail>, sqlx::Error> {
        let Some(project) = self.find(id).await? else {
            return Ok(None);
        };
        let team = self.teams_for(&[id]).await?.remove(&id).unwrap_or_default();
        let thread = self
            .suggestions_for(&[id])
            .await?
            .remove(&id)
            .unwrap_or_default();
        Ok(Some(project.into_detail(team, thread)))
    }

    /// Inserts the project and its team atomically. Returns the new id.
    pub async fn create(&self, new_project: &NewProject<'_>) -> Result<Uuid, sqlx::Error> {
        let timer = QueryTimer::new("create_project");
        let mut tx = self.pool.begin().await?;

        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO projects (title, description, domain, lead_id, status, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(new_project.title)
        .bind(new_project.description)
        .bind(ProjectDomainDb::from(new_project.domain))
        .bind(new_project.lead_id)
        .bind(ProjectStatusDb::from(new_project.status))
        .bind(new_project.created_by)
        .fetch_one(&mut *tx)
        .await?;

        replace_team(&mut tx, id, new_project.team).await?;

        tx.commit().await?;
        timer.record();
        Ok(id)
    }

    /// Applies a partial update. Returns false when the project is gone.
    pub async fn update(&self, id: Uuid, changes: &ProjectChanges) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("update_project");
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE projects
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                domain = COALESCE($4, domain),
                lead_id = COALESCE($5, lead_id),
                status = COALESCE($6, status),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.domain.map(ProjectDomainDb::from))
        .bind(changes.lead_id)
        .bind(changes.status.map(ProjectStatusDb::from))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            timer.record();
            return Ok(false);
        }

        if let Some(team) = &changes.team {
            replace_team(&mut tx, id, team).await?;
        }

        tx.commit().await?;
        timer.record();
        Ok(true)
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let timer = QueryTimer::new("delete_project");
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        timer.record();
        Ok(result.rows_affected() > 0)
    }

    /// Appends a suggestion and returns the project's thread, newest first.
    pub async fn add_suggestion(
        &self,
        project_id: Uuid,
        author_id: Uuid,
        text: &str,
    ) -> Result<Vec<Suggestion>, sqlx::Error> {
        let timer = QueryTimer::new("add_project_suggestion");
        sqlx::query(
            r#"
            INSERT INTO project_suggestions (project_id, author_id, text)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(project_id)
        .bind(author_id)
        .bind(text)
        .execute(&self.pool)
        .await?;
        timer.record();

        Ok(self
            .suggestions_for(&[project_id])
            .await?
            .remove(&project_id)
            .unwrap_or_default())
    }

    async fn teams_for(&self, ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<UserRef>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, UserContactRow>(
            r#"
            SELECT m.project_id AS owner_id, u.id AS user_id, u.name, u.email
            FROM project_members m
            JOIN users u ON u.id = m.user_id
            WHERE m.project_id = ANY($1)
            ORDER BY m.added_at, u.name
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut teams: HashMap<Uuid, Vec<UserRef>> = HashMap::new();
        for row in rows {
            teams.entry(row.owner_id).or_default().push(row.into());
        }
        Ok(teams)
    }

    async fn suggestions_for(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<Suggestion>>, sqlx::Error> {
        let rows = sqlx::query_as::<_, SuggestionEntity>(
            r#"
            SELECT s.id, s.project_id, s.text, s.author_id,
                   u.name AS author_name, u.role AS author_role, s.created_at
            FROM project_suggestions s
            JOIN users u ON u.id = s.author_id
            WHERE s.project_id = ANY($1)
            ORDER BY s.created_at DESC, s.id DESC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        let mut threads: HashMap<Uuid, Vec<Suggestion>> = HashMap::new();
        for row in rows {
            threads.entry(row.project_id).or_default().push(row.into());
        }
        Ok(threads)
    }
}

async fn replace_team(
    tx: &mut Transaction<'_, Postgres>,
    project_id: Uuid,
    team: &[Uuid],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM project_members WHERE project_id = $1")
        .bind(project_id)
        .execute(&mut **tx)
        .await?;

    sqlx::query(
        r#"
        INSERT INTO project_members (project_id, user_id)
        SELECT $1, member FROM UNNEST($2::uuid[]) AS member
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(project_id)
    .bind(team)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
