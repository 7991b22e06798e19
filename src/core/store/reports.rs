//! Reports, report tasks, report types and templates

use chrono::Utc;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};

use super::{parse_datetime, parse_json_column, parse_optional_datetime, Store};
use crate::core::error::EngineResult;
use crate::entities::{
    Report, ReportFields, ReportTask, ReportTemplate, ReportType, TaskFields, TaskStatus,
};

const REPORT_COLUMNS: &str = "id, name, title, columns, filters, report_type_id, user_id, created_at";

const TASK_COLUMNS: &str = "id, report_id, status, orientation, paper_size, output_format, user_id, \
     template_id, command, output_path, error, created_at, completed_at, notified_at";

fn report_from_row(row: &Row<'_>) -> rusqlite::Result<Report> {
    Ok(Report {
        id: row.get(0)?,
        name: row.get(1)?,
        title: row.get(2)?,
        columns: parse_json_column(&row.get::<_, String>(3)?),
        filters: parse_json_column(&row.get::<_, String>(4)?),
        report_type_id: row.get(5)?,
        owner_user_id: row.get(6)?,
        created_at: parse_datetime(row.get::<_, String>(7)?),
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<ReportTask> {
    let code: String = row.get(2)?;
    let status = TaskStatus::from_code(&code).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("unknown task status code '{}'", code).into(),
        )
    })?;
    let orientation: String = row.get(3)?;
    let paper_size: String = row.get(4)?;
    let output_format: String = row.get(5)?;
    Ok(ReportTask {
        id: row.get(0)?,
        report_id: row.get(1)?,
        status,
        orientation: orientation.parse().unwrap_or_default(),
        paper_size: paper_size.parse().unwrap_or_default(),
        output_format: output_format.parse().unwrap_or_default(),
        owner_user_id: row.get(6)?,
        template_id: row.get(7)?,
        command: row.get(8)?,
        output_path: row.get(9)?,
        error: row.get(10)?,
        created_at: parse_datetime(row.get::<_, String>(11)?),
        completed_at: parse_optional_datetime(row.get(12)?),
        notified_at: parse_optional_datetime(row.get(13)?),
    })
}

impl Store {
    pub fn report_type_by_code(&self, code: &str) -> EngineResult<Option<ReportType>> {
        let report_type = self
            .conn
            .query_row(
                "SELECT id, code, name FROM report_types WHERE code = ?1",
                params![code],
                |row| {
                    Ok(ReportType {
                        id: row.get(0)?,
                        code: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(report_type)
    }

    pub fn report_type(&self, id: i64) -> EngineResult<Option<ReportType>> {
        let report_type = self
            .conn
            .query_row(
                "SELECT id, code, name FROM report_types WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ReportType {
                        id: row.get(0)?,
                        code: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(report_type)
    }

    pub fn templates_for_type(&self, report_type_id: i64) -> EngineResult<Vec<ReportTemplate>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, report_type_id, name, file_stem FROM report_templates
             WHERE report_type_id = ?1 ORDER BY id",
        )?;
        let templates = stmt
            .query_map(params![report_type_id], |row| {
                Ok(ReportTemplate {
                    id: row.get(0)?,
                    report_type_id: row.get(1)?,
                    name: row.get(2)?,
                    file_stem: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(templates)
    }

    pub fn template(&self, id: i64) -> EngineResult<Option<ReportTemplate>> {
        let template = self
            .conn
            .query_row(
                "SELECT id, report_type_id, name, file_stem FROM report_templates WHERE id = ?1",
                params![id],
                |row| {
                    Ok(ReportTemplate {
                        id: row.get(0)?,
                        report_type_id: row.get(1)?,
                        name: row.get(2)?,
                        file_stem: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(template)
    }

    /// Insert a report and its Pending task in one transaction
    pub fn create_report_with_task(
        &self,
        report: &ReportFields,
        task: &TaskFields,
        command: &str,
    ) -> EngineResult<(Report, ReportTask)> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "INSERT INTO reports (name, title, columns, filters, report_type_id, user_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                report.name,
                report.title,
                serde_json::to_string(&report.columns)?,
                serde_json::to_string(&report.filters)?,
                report.report_type_id,
                report.user_id,
                now,
            ],
        )?;
        let report_id = tx.last_insert_rowid();

        tx.execute(
            "INSERT INTO report_tasks
                (report_id, status, orientation, paper_size, output_format, user_id, template_id, command, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                report_id,
                TaskStatus::Pending.code(),
                task.orientation.to_string(),
                task.paper_size.to_string(),
                task.output_format.to_string(),
                report.user_id,
                task.template_id,
                command,
                now,
            ],
        )?;
        let task_id = tx.last_insert_rowid();
        tx.commit()?;

        let report = self
            .find_report(report_id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        let task = self
            .find_task(task_id, report.owner_user_id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        Ok((report, task))
    }

    pub fn find_report(&self, id: i64) -> EngineResult<Option<Report>> {
        let report = self
            .conn
            .query_row(
                &format!("SELECT {} FROM reports WHERE id = ?1", REPORT_COLUMNS),
                params![id],
                report_from_row,
            )
            .optional()?;
        Ok(report)
    }

    pub fn count_reports(&self) -> EngineResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    pub fn count_tasks(&self) -> EngineResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM report_tasks", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// A task owned by `owner`
    pub fn find_task(&self, id: i64, owner: i64) -> EngineResult<Option<ReportTask>> {
        let task = self
            .conn
            .query_row(
                &format!("SELECT {} FROM report_tasks WHERE id = ?1 AND user_id = ?2", TASK_COLUMNS),
                params![id, owner],
                task_from_row,
            )
            .optional()?;
        Ok(task)
    }

    /// Most recent tasks first
    pub fn tasks_for_owner(&self, owner: i64, limit: usize) -> EngineResult<Vec<ReportTask>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM report_tasks WHERE user_id = ?1 ORDER BY id DESC LIMIT {}",
            TASK_COLUMNS, limit
        ))?;
        let tasks = stmt
            .query_map(params![owner], task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Pending tasks for `owner`, oldest first
    pub fn pending_tasks(&self, owner: i64) -> EngineResult<Vec<ReportTask>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM report_tasks WHERE user_id = ?1 AND status = ?2 ORDER BY id ASC",
            TASK_COLUMNS
        ))?;
        let tasks = stmt
            .query_map(params![owner, TaskStatus::Pending.code()], task_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    /// Compare-and-set a task's status; false when `from` no longer holds
    pub fn transition_task(&self, id: i64, from: TaskStatus, to: TaskStatus) -> EngineResult<bool> {
        if !from.can_transition_to(to) {
            return Ok(false);
        }
        let completed_at = to.is_terminal().then(|| Utc::now().to_rfc3339());
        let changed = self.conn.execute(
            "UPDATE report_tasks SET status = ?1, completed_at = COALESCE(?2, completed_at)
             WHERE id = ?3 AND status = ?4",
            params![to.code(), completed_at, id, from.code()],
        )?;
        Ok(changed > 0)
    }

    /// Processing → Done with the rendered file path
    pub fn complete_task(&self, id: i64, output_path: &str) -> EngineResult<bool> {
        let done = self.transition_task(id, TaskStatus::Processing, TaskStatus::Done)?;
        if done {
            self.conn.execute(
                "UPDATE report_tasks SET output_path = ?1 WHERE id = ?2",
                params![output_path, id],
            )?;
        }
        Ok(done)
    }

    /// Processing → Failed with an error message
    pub fn fail_task(&self, id: i64, error: &str) -> EngineResult<bool> {
        let failed = self.transition_task(id, TaskStatus::Processing, TaskStatus::Failed)?;
        if failed {
            self.conn.execute(
                "UPDATE report_tasks SET error = ?1 WHERE id = ?2",
                params![error, id],
            )?;
        }
        Ok(failed)
    }

    /// Finished tasks the owner has not been told about yet
    pub fn unnotified_tasks(&self, owner: i64) -> EngineResult<Vec<ReportTask>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM report_tasks
             WHERE user_id = ?1 AND status IN (?2, ?3) AND notified_at IS NULL
             ORDER BY id ASC",
            TASK_COLUMNS
        ))?;
        let tasks = stmt
            .query_map(
                params![owner, TaskStatus::Done.code(), TaskStatus::Failed.code()],
                task_from_row,
            )?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tasks)
    }

    pub fn mark_notified(&self, ids: &[i64]) -> EngineResult<()> {
        let now = Utc::now().to_rfc3339();
        for id in ids {
            self.conn.execute(
                "UPDATE report_tasks SET notified_at = ?1 WHERE id = ?2",
                params![now, id],
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filter::FilterSet;
    use crate::entities::{Orientation, ReportFormat};

    fn report_fields(owner: i64) -> ReportFields {
        ReportFields {
            name: "Roster".to_string(),
            title: "Roster".to_string(),
            columns: vec!["voter_id".to_string()],
            filters: FilterSet::new().with("mine", "1"),
            report_type_id: 2,
            user_id: owner,
        }
    }

    fn task_fields() -> TaskFields {
        TaskFields {
            orientation: Orientation::Landscape,
            output_format: ReportFormat::Markdown,
            template_id: Some(2),
            ..Default::default()
        }
    }

    #[test]
    fn test_create_report_with_pending_task() {
        let store = Store::open_in_memory().unwrap();
        let (report, task) = store
            .create_report_with_task(&report_fields(5), &task_fields(), "run 5")
            .unwrap();

        assert_eq!(report.filters.get("mine"), Some("1"));
        assert_eq!(task.report_id, report.id);
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.orientation, Orientation::Landscape);
        assert_eq!(task.output_format, ReportFormat::Markdown);
        assert_eq!(task.command, "run 5");
        assert!(task.completed_at.is_none());
    }

    #[test]
    fn test_task_lifecycle() {
        let store = Store::open_in_memory().unwrap();
        let (_, task) = store
            .create_report_with_task(&report_fields(5), &task_fields(), "run 5")
            .unwrap();

        // Cannot skip Processing
        assert!(!store.complete_task(task.id, "out.md").unwrap());
        assert!(store
            .transition_task(task.id, TaskStatus::Pending, TaskStatus::Processing)
            .unwrap());
        // A second claim loses the race
        assert!(!store
            .transition_task(task.id, TaskStatus::Pending, TaskStatus::Processing)
            .unwrap());
        assert!(store.complete_task(task.id, "out.md").unwrap());

        let done = store.find_task(task.id, 5).unwrap().unwrap();
        assert_eq!(done.status, TaskStatus::Done);
        assert_eq!(done.output_path.as_deref(), Some("out.md"));
        assert!(done.completed_at.is_some());
    }

    #[test]
    fn test_unknown_status_code_is_an_error() {
        let store = Store::open_in_memory().unwrap();
        let (_, task) = store
            .create_report_with_task(&report_fields(5), &task_fields(), "run 5")
            .unwrap();
        store
            .connection()
            .execute("UPDATE report_tasks SET status = 'ZZ' WHERE id = ?1", [task.id])
            .unwrap();

        let err = store.find_task(task.id, 5).unwrap_err();
        assert!(err.to_string().contains("unknown task status code 'ZZ'"));
    }

    #[test]
    fn test_notifications_reported_once() {
        let store = Store::open_in_memory().unwrap();
        let (_, task) = store
            .create_report_with_task(&report_fields(5), &task_fields(), "run 5")
            .unwrap();
        store
            .transition_task(task.id, TaskStatus::Pending, TaskStatus::Processing)
            .unwrap();
        store.fail_task(task.id, "boom").unwrap();

        let unnotified = store.unnotified_tasks(5).unwrap();
        assert_eq!(unnotified.len(), 1);
        assert_eq!(unnotified[0].error.as_deref(), Some("boom"));

        store.mark_notified(&[task.id]).unwrap();
        assert!(store.unnotified_tasks(5).unwrap().is_empty());
    }

    #[test]
    fn test_tasks_scoped_to_owner() {
        let store = Store::open_in_memory().unwrap();
        let (_, task) = store
            .create_report_with_task(&report_fields(5), &task_fields(), "run 5")
            .unwrap();
        assert!(store.find_task(task.id, 6).unwrap().is_none());
        assert!(store.tasks_for_owner(6, 10).unwrap().is_empty());
        assert_eq!(store.pending_tasks(5).unwrap().len(), 1);
    }

    #[test]
    fn test_seeded_templates() {
        let store = Store::open_in_memory().unwrap();
        let voters = store.report_type_by_code("VOTERS").unwrap().unwrap();
        let templates = store.templates_for_type(voters.id).unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].file_stem, "voters-roster");
    }
}
