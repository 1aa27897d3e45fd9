#![forbid(unsafe_code)]

use crate::rows::{json_vec, opt_flag, opt_row_id, opt_status, row_id, timestamp};
use crate::{SqliteStore, StoreError, read_version};
use roadmap_core::{
    Employee, Function, Resource, RowId, RowKind, Snapshot, Sprint, Task, Team,
    reconstruct_order,
};
use rusqlite::{Connection, Row};
use std::collections::HashMap;
use tracing::{debug, instrument};

impl SqliteStore {
    /// Full document state, read in one transaction so every collection matches the version.
    #[instrument(skip(self))]
    pub fn snapshot(&mut self) -> Result<Snapshot, StoreError> {
        let tx = self.conn.transaction()?;

        let version = read_version(&tx)?;
        let teams = query_rows(
            &tx,
            "SELECT id, name, jira_project, feature_team, issue_type, created_at_ms, updated_at_ms \
             FROM teams ORDER BY name IS NULL, name, created_at_ms, id",
            team_from_row,
        )?;
        let sprints = query_rows(
            &tx,
            "SELECT id, code, start_date, end_date, created_at_ms, updated_at_ms \
             FROM sprints ORDER BY start_date IS NULL, start_date, created_at_ms, id",
            sprint_from_row,
        )?;
        let functions = query_rows(
            &tx,
            "SELECT id, name, color, created_at_ms, updated_at_ms \
             FROM functions ORDER BY name IS NULL, name, created_at_ms, id",
            function_from_row,
        )?;
        let employees = query_rows(
            &tx,
            "SELECT id, name, color, created_at_ms, updated_at_ms \
             FROM employees ORDER BY name IS NULL, name, created_at_ms, id",
            employee_from_row,
        )?;

        let team_names: HashMap<RowId, String> = teams
            .iter()
            .map(|team| (team.id, team.name.clone().unwrap_or_default()))
            .collect();

        let mut resources = query_rows(&tx, RESOURCES_SQL, resource_from_row)?;
        for resource in &mut resources {
            resource.team_names = resource
                .team_ids
                .iter()
                .map(|id| team_names.get(id).cloned().unwrap_or_default())
                .collect();
        }
        let tasks = query_rows(&tx, TASKS_SQL, task_from_row)?;

        tx.commit()?;

        debug!(
            version,
            resources = resources.len(),
            tasks = tasks.len(),
            "snapshot read"
        );

        Ok(Snapshot {
            version,
            teams,
            sprints,
            functions,
            employees,
            resources: reconstruct_order(resources),
            tasks: reconstruct_order(tasks),
        })
    }
}

const RESOURCES_SQL: &str = r#"
    SELECT r.id, r.team_ids, r.function_id, f.name, r.employee_id, e.name, r.weeks,
           r.display_order, r.prev_id, r.next_id, r.created_at_ms, r.updated_at_ms
      FROM resources r
      LEFT JOIN functions f ON f.id = r.function_id
      LEFT JOIN employees e ON e.id = r.employee_id
     ORDER BY r.display_order IS NULL, r.display_order, r.created_at_ms, r.id
"#;

const TASKS_SQL: &str = r#"
    SELECT t.id, t.status, t.sprints_auto, t.epic, t.task_name,
           t.team_id, tm.name, t.function_id, f.name, t.employee_id, e.name,
           t.plan_empl, t.plan_weeks, t.blocker_ids, t.week_blockers, t.fact,
           t.start_week, t.end_week, t.expected_start_week, t.manual_edited, t.auto_plan_enabled,
           t.weeks, t.display_order, t.prev_id, t.next_id, t.created_at_ms, t.updated_at_ms
      FROM tasks t
      LEFT JOIN teams tm ON tm.id = t.team_id
      LEFT JOIN functions f ON f.id = t.function_id
      LEFT JOIN employees e ON e.id = t.employee_id
     ORDER BY t.display_order IS NULL, t.display_order, t.created_at_ms, t.id
"#;

fn query_rows<T>(
    conn: &Connection,
    sql: &str,
    map: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> Result<Vec<T>, StoreError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([], map)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn team_from_row(row: &Row<'_>) -> rusqlite::Result<Team> {
    Ok(Team {
        id: row_id(row, 0)?,
        name: row.get(1)?,
        jira_project: row.get(2)?,
        feature_team: row.get(3)?,
        issue_type: row.get(4)?,
        created_at: timestamp(row, 5)?,
        updated_at: timestamp(row, 6)?,
    })
}

fn sprint_from_row(row: &Row<'_>) -> rusqlite::Result<Sprint> {
    Ok(Sprint {
        id: row_id(row, 0)?,
        code: row.get(1)?,
        start: row.get(2)?,
        end: row.get(3)?,
        created_at: timestamp(row, 4)?,
        updated_at: timestamp(row, 5)?,
    })
}

fn function_from_row(row: &Row<'_>) -> rusqlite::Result<Function> {
    Ok(Function {
        id: row_id(row, 0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        created_at: timestamp(row, 3)?,
        updated_at: timestamp(row, 4)?,
    })
}

fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row_id(row, 0)?,
        name: row.get(1)?,
        color: row.get(2)?,
        created_at: timestamp(row, 3)?,
        updated_at: timestamp(row, 4)?,
    })
}

// Team names are resolved by the caller once the team list is loaded.
fn resource_from_row(row: &Row<'_>) -> rusqlite::Result<Resource> {
    Ok(Resource {
        id: row_id(row, 0)?,
        kind: RowKind::Resource,
        team_names: Vec::new(),
        team_ids: json_vec(row, 1)?,
        function_id: opt_row_id(row, 2)?,
        function: row.get(3)?,
        employee_id: opt_row_id(row, 4)?,
        employee: row.get(5)?,
        weeks: json_vec(row, 6)?,
        display_order: row.get(7)?,
        prev: opt_row_id(row, 8)?,
        next: opt_row_id(row, 9)?,
        created_at: timestamp(row, 10)?,
        updated_at: timestamp(row, 11)?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: row_id(row, 0)?,
        kind: RowKind::Task,
        status: opt_status(row, 1)?,
        sprints_auto: json_vec(row, 2)?,
        epic: row.get(3)?,
        task_name: row.get(4)?,
        team_id: opt_row_id(row, 5)?,
        team: row.get(6)?,
        function_id: opt_row_id(row, 7)?,
        function: row.get(8)?,
        employee_id: opt_row_id(row, 9)?,
        employee: row.get(10)?,
        plan_empl: row.get(11)?,
        plan_weeks: row.get(12)?,
        blocker_ids: json_vec(row, 13)?,
        week_blockers: json_vec(row, 14)?,
        fact: row.get(15)?,
        start_week: row.get(16)?,
        end_week: row.get(17)?,
        expected_start_week: row.get(18)?,
        manual_edited: opt_flag(row, 19)?,
        auto_plan_enabled: opt_flag(row, 20)?,
        weeks: json_vec(row, 21)?,
        display_order: row.get(22)?,
        prev: opt_row_id(row, 23)?,
        next: opt_row_id(row, 24)?,
        created_at: timestamp(row, 25)?,
        updated_at: timestamp(row, 26)?,
    })
}
