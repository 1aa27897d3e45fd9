#![forbid(unsafe_code)]

pub(crate) const NOW_MS_SQL: &str = "CAST((julianday('now') - 2440587.5) * 86400000 AS INTEGER)";

pub(super) fn tables_sql() -> String {
    SQL.replace("{now_ms}", NOW_MS_SQL)
}

const SQL: &str = r#"
        CREATE TABLE IF NOT EXISTS meta (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS document_versions (
          singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
          version_number INTEGER NOT NULL CHECK(version_number >= 0),
          updated_at_ms INTEGER NOT NULL DEFAULT ({now_ms})
        );

        CREATE TABLE IF NOT EXISTS sync_session (
          singleton INTEGER PRIMARY KEY CHECK(singleton = 1),
          user_id TEXT NOT NULL,
          version INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS teams (
          id TEXT PRIMARY KEY,
          name TEXT,
          jira_project TEXT,
          feature_team TEXT,
          issue_type TEXT,
          created_at_ms INTEGER NOT NULL DEFAULT ({now_ms}),
          updated_at_ms INTEGER NOT NULL DEFAULT ({now_ms})
        );

        CREATE TABLE IF NOT EXISTS sprints (
          id TEXT PRIMARY KEY,
          code TEXT,
          start_date TEXT,
          end_date TEXT,
          created_at_ms INTEGER NOT NULL DEFAULT ({now_ms}),
          updated_at_ms INTEGER NOT NULL DEFAULT ({now_ms})
        );

        CREATE TABLE IF NOT EXISTS functions (
          id TEXT PRIMARY KEY,
          name TEXT,
          color TEXT,
          created_at_ms INTEGER NOT NULL DEFAULT ({now_ms}),
          updated_at_ms INTEGER NOT NULL DEFAULT ({now_ms})
        );

        CREATE TABLE IF NOT EXISTS employees (
          id TEXT PRIMARY KEY,
          name TEXT,
          color TEXT,
          created_at_ms INTEGER NOT NULL DEFAULT ({now_ms}),
          updated_at_ms INTEGER NOT NULL DEFAULT ({now_ms})
        );

        CREATE TABLE IF NOT EXISTS resources (
          id TEXT PRIMARY KEY,
          team_ids TEXT,
          function_id TEXT REFERENCES functions(id),
          employee_id TEXT REFERENCES employees(id),
          weeks TEXT,
          display_order INTEGER,
          prev_id TEXT,
          next_id TEXT,
          created_at_ms INTEGER NOT NULL DEFAULT ({now_ms}),
          updated_at_ms INTEGER NOT NULL DEFAULT ({now_ms})
        );

        CREATE TABLE IF NOT EXISTS tasks (
          id TEXT PRIMARY KEY,
          status TEXT CHECK(status IS NULL OR status IN ('Todo', 'Backlog', 'Cancelled')),
          sprints_auto TEXT,
          epic TEXT,
          task_name TEXT,
          team_id TEXT REFERENCES teams(id),
          function_id TEXT REFERENCES functions(id),
          employee_id TEXT REFERENCES employees(id),
          plan_empl REAL,
          plan_weeks REAL,
          blocker_ids TEXT,
          week_blockers TEXT,
          fact REAL,
          start_week INTEGER,
          end_week INTEGER,
          expected_start_week INTEGER,
          manual_edited INTEGER,
          auto_plan_enabled INTEGER,
          weeks TEXT,
          display_order INTEGER,
          prev_id TEXT,
          next_id TEXT,
          created_at_ms INTEGER NOT NULL DEFAULT ({now_ms}),
          updated_at_ms INTEGER NOT NULL DEFAULT ({now_ms})
        );

        CREATE TABLE IF NOT EXISTS change_log (
          seq INTEGER PRIMARY KEY AUTOINCREMENT,
          version_number INTEGER NOT NULL,
          table_name TEXT NOT NULL,
          record_id TEXT NOT NULL,
          operation TEXT NOT NULL CHECK(operation IN ('upsert', 'delete')),
          user_id TEXT,
          old_data TEXT,
          new_data TEXT,
          created_at_ms INTEGER NOT NULL,
          UNIQUE(version_number, table_name, record_id)
        );

        CREATE INDEX IF NOT EXISTS idx_change_log_version
          ON change_log(version_number, created_at_ms, seq);

        CREATE INDEX IF NOT EXISTS idx_resources_order
          ON resources(display_order, created_at_ms);

        CREATE INDEX IF NOT EXISTS idx_tasks_order
          ON tasks(display_order, created_at_ms);
"#;
