#![forbid(unsafe_code)]

//! Change-capture triggers.
//!
//! Each mutated row yields one `change_log` entry per batch, tagged with the pending version and
//! acting user published in `sync_session` by the unit of work. Without a session row the version
//! is NULL and the insert fails, so entity tables cannot be mutated outside a unit of work.

use super::tables::NOW_MS_SQL;
use roadmap_core::Table;

#[derive(Clone, Copy)]
enum Encoding {
    Scalar,
    Json,
}

use Encoding::{Json, Scalar};

struct CapturedTable {
    table: Table,
    columns: &'static [(&'static str, Encoding)],
}

const CAPTURED: [CapturedTable; 6] = [
    CapturedTable {
        table: Table::Teams,
        columns: &[
            ("id", Scalar),
            ("name", Scalar),
            ("jira_project", Scalar),
            ("feature_team", Scalar),
            ("issue_type", Scalar),
            ("created_at_ms", Scalar),
            ("updated_at_ms", Scalar),
        ],
    },
    CapturedTable {
        table: Table::Sprints,
        columns: &[
            ("id", Scalar),
            ("code", Scalar),
            ("start_date", Scalar),
            ("end_date", Scalar),
            ("created_at_ms", Scalar),
            ("updated_at_ms", Scalar),
        ],
    },
    CapturedTable {
        table: Table::Functions,
        columns: &[
            ("id", Scalar),
            ("name", Scalar),
            ("color", Scalar),
            ("created_at_ms", Scalar),
            ("updated_at_ms", Scalar),
        ],
    },
    CapturedTable {
        table: Table::Employees,
        columns: &[
            ("id", Scalar),
            ("name", Scalar),
            ("color", Scalar),
            ("created_at_ms", Scalar),
            ("updated_at_ms", Scalar),
        ],
    },
    CapturedTable {
        table: Table::Resources,
        columns: &[
            ("id", Scalar),
            ("team_ids", Json),
            ("function_id", Scalar),
            ("employee_id", Scalar),
            ("weeks", Json),
            ("display_order", Scalar),
            ("prev_id", Scalar),
            ("next_id", Scalar),
            ("created_at_ms", Scalar),
            ("updated_at_ms", Scalar),
        ],
    },
    CapturedTable {
        table: Table::Tasks,
        columns: &[
            ("id", Scalar),
            ("status", Scalar),
            ("sprints_auto", Json),
            ("epic", Scalar),
            ("task_name", Scalar),
            ("team_id", Scalar),
            ("function_id", Scalar),
            ("employee_id", Scalar),
            ("plan_empl", Scalar),
            ("plan_weeks", Scalar),
            ("blocker_ids", Json),
            ("week_blockers", Json),
            ("fact", Scalar),
            ("start_week", Scalar),
            ("end_week", Scalar),
            ("expected_start_week", Scalar),
            ("manual_edited", Scalar),
            ("auto_plan_enabled", Scalar),
            ("weeks", Json),
            ("display_order", Scalar),
            ("prev_id", Scalar),
            ("next_id", Scalar),
            ("created_at_ms", Scalar),
            ("updated_at_ms", Scalar),
        ],
    },
];

const SESSION_VERSION: &str = "(SELECT version FROM sync_session WHERE singleton = 1)";
const SESSION_USER: &str = "(SELECT user_id FROM sync_session WHERE singleton = 1)";

pub(super) fn capture_sql() -> String {
    let mut sql = String::new();
    for captured in &CAPTURED {
        sql.push_str(&table_triggers(captured));
    }
    sql
}

fn table_triggers(captured: &CapturedTable) -> String {
    let name = captured.table.as_str();
    let old_image = row_image("OLD", captured.columns);
    let new_image = row_image("NEW", captured.columns);

    let on_insert = record_change(name, "NEW.id", "upsert", "NULL", &new_image);
    let on_update = record_change(name, "NEW.id", "upsert", &old_image, &new_image);
    let on_delete = record_change(name, "OLD.id", "delete", &old_image, "NULL");

    format!(
        r#"
        CREATE TRIGGER IF NOT EXISTS {name}_capture_insert AFTER INSERT ON {name}
        BEGIN
        {on_insert}
        END;

        CREATE TRIGGER IF NOT EXISTS {name}_capture_update AFTER UPDATE ON {name}
        BEGIN
        {on_update}
        END;

        CREATE TRIGGER IF NOT EXISTS {name}_capture_delete AFTER DELETE ON {name}
        BEGIN
        {on_delete}
        END;
"#
    )
}

/// Folds into this batch's entry for the row when one exists, keeping its first before-image.
fn record_change(table: &str, record: &str, operation: &str, old: &str, new: &str) -> String {
    format!(
        r#"
          UPDATE change_log
             SET operation = '{operation}', new_data = {new}, created_at_ms = {NOW_MS_SQL}
           WHERE version_number = {SESSION_VERSION}
             AND table_name = '{table}'
             AND record_id = {record};
          INSERT INTO change_log(version_number, table_name, record_id, operation, user_id, old_data, new_data, created_at_ms)
          SELECT {SESSION_VERSION}, '{table}', {record}, '{operation}', {SESSION_USER}, {old}, {new}, {NOW_MS_SQL}
           WHERE NOT EXISTS (
             SELECT 1 FROM change_log
              WHERE version_number = {SESSION_VERSION}
                AND table_name = '{table}'
                AND record_id = {record}
           );"#
    )
}

fn row_image(alias: &str, columns: &[(&str, Encoding)]) -> String {
    let pairs = columns
        .iter()
        .map(|(column, encoding)| match encoding {
            Scalar => format!("'{column}', {alias}.{column}"),
            Json => format!("'{column}', json({alias}.{column})"),
        })
        .collect::<Vec<_>>();
    format!("json_object({})", pairs.join(", "))
}
