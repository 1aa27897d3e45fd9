#![forbid(unsafe_code)]

use crate::ids::RowId;
use crate::ordering::Linked;
use crate::time::TimestampMs;
use serde::{Deserialize, Serialize};

/// Persisted entity collections. Declaration order is the order upserts are applied in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Teams,
    Sprints,
    Functions,
    Employees,
    Resources,
    Tasks,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Teams,
        Table::Sprints,
        Table::Functions,
        Table::Employees,
        Table::Resources,
        Table::Tasks,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Teams => "teams",
            Self::Sprints => "sprints",
            Self::Functions => "functions",
            Self::Employees => "employees",
            Self::Resources => "resources",
            Self::Tasks => "tasks",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|table| table.as_str() == value)
    }

    /// Deletes run dependents first so referenced rows are released before their owners go.
    pub fn delete_rank(self) -> u8 {
        match self {
            Self::Tasks => 0,
            Self::Resources => 1,
            Self::Sprints => 2,
            Self::Employees => 3,
            Self::Functions => 4,
            Self::Teams => 5,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    Todo,
    Backlog,
    Cancelled,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Todo => "Todo",
            Self::Backlog => "Backlog",
            Self::Cancelled => "Cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "Todo" => Some(Self::Todo),
            "Backlog" => Some(Self::Backlog),
            "Cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RowKind {
    Resource,
    Task,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Team {
    pub id: RowId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jira_project: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feature_team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
    pub created_at: TimestampMs,
    pub updated_at: TimestampMs,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Sprint {
    pub id: RowId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
    pub created_at: TimestampMs,
    pub updated_at: TimestampMs,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Function {
    pub id: RowId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub created_at: TimestampMs,
    pub updated_at: TimestampMs,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: RowId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    pub created_at: TimestampMs,
    pub updated_at: TimestampMs,
}

/// A staffing lane. `team` holds display names parallel to `team_ids`; unknown teams resolve to "".
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: RowId,
    pub kind: RowKind,
    #[serde(rename = "team")]
    pub team_names: Vec<String>,
    pub team_ids: Vec<RowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_id: Option<RowId>,
    #[serde(rename = "fn", skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<RowId>,
    #[serde(rename = "empl", skip_serializing_if = "Option::is_none")]
    pub employee: Option<String>,
    pub weeks: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
    pub prev: Option<RowId>,
    pub next: Option<RowId>,
    pub created_at: TimestampMs,
    pub updated_at: TimestampMs,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: RowId,
    pub kind: RowKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    pub sprints_auto: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub epic: Option<String>,
    #[serde(rename = "task", skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team_id: Option<RowId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub team: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_id: Option<RowId>,
    #[serde(rename = "fn", skip_serializing_if = "Option::is_none")]
    pub function: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<RowId>,
    #[serde(rename = "empl", skip_serializing_if = "Option::is_none")]
    pub employee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_empl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_weeks: Option<f64>,
    pub blocker_ids: Vec<RowId>,
    pub week_blockers: Vec<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fact: Option<f64>,
    pub start_week: Option<i64>,
    pub end_week: Option<i64>,
    pub expected_start_week: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_edited: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_plan_enabled: Option<bool>,
    pub weeks: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_order: Option<i64>,
    pub prev: Option<RowId>,
    pub next: Option<RowId>,
    pub created_at: TimestampMs,
    pub updated_at: TimestampMs,
}

impl Linked for Resource {
    fn id(&self) -> RowId {
        self.id
    }

    fn prev(&self) -> Option<RowId> {
        self.prev
    }

    fn next(&self) -> Option<RowId> {
        self.next
    }
}

impl Linked for Task {
    fn id(&self) -> RowId {
        self.id
    }

    fn prev(&self) -> Option<RowId> {
        self.prev
    }

    fn next(&self) -> Option<RowId> {
        self.next
    }
}
