#![forbid(unsafe_code)]

//! Upsert payloads with partial-update semantics.
//!
//! Every attribute is `Option<Option<T>>`: the outer `None` means the caller omitted the field
//! and the stored value must survive, `Some(None)` means the caller explicitly cleared it.
//! Array-valued attributes are replaced as a whole.

use crate::ids::RowId;
use crate::model::{Table, TaskStatus};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Column value in store-neutral form.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Text(String),
    Integer(i64),
    Real(f64),
    Json(Value),
}

/// One supplied column of an upsert.
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    pub column: &'static str,
    pub value: FieldValue,
}

/// A supplied value that could not be encoded for its column.
#[derive(Debug, Error)]
#[error("cannot encode column {column}: {source}")]
pub struct PatchError {
    pub column: &'static str,
    #[source]
    pub source: serde_json::Error,
}

/// A row payload that can be written as "insert, or update the supplied columns on id collision".
pub trait Upsert {
    fn table(&self) -> Table;
    fn id(&self) -> RowId;
    /// Supplied columns only, in declaration order.
    fn assignments(&self) -> Result<Vec<Assignment>, PatchError>;
    /// Whether any column besides the id was supplied.
    fn has_changes(&self) -> bool;
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

type Encoded = Result<FieldValue, serde_json::Error>;

fn text(value: &String) -> Encoded {
    Ok(FieldValue::Text(value.clone()))
}

fn row_id(value: &RowId) -> Encoded {
    Ok(FieldValue::Text(value.to_string()))
}

fn status(value: &TaskStatus) -> Encoded {
    Ok(FieldValue::Text(value.as_str().to_string()))
}

fn integer(value: &i64) -> Encoded {
    Ok(FieldValue::Integer(*value))
}

fn real(value: &f64) -> Encoded {
    Ok(FieldValue::Real(*value))
}

fn flag(value: &bool) -> Encoded {
    Ok(FieldValue::Integer(i64::from(*value)))
}

fn json<T: Serialize>(value: &T) -> Encoded {
    serde_json::to_value(value).map(FieldValue::Json)
}

macro_rules! upsert_payload {
    (
        $(#[$meta:meta])*
        $name:ident => $table:expr, {
            $( $(#[$fmeta:meta])* $field:ident : $ty:ty => $column:literal via $conv:ident ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Deserialize)]
        #[serde(rename_all = "camelCase")]
        pub struct $name {
            pub id: RowId,
            $(
                $(#[$fmeta])*
                #[serde(default, deserialize_with = "present")]
                pub $field: Option<Option<$ty>>,
            )*
        }

        impl $name {
            pub fn new(id: RowId) -> Self {
                Self { id, $( $field: None, )* }
            }
        }

        impl Upsert for $name {
            fn table(&self) -> Table {
                $table
            }

            fn id(&self) -> RowId {
                self.id
            }

            fn assignments(&self) -> Result<Vec<Assignment>, PatchError> {
                let mut out = Vec::new();
                $(
                    if let Some(value) = &self.$field {
                        let value = match value {
                            Some(value) => $conv(value).map_err(|source| PatchError {
                                column: $column,
                                source,
                            })?,
                            None => FieldValue::Null,
                        };
                        out.push(Assignment { column: $column, value });
                    }
                )*
                Ok(out)
            }

            fn has_changes(&self) -> bool {
                false $( || self.$field.is_some() )*
            }
        }
    };
}

upsert_payload! {
    TeamUpsert => Table::Teams, {
        name: String => "name" via text,
        jira_project: String => "jira_project" via text,
        feature_team: String => "feature_team" via text,
        issue_type: String => "issue_type" via text,
    }
}

upsert_payload! {
    SprintUpsert => Table::Sprints, {
        code: String => "code" via text,
        start: String => "start_date" via text,
        end: String => "end_date" via text,
    }
}

upsert_payload! {
    FunctionUpsert => Table::Functions, {
        name: String => "name" via text,
        color: String => "color" via text,
    }
}

upsert_payload! {
    EmployeeUpsert => Table::Employees, {
        name: String => "name" via text,
        color: String => "color" via text,
    }
}

upsert_payload! {
    ResourceUpsert => Table::Resources, {
        #[serde(alias = "team")]
        team_ids: Vec<RowId> => "team_ids" via json,
        function_id: RowId => "function_id" via row_id,
        employee_id: RowId => "employee_id" via row_id,
        weeks: Vec<f64> => "weeks" via json,
        display_order: i64 => "display_order" via integer,
        prev: RowId => "prev_id" via row_id,
        next: RowId => "next_id" via row_id,
    }
}

upsert_payload! {
    TaskUpsert => Table::Tasks, {
        status: TaskStatus => "status" via status,
        sprints_auto: Vec<String> => "sprints_auto" via json,
        epic: String => "epic" via text,
        #[serde(rename = "task")]
        task_name: String => "task_name" via text,
        team_id: RowId => "team_id" via row_id,
        function_id: RowId => "function_id" via row_id,
        employee_id: RowId => "employee_id" via row_id,
        plan_empl: f64 => "plan_empl" via real,
        plan_weeks: f64 => "plan_weeks" via real,
        blocker_ids: Vec<RowId> => "blocker_ids" via json,
        week_blockers: Vec<i64> => "week_blockers" via json,
        fact: f64 => "fact" via real,
        start_week: i64 => "start_week" via integer,
        end_week: i64 => "end_week" via integer,
        expected_start_week: i64 => "expected_start_week" via integer,
        manual_edited: bool => "manual_edited" via flag,
        auto_plan_enabled: bool => "auto_plan_enabled" via flag,
        weeks: Vec<f64> => "weeks" via json,
        display_order: i64 => "display_order" via integer,
        prev: RowId => "prev_id" via row_id,
        next: RowId => "next_id" via row_id,
    }
}
