//! Task tools exposed to the language model.
//!
//! The catalog is a closed set: `ToolName` is the only way to name a tool and
//! dispatch is an exhaustive match. Every call runs as the authenticated
//! owner regardless of what the arguments say.

use serde_json::{json, Map, Value};
use thiserror::Error;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Task, TaskStatusFilter, ToolCallRecord, ToolDefinition, ToolInvocation, ToolResult};
use crate::domain::ports::{TaskFilter, TaskRepository};
use crate::services::task_service::TaskService;

/// Argument keys a model may use to name an owner.
const OWNER_KEYS: [&str; 3] = ["user_id", "owner_id", "owner"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolName {
    AddTask,
    ListTasks,
    CompleteTask,
    DeleteTask,
    UpdateTask,
}

impl ToolName {
    pub const ALL: [Self; 5] = [
        Self::AddTask,
        Self::ListTasks,
        Self::CompleteTask,
        Self::DeleteTask,
        Self::UpdateTask,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AddTask => "add_task",
            Self::ListTasks => "list_tasks",
            Self::CompleteTask => "complete_task",
            Self::DeleteTask => "delete_task",
            Self::UpdateTask => "update_task",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "add_task" => Some(Self::AddTask),
            "list_tasks" => Some(Self::ListTasks),
            "complete_task" => Some(Self::CompleteTask),
            "delete_task" => Some(Self::DeleteTask),
            "update_task" => Some(Self::UpdateTask),
            _ => None,
        }
    }

    const fn description(self) -> &'static str {
        match self {
            Self::AddTask => "Create a new task for the user",
            Self::ListTasks => "Retrieve all tasks or filter by status (pending/completed), newest first",
            Self::CompleteTask => "Mark a task as completed",
            Self::DeleteTask => "Delete a task permanently",
            Self::UpdateTask => "Update task title and/or description",
        }
    }

    fn parameters(self) -> Value {
        let task_id = json!({"type": "integer", "description": "ID of the task"});
        match self {
            Self::AddTask => json!({
                "type": "object",
                "properties": {
                    "title": {"type": "string", "description": "Task title (required, at most 200 characters)"},
                    "description": {"type": "string", "description": "Task description (optional)"}
                },
                "required": ["title"]
            }),
            Self::ListTasks => json!({
                "type": "object",
                "properties": {
                    "status": {
                        "type": "string",
                        "enum": ["all", "pending", "completed"],
                        "description": "Filter by status (default: all)"
                    }
                },
                "required": []
            }),
            Self::CompleteTask | Self::DeleteTask => json!({
                "type": "object",
                "properties": {"task_id": task_id},
                "required": ["task_id"]
            }),
            Self::UpdateTask => json!({
                "type": "object",
                "properties": {
                    "task_id": task_id,
                    "title": {"type": "string", "description": "New title (optional)"},
                    "description": {"type": "string", "description": "New description (optional)"}
                },
                "required": ["task_id"]
            }),
        }
    }

    pub fn definition(self) -> ToolDefinition {
        ToolDefinition {
            name: self.as_str().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("tool {0} does not round-trip through its wire name")]
    NameMismatch(&'static str),
    #[error("duplicate tool name: {0}")]
    DuplicateName(&'static str),
    #[error("tool {0} does not declare an object parameter schema")]
    InvalidSchema(&'static str),
}

/// Check the catalog is internally consistent. Run once at startup.
pub fn verify() -> Result<(), CatalogError> {
    let mut seen = std::collections::HashSet::new();
    for tool in ToolName::ALL {
        let name = tool.as_str();
        if ToolName::from_str(name) != Some(tool) {
            return Err(CatalogError::NameMismatch(name));
        }
        if !seen.insert(name) {
            return Err(CatalogError::DuplicateName(name));
        }
        let schema = tool.parameters();
        if schema.get("type").and_then(Value::as_str) != Some("object") || !schema["properties"].is_object() {
            return Err(CatalogError::InvalidSchema(name));
        }
    }
    Ok(())
}

/// Executes tool invocations against the task service.
pub struct ToolCatalog<T: TaskRepository> {
    tasks: TaskService<T>,
}

impl<T: TaskRepository> ToolCatalog<T> {
    pub fn new(tasks: TaskService<T>) -> Self {
        Self { tasks }
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        ToolName::ALL.iter().map(|t| t.definition()).collect()
    }

    /// Run one invocation as `owner`. Failures become error results, never `Err`.
    pub async fn execute(&self, owner: &str, invocation: &ToolInvocation) -> (ToolCallRecord, ToolResult) {
        let outcome = match ToolName::from_str(&invocation.name) {
            Some(tool) => self.dispatch(owner, tool, &invocation.arguments).await,
            None => Err(DomainError::InvalidInput(format!("Unknown tool: {}", invocation.name))),
        };

        let (content, is_error) = match outcome {
            Ok(value) => {
                tracing::info!(owner, tool = %invocation.name, "tool executed");
                (value, false)
            }
            Err(err) => {
                tracing::warn!(owner, tool = %invocation.name, error = %err, "tool failed");
                (error_result(&err), true)
            }
        };

        let record = ToolCallRecord {
            tool: invocation.name.clone(),
            arguments: invocation.arguments.clone(),
            result: content.clone(),
        };
        let result = ToolResult {
            invocation_id: invocation.id.clone(),
            name: invocation.name.clone(),
            content,
            is_error,
        };
        (record, result)
    }

    async fn dispatch(&self, owner: &str, tool: ToolName, arguments: &Value) -> DomainResult<Value> {
        let args = arguments_object(arguments)?;
        check_owner(args, owner)?;

        match tool {
            ToolName::AddTask => {
                let title = required_str(args, "title")?;
                let description = optional_str(args, "description")?;
                let task = self.tasks.create(owner, title, description).await?;
                Ok(status_result(&task, "created"))
            }
            ToolName::ListTasks => {
                let status = match optional_str(args, "status")? {
                    Some(raw) => TaskStatusFilter::from_str(raw).ok_or_else(|| {
                        DomainError::InvalidInput(format!(
                            "Invalid status filter '{raw}'; expected all, pending or completed"
                        ))
                    })?,
                    None => TaskStatusFilter::All,
                };
                let tasks = self
                    .tasks
                    .list(owner, TaskFilter { status, ..Default::default() })
                    .await?;
                Ok(Value::Array(tasks.iter().map(task_summary).collect()))
            }
            ToolName::CompleteTask => {
                let task = self.tasks.set_completed(owner, task_id(args)?, true).await?;
                Ok(status_result(&task, "completed"))
            }
            ToolName::DeleteTask => {
                let task = self.tasks.delete(owner, task_id(args)?).await?;
                Ok(status_result(&task, "deleted"))
            }
            ToolName::UpdateTask => {
                let id = task_id(args)?;
                let title = optional_str(args, "title")?;
                let description = optional_str(args, "description")?;
                let task = self.tasks.update(owner, id, title, description).await?;
                Ok(status_result(&task, "updated"))
            }
        }
    }
}

fn error_result(err: &DomainError) -> Value {
    json!({
        "error": true,
        "kind": err.kind(),
        "message": err.public_message(),
    })
}

fn status_result(task: &Task, status: &str) -> Value {
    json!({"id": task.id, "status": status, "title": task.title})
}

fn task_summary(task: &Task) -> Value {
    json!({
        "id": task.id,
        "title": task.title,
        "description": task.description,
        "completed": task.completed,
        "created_at": task.created_at,
        "updated_at": task.updated_at,
    })
}

static EMPTY_ARGS: std::sync::LazyLock<Map<String, Value>> = std::sync::LazyLock::new(Map::new);

fn arguments_object(arguments: &Value) -> DomainResult<&Map<String, Value>> {
    match arguments {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(&EMPTY_ARGS),
        other => Err(DomainError::InvalidInput(format!(
            "Tool arguments must be a JSON object, got {other}"
        ))),
    }
}

/// An owner named in the arguments must be the caller.
fn check_owner(args: &Map<String, Value>, owner: &str) -> DomainResult<()> {
    for key in OWNER_KEYS {
        let claimed = match args.get(key) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        if claimed != owner {
            return Err(DomainError::Unauthorized(
                "Tools can only act on the authenticated user's tasks".to_string(),
            ));
        }
    }
    Ok(())
}

/// `task_id` (or `id`) as an integer, an integral float or a numeric string.
fn task_id(args: &Map<String, Value>) -> DomainResult<i64> {
    let raw = args
        .get("task_id")
        .or_else(|| args.get("id"))
        .filter(|v| !v.is_null())
        .ok_or_else(|| DomainError::InvalidInput("task_id is required".to_string()))?;

    let invalid = || DomainError::InvalidInput(format!("task_id must be an integer, got {raw}"));

    match raw {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < 9.0e15)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(invalid)
}

fn required_str<'a>(args: &'a Map<String, Value>, key: &str) -> DomainResult<&'a str> {
    optional_str(args, key)?.ok_or_else(|| DomainError::InvalidInput(format!("{key} is required")))
}

fn optional_str<'a>(args: &'a Map<String, Value>, key: &str) -> DomainResult<Option<&'a str>> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.as_str())),
        Some(other) => Err(DomainError::InvalidInput(format!("{key} must be a string, got {other}"))),
    }
}
