//! Records of the time-tracking feed (tasks → projects → clients, time entries).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

pub const NO_CLIENT: &str = "Sans Client";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Client {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(default, deserialize_with = "opt_id_from_any")]
    pub id: Option<String>,
    #[serde(default)]
    pub month_year: Option<String>,
    #[serde(default, rename = "clients")]
    pub client: Option<Client>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(deserialize_with = "id_from_any")]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub estimated_minutes: Option<f64>,
    /// Week label within the project month, e.g. "S3". Sources send text or numbers.
    #[serde(default, deserialize_with = "opt_id_from_any")]
    pub week_number: Option<String>,
    #[serde(default, rename = "projects")]
    pub project: Option<Project>,
}

impl Task {
    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or("")
    }

    pub fn month_label(&self) -> Option<&str> {
        self.project.as_ref().and_then(|p| p.month_year.as_deref())
    }

    pub fn week_label(&self) -> &str {
        self.week_number.as_deref().unwrap_or("")
    }

    pub fn client_id(&self) -> Option<&str> {
        self.project
            .as_ref()
            .and_then(|p| p.client.as_ref())
            .map(|c| c.id.as_str())
    }

    pub fn client_name(&self) -> &str {
        self.project
            .as_ref()
            .and_then(|p| p.client.as_ref())
            .and_then(|c| c.name.as_deref())
            .filter(|n| !n.trim().is_empty())
            .unwrap_or(NO_CLIENT)
    }

    pub fn progress_value(&self) -> f64 {
        self.progress.unwrap_or(0.0)
    }

    pub fn estimated(&self) -> f64 {
        self.estimated_minutes.unwrap_or(0.0)
    }
}

/// A persisted slice of tracked work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub user_id: String,
    pub client_id: String,
    pub task_id: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

fn id_from_any<'de, D>(de: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Value::deserialize(de)?;
    Ok(match v {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

fn opt_id_from_any<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let v = Option::<Value>::deserialize(de)?;
    Ok(match v {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_deserializes_embedded_project() {
        let t: Task = serde_json::from_value(json!({
            "id": 42,
            "title": "Audit SEO",
            "progress": 50,
            "completed": false,
            "estimated_minutes": 90,
            "week_number": "S2",
            "projects": {
                "id": "p1",
                "month_year": "Mars 2025",
                "clients": { "id": "c1", "name": "Acme", "user_id": "u1" }
            }
        }))
        .unwrap();

        assert_eq!(t.id, "42");
        assert_eq!(t.month_label(), Some("Mars 2025"));
        assert_eq!(t.week_label(), "S2");
        assert_eq!(t.client_id(), Some("c1"));
        assert_eq!(t.client_name(), "Acme");
        assert_eq!(t.estimated(), 90.0);
    }

    #[test]
    fn task_without_project_falls_back() {
        let t: Task = serde_json::from_value(json!({
            "id": "t1",
            "week_number": 3,
            "estimated_minutes": null
        }))
        .unwrap();

        assert_eq!(t.week_label(), "3");
        assert_eq!(t.client_name(), NO_CLIENT);
        assert_eq!(t.client_id(), None);
        assert_eq!(t.estimated(), 0.0);
        assert_eq!(t.progress_value(), 0.0);
    }
}
