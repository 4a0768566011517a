//! Domain types shared by the ingestor, reconciliation engine, store and query service.

use crate::core::error::InventoryError;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

pub type SystemId = i64;
pub type ComponentId = i64;

/// Hardware part category. Open to extension through `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ComponentType {
    Cpu,
    Memory,
    Storage,
    Gpu,
    Motherboard,
    Other(String),
}

impl ComponentType {
    pub fn as_str(&self) -> &str {
        match self {
            ComponentType::Cpu => "cpu",
            ComponentType::Memory => "memory",
            ComponentType::Storage => "storage",
            ComponentType::Gpu => "gpu",
            ComponentType::Motherboard => "motherboard",
            ComponentType::Other(name) => name,
        }
    }

    /// Parse user input; unknown names become `Other`, blank input is rejected.
    pub fn parse(input: &str) -> Result<Self, InventoryError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(InventoryError::ValidationError(
                "component type must not be empty".to_string(),
            ));
        }
        Ok(Self::from(trimmed.to_ascii_lowercase()))
    }
}

impl From<String> for ComponentType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "cpu" => ComponentType::Cpu,
            "memory" => ComponentType::Memory,
            "storage" => ComponentType::Storage,
            "gpu" => ComponentType::Gpu,
            "motherboard" => ComponentType::Motherboard,
            _ => ComponentType::Other(value),
        }
    }
}

impl From<ComponentType> for String {
    fn from(value: ComponentType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for ComponentType {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ComponentType {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        String::column_result(value).map(ComponentType::from)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Installed,
    Spare,
    Retired,
}

impl ComponentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentStatus::Installed => "installed",
            ComponentStatus::Spare => "spare",
            ComponentStatus::Retired => "retired",
        }
    }
}

impl FromStr for ComponentStatus {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "installed" => Ok(ComponentStatus::Installed),
            "spare" => Ok(ComponentStatus::Spare),
            "retired" => Ok(ComponentStatus::Retired),
            other => Err(InventoryError::ValidationError(format!(
                "invalid status '{}': expected installed, spare or retired",
                other
            ))),
        }
    }
}

impl fmt::Display for ComponentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ToSql for ComponentStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ComponentStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = value.as_str()?;
        raw.parse::<ComponentStatus>()
            .map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct System {
    pub id: SystemId,
    pub hostname: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub uuid: String,
    pub last_scan: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    pub id: ComponentId,
    pub component_type: ComponentType,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: Option<String>,
    /// Type-specific detail exactly as detected; never interpreted by the ledger.
    pub specifications: Option<JsonValue>,
    pub status: ComponentStatus,
    pub location: Option<String>,
    pub notes: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSummary {
    #[serde(flatten)]
    pub system: System,
    pub component_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemDetail {
    #[serde(flatten)]
    pub system: System,
    pub components: Vec<Component>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentFilter {
    pub component_type: Option<ComponentType>,
    pub status: Option<ComponentStatus>,
}

/// Hand-entered spare part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSpare {
    pub component_type: ComponentType,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

/// Administrative edit; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentEdit {
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub status: Option<ComponentStatus>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeStatusCount {
    pub component_type: ComponentType,
    pub status: ComponentStatus,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryStats {
    pub system_count: i64,
    pub component_counts: Vec<TypeStatusCount>,
}

impl InventoryStats {
    pub fn count(&self, component_type: &ComponentType, status: ComponentStatus) -> i64 {
        self.component_counts
            .iter()
            .find(|c| &c.component_type == component_type && c.status == status)
            .map(|c| c.count)
            .unwrap_or(0)
    }
}

/// Treat blank strings as absent.
pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}
