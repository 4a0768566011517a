//! Snapshot ingestion.
//!
//! A detection agent reports one JSON document per host. `ingest` validates the
//! two required fields once and flattens the optional hardware sections into
//! uniform [`CandidateComponent`]s through a table of per-kind extractors.
//! Nothing downstream re-checks field presence.

use crate::core::error::InventoryError;
use crate::inventory::model::{ComponentType, non_blank};
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value as JsonValue};

type Section = Map<String, JsonValue>;

/// Raw agent report. Every field is optional at this layer; `ingest` decides what is required.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSnapshot {
    #[serde(default, deserialize_with = "lenient_string")]
    pub hostname: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub detection_date: Option<String>,
    #[serde(default)]
    pub system: Option<RawSystem>,
    #[serde(default)]
    pub cpu: Option<Section>,
    #[serde(default)]
    pub memory: Option<RawMemory>,
    #[serde(default, deserialize_with = "entries")]
    pub storage: Vec<JsonValue>,
    #[serde(default, deserialize_with = "entries")]
    pub gpu: Vec<JsonValue>,
    #[serde(default)]
    pub motherboard: Option<Section>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawSystem {
    #[serde(default, deserialize_with = "lenient_string")]
    pub manufacturer: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub product: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub serial: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMemory {
    #[serde(default, deserialize_with = "entries")]
    pub slots: Vec<JsonValue>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SystemMeta {
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
    pub uuid: String,
}

/// One observed part, ready for identity resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateComponent {
    pub kind: ComponentType,
    pub manufacturer: String,
    pub model: String,
    pub serial: Option<String>,
    pub specs: JsonValue,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSnapshot {
    pub hostname: String,
    pub detection_date: String,
    pub system: SystemMeta,
    pub components: Vec<CandidateComponent>,
}

type Extractor = fn(&RawSnapshot) -> Vec<CandidateComponent>;

/// Extraction order is also link order: cpu, memory, storage, gpu, motherboard.
const EXTRACTORS: [Extractor; 5] = [
    extract_cpu,
    extract_memory,
    extract_storage,
    extract_gpu,
    extract_motherboard,
];

pub fn ingest(raw: &RawSnapshot) -> Result<NormalizedSnapshot, InventoryError> {
    let hostname = non_blank(raw.hostname.as_deref()).ok_or_else(|| {
        InventoryError::MalformedSnapshot("missing required field 'hostname'".to_string())
    })?;
    let detection_date = non_blank(raw.detection_date.as_deref()).ok_or_else(|| {
        InventoryError::MalformedSnapshot("missing required field 'detection_date'".to_string())
    })?;

    let system = raw
        .system
        .as_ref()
        .map(|s| SystemMeta {
            manufacturer: s.manufacturer.clone().unwrap_or_default(),
            model: s.product.clone().unwrap_or_default(),
            serial_number: s.serial.clone().unwrap_or_default(),
            uuid: s.uuid.clone().unwrap_or_default(),
        })
        .unwrap_or_default();

    let components = EXTRACTORS
        .iter()
        .flat_map(|extract| extract(raw))
        .collect();

    Ok(NormalizedSnapshot {
        hostname,
        detection_date,
        system,
        components,
    })
}

/// Parse agent JSON and ingest it. Unparseable input is a malformed snapshot too.
pub fn ingest_json(text: &str) -> Result<NormalizedSnapshot, InventoryError> {
    let raw: RawSnapshot = serde_json::from_str(text)
        .map_err(|e| InventoryError::MalformedSnapshot(format!("invalid snapshot JSON: {}", e)))?;
    ingest(&raw)
}

fn extract_cpu(raw: &RawSnapshot) -> Vec<CandidateComponent> {
    let Some(cpu) = raw.cpu.as_ref() else {
        return Vec::new();
    };
    let Some(model) = field(cpu, "model") else {
        return Vec::new();
    };
    vec![CandidateComponent {
        kind: ComponentType::Cpu,
        manufacturer: String::new(),
        model,
        serial: None,
        specs: JsonValue::Object(cpu.clone()),
    }]
}

fn extract_memory(raw: &RawSnapshot) -> Vec<CandidateComponent> {
    let Some(memory) = raw.memory.as_ref() else {
        return Vec::new();
    };
    memory
        .slots
        .iter()
        .filter_map(JsonValue::as_object)
        .filter_map(|slot| {
            let size = field(slot, "size")?;
            if size.contains("No Module") {
                return None;
            }
            let mem_type = field(slot, "type").unwrap_or_else(|| "Memory".to_string());
            Some(CandidateComponent {
                kind: ComponentType::Memory,
                manufacturer: field(slot, "manufacturer").unwrap_or_default(),
                model: format!("{} {}", mem_type, size),
                serial: field(slot, "part_number"),
                specs: JsonValue::Object(slot.clone()),
            })
        })
        .collect()
}

fn extract_storage(raw: &RawSnapshot) -> Vec<CandidateComponent> {
    raw.storage
        .iter()
        .filter_map(JsonValue::as_object)
        .filter_map(|disk| {
            Some(CandidateComponent {
                kind: ComponentType::Storage,
                manufacturer: String::new(),
                model: field(disk, "model")?,
                serial: field(disk, "serial"),
                specs: JsonValue::Object(disk.clone()),
            })
        })
        .collect()
}

fn extract_gpu(raw: &RawSnapshot) -> Vec<CandidateComponent> {
    raw.gpu
        .iter()
        .filter_map(JsonValue::as_object)
        .filter_map(|gpu| {
            Some(CandidateComponent {
                kind: ComponentType::Gpu,
                manufacturer: String::new(),
                model: field(gpu, "device")?,
                serial: None,
                specs: JsonValue::Object(gpu.clone()),
            })
        })
        .collect()
}

fn extract_motherboard(raw: &RawSnapshot) -> Vec<CandidateComponent> {
    let Some(board) = raw.motherboard.as_ref() else {
        return Vec::new();
    };
    let Some(model) = field(board, "product") else {
        return Vec::new();
    };
    vec![CandidateComponent {
        kind: ComponentType::Motherboard,
        manufacturer: field(board, "manufacturer").unwrap_or_default(),
        model,
        serial: field(board, "serial"),
        specs: JsonValue::Object(board.clone()),
    }]
}

/// Read a scalar field as trimmed text; blank, null and structured values are absent.
fn field(section: &Section, key: &str) -> Option<String> {
    match section.get(key)? {
        JsonValue::String(s) => non_blank(Some(s.as_str())),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// A list section where `null` means "nothing detected". Entries stay untyped so the
/// extractors can skip ones that are not objects.
fn entries<'de, D>(deserializer: D) -> Result<Vec<JsonValue>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<JsonValue>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accept strings, numbers and booleans for text fields; agents are not strict about types.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<JsonValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(JsonValue::String(s)) => Some(s),
        Some(JsonValue::Number(n)) => Some(n.to_string()),
        Some(JsonValue::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}
