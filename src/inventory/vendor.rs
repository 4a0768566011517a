//! Manufacturer normalization.
//!
//! Detection tools often leave the manufacturer blank for CPUs, disks and GPUs
//! while the model string names the vendor outright ("Samsung SSD 970 EVO",
//! "NVIDIA Corporation GA102 [10de:2206]"). The normalizer fills the gap from an
//! optional PCI vendor table (the system `pci.ids` file) and from substring
//! heuristics per component type. It holds no state beyond the loaded table.

use crate::core::config::VendorConfig;
use crate::inventory::model::ComponentType;
use regex::Regex;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Manufacturers longer than this are considered informative and kept as-is.
const INFORMATIVE_MANUFACTURER_LEN: usize = 2;

static PCI_ID_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\[([0-9a-f]{4}):([0-9a-f]{4})\]").expect("PCI id pattern is valid")
});

/// Vendor names parsed from a `pci.ids` database, keyed by lowercase four-digit id.
#[derive(Debug, Clone, Default)]
pub struct PciIdTable {
    vendors: HashMap<String, String>,
}

impl PciIdTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse the `pci.ids` text format.
    ///
    /// Vendor lines start at column 0 (`8086  Intel Corporation`). Indented
    /// device and subsystem lines, class headers (`C 03  Display controller`)
    /// and comments carry no vendor and are skipped.
    pub fn parse(text: &str) -> Self {
        let vendors = text
            .lines()
            .filter(|line| !line.starts_with('\t') && !line.starts_with('#'))
            .filter_map(|line| split_id_line(line.trim_end()))
            .map(|(id, name)| (id, name.to_string()))
            .collect();
        Self { vendors }
    }

    /// Load the first readable file in `paths`; an empty table if none is found.
    pub fn load_first(paths: &[PathBuf]) -> Self {
        for path in paths {
            if !path.is_file() {
                continue;
            }
            match fs::read(path) {
                Ok(bytes) => {
                    let table = Self::parse(&String::from_utf8_lossy(&bytes));
                    debug!(
                        path = %path.display(),
                        vendors = table.vendor_count(),
                        "loaded PCI id table"
                    );
                    return table;
                }
                Err(e) => warn!(path = %path.display(), error = %e, "unreadable pci.ids file, skipping"),
            }
        }
        warn!("no pci.ids file found; manufacturer detection limited to model heuristics");
        Self::empty()
    }

    pub fn vendor_name(&self, vendor_id: &str) -> Option<&str> {
        let key = normalize_id(vendor_id)?;
        self.vendors.get(&key).map(String::as_str)
    }

    pub fn vendor_count(&self) -> usize {
        self.vendors.len()
    }
}

fn split_id_line(line: &str) -> Option<(String, &str)> {
    let (id, name) = line.split_once(' ')?;
    if id.len() != 4 || !id.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    Some((id.to_ascii_lowercase(), name.trim()))
}

/// Lowercase and left-pad a hex id to four digits.
fn normalize_id(id: &str) -> Option<String> {
    let id = id.trim();
    if id.is_empty() || id.len() > 4 {
        return None;
    }
    Some(format!("{:0>4}", id.to_ascii_lowercase()))
}

/// Extract the vendor half of a `[vvvv:dddd]` PCI id embedded in a device string.
pub fn extract_vendor_id(device_string: &str) -> Option<String> {
    PCI_ID_PATTERN
        .captures(device_string)
        .map(|caps| caps[1].to_ascii_lowercase())
}

#[derive(Debug, Clone)]
pub struct ManufacturerNormalizer {
    table: PciIdTable,
    enabled: bool,
}

impl ManufacturerNormalizer {
    pub fn new(table: PciIdTable) -> Self {
        Self {
            table,
            enabled: true,
        }
    }

    /// A normalizer that returns manufacturers unchanged.
    pub fn disabled() -> Self {
        Self {
            table: PciIdTable::empty(),
            enabled: false,
        }
    }

    pub fn from_config(config: &VendorConfig) -> Self {
        if !config.enrich {
            return Self::disabled();
        }
        Self::new(PciIdTable::load_first(&config.pci_ids_paths))
    }

    /// True when `manufacturer` is too short to be informative.
    pub fn needs_enrichment(manufacturer: &str) -> bool {
        manufacturer.trim().chars().count() <= INFORMATIVE_MANUFACTURER_LEN
    }

    /// Best manufacturer name for a component; falls back to the trimmed input.
    pub fn normalize(&self, kind: &ComponentType, manufacturer: &str, model: &str) -> String {
        let current = manufacturer.trim();
        if !self.enabled || !Self::needs_enrichment(current) {
            return current.to_string();
        }

        if let Some(vendor_id) = extract_vendor_id(model)
            && let Some(name) = self.table.vendor_name(&vendor_id)
        {
            return name.to_string();
        }

        match heuristic_manufacturer(kind, model) {
            Some(name) => name.to_string(),
            None => current.to_string(),
        }
    }
}

fn heuristic_manufacturer(kind: &ComponentType, model: &str) -> Option<&'static str> {
    let model = model.to_lowercase();
    let has = |needle: &str| model.contains(needle);

    match kind {
        ComponentType::Gpu => {
            // "ati" also occurs inside "Corporation", so Intel is checked first.
            if has("nvidia") || has("geforce") || has("quadro") || has("tesla") {
                Some("NVIDIA Corporation")
            } else if has("intel") {
                Some("Intel Corporation")
            } else if has("amd") || has("radeon") || has("ati") {
                Some("Advanced Micro Devices, Inc.")
            } else {
                None
            }
        }
        ComponentType::Storage => {
            if has("samsung") {
                Some("Samsung Electronics Co Ltd")
            } else if has("western digital") || has("wd") {
                Some("Western Digital")
            } else if has("seagate") {
                Some("Seagate Technology")
            } else if has("toshiba") {
                Some("Toshiba")
            } else if has("intel") {
                Some("Intel Corporation")
            } else if has("crucial") || has("micron") {
                Some("Micron Technology")
            } else if has("kingston") {
                Some("Kingston Technology")
            } else {
                None
            }
        }
        ComponentType::Cpu => {
            if has("intel") {
                Some("Intel Corporation")
            } else if has("amd") {
                Some("Advanced Micro Devices, Inc.")
            } else if has("arm") {
                Some("ARM")
            } else {
                None
            }
        }
        _ => None,
    }
}
