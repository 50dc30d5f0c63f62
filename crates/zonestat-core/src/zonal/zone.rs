use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::error::{Result, ZonestatError};

use super::geometry::{GeoJsonGeometry, MultiPolygon};

/// Stable administrative code identifying a zone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ZoneCode(pub i64);

impl std::fmt::Display for ZoneCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Display metadata of a zone, attached to output rows by key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ZoneMeta {
    pub code: ZoneCode,
    pub name: String,
    pub parent: String,
}

/// Administrative polygon used as the aggregation unit.
#[derive(Clone, Debug, PartialEq)]
pub struct Zone {
    pub code: ZoneCode,
    pub name: String,
    /// Name of the enclosing region (e.g. province).
    pub parent: String,
    pub geometry: MultiPolygon,
}

impl Zone {
    pub fn new(
        code: i64,
        name: impl Into<String>,
        parent: impl Into<String>,
        geometry: impl Into<MultiPolygon>,
    ) -> Self {
        Self {
            code: ZoneCode(code),
            name: name.into(),
            parent: parent.into(),
            geometry: geometry.into(),
        }
    }

    pub fn meta(&self) -> ZoneMeta {
        ZoneMeta {
            code: self.code,
            name: self.name.clone(),
            parent: self.parent.clone(),
        }
    }
}

/// Property names holding zone identity in the boundary source.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneFields {
    pub code: String,
    pub name: String,
    pub parent: String,
}

impl Default for ZoneFields {
    fn default() -> Self {
        Self {
            code: "ADM2_CODE".to_string(),
            name: "ADM2_NAME".to_string(),
            parent: "ADM1_NAME".to_string(),
        }
    }
}

#[derive(Deserialize)]
struct FeatureCollection {
    features: Vec<Feature>,
}

#[derive(Deserialize)]
struct Feature {
    #[serde(default)]
    properties: Option<Map<String, Value>>,
    geometry: Option<GeoJsonGeometry>,
}

/// Load zones from a GeoJSON FeatureCollection file.
pub fn load_zones(path: &Path, fields: &ZoneFields) -> Result<Vec<Zone>> {
    let contents = std::fs::read_to_string(path)?;
    let zones = parse_zones(&contents, fields)?;
    info!(path = %path.display(), zones = zones.len(), "Loaded zones");
    Ok(zones)
}

/// Parse zones from GeoJSON text. Features without geometry are skipped.
pub fn parse_zones(json: &str, fields: &ZoneFields) -> Result<Vec<Zone>> {
    let collection: FeatureCollection = serde_json::from_str(json)?;
    let mut zones = Vec::with_capacity(collection.features.len());

    for (index, feature) in collection.features.into_iter().enumerate() {
        let props = feature.properties.unwrap_or_default();
        let Some(geometry) = feature.geometry else {
            warn!(index, "Skipping feature without geometry");
            continue;
        };
        let code = props
            .get(&fields.code)
            .and_then(code_value)
            .ok_or_else(|| {
                ZonestatError::InvalidGeometry(format!(
                    "feature {index} has no integer '{}' property",
                    fields.code
                ))
            })?;
        zones.push(Zone {
            code: ZoneCode(code),
            name: text_value(props.get(&fields.name)),
            parent: text_value(props.get(&fields.parent)),
            geometry: geometry.into_multipolygon()?,
        });
    }

    Ok(zones)
}

fn code_value(v: &Value) -> Option<i64> {
    match v {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn text_value(v: Option<&Value>) -> String {
    match v {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}
