//! Campus GeoJSON annotation after emissions queries.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use pulse_analytics::QueryResult;
use pulse_core::Result;
use serde_json::{json, Value};
use tracing::{info, warn};

/// Extrusion height used for buildings not in the table.
pub const DEFAULT_HEIGHT: u32 = 15;

const BUILDING_HEIGHTS: &[(&str, u32)] = &[
    ("Large_Hostel_Boys", 35),
    ("Large_Hostel_Girls", 35),
    ("Academic_Block_Large", 25),
    ("Academic_Block_Small", 20),
    ("Library", 22),
    ("Boys_Mess", 15),
    ("Girls_Mess", 15),
    ("Canteen", 12),
    ("Clinic", 12),
    ("Sports_Complex", 18),
    ("Small_Hostel_Boys", 25),
    ("Small_Hostel_Girls", 25),
];

pub fn building_height(name: &str) -> u32 {
    BUILDING_HEIGHTS
        .iter()
        .find(|(building, _)| *building == name)
        .map(|(_, h)| *h)
        .unwrap_or(DEFAULT_HEIGHT)
}

/// Write `name`, `height` and, where a result exists, `carbon` and
/// `heatLevel` into every feature's properties. Returns the number of
/// features that received live data.
pub fn annotate(geojson: &mut Value, result: &QueryResult) -> usize {
    let live: HashMap<&str, (f64, f64)> = result
        .results
        .iter()
        .map(|r| {
            (
                r.building_id.as_str(),
                (r.total_emission, r.scaled_emission),
            )
        })
        .collect();

    let Some(features) = geojson.get_mut("features").and_then(Value::as_array_mut) else {
        return 0;
    };

    let mut updated = 0;
    for feature in features {
        let Some(props) = feature
            .get_mut("properties")
            .and_then(Value::as_object_mut)
        else {
            continue;
        };

        let name = props
            .get("Name")
            .or_else(|| props.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);

        props.insert("name".into(), json!(name));
        props.insert(
            "height".into(),
            json!(name.as_deref().map(building_height).unwrap_or(DEFAULT_HEIGHT)),
        );

        if let Some((carbon, heat)) = name.as_deref().and_then(|n| live.get(n)) {
            props.insert("carbon".into(), json!(carbon));
            props.insert("heatLevel".into(), json!(heat));
            updated += 1;
        }
    }
    updated
}

/// Annotate the map file in place. A missing file is skipped with a warning.
///
/// The new content is written next to the file and renamed over it, so
/// readers see either the old map or the new one. Callers sharing a file
/// must serialize calls; see [`MapAnnotator`].
pub fn update_map_file(path: &Path, result: &QueryResult) -> Result<usize> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!("Map file {} not found, skipping annotation", path.display());
            return Ok(0);
        }
        Err(e) => return Err(e.into()),
    };

    let mut geojson: Value = serde_json::from_str(&raw)?;
    let updated = annotate(&mut geojson, result);

    let tmp = tmp_path(path);
    std::fs::write(&tmp, serde_json::to_string_pretty(&geojson)?)?;
    std::fs::rename(&tmp, path)?;

    info!(
        "Map annotated: {} buildings updated for hour {}",
        updated, result.hour
    );
    Ok(updated)
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}

/// Owner of the campus map file. One annotation at a time.
#[derive(Debug)]
pub struct MapAnnotator {
    path: PathBuf,
    lock: Mutex<()>,
}

impl MapAnnotator {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Blocking; call from a blocking thread.
    pub fn update(&self, result: &QueryResult) -> Result<usize> {
        let _guard = self.lock.lock();
        update_map_file(&self.path, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_analytics::BuildingEmission;

    fn result() -> QueryResult {
        QueryResult {
            hour: 9,
            results: vec![BuildingEmission {
                building_id: "Library".into(),
                total_emission: 42.5,
                scaled_emission: 80.0,
            }],
        }
    }

    fn map() -> Value {
        json!({
            "type": "FeatureCollection",
            "features": [
                { "type": "Feature", "properties": { "Name": "Library" }, "geometry": null },
                { "type": "Feature", "properties": { "name": "Canteen" }, "geometry": null },
                { "type": "Feature", "properties": { "Name": "Observatory" }, "geometry": null },
                { "type": "Feature", "properties": {}, "geometry": null }
            ]
        })
    }

    #[test]
    fn test_heights_and_live_data() {
        let mut geojson = map();
        assert_eq!(annotate(&mut geojson, &result()), 1);

        let props = |i: usize| geojson["features"][i]["properties"].clone();
        assert_eq!(props(0)["name"], "Library");
        assert_eq!(props(0)["height"], 22);
        assert_eq!(props(0)["carbon"], 42.5);
        assert_eq!(props(0)["heatLevel"], 80.0);

        assert_eq!(props(1)["name"], "Canteen");
        assert_eq!(props(1)["height"], 12);
        assert!(props(1).get("carbon").is_none());

        assert_eq!(props(2)["height"], DEFAULT_HEIGHT);
        assert!(props(3)["name"].is_null());
        assert_eq!(props(3)["height"], DEFAULT_HEIGHT);
    }

    #[test]
    fn test_missing_file_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campus.json");
        assert_eq!(update_map_file(&path, &result()).unwrap(), 0);
        assert!(!path.exists());
    }

    #[test]
    fn test_file_rewritten_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campus.json");
        std::fs::write(&path, map().to_string()).unwrap();

        assert_eq!(update_map_file(&path, &result()).unwrap(), 1);
        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["features"][0]["properties"]["carbon"], 42.5);
        assert!(!dir.path().join("campus.json.tmp").exists());
    }

    #[test]
    fn test_concurrent_annotations_keep_file_intact() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("campus.json");
        let features: Vec<Value> = (0..2000)
            .map(|i| json!({ "type": "Feature", "properties": { "Name": format!("Block_{}", i) } }))
            .chain(std::iter::once(
                json!({ "type": "Feature", "properties": { "Name": "Library" } }),
            ))
            .collect();
        std::fs::write(
            &path,
            json!({ "type": "FeatureCollection", "features": features }).to_string(),
        )
        .unwrap();

        let annotator = MapAnnotator::new(&path);
        let failures = std::sync::atomic::AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    for _ in 0..20 {
                        if annotator.update(&result()).map_or(true, |n| n != 1) {
                            failures.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        assert_eq!(failures.into_inner(), 0);
        let written: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["features"].as_array().unwrap().len(), 2001);
        assert_eq!(written["features"][2000]["properties"]["heatLevel"], 80.0);
    }
}
