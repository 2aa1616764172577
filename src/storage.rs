//! Save file: one JSON record per pet.
//!
//! Reads are forgiving: every field falls back to its own default, so a
//! damaged file costs at most the damaged fields, never the startup.

use crate::appearance::{random_appearance, Appearance};
use crate::error::StorageError;
use crate::pet::{clamp01, Catchup, Needs, PetState};
use rand::Rng;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::{fs, path::Path};
use tracing::{info, warn};

pub const SNAPSHOT_VERSION: u32 = 1;

static MISSING: Value = Value::Null;

#[derive(Debug, Serialize)]
struct SnapshotOut<'a> {
    version: u32,
    hunger: f64,
    energy: f64,
    fun: f64,
    hygiene: f64,
    asleep: bool,
    alive: bool,
    death_reason: &'a str,
    last_timestamp: f64,
    appearance: &'a Appearance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadSource {
    /// No save file yet.
    Fresh,
    Snapshot,
    /// The file existed but could not be read as a record at all.
    Corrupt,
}

#[derive(Debug)]
pub struct Loaded {
    pub state: PetState,
    pub source: LoadSource,
    pub catchup: Catchup,
}

pub fn encode(state: &PetState) -> Result<String, StorageError> {
    let n = state.needs();
    let out = SnapshotOut {
        version: SNAPSHOT_VERSION,
        hunger: n.hunger,
        energy: n.energy,
        fun: n.fun,
        hygiene: n.hygiene,
        asleep: state.is_asleep(),
        alive: state.is_alive(),
        death_reason: state.death_reason(),
        last_timestamp: state.last_timestamp(),
        appearance: state.appearance(),
    };
    Ok(serde_json::to_string_pretty(&out)?)
}

fn unit(v: &Value, default: f64) -> f64 {
    v.as_f64()
        .filter(|x| x.is_finite())
        .map(clamp01)
        .unwrap_or(default)
}

// Legacy saves used camelCase keys; when both spellings are present the
// snake_case one wins.
fn field<'a>(map: &'a Map<String, Value>, key: &str, legacy: &str) -> &'a Value {
    map.get(key).or_else(|| map.get(legacy)).unwrap_or(&MISSING)
}

/// Parse a snapshot without catching up. `None` when `text` is not a record.
///
/// Each field is validated on its own, so no single field can reject the
/// whole record.
pub fn decode<R: Rng + ?Sized>(text: &str, now: f64, rng: &mut R) -> Option<PetState> {
    let value: Value = serde_json::from_str(text).ok()?;
    let map = value.as_object()?;
    let get = |key: &str| map.get(key).unwrap_or(&MISSING);

    let version = get("version").as_u64().unwrap_or(u64::from(SNAPSHOT_VERSION));
    if version > u64::from(SNAPSHOT_VERSION) {
        warn!(version, "snapshot is newer than this build; reading known fields only");
    }

    let d = Needs::default();
    let needs = Needs {
        hunger: unit(get("hunger"), d.hunger),
        energy: unit(get("energy"), d.energy),
        fun: unit(get("fun"), d.fun),
        hygiene: unit(get("hygiene"), d.hygiene),
    };
    let asleep = get("asleep").as_bool().unwrap_or(false);
    let alive = get("alive").as_bool().unwrap_or(true);
    let death_reason = if alive {
        None
    } else {
        let reason = field(map, "death_reason", "deathReason");
        Some(reason.as_str().unwrap_or_default().to_string())
    };

    let mut last_timestamp = field(map, "last_timestamp", "lastTimestamp")
        .as_f64()
        .filter(|t| t.is_finite())
        .unwrap_or(now);
    if last_timestamp > now {
        warn!(last_timestamp, now, "snapshot timestamp is in the future; using now");
        last_timestamp = now;
    }

    let appearance = Appearance::deserialize(get("appearance"))
        .unwrap_or_else(|_| random_appearance(rng));

    Some(PetState::from_parts(
        needs,
        asleep,
        death_reason,
        last_timestamp,
        appearance,
    ))
}

/// Read the save at `path` (or start fresh) and catch up to `now`.
pub fn load<R: Rng + ?Sized>(path: &Path, now: f64, rng: &mut R) -> Loaded {
    let (mut state, source) = match fs::read_to_string(path) {
        Ok(text) => match decode(&text, now, rng) {
            Some(st) => (st, LoadSource::Snapshot),
            None => {
                warn!(path = %path.display(), "save file unreadable; starting over");
                (PetState::new(now, random_appearance(rng)), LoadSource::Corrupt)
            }
        },
        Err(err) => {
            if err.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %path.display(), "could not read save file: {err}");
            }
            (PetState::new(now, random_appearance(rng)), LoadSource::Fresh)
        }
    };

    let catchup = state.apply_offline(now);
    info!(
        ?source,
        away_secs = catchup.elapsed,
        died_while_away = catchup.died,
        alive = state.is_alive(),
        "pet loaded"
    );
    Loaded {
        state,
        source,
        catchup,
    }
}

/// Bring `state` up to `now` and write it out.
pub fn save(path: &Path, state: &mut PetState, now: f64) -> Result<(), StorageError> {
    state.apply_offline(now);
    let data = encode(state)?;
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, data)?;
    fs::rename(&tmp, path)?;
    info!(path = %path.display(), "pet saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pet::STARVED;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const NOW: f64 = 1_700_000_000.0;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(1)
    }

    #[test]
    fn encode_then_decode_is_identity() {
        let mut st = PetState::new(NOW - 50.0, random_appearance(&mut rng()));
        st.play();
        st.toggle_sleep();
        st.apply_offline(NOW);
        let text = encode(&st).expect("encode");
        let back = decode(&text, NOW, &mut rng()).expect("decode");
        assert_eq!(back, st);
    }

    #[test]
    fn dead_pet_keeps_reason() {
        let st = PetState::from_parts(
            Needs::default(),
            false,
            Some(STARVED.into()),
            NOW,
            Appearance::default(),
        );
        let back = decode(&encode(&st).expect("encode"), NOW, &mut rng()).expect("decode");
        assert!(!back.is_alive());
        assert_eq!(back.death_reason(), STARVED);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let st = decode(r#"{"hunger": 0.5}"#, NOW, &mut rng()).expect("decode");
        let d = Needs::default();
        assert_eq!(st.hunger(), 0.5);
        assert_eq!(st.energy(), d.energy);
        assert_eq!(st.fun(), d.fun);
        assert!(st.is_alive());
        assert!(!st.is_asleep());
        assert_eq!(st.last_timestamp(), NOW);
    }

    #[test]
    fn bad_fields_are_repaired_individually() {
        let st = decode(
            r#"{"hunger": "lots", "energy": 4.5, "fun": -2, "hygiene": null,
                "asleep": "yes", "alive": false, "death_reason": "",
                "last_timestamp": 99999999999.0, "appearance": {}}"#,
            NOW,
            &mut rng(),
        )
        .expect("decode");
        let d = Needs::default();
        assert_eq!(st.hunger(), d.hunger);
        assert_eq!(st.energy(), 1.0);
        assert_eq!(st.fun(), 0.0);
        assert_eq!(st.hygiene(), d.hygiene);
        assert!(!st.is_asleep());
        assert!(!st.is_alive());
        assert_eq!(st.death_reason(), "Unknown");
        assert_eq!(st.last_timestamp(), NOW);
    }

    #[test]
    fn camel_case_fields_are_accepted() {
        let st = decode(
            r#"{"alive": false, "deathReason": "Exhausted", "lastTimestamp": 1000.0}"#,
            NOW,
            &mut rng(),
        )
        .expect("decode");
        assert_eq!(st.death_reason(), "Exhausted");
        assert_eq!(st.last_timestamp(), 1000.0);
    }

    #[test]
    fn both_key_spellings_still_load() {
        let st = decode(
            r#"{"hunger": 0.9, "alive": false,
                "death_reason": "Starved", "deathReason": "Exhausted",
                "last_timestamp": 5.0, "lastTimestamp": 7.0}"#,
            10.0,
            &mut rng(),
        )
        .expect("decode");
        assert!(!st.is_alive());
        assert_eq!(st.death_reason(), "Starved");
        assert_eq!(st.hunger(), 0.9);
        assert_eq!(st.last_timestamp(), 5.0);
    }

    #[test]
    fn non_record_is_rejected() {
        assert!(decode("not json", NOW, &mut rng()).is_none());
        assert!(decode("[1,2,3]", NOW, &mut rng()).is_none());
    }

    #[test]
    fn newer_version_still_loads() {
        let st = decode(r#"{"version": 9, "fun": 0.3, "mystery": true}"#, NOW, &mut rng())
            .expect("decode");
        assert_eq!(st.fun(), 0.3);
    }
}
