//! Canonical hashing.
//!
//! Deterministic canonical serialization + SHA-256 hashing of the game
//! state. Produces byte-identical output across platforms.
//!
//! Rules:
//!   - engine_version is the first field (identity binding)
//!   - strict hand-written field order, no derive round-trips
//!   - UTF-8 JSON, no whitespace, no floats, no platform newline
//!   - phase rendered as a tagged object with sorted-by-hand fields

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::domain::{GameState, Phase};
use crate::ENGINE_VERSION;

/// Canonical serialization of a GameState to UTF-8 JSON bytes.
pub fn canonical_serialize(state: &GameState) -> Vec<u8> {
    let obj = build_canonical_value(state);
    serde_json::to_string(&obj)
        .expect("canonical serialization cannot fail for tree-shaped state")
        .into_bytes()
}

/// SHA-256 of the canonical serialization. Lowercase hex string.
pub fn canonical_hash(state: &GameState) -> String {
    let digest = Sha256::digest(canonical_serialize(state));
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Build the canonical serde_json::Value in strict field order.
///
/// serde_json::Map preserves insertion order (preserve_order feature).
fn build_canonical_value(state: &GameState) -> Value {
    let mut root = Map::new();
    root.insert(
        "engine_version".to_string(),
        Value::Number(ENGINE_VERSION.into()),
    );
    root.insert("home_score".to_string(), Value::Number(state.home_score.into()));
    root.insert("away_score".to_string(), Value::Number(state.away_score.into()));
    root.insert("ot_home".to_string(), Value::Number(state.ot_home.into()));
    root.insert("ot_away".to_string(), Value::Number(state.ot_away.into()));
    root.insert(
        "overtime_period".to_string(),
        Value::Number(state.overtime_period.into()),
    );
    root.insert("phase".to_string(), phase_value(&state.phase));
    root.insert(
        "current_turn".to_string(),
        Value::String(state.current_turn.as_str().to_string()),
    );
    root.insert(
        "throws_in_turn".to_string(),
        Value::Number(state.throws_in_turn.into()),
    );
    root.insert(
        "hits_in_turn".to_string(),
        Value::Number(state.hits_in_turn.into()),
    );
    root.insert("last_thrower".to_string(), optional_string(&state.last_thrower));
    root.insert(
        "last_overtime_thrower".to_string(),
        optional_string(&state.last_overtime_thrower),
    );
    root.insert(
        "opening_throw_taken".to_string(),
        Value::Bool(state.opening_throw_taken),
    );
    root.insert("ended".to_string(), Value::Bool(state.ended));
    Value::Object(root)
}

fn phase_value(phase: &Phase) -> Value {
    let mut map = Map::new();
    match phase {
        Phase::Regular => {
            map.insert("kind".to_string(), Value::String("regular".to_string()));
        }
        Phase::Overtime => {
            map.insert("kind".to_string(), Value::String("overtime".to_string()));
        }
        Phase::Ended => {
            map.insert("kind".to_string(), Value::String("ended".to_string()));
        }
        Phase::ReturnServe(serve) => {
            map.insert("kind".to_string(), Value::String("return_serve".to_string()));
            map.insert(
                "mode".to_string(),
                Value::String(serve.mode.as_str().to_string()),
            );
            map.insert(
                "exit_team".to_string(),
                Value::String(serve.exit_team.as_str().to_string()),
            );
            map.insert(
                "cups_needed".to_string(),
                Value::Number(serve.cups_needed.into()),
            );
            map.insert("step".to_string(), Value::Number(serve.step.into()));
            map.insert(
                "attempts_left".to_string(),
                Value::Number(serve.attempts_left.into()),
            );
            map.insert("last_shooter".to_string(), optional_string(&serve.last_shooter));
            map.insert(
                "origin".to_string(),
                Value::String(serve.origin.as_str().to_string()),
            );
        }
    }
    Value::Object(map)
}

fn optional_string(value: &Option<String>) -> Value {
    match value {
        Some(s) => Value::String(s.clone()),
        None => Value::Null,
    }
}
