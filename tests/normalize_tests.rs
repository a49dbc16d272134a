//! Integration tests for payload normalization and speed colors
//!
//! Exercises the public API the way the session uses it:
//! - partial updates leave untouched fields alone
//! - string-encoded and double-encoded payloads
//! - numeric policy for unparseable values
//! - gradient clamping, boundary ties and rounding

use live_tracker::*;
use serde_json::json;

fn populated() -> CanonicalTelemetry {
    CanonicalTelemetry {
        lat: 45.8,
        lon: 15.9,
        alt: 120.0,
        spd: 33.0,
        sat: 9,
        temp: Some(21.5),
        button: 1,
    }
}

#[test]
fn test_missing_fields_are_preserved() {
    let payloads = [
        json!({}),
        json!({"lat": 46.0}),
        json!("{\"spd\": 50}"),
        json!({"v": "{\"alt\": 300}"}),
        json!({"unrelated": "x"}),
    ];

    for payload in payloads {
        let before = populated();
        let mut state = before.clone();
        let updated = normalize(&payload, &mut state);

        for (name, changed) in [
            ("lat", state.lat != before.lat),
            ("lon", state.lon != before.lon),
            ("alt", state.alt != before.alt),
            ("spd", state.spd != before.spd),
            ("sat", state.sat != before.sat),
            ("temp", state.temp != before.temp),
        ] {
            if changed {
                assert!(updated.contains(&name), "{name} changed without being reported for {payload}");
            }
        }
        // the button is never part of a telemetry payload
        assert_eq!(state.button, before.button);
    }
}

#[test]
fn test_double_encoded_string_unwraps() {
    let mut state = CanonicalTelemetry::new();
    normalize(&json!(r#"{"v":"{\"lat\":1.5,\"lon\":2.5}"}"#), &mut state);
    assert_eq!(state.lat, 1.5);
    assert_eq!(state.lon, 2.5);
}

#[test]
fn test_string_values_are_coerced() {
    let mut state = CanonicalTelemetry::new();
    let updated = normalize(&json!({"lat": "10.1", "sat": "7"}), &mut state);
    assert_eq!(state.lat, 10.1);
    assert_eq!(state.sat, 7);
    assert_eq!(updated, vec!["lat", "sat"]);
}

#[test]
fn test_garbage_is_ignored() {
    let mut state = populated();
    for garbage in [json!("not json at all"), json!(42), json!(null), json!([1, 2])] {
        assert!(normalize(&garbage, &mut state).is_empty());
    }
    assert_eq!(state, populated());
}

#[test]
fn test_numeric_policy() {
    let payload = json!({"spd": "fast", "sat": "many"});

    let mut strict = populated();
    Normalizer::new(NumericPolicy::Strict).normalize(&payload, &mut strict);
    assert_eq!(strict, populated());

    let mut permissive = populated();
    let updated = Normalizer::new(NumericPolicy::Permissive).normalize(&payload, &mut permissive);
    assert!(permissive.spd.is_nan());
    // integer fields keep their value either way
    assert_eq!(permissive.sat, 9);
    assert_eq!(updated, vec!["spd"]);
}

#[test]
fn test_temp_null_clears() {
    let mut state = populated();
    normalize(&json!({"temp": null}), &mut state);
    assert_eq!(state.temp, None);
}

#[test]
fn test_gradient_properties() {
    assert_eq!(gradient_color(0.0), Rgb::new(0, 0, 255));
    assert_eq!(gradient_color(-10.0), Rgb::new(0, 0, 255));
    assert_eq!(gradient_color(120.0), gradient_color(200.0));
    assert_eq!(gradient_color(40.0), Rgb::new(0, 255, 0));
    assert_eq!(gradient_color(85.0).to_string(), "rgb(255,82,0)");
}

#[test]
fn test_gradient_is_monotonic_in_red_up_to_orange() {
    let mut previous = gradient_color(40.0).r;
    for speed in 41..=70 {
        let red = gradient_color(f64::from(speed)).r;
        assert!(red >= previous, "red channel dropped at {speed}");
        previous = red;
    }
}
