// Normalized device state and the status payload parser.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::IntoEnumIterator;

use crate::command::Field;
use crate::error::Error;

pub const MIN_SPEED: u8 = 1;
pub const MAX_SPEED: u8 = 30;

/// Snapshot of every fan attribute, replaced wholesale on each fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DeviceState {
    pub power: bool,
    /// 1-30. Only meaningful while `power` is on.
    pub speed: u8,
    /// 0 = off, 1-3 = sweep angle.
    pub horizontal_oscillation: u8,
    /// 0 = off, 1-2 = sweep angle.
    pub vertical_oscillation: u8,
    /// 0-3. Mode 1 is "natural wind".
    pub mode: u8,
    pub night_mode: bool,
    pub lock: bool,
}

impl DeviceState {
    /// Parse the `{"data": {...}}` status envelope.
    ///
    /// Every field must be present as an integer inside its domain; extra
    /// vendor fields are ignored.
    pub fn from_envelope(body: &str) -> Result<Self, Error> {
        let envelope: Value = serde_json::from_str(body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body: body.to_owned(),
        })?;
        let data = envelope
            .get("data")
            .and_then(Value::as_object)
            .ok_or_else(|| Error::Deserialization {
                message: "missing `data` object".into(),
                body: body.to_owned(),
            })?;
        Self::from_fields(data).map_err(|message| Error::Deserialization {
            message,
            body: body.to_owned(),
        })
    }

    fn from_fields(data: &Map<String, Value>) -> Result<Self, String> {
        let read = |field: Field| -> Result<u8, String> {
            let token = field.token();
            let raw = data
                .get(token)
                .ok_or_else(|| format!("missing field `{token}`"))?
                .as_i64()
                .ok_or_else(|| format!("field `{token}` is not an integer"))?;
            field.validate(raw).map_err(|e| e.to_string())
        };

        Ok(Self {
            power: read(Field::Power)? == 1,
            speed: read(Field::Speed)?,
            horizontal_oscillation: read(Field::HorizontalOscillation)?,
            vertical_oscillation: read(Field::VerticalOscillation)?,
            mode: read(Field::Mode)?,
            night_mode: read(Field::NightMode)? == 1,
            lock: read(Field::Lock)? == 1,
        })
    }

    /// Raw wire value of one field (booleans as 0/1).
    pub fn value_of(&self, field: Field) -> u8 {
        match field {
            Field::Power => u8::from(self.power),
            Field::Speed => self.speed,
            Field::HorizontalOscillation => self.horizontal_oscillation,
            Field::VerticalOscillation => self.vertical_oscillation,
            Field::Mode => self.mode,
            Field::NightMode => u8::from(self.night_mode),
            Field::Lock => u8::from(self.lock),
        }
    }

    /// Fields whose wire value differs between `self` and `other`.
    pub fn changed_fields(&self, other: &Self) -> Vec<Field> {
        Field::iter()
            .filter(|f| self.value_of(*f) != other.value_of(*f))
            .collect()
    }

    /// Speed on the 1-100 scale, or `None` while the fan is off.
    pub fn percentage(&self) -> Option<u8> {
        self.power.then(|| speed_to_percentage(self.speed))
    }

    pub fn is_oscillating(&self) -> bool {
        self.horizontal_oscillation != 0
    }

    pub fn natural_wind(&self) -> bool {
        self.mode == 1
    }
}

/// `round(speed / 30 * 100)`, with speed clamped to 1-30 first.
pub fn speed_to_percentage(speed: u8) -> u8 {
    let speed = u32::from(speed.clamp(MIN_SPEED, MAX_SPEED));
    let max = u32::from(MAX_SPEED);
    let percent = (speed * 100 + max / 2) / max;
    u8::try_from(percent).unwrap_or(100)
}

/// `max(1, round(percent / 100 * 30))`, clamped to 1-30.
pub fn percentage_to_speed(percent: u8) -> u8 {
    let percent = u32::from(percent.min(100));
    let speed = (percent * u32::from(MAX_SPEED) + 50) / 100;
    u8::try_from(speed)
        .unwrap_or(MAX_SPEED)
        .clamp(MIN_SPEED, MAX_SPEED)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn envelope(data: &Value) -> String {
        json!({ "data": data }).to_string()
    }

    #[test]
    fn parses_full_status() {
        let body = envelope(&json!({
            "power": 1, "speed": 15, "mode": 0, "night": 0,
            "lock": 0, "horosc": 1, "verosc": 0, "timer": 0
        }));
        let state = DeviceState::from_envelope(&body).unwrap();
        assert_eq!(
            state,
            DeviceState {
                power: true,
                speed: 15,
                horizontal_oscillation: 1,
                vertical_oscillation: 0,
                mode: 0,
                night_mode: false,
                lock: false,
            }
        );
        assert_eq!(state.percentage(), Some(50));
        assert!(state.is_oscillating());
        assert!(!state.natural_wind());
    }

    #[test]
    fn missing_field_is_rejected() {
        let body = envelope(&json!({
            "power": 1, "speed": 15, "mode": 0, "night": 0, "lock": 0, "horosc": 1
        }));
        match DeviceState::from_envelope(&body) {
            Err(Error::Deserialization { message, .. }) => {
                assert!(message.contains("verosc"), "unexpected message: {message}");
            }
            other => panic!("expected Deserialization error, got: {other:?}"),
        }
    }

    #[test]
    fn missing_envelope_is_rejected() {
        let body = json!({ "power": 1 }).to_string();
        assert!(matches!(
            DeviceState::from_envelope(&body),
            Err(Error::Deserialization { .. })
        ));
        assert!(matches!(
            DeviceState::from_envelope("not json"),
            Err(Error::Deserialization { .. })
        ));
    }

    #[test]
    fn non_integer_and_out_of_domain_are_rejected() {
        let text_speed = envelope(&json!({
            "power": 1, "speed": "fast", "mode": 0, "night": 0,
            "lock": 0, "horosc": 1, "verosc": 0
        }));
        assert!(DeviceState::from_envelope(&text_speed).is_err());

        let too_fast = envelope(&json!({
            "power": 1, "speed": 31, "mode": 0, "night": 0,
            "lock": 0, "horosc": 1, "verosc": 0
        }));
        assert!(DeviceState::from_envelope(&too_fast).is_err());
    }

    #[test]
    fn percentage_scale_endpoints() {
        assert_eq!(speed_to_percentage(1), 3);
        assert_eq!(speed_to_percentage(15), 50);
        assert_eq!(speed_to_percentage(30), 100);
        assert_eq!(percentage_to_speed(1), 1);
        assert_eq!(percentage_to_speed(50), 15);
        assert_eq!(percentage_to_speed(100), 30);
        assert_eq!(percentage_to_speed(0), 1);
        assert_eq!(percentage_to_speed(255), 30);
    }

    #[test]
    fn percentage_round_trip_is_stable() {
        for percent in 1..=100 {
            let speed = percentage_to_speed(percent);
            assert!((MIN_SPEED..=MAX_SPEED).contains(&speed));
            assert_eq!(
                percentage_to_speed(speed_to_percentage(speed)),
                speed,
                "percent {percent} drifted"
            );
        }
    }

    #[test]
    fn changed_fields_lists_differences() {
        let before = DeviceState {
            power: true,
            speed: 10,
            horizontal_oscillation: 0,
            vertical_oscillation: 0,
            mode: 0,
            night_mode: false,
            lock: false,
        };
        let after = DeviceState {
            speed: 12,
            night_mode: true,
            ..before
        };
        assert_eq!(
            before.changed_fields(&after),
            vec![Field::Speed, Field::NightMode]
        );
        assert_eq!(after.value_of(Field::NightMode), 1);
    }
}
