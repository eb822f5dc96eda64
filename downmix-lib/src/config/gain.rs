//! Helpers for converting dB gains and parsing them from settings files.

use serde::de::{Error as DeError, SeqAccess, Visitor};
use serde::Deserializer;
use std::fmt;

/// Convert a dB value to linear gain.
pub fn db_to_linear(db: f32) -> f32 {
    10.0_f32.powf(db / 20.0)
}

/// Convert a linear gain to dB.
pub fn linear_to_db(value: f32) -> f32 {
    let v = value.max(f32::MIN_POSITIVE);
    20.0 * v.log10()
}

/// Deserialize the four stage gains, each given as a number or a `"-6db"` string.
pub fn deserialize_db_gains<'de, D>(deserializer: D) -> Result<[f32; 4], D::Error>
where
    D: Deserializer<'de>,
{
    struct GainsVisitor;

    impl<'de> Visitor<'de> for GainsVisitor {
        type Value = [f32; 4];

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("an array of four gains (numbers or strings like \"-6db\")")
        }

        fn visit_seq<A>(self, mut seq: A) -> Result<Self::Value, A::Error>
        where
            A: SeqAccess<'de>,
        {
            let mut gains = [0.0_f32; 4];
            for (index, slot) in gains.iter_mut().enumerate() {
                let DbGain(value) = seq
                    .next_element()?
                    .ok_or_else(|| A::Error::invalid_length(index, &self))?;
                *slot = value;
            }
            if seq.next_element::<DbGain>()?.is_some() {
                return Err(A::Error::invalid_length(5, &self));
            }
            Ok(gains)
        }
    }

    deserializer.deserialize_seq(GainsVisitor)
}

struct DbGain(f32);

impl<'de> serde::Deserialize<'de> for DbGain {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DbGainVisitor;

        impl<'de> Visitor<'de> for DbGainVisitor {
            type Value = DbGain;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a number or a string like \"-6db\"")
            }

            fn visit_f64<E>(self, value: f64) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                Ok(DbGain(value as f32))
            }

            fn visit_i64<E>(self, value: i64) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                Ok(DbGain(value as f32))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                Ok(DbGain(value as f32))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: DeError,
            {
                parse_db_str(value)
                    .map(DbGain)
                    .ok_or_else(|| DeError::custom(format!("invalid gain value \"{}\"", value)))
            }
        }

        deserializer.deserialize_any(DbGainVisitor)
    }
}

/// Parse `"-6db"`, `"-6 dB"` or a bare `"-6"` into dB.
pub fn parse_db_str(value: &str) -> Option<f32> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_ascii_lowercase();
    let number = lower.strip_suffix("db").unwrap_or(lower.as_str());
    number.trim().parse::<f32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_round_trips_through_linear() {
        assert!((db_to_linear(0.0) - 1.0).abs() < 1e-6);
        assert!((db_to_linear(-6.0) - 0.501_187).abs() < 1e-4);
        assert!((linear_to_db(db_to_linear(-40.0)) + 40.0).abs() < 1e-3);
    }

    #[test]
    fn parses_db_strings() {
        assert_eq!(parse_db_str("-6db"), Some(-6.0));
        assert_eq!(parse_db_str(" 3 dB "), Some(3.0));
        assert_eq!(parse_db_str("12"), Some(12.0));
        assert_eq!(parse_db_str("loud"), None);
        assert_eq!(parse_db_str(""), None);
    }

    #[derive(serde::Deserialize)]
    struct Wrapper {
        #[serde(deserialize_with = "deserialize_db_gains")]
        gain: [f32; 4],
    }

    #[test]
    fn deserializes_mixed_gain_arrays() {
        let wrapper: Wrapper =
            serde_json::from_str(r#"{"gain":[0, "-6db", -80.5, "0dB"]}"#).expect("gains");
        assert_eq!(wrapper.gain, [0.0, -6.0, -80.5, 0.0]);
    }

    #[test]
    fn rejects_wrong_gain_count() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"gain":[0, 1, 2]}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"gain":[0, 1, 2, 3, 4]}"#).is_err());
        assert!(serde_json::from_str::<Wrapper>(r#"{"gain":[0, "x", 2, 3]}"#).is_err());
    }
}
