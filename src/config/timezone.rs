//! Timezone used to stamp new posts

use chrono::{DateTime, FixedOffset, Offset, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Either a fixed offset (`+08:00`) or a named zone (`Asia/Shanghai`)
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Timezone {
    Fixed(FixedOffset),
    Named(Tz),
}

impl Timezone {
    /// Current time in this zone
    pub fn now(&self) -> DateTime<FixedOffset> {
        self.from_utc(Utc::now())
    }

    /// Convert a UTC instant into this zone
    pub fn from_utc(&self, utc: DateTime<Utc>) -> DateTime<FixedOffset> {
        match self {
            Timezone::Fixed(offset) => utc.with_timezone(offset),
            Timezone::Named(tz) => utc.with_timezone(tz).fixed_offset(),
        }
    }
}

impl Default for Timezone {
    fn default() -> Self {
        Timezone::Fixed(Utc.fix())
    }
}

impl FromStr for Timezone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("utc") {
            return Ok(Timezone::default());
        }
        if let Ok(offset) = s.parse::<FixedOffset>() {
            return Ok(Timezone::Fixed(offset));
        }
        s.parse::<Tz>()
            .map(Timezone::Named)
            .map_err(|_| format!("unknown timezone: {}", s))
    }
}

impl fmt::Display for Timezone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Timezone::Fixed(offset) => write!(f, "{}", offset),
            Timezone::Named(tz) => write!(f, "{}", tz.name()),
        }
    }
}

impl Serialize for Timezone {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timezone {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_parse_offset() {
        let tz: Timezone = "+08:00".parse().unwrap();
        assert_eq!(tz, Timezone::Fixed(FixedOffset::east_opt(8 * 3600).unwrap()));
    }

    #[test]
    fn test_parse_named_and_empty() {
        assert!(matches!("Europe/Paris".parse::<Timezone>(), Ok(Timezone::Named(_))));
        assert_eq!("".parse::<Timezone>().unwrap(), Timezone::default());
        assert!("Mars/Olympus".parse::<Timezone>().is_err());
    }

    #[test]
    fn test_from_utc_keeps_offset() {
        let tz: Timezone = "-05:00".parse().unwrap();
        let utc = Utc.with_ymd_and_hms(2024, 1, 1, 3, 0, 0).unwrap();
        let local = tz.from_utc(utc);
        assert_eq!(local.format("%Y-%m-%d %H:%M").to_string(), "2023-12-31 22:00");
        assert_eq!(local.offset().local_minus_utc(), -5 * 3600);
    }
}
