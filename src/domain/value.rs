//! Value payloads of content items
//!
//! One variant per storable value type. An item's value type is derived from
//! its payload, so a committed node can never carry the `Invalid` tag.

use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::domain::code::CodedEntry;
use crate::domain::error::{TreeError, TreeResult};
use crate::domain::types::ValueType;

static DECIMAL_STRING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?([0-9]+\.?[0-9]*|\.[0-9]+)([eE][+-]?[0-9]+)?$").expect("decimal string pattern")
});

static UNIQUE_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(0|[1-9][0-9]*)(\.(0|[1-9][0-9]*))*$").expect("uid pattern")
});

const MAX_DECIMAL_STRING_LEN: usize = 16;
const MAX_UID_LEN: usize = 64;

const DATE_FORMATS: [&str; 2] = ["%Y%m%d", "%Y-%m-%d"];
const TIME_FORMATS: [&str; 6] = [
    "%H%M%S%.f",
    "%H%M%S",
    "%H%M",
    "%H:%M:%S%.f",
    "%H:%M:%S",
    "%H:%M",
];
const DATETIME_FORMATS: [&str; 5] = [
    "%Y%m%d%H%M%S%.f",
    "%Y%m%d%H%M%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
];

/// Continuity of content of a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Continuity {
    #[default]
    Separate,
    Continuous,
}

impl fmt::Display for Continuity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Continuity::Separate => f.write_str("SEPARATE"),
            Continuity::Continuous => f.write_str("CONTINUOUS"),
        }
    }
}

/// Rational representation of a measured value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rational {
    pub numerator: i32,
    pub denominator: u32,
}

/// Measured value of a NUM content item.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericValue {
    value: String,
    units: Option<CodedEntry>,
    rational: Option<Rational>,
    floating_point: Option<f64>,
    qualifier: Option<CodedEntry>,
}

impl NumericValue {
    pub fn new(value: &str, units: CodedEntry) -> TreeResult<Self> {
        let mut numeric = Self::default();
        numeric.set_value(value, units)?;
        Ok(numeric)
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn units(&self) -> Option<&CodedEntry> {
        self.units.as_ref()
    }

    pub fn rational(&self) -> Option<Rational> {
        self.rational
    }

    pub fn floating_point(&self) -> Option<f64> {
        self.floating_point
    }

    /// Numeric value qualifier, used when no measured value is available.
    pub fn qualifier(&self) -> Option<&CodedEntry> {
        self.qualifier.as_ref()
    }

    /// Sets measured value and units together, the optional representations
    /// belong to the previous value and are cleared.
    ///
    /// An empty `value` records units without a measurement, typically
    /// together with a [qualifier](Self::set_qualifier).
    pub fn set_value(&mut self, value: &str, units: CodedEntry) -> TreeResult<()> {
        if !value.trim().is_empty() {
            check_decimal_string(value)?;
        }
        if !units.is_valid() {
            return Err(TreeError::invalid_value(
                ValueType::Num,
                format!("invalid measurement units {}", units),
            ));
        }
        self.value = value.trim().to_string();
        self.units = Some(units);
        self.rational = None;
        self.floating_point = None;
        Ok(())
    }

    fn set_number(&mut self, value: &str) -> TreeResult<()> {
        check_decimal_string(value)?;
        self.value = value.trim().to_string();
        self.rational = None;
        self.floating_point = None;
        Ok(())
    }

    pub fn set_rational(&mut self, numerator: i32, denominator: u32) -> TreeResult<()> {
        if denominator == 0 {
            return Err(TreeError::invalid_value(
                ValueType::Num,
                "rational denominator must not be zero",
            ));
        }
        self.rational = Some(Rational {
            numerator,
            denominator,
        });
        Ok(())
    }

    pub fn set_floating_point(&mut self, value: f64) -> TreeResult<()> {
        if !value.is_finite() {
            return Err(TreeError::invalid_value(
                ValueType::Num,
                format!("floating point value {} is not finite", value),
            ));
        }
        self.floating_point = Some(value);
        Ok(())
    }

    pub fn set_qualifier(&mut self, qualifier: CodedEntry) -> TreeResult<()> {
        if !qualifier.is_valid() {
            return Err(TreeError::invalid_value(
                ValueType::Num,
                format!("invalid numeric value qualifier {}", qualifier),
            ));
        }
        self.qualifier = Some(qualifier);
        Ok(())
    }
}

impl fmt::Display for NumericValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.units, &self.qualifier) {
            (Some(units), _) if !self.value.is_empty() => write!(f, "\"{}\" {}", self.value, units),
            (_, Some(qualifier)) => write!(f, "qualifier {}", qualifier),
            _ => f.write_str("empty"),
        }
    }
}

fn check_decimal_string(value: &str) -> TreeResult<()> {
    let value = value.trim();
    if value.len() > MAX_DECIMAL_STRING_LEN || !DECIMAL_STRING.is_match(value) {
        return Err(TreeError::invalid_value(
            ValueType::Num,
            format!("'{}' is not a decimal string", value),
        ));
    }
    Ok(())
}

fn check_uid(value: &str) -> TreeResult<()> {
    if value.len() > MAX_UID_LEN || !UNIQUE_IDENTIFIER.is_match(value) {
        return Err(TreeError::invalid_value(
            ValueType::UidRef,
            format!("'{}' is not a unique identifier", value),
        ));
    }
    Ok(())
}

/// Date/time in DICOM (`YYYYMMDDHHMMSS`) or ISO form.
pub fn parse_datetime(value: &str) -> TreeResult<NaiveDateTime> {
    parse_with(
        value,
        ValueType::DateTime,
        &DATETIME_FORMATS,
        NaiveDateTime::parse_from_str,
    )
}

fn parse_with<T>(
    value: &str,
    value_type: ValueType,
    formats: &[&str],
    parse: impl Fn(&str, &str) -> chrono::ParseResult<T>,
) -> TreeResult<T> {
    let value = value.trim();
    formats
        .iter()
        .find_map(|format| parse(value, format).ok())
        .ok_or_else(|| {
            TreeError::invalid_value(value_type, format!("cannot parse '{}'", value))
        })
}

/// Typed payload of a content item.
#[derive(Debug, Clone, PartialEq)]
pub enum ContentValue {
    Container(Continuity),
    Text(String),
    Code(Option<CodedEntry>),
    Num(NumericValue),
    DateTime(Option<NaiveDateTime>),
    Date(Option<NaiveDate>),
    Time(Option<NaiveTime>),
    UidRef(String),
    PName(String),
}

impl ContentValue {
    /// Empty payload for `value_type`, `None` for the `Invalid` sentinel.
    pub fn empty(value_type: ValueType) -> Option<Self> {
        let value = match value_type {
            ValueType::Container => Self::Container(Continuity::default()),
            ValueType::Text => Self::Text(String::new()),
            ValueType::Code => Self::Code(None),
            ValueType::Num => Self::Num(NumericValue::default()),
            ValueType::DateTime => Self::DateTime(None),
            ValueType::Date => Self::Date(None),
            ValueType::Time => Self::Time(None),
            ValueType::UidRef => Self::UidRef(String::new()),
            ValueType::PName => Self::PName(String::new()),
            ValueType::Invalid => return None,
        };
        Some(value)
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Self::Container(_) => ValueType::Container,
            Self::Text(_) => ValueType::Text,
            Self::Code(_) => ValueType::Code,
            Self::Num(_) => ValueType::Num,
            Self::DateTime(_) => ValueType::DateTime,
            Self::Date(_) => ValueType::Date,
            Self::Time(_) => ValueType::Time,
            Self::UidRef(_) => ValueType::UidRef,
            Self::PName(_) => ValueType::PName,
        }
    }

    /// Checks the payload the way setters do, used for caller-built values.
    pub fn validate(&self) -> TreeResult<()> {
        match self {
            Self::Code(Some(code)) if !code.is_valid() => Err(TreeError::invalid_value(
                ValueType::Code,
                format!("invalid code {}", code),
            )),
            Self::Num(numeric) => {
                if !numeric.value.is_empty() {
                    check_decimal_string(&numeric.value)?;
                }
                if let Some(rational) = numeric.rational {
                    if rational.denominator == 0 {
                        return Err(TreeError::invalid_value(
                            ValueType::Num,
                            "rational denominator must not be zero",
                        ));
                    }
                }
                Ok(())
            }
            Self::UidRef(uid) if !uid.is_empty() => check_uid(uid),
            Self::Container(_)
            | Self::Text(_)
            | Self::Code(_)
            | Self::DateTime(_)
            | Self::Date(_)
            | Self::Time(_)
            | Self::UidRef(_)
            | Self::PName(_) => Ok(()),
        }
    }

    /// String form for TEXT, UIDREF and PNAME items.
    pub fn string_value(&self) -> Option<&str> {
        match self {
            Self::Text(s) | Self::UidRef(s) | Self::PName(s) => Some(s),
            Self::Container(_)
            | Self::Code(_)
            | Self::Num(_)
            | Self::DateTime(_)
            | Self::Date(_)
            | Self::Time(_) => None,
        }
    }

    /// Sets the value from its string form.
    ///
    /// Dates and times accept the DICOM (`YYYYMMDD`, `HHMMSS`) and ISO forms.
    /// A NUM value keeps its units.
    pub fn set_string_value(&mut self, value: &str) -> TreeResult<()> {
        let value_type = self.value_type();
        match self {
            Self::Text(s) | Self::PName(s) => {
                if value.is_empty() {
                    return Err(TreeError::invalid_value(
                        value_type,
                        "value must not be empty",
                    ));
                }
                *s = value.to_string();
            }
            Self::UidRef(s) => {
                check_uid(value)?;
                *s = value.to_string();
            }
            Self::Num(numeric) => numeric.set_number(value)?,
            Self::Date(d) => {
                *d = Some(parse_with(value, ValueType::Date, &DATE_FORMATS, |v, f| {
                    NaiveDate::parse_from_str(v, f)
                })?);
            }
            Self::Time(t) => {
                *t = Some(parse_with(value, ValueType::Time, &TIME_FORMATS, |v, f| {
                    NaiveTime::parse_from_str(v, f)
                })?);
            }
            Self::DateTime(dt) => *dt = Some(parse_datetime(value)?),
            Self::Container(_) | Self::Code(_) => {
                return Err(TreeError::invalid_value(
                    value_type,
                    "no string representation",
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ContentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container(continuity) => continuity.fmt(f),
            Self::Text(s) | Self::UidRef(s) | Self::PName(s) => write!(f, "\"{}\"", s),
            Self::Code(Some(code)) => code.fmt(f),
            Self::Num(numeric) => numeric.fmt(f),
            Self::DateTime(Some(dt)) => write!(f, "{}", dt.format("%Y%m%d%H%M%S")),
            Self::Date(Some(d)) => write!(f, "{}", d.format("%Y%m%d")),
            Self::Time(Some(t)) => write!(f, "{}", t.format("%H%M%S")),
            Self::Code(None) | Self::DateTime(None) | Self::Date(None) | Self::Time(None) => {
                f.write_str("empty")
            }
        }
    }
}
