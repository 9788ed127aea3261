use std::collections::BTreeMap;

use crate::error::{LookupError, ObservationSide};

/// How a raw parameter string should be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParamFormat {
    Raw,
    /// Base 10, optionally signed.
    Int,
    /// Base 16, with or without a `0x` prefix.
    Hex,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ParamValue {
    Raw(String),
    Int(i64),
    Hex(u64),
}

/// Result of a prefix-convention lookup (see [`CallRecord::attribute`]).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute<'a> {
    Raw(&'a str),
    Int(i64),
    Hex(u64),
    Extra(&'a Extra),
}

/// A contiguous memory range captured for a call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemoryObservation {
    pub start: u64,
    /// Inclusive.
    pub end: u64,
    pub id: String,
    pub bytes: Vec<u8>,
}

impl MemoryObservation {
    pub fn new(start: u64, end: u64, id: impl Into<String>) -> Self {
        Self {
            start,
            end,
            id: id.into(),
            bytes: Vec::new(),
        }
    }

    /// Number of bytes the range spans; 0 when `end < start`, saturated for the full 64-bit
    /// range.
    pub fn range_len(&self) -> u64 {
        self.end
            .checked_sub(self.start)
            .map_or(0, |span| span.saturating_add(1))
    }

    pub fn contains(&self, address: u64) -> bool {
        self.start <= address && address <= self.end
    }

    /// Bytes for `[address, address + length)`, if the range covers them and they were captured.
    fn slice(&self, address: u64, length: u64) -> Option<&[u8]> {
        if !self.contains(address) {
            return None;
        }
        if length > 0 {
            let last = address.checked_add(length - 1)?;
            if !self.contains(last) {
                return None;
            }
        }
        let from = usize::try_from(address - self.start).ok()?;
        let to = from.checked_add(usize::try_from(length).ok()?)?;
        self.bytes.get(from..to)
    }
}

/// Named side-channel metadata attached to a call by the capture tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extra {
    pub name: String,
    values: BTreeMap<String, String>,
    call_index: u64,
    call_name: String,
}

impl Extra {
    pub(crate) fn new(
        name: String,
        values: BTreeMap<String, String>,
        call_index: u64,
        call_name: String,
    ) -> Self {
        Self {
            name,
            values,
            call_index,
            call_name,
        }
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn get_raw(&self, key: &str) -> Result<&str, LookupError> {
        self.values
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| LookupError::MissingParameter {
                call_index: self.call_index,
                call_name: format!("{} (extra {})", self.call_name, self.name),
                name: key.to_string(),
            })
    }

    pub fn get_as_int(&self, key: &str) -> Result<i64, LookupError> {
        let raw = self.get_raw(key)?;
        parse_int(raw).ok_or_else(|| self.invalid(key, raw, "decimal integer"))
    }

    pub fn get_as_hex(&self, key: &str) -> Result<u64, LookupError> {
        let raw = self.get_raw(key)?;
        parse_hex(raw).ok_or_else(|| self.invalid(key, raw, "hexadecimal integer"))
    }

    pub fn get(&self, key: &str, format: ParamFormat) -> Result<ParamValue, LookupError> {
        Ok(match format {
            ParamFormat::Raw => ParamValue::Raw(self.get_raw(key)?.to_string()),
            ParamFormat::Int => ParamValue::Int(self.get_as_int(key)?),
            ParamFormat::Hex => ParamValue::Hex(self.get_as_hex(key)?),
        })
    }

    fn invalid(&self, key: &str, raw: &str, expected: &'static str) -> LookupError {
        LookupError::InvalidValue {
            call_index: self.call_index,
            call_name: format!("{} (extra {})", self.call_name, self.name),
            name: key.to_string(),
            value: raw.to_string(),
            expected,
        }
    }
}

/// One logged API invocation ("atom").
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallRecord {
    pub index: u64,
    pub name: String,
    parameters: BTreeMap<String, String>,
    return_value: Option<String>,
    pub(crate) read_observations: Vec<MemoryObservation>,
    pub(crate) write_observations: Vec<MemoryObservation>,
    pub(crate) extras: BTreeMap<String, Extra>,
}

impl CallRecord {
    pub fn new(
        index: u64,
        name: impl Into<String>,
        parameters: BTreeMap<String, String>,
        return_value: Option<String>,
    ) -> Self {
        Self {
            index,
            name: name.into(),
            parameters,
            return_value,
            read_observations: Vec::new(),
            write_observations: Vec::new(),
            extras: BTreeMap::new(),
        }
    }

    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }

    pub fn read_observations(&self) -> &[MemoryObservation] {
        &self.read_observations
    }

    pub fn write_observations(&self) -> &[MemoryObservation] {
        &self.write_observations
    }

    pub fn observations(&self, side: ObservationSide) -> &[MemoryObservation] {
        match side {
            ObservationSide::Read => &self.read_observations,
            ObservationSide::Write => &self.write_observations,
        }
    }

    pub fn observation_count(&self) -> usize {
        self.read_observations.len() + self.write_observations.len()
    }

    pub fn extras(&self) -> impl Iterator<Item = &Extra> {
        self.extras.values()
    }

    pub fn get_raw(&self, name: &str) -> Result<&str, LookupError> {
        self.parameters
            .get(name)
            .map(String::as_str)
            .ok_or_else(|| LookupError::MissingParameter {
                call_index: self.index,
                call_name: self.name.clone(),
                name: name.to_string(),
            })
    }

    pub fn get_as_int(&self, name: &str) -> Result<i64, LookupError> {
        let raw = self.get_raw(name)?;
        parse_int(raw).ok_or_else(|| self.invalid(name, raw, "decimal integer"))
    }

    pub fn get_as_hex(&self, name: &str) -> Result<u64, LookupError> {
        let raw = self.get_raw(name)?;
        parse_hex(raw).ok_or_else(|| self.invalid(name, raw, "hexadecimal integer"))
    }

    pub fn get(&self, name: &str, format: ParamFormat) -> Result<ParamValue, LookupError> {
        Ok(match format {
            ParamFormat::Raw => ParamValue::Raw(self.get_raw(name)?.to_string()),
            ParamFormat::Int => ParamValue::Int(self.get_as_int(name)?),
            ParamFormat::Hex => ParamValue::Hex(self.get_as_hex(name)?),
        })
    }

    /// Looks up `name` using the capture harness naming convention: `hex_X` and `int_X` parse
    /// parameter `X`, `extra_X` returns the extra `X`, anything else is the raw parameter.
    pub fn attribute(&self, name: &str) -> Result<Attribute<'_>, LookupError> {
        if let Some(param) = name.strip_prefix("hex_") {
            return self.get_as_hex(param).map(Attribute::Hex);
        }
        if let Some(param) = name.strip_prefix("int_") {
            return self.get_as_int(param).map(Attribute::Int);
        }
        if let Some(extra) = name.strip_prefix("extra_") {
            return self.get_extra(extra).map(Attribute::Extra);
        }
        self.get_raw(name).map(Attribute::Raw)
    }

    pub fn return_value(&self) -> Option<&str> {
        self.return_value.as_deref()
    }

    pub fn return_as_int(&self) -> Result<i64, LookupError> {
        let raw = self.require_return()?;
        parse_int(raw).ok_or_else(|| self.invalid("return value", raw, "decimal integer"))
    }

    pub fn return_as_hex(&self) -> Result<u64, LookupError> {
        let raw = self.require_return()?;
        parse_hex(raw).ok_or_else(|| self.invalid("return value", raw, "hexadecimal integer"))
    }

    fn require_return(&self) -> Result<&str, LookupError> {
        self.return_value
            .as_deref()
            .ok_or_else(|| LookupError::MissingReturnValue {
                call_index: self.index,
                call_name: self.name.clone(),
            })
    }

    pub fn get_extra(&self, name: &str) -> Result<&Extra, LookupError> {
        self.extras
            .get(name)
            .ok_or_else(|| LookupError::MissingExtra {
                call_index: self.index,
                call_name: self.name.clone(),
                name: name.to_string(),
            })
    }

    /// `length` bytes starting at `address` from the first read observation covering them.
    pub fn read(&self, address: u64, length: u64) -> Result<&[u8], LookupError> {
        self.memory(ObservationSide::Read, address, length)
    }

    /// `length` bytes starting at `address` from the first write observation covering them.
    pub fn write(&self, address: u64, length: u64) -> Result<&[u8], LookupError> {
        self.memory(ObservationSide::Write, address, length)
    }

    pub fn memory(
        &self,
        side: ObservationSide,
        address: u64,
        length: u64,
    ) -> Result<&[u8], LookupError> {
        self.observations(side)
            .iter()
            .find_map(|obs| obs.slice(address, length))
            .ok_or_else(|| self.missing_range(side, address, length))
    }

    /// NUL-terminated string starting at `address` in the read observations.
    pub fn read_string(&self, address: u64) -> Result<String, LookupError> {
        self.string(ObservationSide::Read, address)
    }

    /// NUL-terminated string starting at `address` in the write observations.
    pub fn write_string(&self, address: u64) -> Result<String, LookupError> {
        self.string(ObservationSide::Write, address)
    }

    pub fn string(&self, side: ObservationSide, address: u64) -> Result<String, LookupError> {
        let tail = self
            .observations(side)
            .iter()
            .filter(|obs| obs.contains(address))
            .find_map(|obs| {
                let from = usize::try_from(address - obs.start).ok()?;
                // Bytes past the end of a short or missing memory line were never captured.
                obs.bytes.get(from..).filter(|tail| !tail.is_empty())
            })
            .ok_or_else(|| self.missing_range(side, address, 0))?;
        let len = tail.iter().position(|&b| b == 0).unwrap_or(tail.len());
        Ok(String::from_utf8_lossy(&tail[..len]).into_owned())
    }

    fn missing_range(&self, side: ObservationSide, address: u64, length: u64) -> LookupError {
        LookupError::MissingObservationRange {
            call_index: self.index,
            call_name: self.name.clone(),
            side,
            address,
            length,
        }
    }

    fn invalid(&self, name: &str, raw: &str, expected: &'static str) -> LookupError {
        LookupError::InvalidValue {
            call_index: self.index,
            call_name: self.name.clone(),
            name: name.to_string(),
            value: raw.to_string(),
            expected,
        }
    }
}

fn parse_int(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok()
}

fn parse_hex(raw: &str) -> Option<u64> {
    let raw = raw.trim();
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .unwrap_or(raw);
    u64::from_str_radix(digits, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn observed(start: u64, bytes: &[u8]) -> MemoryObservation {
        let mut obs = MemoryObservation::new(start, start + bytes.len() as u64 - 1, "00");
        obs.bytes = bytes.to_vec();
        obs
    }

    fn sample_call() -> CallRecord {
        let mut parameters = BTreeMap::new();
        parameters.insert("Device".to_string(), "32".to_string());
        parameters.insert("PData".to_string(), "0x1000".to_string());
        parameters.insert("Offset".to_string(), "-4".to_string());
        parameters.insert("PName".to_string(), "vkMapMemory".to_string());
        let mut call = CallRecord::new(7, "vkTest", parameters, Some("0".to_string()));
        call.read_observations
            .push(observed(0x1000, &[1, 2, 3, 4, 5, 6, 7, 8]));
        call.read_observations
            .push(observed(0x2000, b"hello\0world"));
        call.write_observations.push(observed(0x3000, b"unterminated"));

        let mut values = BTreeMap::new();
        values.insert("U64Alignment".to_string(), "8".to_string());
        call.extras.insert(
            "FieldAlignments".to_string(),
            Extra::new("FieldAlignments".to_string(), values, 7, "vkTest".to_string()),
        );
        call
    }

    #[test]
    fn typed_parameter_access() {
        let call = sample_call();
        assert_eq!(call.get_raw("Device").unwrap(), "32");
        assert_eq!(call.get_as_int("Device").unwrap(), 32);
        assert_eq!(call.get_as_hex("Device").unwrap(), 0x32);
        assert_eq!(call.get_as_hex("PData").unwrap(), 0x1000);
        assert_eq!(call.get_as_int("Offset").unwrap(), -4);
        assert_eq!(
            call.get("PData", ParamFormat::Hex).unwrap(),
            ParamValue::Hex(0x1000)
        );
        assert_eq!(
            call.get("PName", ParamFormat::Raw).unwrap(),
            ParamValue::Raw("vkMapMemory".into())
        );
    }

    #[test]
    fn missing_parameter_names_the_call() {
        let call = sample_call();
        let err = call.get_as_int("Flags").unwrap_err();
        assert_eq!(
            err,
            LookupError::MissingParameter {
                call_index: 7,
                call_name: "vkTest".into(),
                name: "Flags".into(),
            }
        );
        assert_eq!(
            err.to_string(),
            "could not find parameter Flags on call [7] vkTest"
        );
    }

    #[test]
    fn unparseable_values_are_reported() {
        let call = sample_call();
        let err = call.get_as_int("PName").unwrap_err();
        assert!(matches!(
            err,
            LookupError::InvalidValue {
                expected: "decimal integer",
                ..
            }
        ));
    }

    #[test]
    fn prefix_convention() {
        let call = sample_call();
        assert_eq!(call.attribute("hex_PData").unwrap(), Attribute::Hex(0x1000));
        assert_eq!(call.attribute("int_Device").unwrap(), Attribute::Int(32));
        assert_eq!(call.attribute("Device").unwrap(), Attribute::Raw("32"));
        match call.attribute("extra_FieldAlignments").unwrap() {
            Attribute::Extra(extra) => assert_eq!(extra.get_as_int("U64Alignment").unwrap(), 8),
            other => panic!("unexpected attribute {other:?}"),
        }
        assert!(matches!(
            call.attribute("extra_Missing"),
            Err(LookupError::MissingExtra { .. })
        ));
    }

    #[test]
    fn return_value_access() {
        let call = sample_call();
        assert_eq!(call.return_value(), Some("0"));
        assert_eq!(call.return_as_int().unwrap(), 0);

        let bare = CallRecord::new(1, "vkVoid", BTreeMap::new(), None);
        assert!(matches!(
            bare.return_as_int(),
            Err(LookupError::MissingReturnValue { call_index: 1, .. })
        ));
    }

    #[test]
    fn read_returns_covered_bytes() {
        let call = sample_call();
        assert_eq!(call.read(0x1000, 4).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(call.read(0x1004, 4).unwrap(), &[5, 6, 7, 8]);
        assert_eq!(call.read(0x2006, 5).unwrap(), b"world");
    }

    #[test]
    fn read_miss_is_a_soft_error() {
        let call = sample_call();
        // Straddles the end of the first observation.
        let err = call.read(0x1006, 4).unwrap_err();
        assert_eq!(
            err,
            LookupError::MissingObservationRange {
                call_index: 7,
                call_name: "vkTest".into(),
                side: ObservationSide::Read,
                address: 0x1006,
                length: 4,
            }
        );
        assert!(err.to_string().contains("0x1006"));
        assert!(call.read(0x3000, 1).is_err());
        assert!(call.write(0x1000, 1).is_err());
        assert_eq!(call.write(0x3000, 2).unwrap(), b"un");
    }

    #[test]
    fn zero_length_read_needs_a_covering_observation() {
        let call = sample_call();
        assert!(call.read(0x1002, 0).unwrap().is_empty());
        assert!(call.read(0x5000, 0).is_err());
    }

    #[test]
    fn string_scan_stops_at_nul() {
        let call = sample_call();
        assert_eq!(call.read_string(0x2000).unwrap(), "hello");
        assert_eq!(call.read_string(0x2002).unwrap(), "llo");
        assert_eq!(call.read_string(0x2006).unwrap(), "world");
        assert_eq!(call.read_string(0x2005).unwrap(), "");
    }

    #[test]
    fn string_scan_stops_at_observation_end() {
        let call = sample_call();
        assert_eq!(call.write_string(0x3000).unwrap(), "unterminated");
        assert!(matches!(
            call.write_string(0x4000),
            Err(LookupError::MissingObservationRange { length: 0, .. })
        ));
    }

    #[test]
    fn observation_without_bytes_is_a_miss() {
        let mut call = CallRecord::new(1, "vkEmpty", BTreeMap::new(), None);
        call.read_observations
            .push(MemoryObservation::new(0x10, 0x1f, "ab"));
        assert!(call.read(0x10, 4).is_err());
        assert_eq!(call.observation_count(), 1);
        assert_eq!(call.read_observations()[0].range_len(), 16);
    }

    #[test]
    fn range_len_never_wraps() {
        assert_eq!(MemoryObservation::new(0x20, 0x10, "ab").range_len(), 0);
        assert_eq!(MemoryObservation::new(0, u64::MAX, "ab").range_len(), u64::MAX);
        assert_eq!(MemoryObservation::new(7, 7, "ab").range_len(), 1);
    }

    #[test]
    fn string_scan_needs_captured_bytes_at_the_address() {
        let mut call = CallRecord::new(2, "vkShort", BTreeMap::new(), None);
        let mut obs = MemoryObservation::new(0x40, 0x4f, "ab");
        obs.bytes = b"ab".to_vec();
        call.read_observations.push(obs);
        assert_eq!(call.read_string(0x40).unwrap(), "ab");
        assert_eq!(call.read_string(0x41).unwrap(), "b");
        // Inside the declared range, past the captured bytes.
        assert!(matches!(
            call.read_string(0x42),
            Err(LookupError::MissingObservationRange { address: 0x42, length: 0, .. })
        ));
        assert!(call.read_string(0x48).is_err());
    }
}
