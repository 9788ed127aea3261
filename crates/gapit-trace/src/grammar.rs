//! Line grammars of `gapit dump -observations` output.
//!
//! ```text
//! 000036 vkGetDeviceProcAddr(Device: 32, PName: vkMapMemory)-> 0xd83ebcac
//! Reads: [], Writes: [{Range: [0x00000000eaafff34-0x00000000eaafff37], ID: 8f85530a...}]
//! FieldAlignments: [&{U64Alignment:8 PointerAlignment:4}]
//! [52 0 0 0]
//! ```
//!
//! Each parser returns `Err(reason)` with a short static description; the reader attaches the
//! line number and text.

use std::collections::BTreeMap;

/// Label of the line that lists a call's memory observations.
pub const OBSERVATION_LABEL: &str = "Reads";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Header {
    pub index: u64,
    pub name: String,
    pub parameters: BTreeMap<String, String>,
    pub return_value: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RangeEntry {
    pub start: u64,
    pub end: u64,
    pub id: String,
}

/// A `Name: [...]` line, split into its label and bracketed body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LabeledLine<'a> {
    pub label: &'a str,
    pub line: &'a str,
}

pub type GrammarResult<T> = Result<T, &'static str>;

fn is_identifier(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// `<index> <name>(<Key: Value, ...>)[-><return>]`
pub fn parse_header(line: &str) -> GrammarResult<Header> {
    let line = line.trim_end();
    let (index, rest) = line.split_once(' ').ok_or("missing call index")?;
    if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
        return Err("call index is not a decimal number");
    }
    let index = index.parse::<u64>().map_err(|_| "call index out of range")?;

    let (name, rest) = rest.split_once('(').ok_or("missing parameter list")?;
    if !is_identifier(name) {
        return Err("call name is not an identifier");
    }

    let (params, return_value) = match rest.split_once(")->") {
        Some((params, ret)) => (params, Some(ret.trim().to_string())),
        None => (
            rest.strip_suffix(')').ok_or("unterminated parameter list")?,
            None,
        ),
    };
    let parameters = parse_parameters(params)?;

    Ok(Header {
        index,
        name: name.to_string(),
        parameters,
        return_value,
    })
}

fn is_key_token(token: &str) -> bool {
    token
        .split_once(':')
        .is_some_and(|(key, _)| is_identifier(key))
}

/// `Key: Value` pairs separated by commas and/or whitespace. A value is the single token after
/// its key (`Key:Value` is accepted too); a key directly followed by another key has an empty
/// value.
fn parse_parameters(params: &str) -> GrammarResult<BTreeMap<String, String>> {
    let mut parameters = BTreeMap::new();
    let mut tokens = params
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .peekable();
    while let Some(token) = tokens.next() {
        let (key, inline) = token
            .split_once(':')
            .ok_or("parameter is not a `Key: Value` pair")?;
        if !is_identifier(key) {
            return Err("parameter name is not an identifier");
        }
        let value = if inline.is_empty() {
            tokens.next_if(|next| !is_key_token(next)).unwrap_or("")
        } else {
            inline
        };
        parameters.insert(key.to_string(), value.to_string());
    }
    Ok(parameters)
}

/// Recognizes `Name: [...]`. Returns `None` for lines of any other shape.
pub fn classify_labeled(line: &str) -> Option<LabeledLine<'_>> {
    let line = line.trim();
    let (label, rest) = line.split_once(": [")?;
    if !is_identifier(label) || !rest.ends_with(']') {
        return None;
    }
    Some(LabeledLine { label, line })
}

/// `Reads: [<entries>], Writes: [<entries>]`
pub fn parse_observations(line: &str) -> GrammarResult<(Vec<RangeEntry>, Vec<RangeEntry>)> {
    let rest = line
        .trim()
        .strip_prefix("Reads: [")
        .ok_or("observation line must start with `Reads: [`")?;
    let (reads, writes) = rest
        .split_once("], Writes: [")
        .ok_or("observation line is missing `Writes: [`")?;
    let writes = writes
        .strip_suffix(']')
        .ok_or("unterminated write observation list")?;
    Ok((parse_range_entries(reads)?, parse_range_entries(writes)?))
}

fn parse_range_entries(list: &str) -> GrammarResult<Vec<RangeEntry>> {
    let mut out = Vec::new();
    let mut rest = list.trim();
    while !rest.is_empty() {
        let body = rest.strip_prefix('{').ok_or("expected `{` to open an observation")?;
        let (entry, tail) = body.split_once('}').ok_or("unterminated observation entry")?;
        out.push(parse_range_entry(entry)?);
        rest = tail.trim_start();
        if let Some(tail) = rest.strip_prefix(',') {
            rest = tail.trim_start();
            if rest.is_empty() {
                return Err("trailing comma in observation list");
            }
        } else if !rest.is_empty() {
            return Err("observations must be separated by commas");
        }
    }
    Ok(out)
}

/// `Range: [0xSTART-0xEND], ID: hexdigest`
fn parse_range_entry(entry: &str) -> GrammarResult<RangeEntry> {
    let range = entry
        .trim()
        .strip_prefix("Range: [")
        .ok_or("observation entry must start with `Range: [`")?;
    let (range, id) = range
        .split_once("], ID: ")
        .ok_or("observation entry is missing its ID")?;
    let (start, end) = range.split_once('-').ok_or("range is missing `-`")?;
    let start = parse_hex_address(start)?;
    let end = parse_hex_address(end)?;
    if end < start {
        return Err("range ends before it starts");
    }
    let id = id.trim();
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err("observation ID is not a hex digest");
    }
    Ok(RangeEntry {
        start,
        end,
        id: id.to_string(),
    })
}

fn parse_hex_address(s: &str) -> GrammarResult<u64> {
    let digits = s
        .trim()
        .strip_prefix("0x")
        .ok_or("address must start with 0x")?;
    u64::from_str_radix(digits, 16).map_err(|_| "address is not a 64-bit hex number")
}

/// `Name: [&{Key:Value Key:Value}]`. Several `&{...}` groups are merged.
pub fn parse_extra(labeled: LabeledLine<'_>) -> GrammarResult<BTreeMap<String, String>> {
    let body = labeled
        .line
        .strip_prefix(labeled.label)
        .and_then(|rest| rest.strip_prefix(": ["))
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or("malformed extra line")?;

    let mut values = BTreeMap::new();
    let mut rest = body.trim();
    while !rest.is_empty() {
        let group = rest.strip_prefix("&{").ok_or("extra entries must be wrapped in `&{...}`")?;
        let (group, tail) = group.split_once('}').ok_or("unterminated extra entry")?;
        for pair in group.split(|c: char| c == ',' || c.is_whitespace()) {
            if pair.is_empty() {
                continue;
            }
            let (key, value) = pair.split_once(':').ok_or("extra entry is not a `Key:Value` pair")?;
            if !is_identifier(key) {
                return Err("extra key is not an identifier");
            }
            values.insert(key.to_string(), value.to_string());
        }
        rest = tail.trim_start();
        rest = rest.strip_prefix(',').unwrap_or(rest).trim_start();
    }
    Ok(values)
}

/// `[b b b ...]` with decimal byte values.
pub fn parse_memory(line: &str) -> GrammarResult<Vec<u8>> {
    let body = line
        .trim()
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .ok_or("memory line must be a bracketed byte list")?;
    body.split_ascii_whitespace()
        .map(|b| b.parse::<u8>().map_err(|_| "memory value is not a decimal byte"))
        .collect()
}
