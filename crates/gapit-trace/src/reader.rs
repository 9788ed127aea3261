use std::collections::BTreeMap;
use std::io::BufRead;

use crate::call::{CallRecord, Extra, MemoryObservation};
use crate::error::TraceReadError;
use crate::grammar::{self, OBSERVATION_LABEL};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ReadState {
    /// The dump tool prints one banner line before the first call.
    FirstLine,
    Header,
    ExtrasOrObservations,
    Memory,
    Done,
}

/// Pull parser over `gapit dump -observations` output.
///
/// Yields call records in arrival order. A record is only handed out once the line after it
/// (or the end of the stream) shows that nothing more belongs to it. The reader is single-pass:
/// after the end of the stream or the first error it returns `None` forever.
pub struct TraceReader<R> {
    reader: R,
    state: ReadState,
    line_number: usize,
    /// One line of lookahead, handed back by `ExtrasOrObservations`.
    pushback: Option<String>,
    pending: Option<CallRecord>,
    /// Observations of `pending` that already received their bytes.
    filled: usize,
}

impl<R: BufRead> TraceReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            state: ReadState::FirstLine,
            line_number: 0,
            pushback: None,
            pending: None,
            filled: 0,
        }
    }

    /// Number of input lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    fn next_line(&mut self) -> Result<Option<String>, TraceReadError> {
        if let Some(line) = self.pushback.take() {
            return Ok(Some(line));
        }
        let mut raw = Vec::new();
        if self.reader.read_until(b'\n', &mut raw)? == 0 {
            return Ok(None);
        }
        self.line_number += 1;
        while matches!(raw.last(), Some(b'\n' | b'\r')) {
            raw.pop();
        }
        match String::from_utf8(raw) {
            Ok(line) => Ok(Some(line)),
            Err(err) => {
                let line = String::from_utf8_lossy(err.as_bytes()).into_owned();
                Err(self.malformed(line, "line is not valid UTF-8"))
            }
        }
    }

    fn malformed(&self, line: String, reason: &'static str) -> TraceReadError {
        TraceReadError::MalformedInput {
            line_number: self.line_number,
            line,
            reason,
        }
    }

    fn finish(&mut self) -> Option<CallRecord> {
        self.state = ReadState::Done;
        let call = self.pending.take()?;
        let expected = call.observation_count();
        if self.filled < expected {
            tracing::warn!(
                index = call.index,
                name = %call.name,
                filled = self.filled,
                expected,
                "dump output ended before all observation bytes were read"
            );
        }
        Some(call)
    }

    /// Runs the state machine until a record is complete, the stream ends or a line fails to
    /// parse.
    fn step(&mut self) -> Result<Option<CallRecord>, TraceReadError> {
        loop {
            if self.state == ReadState::Done {
                return Ok(None);
            }
            let Some(line) = self.next_line()? else {
                return Ok(self.finish());
            };

            match self.state {
                ReadState::FirstLine => {
                    tracing::trace!(banner = %line, "skipping dump banner");
                    self.state = ReadState::Header;
                }
                ReadState::Header => {
                    let header = match grammar::parse_header(&line) {
                        Ok(header) => header,
                        Err(reason) => return Err(self.malformed(line, reason)),
                    };
                    if let Some(previous) = &self.pending {
                        if header.index <= previous.index {
                            tracing::warn!(
                                previous = previous.index,
                                index = header.index,
                                "call indices are not increasing"
                            );
                        }
                    }
                    tracing::debug!(index = header.index, name = %header.name, "parsed call header");

                    let call = CallRecord::new(
                        header.index,
                        header.name,
                        header.parameters,
                        header.return_value,
                    );
                    self.filled = 0;
                    self.state = ReadState::ExtrasOrObservations;
                    if let Some(previous) = self.pending.replace(call) {
                        return Ok(Some(previous));
                    }
                }
                ReadState::ExtrasOrObservations => {
                    let Some(labeled) = grammar::classify_labeled(&line) else {
                        let has_observations = self
                            .pending
                            .as_ref()
                            .is_some_and(|call| call.observation_count() > 0);
                        self.state = if has_observations {
                            ReadState::Memory
                        } else {
                            ReadState::Header
                        };
                        self.pushback = Some(line);
                        continue;
                    };

                    let parsed = if labeled.label == OBSERVATION_LABEL {
                        grammar::parse_observations(&line).map(|(reads, writes)| {
                            self.attach_observations(reads, writes);
                        })
                    } else {
                        grammar::parse_extra(labeled).map(|values| {
                            let name = labeled.label.to_string();
                            self.attach_extra(name, values);
                        })
                    };
                    if let Err(reason) = parsed {
                        return Err(self.malformed(line, reason));
                    }
                }
                ReadState::Memory => {
                    let bytes = match grammar::parse_memory(&line) {
                        Ok(bytes) => bytes,
                        Err(reason) => return Err(self.malformed(line, reason)),
                    };
                    let Some(call) = self.pending.as_mut() else {
                        return Err(self.malformed(line, "memory line without a call"));
                    };
                    let reads = call.read_observations.len();
                    let total = call.observation_count();
                    let obs = if self.filled < reads {
                        &mut call.read_observations[self.filled]
                    } else {
                        &mut call.write_observations[self.filled - reads]
                    };
                    if bytes.len() as u64 != obs.range_len() {
                        tracing::warn!(
                            index = call.index,
                            name = %call.name,
                            start = obs.start,
                            expected = obs.range_len(),
                            got = bytes.len(),
                            "observation byte count does not match its range"
                        );
                    }
                    tracing::trace!(index = call.index, len = bytes.len(), "observation bytes");
                    obs.bytes = bytes;

                    self.filled += 1;
                    if self.filled == total {
                        self.state = ReadState::Header;
                    }
                }
                ReadState::Done => unreachable!("handled at the top of the loop"),
            }
        }
    }

    fn attach_observations(
        &mut self,
        reads: Vec<grammar::RangeEntry>,
        writes: Vec<grammar::RangeEntry>,
    ) {
        if let Some(call) = self.pending.as_mut() {
            call.read_observations.extend(
                reads
                    .into_iter()
                    .map(|r| MemoryObservation::new(r.start, r.end, r.id)),
            );
            call.write_observations.extend(
                writes
                    .into_iter()
                    .map(|r| MemoryObservation::new(r.start, r.end, r.id)),
            );
        }
    }

    fn attach_extra(&mut self, name: String, values: BTreeMap<String, String>) {
        if let Some(call) = self.pending.as_mut() {
            let extra = Extra::new(name.clone(), values, call.index, call.name.clone());
            call.extras.insert(name, extra);
        }
    }
}

impl<R: BufRead> Iterator for TraceReader<R> {
    type Item = Result<CallRecord, TraceReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.step() {
            Ok(call) => call.map(Ok),
            Err(err) => {
                self.state = ReadState::Done;
                self.pending = None;
                self.pushback = None;
                Some(Err(err))
            }
        }
    }
}
