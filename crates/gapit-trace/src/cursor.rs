use crate::call::CallRecord;
use crate::error::{CursorError, LookupError, TraceReadError};

/// Walks a call stream by name, the way capture tests look for the calls they check.
///
/// Every lookup consumes the calls it skips; there is no rewinding.
pub struct CallCursor<I> {
    calls: I,
}

impl<I> CallCursor<I>
where
    I: Iterator<Item = Result<CallRecord, TraceReadError>>,
{
    pub fn new(calls: I) -> Self {
        Self { calls }
    }

    fn pull(&mut self) -> Result<Option<CallRecord>, CursorError> {
        self.calls.next().transpose().map_err(CursorError::from)
    }

    /// Consumes calls until one named `name` shows up.
    pub fn next_call_of(&mut self, name: &str) -> Result<CallRecord, CursorError> {
        self.nth_call_of(name, 1)
    }

    /// Consumes calls until the `nth` (1-based) call named `name` shows up.
    pub fn nth_call_of(&mut self, name: &str, nth: usize) -> Result<CallRecord, CursorError> {
        let mut seen = 0;
        while let Some(call) = self.pull()? {
            if call.name == name {
                seen += 1;
                if seen >= nth {
                    return Ok(call);
                }
            }
        }
        Err(LookupError::MissingCall {
            name: name.to_string(),
            nth,
            found: None,
        }
        .into())
    }

    /// The very next call, which must be named `name`.
    pub fn next_call(&mut self, name: &str) -> Result<CallRecord, CursorError> {
        match self.pull()? {
            Some(call) if call.name == name => Ok(call),
            other => Err(LookupError::MissingCall {
                name: name.to_string(),
                nth: 1,
                found: other.map(|call| call.name),
            }
            .into()),
        }
    }

    pub fn into_inner(self) -> I {
        self.calls
    }
}

impl<I> Iterator for CallCursor<I>
where
    I: Iterator<Item = Result<CallRecord, TraceReadError>>,
{
    type Item = Result<CallRecord, TraceReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.calls.next()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TraceReader;

    const INSTANCE_TRACE: &str = "banner\n\
        000000 vkCreateInstance(PCreateInfo: 0x10, PAllocator: 0, PInstance: 0x20)-> 0\n\
        000001 vkDestroyInstance(Instance: 1, PAllocator: 0)\n\
        000002 vkCreateInstance(PCreateInfo: 0x10, PAllocator: 0, PInstance: 0x20)-> 0\n\
        000003 vkDestroyInstance(Instance: 2, PAllocator: 0)\n\
        000004 vkCreateInstance(PCreateInfo: 0x10, PAllocator: 0, PInstance: 0x20)-> 0\n\
        000005 vkDestroyInstance(Instance: 3, PAllocator: 0)\n";

    fn cursor(text: &'static str) -> CallCursor<TraceReader<&'static [u8]>> {
        CallCursor::new(TraceReader::new(text.as_bytes()))
    }

    #[test]
    fn walks_calls_by_name() {
        let mut calls = cursor(INSTANCE_TRACE);
        assert_eq!(calls.next_call_of("vkCreateInstance").unwrap().index, 0);
        assert_eq!(calls.next_call_of("vkDestroyInstance").unwrap().index, 1);
        // Two more creations follow; the second of them is index 4.
        assert_eq!(calls.nth_call_of("vkCreateInstance", 2).unwrap().index, 4);
        let err = calls.next_call_of("vkCreateInstance").unwrap_err();
        assert!(matches!(
            err,
            CursorError::Lookup(LookupError::MissingCall { nth: 1, .. })
        ));
        assert_eq!(
            err.to_string(),
            "could not find call #1 of type vkCreateInstance"
        );
    }

    #[test]
    fn next_call_checks_the_immediate_successor() {
        let mut calls = cursor(INSTANCE_TRACE);
        assert!(calls.next_call("vkCreateInstance").is_ok());
        let err = calls.next_call("vkCreateInstance").unwrap_err();
        assert!(matches!(
            &err,
            CursorError::Lookup(LookupError::MissingCall { found: Some(found), .. })
                if found == "vkDestroyInstance"
        ));
        assert!(err.to_string().contains("next call was vkDestroyInstance"));
    }

    #[test]
    fn parse_errors_pass_through() {
        let mut calls = cursor("banner\n000000 vkA()\nnot a header\n");
        assert!(matches!(
            calls.next_call_of("vkB"),
            Err(CursorError::Read(TraceReadError::MalformedInput { .. }))
        ));
    }
}
