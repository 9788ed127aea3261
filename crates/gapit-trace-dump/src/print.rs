use std::io::{self, Write};

use gapit_trace::{CallRecord, MemoryObservation};

pub fn write_call(out: &mut impl Write, call: &CallRecord, verbose: bool) -> io::Result<()> {
    write!(out, "{} {}", call.index, call.name)?;
    if !verbose {
        return writeln!(out);
    }
    match call.return_value() {
        Some(ret) => writeln!(out, " -> {ret}")?,
        None => writeln!(out)?,
    }
    for (name, value) in call.parameters() {
        writeln!(out, "    {name}: {value}")?;
    }
    for extra in call.extras() {
        write!(out, "    extra {}:", extra.name)?;
        for (key, value) in extra.values() {
            write!(out, " {key}={value}")?;
        }
        writeln!(out)?;
    }
    for obs in call.read_observations() {
        write_observation(out, "read", obs)?;
    }
    for obs in call.write_observations() {
        write_observation(out, "write", obs)?;
    }
    Ok(())
}

fn write_observation(out: &mut impl Write, side: &str, obs: &MemoryObservation) -> io::Result<()> {
    writeln!(
        out,
        "    {side} [{:#x}-{:#x}] {} bytes id={}",
        obs.start,
        obs.end,
        obs.bytes.len(),
        obs.id
    )
}
