use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;
use std::sync::OnceLock;

use axperf_bus::BusCycle;
use axperf_core::ControlRequest;
use regex::Regex;
use tracing::debug;

use super::{TraceCommand, TraceError, TraceLine};
use crate::Result;

/// Register write strobe when a `write` line gives none.
const DEFAULT_STRB: u8 = 0xff;

impl TraceCommand {
    /// Parse one trace line.
    ///
    /// Returns `Ok(None)` for blank and comment-only lines.
    ///
    /// # Errors
    ///
    /// Returns a description of the problem for malformed lines.
    pub fn parse(line: &str) -> std::result::Result<Option<Self>, String> {
        let line = line.find('#').map_or(line, |i| &line[..i]).trim();
        let Some(keyword) = line.split_whitespace().next() else {
            return Ok(None);
        };

        let command = match keyword {
            "start" | "stop" | "clear" | "reset" => {
                if line != keyword {
                    return Err(format!("`{keyword}` takes no arguments"));
                }
                match keyword {
                    "start" => Self::Control(ControlRequest::Start),
                    "stop" => Self::Control(ControlRequest::Stop),
                    "clear" => Self::Control(ControlRequest::Clear),
                    _ => Self::Reset,
                }
            }
            "write" => {
                let caps = pattern(&WRITE_PATTERN, r"^write\s+(\S+)\s+(\S+)(?:\s+(\S+))?$")
                    .captures(line)
                    .ok_or("expected `write <addr> <data> [strb]`")?;
                let strb = match caps.get(3) {
                    Some(m) => narrow("strb", m.as_str())?,
                    None => DEFAULT_STRB,
                };
                Self::RegisterWrite {
                    addr: narrow("addr", &caps[1])?,
                    data: narrow("data", &caps[2])?,
                    strb,
                }
            }
            "read" => {
                let caps = pattern(&READ_PATTERN, r"^read\s+(\S+)$")
                    .captures(line)
                    .ok_or("expected `read <addr>`")?;
                Self::RegisterRead {
                    addr: narrow("addr", &caps[1])?,
                }
            }
            "cycle" => parse_cycle(line)?,
            other => return Err(format!("unknown command `{other}`")),
        };
        Ok(Some(command))
    }
}

fn parse_cycle(line: &str) -> std::result::Result<TraceCommand, String> {
    let caps = pattern(
        &CYCLE_PATTERN,
        r"^cycle(?:\s+x(\w+))?((?:\s+[a-z_]+=\S+)*)$",
    )
    .captures(line)
    .ok_or("expected `cycle [xN] key=value ...`")?;

    let repeat = match caps.get(1) {
        Some(m) => narrow("repeat", m.as_str())?,
        None => 1,
    };
    if repeat == 0 {
        return Err("repeat count must be at least 1".to_string());
    }

    let mut bus = BusCycle::idle();
    let fields = pattern(&FIELD_PATTERN, r"([a-z_]+)=(\S+)");
    for field in fields.captures_iter(caps.get(2).map_or("", |m| m.as_str())) {
        apply_field(&mut bus, &field[1], &field[2])?;
    }
    Ok(TraceCommand::Cycle { bus, repeat })
}

fn apply_field(bus: &mut BusCycle, key: &str, value: &str) -> std::result::Result<(), String> {
    let w = &mut bus.write;
    let r = &mut bus.read;
    match key {
        "aw" => (w.aw_valid, w.aw_ready) = handshake(key, value)?,
        "w" => (w.w_valid, w.w_ready) = handshake(key, value)?,
        "b" => (w.b_valid, w.b_ready) = handshake(key, value)?,
        "ar" => (r.ar_valid, r.ar_ready) = handshake(key, value)?,
        "r" => (r.r_valid, r.r_ready) = handshake(key, value)?,
        "awlen" => w.aw_len = narrow(key, value)?,
        "awsize" => w.aw_size = size(key, value)?,
        "wlast" => w.w_last = flag(key, value)?,
        "wstrb" => w.w_strb = parse_number(value)?,
        "arid" => r.ar_id = narrow(key, value)?,
        "arlen" => r.ar_len = narrow(key, value)?,
        "arsize" => r.ar_size = size(key, value)?,
        "rlast" => r.r_last = flag(key, value)?,
        "rid" => r.r_id = narrow(key, value)?,
        _ => return Err(format!("unknown cycle field `{key}`")),
    }
    Ok(())
}

/// `V/R`, or a bare `V` meaning valid and ready together.
fn handshake(key: &str, value: &str) -> std::result::Result<(bool, bool), String> {
    let caps = pattern(&HANDSHAKE_PATTERN, r"^([01])(?:/([01]))?$")
        .captures(value)
        .ok_or_else(|| format!("`{key}` expects V/R, got `{value}`"))?;
    let valid = &caps[1] == "1";
    let ready = caps.get(2).map_or(valid, |m| m.as_str() == "1");
    Ok((valid, ready))
}

fn flag(key: &str, value: &str) -> std::result::Result<bool, String> {
    match parse_number(value)? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(format!("`{key}` expects 0 or 1, got `{value}`")),
    }
}

fn size(key: &str, value: &str) -> std::result::Result<u8, String> {
    let size: u8 = narrow(key, value)?;
    if size > 7 {
        return Err(format!("`{key}` must be 0..=7, got {size}"));
    }
    Ok(size)
}

fn narrow<T: TryFrom<u128>>(key: &str, value: &str) -> std::result::Result<T, String> {
    T::try_from(parse_number(value)?).map_err(|_| format!("`{key}` out of range: `{value}`"))
}

/// Decimal or `0x` hex, with optional `_` separators.
fn parse_number(text: &str) -> std::result::Result<u128, String> {
    let (digits, radix) = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .map_or((text, 10), |hex| (hex, 16));
    u128::from_str_radix(&digits.replace('_', ""), radix)
        .map_err(|_| format!("malformed number `{text}`"))
}

fn pattern(cell: &'static OnceLock<Regex>, source: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(source).expect("trace patterns are valid"))
}

static WRITE_PATTERN: OnceLock<Regex> = OnceLock::new();
static READ_PATTERN: OnceLock<Regex> = OnceLock::new();
static CYCLE_PATTERN: OnceLock<Regex> = OnceLock::new();
static FIELD_PATTERN: OnceLock<Regex> = OnceLock::new();
static HANDSHAKE_PATTERN: OnceLock<Regex> = OnceLock::new();

/// Parse a whole trace.
///
/// # Errors
///
/// Returns the first malformed line, or a read failure.
pub fn parse_trace<R: BufRead>(reader: R) -> Result<Vec<TraceLine>> {
    let mut lines = Vec::new();
    for (index, text) in reader.lines().enumerate() {
        let text = text?;
        let line = index + 1;
        if let Some(command) =
            TraceCommand::parse(&text).map_err(|message| TraceError::new(line, message))?
        {
            lines.push(TraceLine { line, command });
        }
    }
    Ok(lines)
}

/// Parse a trace file. Files ending in `.zst` are decompressed.
///
/// # Errors
///
/// Returns IO errors opening or decompressing the file, and parse errors.
pub fn parse_trace_file(path: &Path) -> Result<Vec<TraceLine>> {
    let file = File::open(path)?;
    let reader: Box<dyn Read> = if path.extension().is_some_and(|ext| ext == "zst") {
        Box::new(zstd::stream::Decoder::new(file)?)
    } else {
        Box::new(file)
    };
    let lines = parse_trace(BufReader::new(reader))?;
    debug!(path = %path.display(), commands = lines.len(), "parsed trace");
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cycle(line: &str) -> (BusCycle, u64) {
        match TraceCommand::parse(line) {
            Ok(Some(TraceCommand::Cycle { bus, repeat })) => (bus, repeat),
            other => panic!("expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_controls() {
        assert_eq!(
            TraceCommand::parse("start"),
            Ok(Some(TraceCommand::Control(ControlRequest::Start)))
        );
        assert_eq!(
            TraceCommand::parse("  clear  # zero everything"),
            Ok(Some(TraceCommand::Control(ControlRequest::Clear)))
        );
        assert_eq!(TraceCommand::parse("reset"), Ok(Some(TraceCommand::Reset)));
        assert!(TraceCommand::parse("stop now").is_err());
    }

    #[test]
    fn test_parse_blank_and_comments() {
        assert_eq!(TraceCommand::parse(""), Ok(None));
        assert_eq!(TraceCommand::parse("   "), Ok(None));
        assert_eq!(TraceCommand::parse("# cycle aw=1"), Ok(None));
    }

    #[test]
    fn test_parse_register_access() {
        assert_eq!(
            TraceCommand::parse("write 0x7c 3"),
            Ok(Some(TraceCommand::RegisterWrite {
                addr: 0x7c,
                data: 3,
                strb: 0xff
            }))
        );
        assert_eq!(
            TraceCommand::parse("write 0x7c 1 0x2"),
            Ok(Some(TraceCommand::RegisterWrite {
                addr: 0x7c,
                data: 1,
                strb: 2
            }))
        );
        assert_eq!(
            TraceCommand::parse("read 0x1_0"),
            Ok(Some(TraceCommand::RegisterRead { addr: 0x10 }))
        );
        assert!(TraceCommand::parse("read").is_err());
        assert!(TraceCommand::parse("write 0x7c 1 0x100").is_err());
    }

    #[test]
    fn test_parse_cycle_fields() {
        let (bus, repeat) = cycle("cycle");
        assert_eq!(bus, BusCycle::idle());
        assert_eq!(repeat, 1);

        let (bus, repeat) = cycle("cycle x4 aw=1 awlen=3 awsize=2 w=1/0 wstrb=0xf b=0/1");
        assert_eq!(repeat, 4);
        assert!(bus.write.aw_valid && bus.write.aw_ready);
        assert_eq!(bus.write.aw_len, 3);
        assert_eq!(bus.write.aw_size, 2);
        assert!(bus.write.w_valid && !bus.write.w_ready);
        assert_eq!(bus.write.w_strb, 0xf);
        assert!(!bus.write.b_valid && bus.write.b_ready);

        let (bus, _) = cycle("cycle ar=1 arid=5 arlen=7 r=1 rid=0x3 rlast=1");
        assert_eq!(bus.read.ar_id, 5);
        assert_eq!(bus.read.ar_len, 7);
        assert!(bus.read.r_fire());
        assert_eq!(bus.read.r_id, 3);
        assert!(bus.read.r_last);
    }

    #[test]
    fn test_parse_cycle_errors() {
        assert!(TraceCommand::parse("cycle x0").is_err());
        assert!(TraceCommand::parse("cycle foo=1").is_err());
        assert!(TraceCommand::parse("cycle aw=2").is_err());
        assert!(TraceCommand::parse("cycle awlen=256").is_err());
        assert!(TraceCommand::parse("cycle awsize=8").is_err());
        assert!(TraceCommand::parse("cycle wlast=yes").is_err());
        assert!(TraceCommand::parse("cycle aw").is_err());
        assert!(TraceCommand::parse("bogus").is_err());
    }

    #[test]
    fn test_parse_trace_reports_line() {
        let text = "start\n\n# idle\ncycle\ncycle aw=3\n";
        match parse_trace(text.as_bytes()) {
            Err(crate::Error::Trace(e)) => {
                assert_eq!(e.line, 5);
                assert!(e.message.contains("aw"));
            }
            other => panic!("expected trace error, got {other:?}"),
        }

        let lines = parse_trace("start\n\ncycle x2\n".as_bytes()).expect("valid trace");
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].line, 3);
    }
}
