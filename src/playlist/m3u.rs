//! M3U playlist parsing

use std::io::{BufReader, Read};

use super::delimited::DelimitedList;
use crate::error::{PlaylistError, Result};
use crate::memory::MemoryBudget;

const BOM: &str = "\u{feff}";

/// Parse m3u content into a delimited list of entries
///
/// `#` starts a comment running to the end of the line, which also covers
/// `#EXTM3U`/`#EXTINF` directives. `\n` and `\r` both end a line and blank
/// lines are dropped. Other bytes are kept as-is, apart from a leading byte
/// order mark. `source` only names the input in errors.
pub fn parse<R: Read>(reader: R, source: &str, budget: &MemoryBudget, chunk: usize) -> Result<DelimitedList> {
    let mut list = DelimitedList::new(budget, chunk)?;
    let mut line = Vec::new();
    let mut in_comment = false;

    for byte in BufReader::new(reader).bytes() {
        let byte = byte.map_err(|e| PlaylistError::io(source, e))?;
        match byte {
            b'\n' | b'\r' => {
                push_line(&mut list, &mut line)?;
                in_comment = false;
            }
            b'#' => in_comment = true,
            _ if in_comment => {}
            _ => line.push(byte),
        }
    }
    push_line(&mut list, &mut line)?;

    Ok(list)
}

fn push_line(list: &mut DelimitedList, line: &mut Vec<u8>) -> Result<()> {
    if line.is_empty() {
        return Ok(());
    }
    let text = String::from_utf8_lossy(line);
    let entry = text.trim_start_matches(BOM);
    list.append(entry)?;
    line.clear();
    Ok(())
}

/// Whether an entry is an absolute card path or a URL
pub fn is_absolute(entry: &str) -> bool {
    entry.starts_with('/') || entry.contains("://")
}
