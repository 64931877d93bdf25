use crate::key_catalog::NamedKey;
use crate::types::{KeyInput, KeySequence};
use anyhow::{bail, Result};
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, warn};

/// Reads a key script: one sequence per non-empty line, `;` starts a comment line.
pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Vec<KeySequence>> {
    let path = path.as_ref();
    let raw = std::fs::read(path)?;
    let decoded = decode_script_bytes(&raw);
    if decoded.lossy {
        warn!(
            "{} read as {} with replacement characters",
            path.display(),
            decoded.encoding.name()
        );
    } else {
        debug!("{} read as {}", path.display(), decoded.encoding.name());
    }
    parse_script(&decoded.text)
}

/// Script text plus the encoding it was read with.
struct Decoded<'a> {
    text: Cow<'a, str>,
    encoding: &'static Encoding,
    lossy: bool,
}

/// BOM wins, then UTF-8 if the bytes are valid, else Windows-1252.
fn decode_script_bytes(raw: &[u8]) -> Decoded<'_> {
    let guess = match Encoding::for_bom(raw) {
        Some((enc, _)) => enc,
        None if std::str::from_utf8(raw).is_ok() => UTF_8,
        None => WINDOWS_1252,
    };
    let (text, encoding, lossy) = guess.decode(raw);
    Decoded {
        text,
        encoding,
        lossy,
    }
}

pub fn parse_script(content: &str) -> Result<Vec<KeySequence>> {
    let mut sequences = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() || line.trim_start().starts_with(';') {
            continue;
        }
        match parse_sequence(line) {
            Ok(seq) => sequences.push(seq),
            Err(e) => bail!("line {}: {}", idx + 1, e),
        }
    }
    debug!("Parsed {} sequence(s)", sequences.len());
    Ok(sequences)
}

/// Parses inline notation: `{Name}` for a named key, `{{` and `}}` for braces.
///
/// Modifier names become toggles. Names are not checked against the catalog here.
pub fn parse_sequence(raw: &str) -> Result<KeySequence> {
    let mut seq = Vec::new();
    let mut chars = raw.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                seq.push(KeyInput::Literal('{'));
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                seq.push(KeyInput::Literal('}'));
            }
            '{' => {
                let mut name = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some(n) => name.push(n),
                        None => bail!("unterminated key name {{{}", name),
                    }
                }
                let name = name.trim();
                if name.is_empty() {
                    bail!("empty key name");
                }
                seq.push(named_input(name));
            }
            '}' => bail!("unmatched '}}'"),
            _ => seq.push(KeyInput::Literal(c)),
        }
    }
    Ok(seq)
}

fn named_input(name: &str) -> KeyInput {
    match NamedKey::from_name(name) {
        Some(key) if key.modifier().is_some() => KeyInput::toggle(name),
        _ => KeyInput::named(name),
    }
}
