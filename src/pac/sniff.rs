//! Payload signature sniffing
//!
//! Archive indexes carry no type information, so each entry is classified by
//! looking at the first few bytes of its payload. Classification is an ordered
//! chain of [`Classifier`] rules; the first rule that returns a [`Verdict`]
//! wins and later rules are not consulted.
//!
//! The built-in chain, in priority order:
//!
//! 1. `OggS` signature: audio, renamed to `.ogg`
//! 2. low byte 1 or 2 inside an archive whose name contains `grd`: image,
//!    renamed to `.grd`
//! 3. low byte 0x44 with a u32 at +5 equal to `size - 9`: audio
//! 4. u16 at +4 equal to 6 and u32 at +6 equal to 0x140050: script, renamed
//!    to `.srp` when the archive is named exactly `srp`
//!
//! Rules 2 and 3 are byte-pattern guesses and can misfire on arbitrary data;
//! they report [`Confidence::Heuristic`].

use super::ArchiveIndex;
use crate::view::ArcView;
use crate::{EntryKind, Result, OGG_SIGNATURE, SCRIPT_MARKER_DWORD, SCRIPT_MARKER_WORD};
use log::{debug, trace};
use std::fmt;
use std::io::{Read, Seek};
use std::path::Path;

/// Bytes read at the start of every entry
pub const PROBE_LEN: u64 = 10;

/// Leading bytes of an entry plus its declared size
///
/// The probe may extend past the entry into the next payload, and is clipped
/// at end of file. Field accessors return `None` when the field would lie
/// beyond what was read.
#[derive(Debug, Clone)]
pub struct Probe<'a> {
    bytes: &'a [u8],
    size: u32,
}

impl<'a> Probe<'a> {
    /// Wrap probe bytes for an entry of `size` bytes
    pub fn new(bytes: &'a [u8], size: u32) -> Self {
        Self { bytes, size }
    }

    /// Declared entry size
    pub fn size(&self) -> u32 {
        self.size
    }

    fn field<const N: usize>(&self, at: usize) -> Option<[u8; N]> {
        self.bytes.get(at..at + N)?.try_into().ok()
    }

    /// u32 at offset 0
    pub fn signature(&self) -> Option<u32> {
        self.u32_at(0)
    }

    /// i16 at `at`
    pub fn i16_at(&self, at: usize) -> Option<i16> {
        self.field(at).map(i16::from_le_bytes)
    }

    /// u32 at `at`
    pub fn u32_at(&self, at: usize) -> Option<u32> {
        self.field(at).map(u32::from_le_bytes)
    }

    /// True when the script marker is present at +4/+6
    pub fn has_script_marker(&self) -> bool {
        self.i16_at(4) == Some(SCRIPT_MARKER_WORD) && self.u32_at(6) == Some(SCRIPT_MARKER_DWORD)
    }
}

/// Archive-level context shared by all rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SniffContext {
    archive_name: String,
}

impl SniffContext {
    /// Context for an archive called `name` (stem, any case)
    pub fn new(name: &str) -> Self {
        Self {
            archive_name: name.to_lowercase(),
        }
    }

    /// Context derived from an archive path's lower-cased file stem
    pub fn from_path(path: &Path) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::new(&stem)
    }

    /// Lower-cased archive stem
    pub fn archive_name(&self) -> &str {
        &self.archive_name
    }
}

/// How much a verdict should be trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// A magic number matched
    Signature,
    /// A loose byte pattern matched
    Heuristic,
}

/// Outcome of a matching rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    /// Kind to assign
    pub kind: EntryKind,
    /// Replacement extension, including the dot
    pub extension: Option<&'static str>,
    /// Trust level of the match
    pub confidence: Confidence,
}

/// One signature rule in the sniffing chain
pub trait Classifier: fmt::Debug + Send + Sync {
    /// Rule name used in logs
    fn name(&self) -> &'static str;

    /// Classify an entry, or return `None` to defer to the next rule
    fn classify(&self, probe: &Probe<'_>, context: &SniffContext) -> Option<Verdict>;
}

/// `OggS` stream
#[derive(Debug, Clone, Copy, Default)]
pub struct OggRule;

impl Classifier for OggRule {
    fn name(&self) -> &'static str {
        "ogg"
    }

    fn classify(&self, probe: &Probe<'_>, _context: &SniffContext) -> Option<Verdict> {
        (probe.signature()? == OGG_SIGNATURE).then_some(Verdict {
            kind: EntryKind::Audio,
            extension: Some(".ogg"),
            confidence: Confidence::Signature,
        })
    }
}

/// GRD image inside an image archive
#[derive(Debug, Clone, Copy, Default)]
pub struct GrdImageRule;

impl Classifier for GrdImageRule {
    fn name(&self) -> &'static str {
        "grd"
    }

    fn classify(&self, probe: &Probe<'_>, context: &SniffContext) -> Option<Verdict> {
        let low = probe.signature()? & 0xFF;
        ((low == 1 || low == 2) && context.archive_name().contains("grd")).then_some(Verdict {
            kind: EntryKind::Image,
            extension: Some(".grd"),
            confidence: Confidence::Heuristic,
        })
    }
}

/// Audio blob with a length field at +5
#[derive(Debug, Clone, Copy, Default)]
pub struct LengthPrefixedAudioRule;

impl Classifier for LengthPrefixedAudioRule {
    fn name(&self) -> &'static str {
        "audio-0x44"
    }

    fn classify(&self, probe: &Probe<'_>, _context: &SniffContext) -> Option<Verdict> {
        if probe.signature()? & 0xFF != 0x44 {
            return None;
        }
        let body = probe.size().checked_sub(9)?;
        (probe.u32_at(5)? == body).then_some(Verdict {
            kind: EntryKind::Audio,
            extension: None,
            confidence: Confidence::Heuristic,
        })
    }
}

/// Nibble-obfuscated script
#[derive(Debug, Clone, Copy, Default)]
pub struct ScriptRule;

impl Classifier for ScriptRule {
    fn name(&self) -> &'static str {
        "script"
    }

    fn classify(&self, probe: &Probe<'_>, context: &SniffContext) -> Option<Verdict> {
        probe.has_script_marker().then(|| Verdict {
            kind: EntryKind::Script,
            extension: (context.archive_name() == "srp").then_some(".srp"),
            confidence: Confidence::Signature,
        })
    }
}

/// Ordered chain of classifiers
#[derive(Debug)]
pub struct Sniffer {
    rules: Vec<Box<dyn Classifier>>,
}

impl Sniffer {
    /// Sniffer without any rules
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule with the lowest priority so far
    pub fn with_rule<C: Classifier + 'static>(mut self, rule: C) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Run the chain on one probe, returning the matching rule's name
    pub fn classify(
        &self,
        probe: &Probe<'_>,
        context: &SniffContext,
    ) -> Option<(&'static str, Verdict)> {
        self.rules
            .iter()
            .find_map(|rule| rule.classify(probe, context).map(|v| (rule.name(), v)))
    }

    /// Classify every entry of `index` in place
    pub fn apply<R: Read + Seek>(
        &self,
        view: &mut ArcView<R>,
        index: &mut ArchiveIndex,
        context: &SniffContext,
    ) -> Result<()> {
        for entry in &mut index.entries {
            let bytes = view.read_clipped(entry.offset, PROBE_LEN)?;
            let probe = Probe::new(&bytes, entry.size);
            let Some((rule, verdict)) = self.classify(&probe, context) else {
                trace!("'{}': no signature matched", entry.name);
                continue;
            };

            match verdict.confidence {
                Confidence::Signature => {
                    trace!("'{}': {} ({rule})", entry.name, verdict.kind.as_str())
                }
                Confidence::Heuristic => debug!(
                    "'{}': heuristic match {} ({rule})",
                    entry.name,
                    verdict.kind.as_str()
                ),
            }

            entry.kind = verdict.kind;
            if let Some(ext) = verdict.extension {
                entry.name = replace_extension(&entry.name, ext);
            }
        }
        Ok(())
    }
}

impl Default for Sniffer {
    fn default() -> Self {
        Self::empty()
            .with_rule(OggRule)
            .with_rule(GrdImageRule)
            .with_rule(LengthPrefixedAudioRule)
            .with_rule(ScriptRule)
    }
}

/// Replace the last extension of the final path component
///
/// A leading dot does not start an extension, so `.cfg` becomes `.cfg.ogg`
/// rather than `.ogg`.
pub fn replace_extension(name: &str, ext: &str) -> String {
    let start = name.rfind(&['/', '\\'][..]).map_or(0, |p| p + 1);
    let component = &name[start..];
    let stem_len = match component.rfind('.') {
        Some(dot) if component[..dot].chars().any(|c| c != '.') => dot,
        _ => component.len(),
    };
    format!("{}{}", &name[..start + stem_len], ext)
}
