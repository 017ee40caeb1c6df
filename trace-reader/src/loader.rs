//! Reader for the raw binary files written by the BEGe digitizer.
//!
//! The files have no header. Each trigger is a fixed size record of 32-bit
//! big-endian words:
//! * waveforms 0 and 1, interlaced sample by sample, as IEEE single floats,
//! * two floats encoding the timestamp and two unsigned pulser words,
//! * waveforms 2 and 3, interlaced,
//! * waveforms 4 and 5, interlaced.
use super::{EventSource, EventView, ReaderError};
use bege_common::{CHANNELS_PER_EVENT, ChannelRole, EntryIndex, Real, Timestamp};
use std::{
    fs::File,
    io::{BufWriter, Read, Seek, SeekFrom, Write},
    mem::size_of,
    path::Path,
};
use strum::IntoEnumIterator;
use tracing::{debug, info};

const WORD: usize = size_of::<u32>();
const EXTRA_WORDS: usize = 4;
const TIMESTAMP_SCALE: f64 = 1e7;

/// Fixed parameters of the recording which are not stored in the file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawFileFormat {
    pub waveform_length: usize,
    pub sampling_frequency: Real,
}

impl Default for RawFileFormat {
    fn default() -> Self {
        Self {
            waveform_length: 8000,
            sampling_frequency: 20e6,
        }
    }
}

impl RawFileFormat {
    fn words_per_pair(&self) -> usize {
        2 * self.waveform_length
    }

    pub fn record_size(&self) -> usize {
        WORD * (CHANNELS_PER_EVENT * self.waveform_length + EXTRA_WORDS)
    }
}

/// An open raw digitizer file. The record buffer is reused between entries.
#[derive(Debug)]
pub struct RawEventFile {
    file: File,
    format: RawFileFormat,
    num_entries: usize,
    buffer: Vec<u8>,
}

impl RawEventFile {
    pub fn open(path: &Path, format: RawFileFormat) -> Result<Self, ReaderError> {
        let file = File::open(path)?;
        let size = file.metadata()?.len();
        let record_size = format.record_size() as u64;
        if record_size == 0 || size % record_size != 0 {
            return Err(ReaderError::CorruptFile { size, record_size });
        }
        let num_entries = (size / record_size) as usize;
        info!("Opened {path:?}: {num_entries} events of {record_size} bytes");
        Ok(Self {
            file,
            format,
            num_entries,
            buffer: vec![0; format.record_size()],
        })
    }

    pub fn format(&self) -> &RawFileFormat {
        &self.format
    }
}

impl EventSource for RawEventFile {
    fn entry_count(&self) -> usize {
        self.num_entries
    }

    fn entry(&mut self, entry: EntryIndex) -> Result<EventView, ReaderError> {
        if entry >= self.num_entries {
            return Err(ReaderError::EntryOutOfRange {
                entry,
                count: self.num_entries,
            });
        }
        self.file
            .seek(SeekFrom::Start((entry * self.format.record_size()) as u64))?;
        self.file.read_exact(&mut self.buffer)?;
        debug!("Read entry {entry}");
        Ok(decode_record(&self.buffer, &self.format))
    }
}

fn word_at(bytes: &[u8], index: usize) -> u32 {
    let offset = index * WORD;
    u32::from_be_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn float_at(bytes: &[u8], index: usize) -> f32 {
    f32::from_bits(word_at(bytes, index))
}

/// Reads two interlaced waveforms beginning at word `first`.
fn load_waveform_pair(bytes: &[u8], first: usize, length: usize) -> (Vec<Real>, Vec<Real>) {
    (0..length)
        .map(|i| {
            (
                float_at(bytes, first + 2 * i) as Real,
                float_at(bytes, first + 2 * i + 1) as Real,
            )
        })
        .unzip()
}

pub(crate) fn decode_timestamp(coarse: f32, fine: f32) -> Timestamp {
    (coarse as f64 * TIMESTAMP_SCALE) as Timestamp + (fine as f64) as Timestamp
}

pub(crate) fn encode_timestamp(timestamp: Timestamp) -> (f32, f32) {
    let scale = TIMESTAMP_SCALE as Timestamp;
    ((timestamp / scale) as f32, (timestamp % scale) as f32)
}

fn decode_record(bytes: &[u8], format: &RawFileFormat) -> EventView {
    let length = format.waveform_length;
    let pair = format.words_per_pair();

    let (trace0, trace1) = load_waveform_pair(bytes, 0, length);
    let extra = pair;
    let timestamp = decode_timestamp(float_at(bytes, extra), float_at(bytes, extra + 1));
    let pulser_chunks = [word_at(bytes, extra + 2), word_at(bytes, extra + 3)];
    let (trace2, trace3) = load_waveform_pair(bytes, pair + EXTRA_WORDS, length);
    let (trace4, trace5) = load_waveform_pair(bytes, 2 * pair + EXTRA_WORDS, length);

    EventView {
        traces: [trace0, trace1, trace2, trace3, trace4, trace5],
        sampling_frequency: format.sampling_frequency,
        pulser_chunks,
        timestamp,
    }
}

/// Encodes an event in the raw digitizer format.
/// Samples are narrowed to single precision.
pub fn write_raw_event<W: Write>(
    writer: &mut W,
    event: &EventView,
    format: &RawFileFormat,
) -> Result<(), ReaderError> {
    for role in ChannelRole::iter() {
        let trace = event.trace(role);
        if trace.len() != format.waveform_length {
            return Err(ReaderError::TraceLength {
                role,
                expected: format.waveform_length,
                found: trace.len(),
            });
        }
    }

    let write_pair = |writer: &mut W, a: &[Real], b: &[Real]| -> Result<(), ReaderError> {
        for (x, y) in a.iter().zip(b) {
            writer.write_all(&(*x as f32).to_bits().to_be_bytes())?;
            writer.write_all(&(*y as f32).to_bits().to_be_bytes())?;
        }
        Ok(())
    };

    let [trace0, trace1, trace2, trace3, trace4, trace5] = &event.traces;
    write_pair(writer, trace0, trace1)?;

    let (coarse, fine) = encode_timestamp(event.timestamp);
    writer.write_all(&coarse.to_bits().to_be_bytes())?;
    writer.write_all(&fine.to_bits().to_be_bytes())?;
    for chunk in event.pulser_chunks {
        writer.write_all(&chunk.to_be_bytes())?;
    }

    write_pair(writer, trace2, trace3)?;
    write_pair(writer, trace4, trace5)?;
    Ok(())
}

/// Writes all events to a new raw file at `path`.
pub fn write_raw_file<'a>(
    path: &Path,
    events: impl IntoIterator<Item = &'a EventView>,
    format: &RawFileFormat,
) -> Result<usize, ReaderError> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut count = 0;
    for event in events {
        write_raw_event(&mut writer, event, format)?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("trace-reader-{}-{name}", std::process::id()))
    }

    fn small_format() -> RawFileFormat {
        RawFileFormat {
            waveform_length: 4,
            sampling_frequency: 20e6,
        }
    }

    fn event(seed: Real, timestamp: Timestamp, pulser_chunks: [u32; 2]) -> EventView {
        EventView {
            traces: std::array::from_fn(|c| {
                (0..4).map(|i| seed + c as Real + 0.25 * i as Real).collect()
            }),
            sampling_frequency: 20e6,
            pulser_chunks,
            timestamp,
        }
    }

    #[test]
    fn record_size_matches_digitizer() {
        assert_eq!(RawFileFormat::default().record_size(), 6 * 4 * 8000 + 16);
    }

    #[test]
    fn timestamp_encoding() {
        assert_eq!(decode_timestamp(3.0, 250.0), 30_000_250);
        let (coarse, fine) = encode_timestamp(123_456_789_012);
        assert_eq!(decode_timestamp(coarse, fine), 123_456_789_012);
    }

    #[test]
    fn layout_is_interlaced_big_endian() {
        let format = small_format();
        let mut bytes = Vec::new();
        write_raw_event(&mut bytes, &event(0.0, 5, [1, 2]), &format)
            .expect("event should encode");
        assert_eq!(bytes.len(), format.record_size());
        // first word is sample 0 of trace 0, second is sample 0 of trace 1
        assert_eq!(float_at(&bytes, 0), 0.0);
        assert_eq!(float_at(&bytes, 1), 1.0);
        assert_eq!(float_at(&bytes, 2), 0.25);
        // pulser words follow the first pair and the timestamp
        assert_eq!(word_at(&bytes, 8 + 2), 1);
        assert_eq!(word_at(&bytes, 8 + 3), 2);
        // trace 3 is the second of the middle pair
        assert_eq!(float_at(&bytes, 12 + 1), 3.0);
    }

    #[test]
    fn file_round_trip() {
        let format = small_format();
        let path = temp_path("round-trip");
        let events = vec![event(0.0, 10, [0, 0]), event(10.0, 20_000_001, [0, 1])];
        assert_eq!(
            write_raw_file(&path, &events, &format).expect("file should be written"),
            2
        );

        let mut file = RawEventFile::open(&path, format).expect("file should open");
        assert_eq!(file.entry_count(), 2);
        assert_eq!(file.entry(1).expect("entry 1 should load"), events[1]);
        assert_eq!(file.entry(0).expect("entry 0 should load"), events[0]);
        assert!(matches!(
            file.entry(2),
            Err(ReaderError::EntryOutOfRange { entry: 2, count: 2 })
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn truncated_file_is_corrupt() {
        let format = small_format();
        let path = temp_path("truncated");
        std::fs::write(&path, vec![0u8; format.record_size() + 3]).expect("file should be written");
        assert!(matches!(
            RawEventFile::open(&path, format),
            Err(ReaderError::CorruptFile { .. })
        ));
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn wrong_trace_length_is_rejected() {
        let mut bad = event(0.0, 0, [0, 0]);
        bad.traces[ChannelRole::MuonVeto.index()].pop();
        let mut bytes = Vec::new();
        assert!(matches!(
            write_raw_event(&mut bytes, &bad, &small_format()),
            Err(ReaderError::TraceLength {
                role: ChannelRole::MuonVeto,
                expected: 4,
                found: 3
            })
        ));
    }
}
