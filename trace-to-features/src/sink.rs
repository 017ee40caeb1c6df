//! Destinations for the event records, written in input order.
use crate::error::SinkError;
use bege_common::record::EventRecord;
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

pub(crate) trait RecordSink {
    fn append_record(&mut self, record: &EventRecord) -> Result<(), SinkError>;

    /// Flushes anything buffered. No record is appended afterwards.
    fn finish(&mut self) -> Result<(), SinkError>;
}

/// Writes each record as one line of JSON.
pub(crate) struct JsonLinesSink<W: Write> {
    writer: BufWriter<W>,
    written: usize,
}

impl JsonLinesSink<File> {
    pub(crate) fn create(path: &Path) -> Result<Self, SinkError> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> JsonLinesSink<W> {
    pub(crate) fn new(writer: W) -> Self {
        Self {
            writer: BufWriter::new(writer),
            written: 0,
        }
    }

    pub(crate) fn written(&self) -> usize {
        self.written
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn append_record(&mut self, record: &EventRecord) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Keeps the records in memory.
impl RecordSink for Vec<EventRecord> {
    fn append_record(&mut self, record: &EventRecord) -> Result<(), SinkError> {
        self.push(record.clone());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bege_common::record::{ChannelFeature, PulseRegion, RisetimeFeature};

    fn record(entry: usize) -> EventRecord {
        EventRecord {
            entry,
            timestamp: 10 * entry as u64,
            pulser_on: entry % 2 == 1,
            veto_regions: vec![PulseRegion::new(1, 2)].into(),
            channels: [ChannelFeature::default(); 5],
            risetimes: [RisetimeFeature {
                risetime: Some(1e-6),
                ..Default::default()
            }; 2],
        }
    }

    #[test]
    fn one_line_per_record_in_order() {
        let mut buffer = Vec::new();
        {
            let mut sink = JsonLinesSink::new(&mut buffer);
            for entry in 0..3 {
                sink.append_record(&record(entry)).expect("record should be written");
            }
            sink.finish().expect("sink should flush");
            assert_eq!(sink.written(), 3);
        }
        let text = String::from_utf8(buffer).expect("output is utf8");
        let records: Vec<EventRecord> = text
            .lines()
            .map(|line| serde_json::from_str(line).expect("line is a record"))
            .collect();
        assert_eq!(records, (0..3).map(record).collect::<Vec<_>>());
    }

    #[test]
    fn memory_sink() {
        let mut sink: Vec<EventRecord> = Vec::new();
        sink.append_record(&record(4)).expect("always succeeds");
        sink.finish().expect("always succeeds");
        assert_eq!(sink, vec![record(4)]);
    }
}
