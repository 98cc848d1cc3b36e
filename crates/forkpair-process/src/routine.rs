//! The two child-side routines.
//!
//! Both take ownership of their endpoint, so it is closed on every return
//! path, including errors.

use std::io::{Read, Write};
use std::ops::Range;
use std::time::Duration;

use forkpair_channel::{ChannelError, ValueReader, ValueWriter};
use serde::Serialize;
use tracing::{debug, info};

/// Child exit status for a run that reached end-of-stream cleanly.
pub const CHILD_SUCCESS: i32 = 0;
/// Child exit status for a failed send or receive.
pub const CHILD_IO_FAILURE: i32 = 1;
/// Child exit status for a stream that ended mid-value.
pub const CHILD_PROTOCOL_VIOLATION: i32 = 2;

/// What a producer sent before closing its end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProducerSummary {
    pub sent: usize,
    pub last: Option<i32>,
}

/// What a consumer received before end-of-stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsumerSummary {
    pub pair: u32,
    pub received: usize,
    pub sum: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum TaskSummary {
    Producer(ProducerSummary),
    Consumer(ConsumerSummary),
}

/// Send every value in `values`, sleeping `delay` after each send.
///
/// Stops at the first failed or short send without attempting the rest.
pub fn produce<W: Write>(
    writer: W,
    values: Range<i32>,
    delay: Duration,
) -> Result<ProducerSummary, ChannelError> {
    let mut writer = ValueWriter::new(writer);
    let mut summary = ProducerSummary {
        sent: 0,
        last: None,
    };

    info!(pid = std::process::id(), "producer starting");

    for value in values {
        writer.send(value)?;
        summary.sent += 1;
        summary.last = Some(value);
        debug!(value, "producer sent value");
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    info!(sent = summary.sent, "producer finished");
    Ok(summary)
}

/// Sum values until the peer closes its write end.
///
/// `pair` is used for logging only.
pub fn consume<R: Read>(reader: R, pair: u32) -> Result<ConsumerSummary, ChannelError> {
    let mut reader = ValueReader::new(reader);
    let mut summary = ConsumerSummary {
        pair,
        received: 0,
        sum: 0,
    };

    info!(pid = std::process::id(), pair, "consumer starting");

    while let Some(value) = reader.read_value()? {
        summary.received += 1;
        summary.sum += i64::from(value);
        debug!(pair, value, running_sum = summary.sum, "consumer received value");
    }

    info!(
        pair,
        received = summary.received,
        sum = summary.sum,
        "consumer reached end of stream"
    );
    Ok(summary)
}

/// Map a routine outcome onto the child's exit status.
pub fn exit_code<T>(result: &Result<T, ChannelError>) -> i32 {
    match result {
        Ok(_) => CHILD_SUCCESS,
        Err(ChannelError::Truncated { .. }) => CHILD_PROTOCOL_VIOLATION,
        Err(_) => CHILD_IO_FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use forkpair_channel::Channel;

    use super::*;

    fn wire(values: &[i32]) -> Vec<u8> {
        values.iter().flat_map(|v| v.to_ne_bytes()).collect()
    }

    #[test]
    fn producer_writes_exactly_k_values() {
        let mut sink = Vec::new();
        let summary = produce(&mut sink, 1..6, Duration::ZERO).unwrap();

        assert_eq!(summary, ProducerSummary { sent: 5, last: Some(5) });
        assert_eq!(sink, wire(&[1, 2, 3, 4, 5]));
    }

    #[test]
    fn producer_paces_sends() {
        let started = std::time::Instant::now();
        produce(std::io::sink(), 1..4, Duration::from_millis(20)).unwrap();
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[test]
    fn producer_stops_when_reader_is_gone() {
        let (reader, writer) = Channel::open().unwrap().split().unwrap();
        drop(reader);

        let result = produce(writer, 1..6, Duration::ZERO);
        assert!(matches!(result, Err(ChannelError::Io(_))));
        assert_eq!(exit_code(&result), CHILD_IO_FAILURE);
    }

    #[test]
    fn consumer_sums_first_pair() {
        let summary = consume(Cursor::new(wire(&[1, 2, 3, 4, 5])), 1).unwrap();
        assert_eq!(summary.received, 5);
        assert_eq!(summary.sum, 15);
    }

    #[test]
    fn consumer_sums_second_pair() {
        let summary = consume(Cursor::new(wire(&[6, 7, 8, 9, 10])), 2).unwrap();
        assert_eq!(summary.sum, 40);
        assert_eq!(summary.pair, 2);
    }

    #[test]
    fn consumer_sum_does_not_overflow() {
        let summary = consume(Cursor::new(wire(&[i32::MAX, i32::MAX])), 0).unwrap();
        assert_eq!(summary.sum, 2 * i64::from(i32::MAX));
    }

    #[test]
    fn consumer_on_empty_stream_sums_zero() {
        let result = consume(Cursor::new(Vec::new()), 0);
        assert_eq!(exit_code(&result), CHILD_SUCCESS);
        assert_eq!(result.unwrap().sum, 0);
    }

    #[test]
    fn consumer_rejects_partial_value() {
        let mut bytes = wire(&[1, 2]);
        bytes.push(0x7f);

        let result = consume(Cursor::new(bytes), 1);
        assert!(matches!(result, Err(ChannelError::Truncated { received: 1, .. })));
        assert_eq!(exit_code(&result), CHILD_PROTOCOL_VIOLATION);
    }

    #[test]
    fn producer_and_consumer_over_pipe() {
        let (reader, writer) = Channel::open().unwrap().split().unwrap();

        let consumer = std::thread::spawn(move || consume(reader, 1));
        produce(writer, 1..6, Duration::from_millis(1)).unwrap();

        let summary = consumer.join().unwrap().unwrap();
        assert_eq!(summary.received, 5);
        assert_eq!(summary.sum, 15);
    }

    #[test]
    fn summaries_serialize_with_role_tag() {
        let json = serde_json::to_value(TaskSummary::Consumer(ConsumerSummary {
            pair: 2,
            received: 5,
            sum: 40,
        }))
        .unwrap();
        assert_eq!(json["role"], "consumer");
        assert_eq!(json["sum"], 40);
    }
}
