// Serial side channel to the touch sensor board.
// Periodically sends a status query over the serial link, reads one
// acknowledgement line and maps a threshold crossing of the reported value
// to a mood change for the eyes.

use std::io::{self, BufRead, BufReader};
use std::time::{Duration, Instant};

use log::{debug, warn};

use crate::eyes::Mood;

// One-time board setup: disable both servo channels
const SETUP_CMD: &[u8] = b"sm;s1:-1000;s2:-1000\n";
const STATUS_QUERY: &[u8] = b"swa;\n";
const ACK_PREFIX: &str = "ACK;swa:";

const READ_TIMEOUT: Duration = Duration::from_millis(200);

pub struct SensorLink {
    port: Box<dyn serialport::SerialPort>,
    poll_interval: Duration,
    last_poll: Instant,
    happy_threshold: i32,
}

impl SensorLink {
    pub fn open(
        path: &str,
        baud: u32,
        poll_interval: Duration,
        happy_threshold: i32,
    ) -> serialport::Result<Self> {
        let port = serialport::new(path, baud).timeout(READ_TIMEOUT).open()?;
        Ok(Self {
            port,
            poll_interval,
            last_poll: Instant::now(),
            happy_threshold,
        })
    }

    /// Send the one-time board setup command.
    pub fn configure(&mut self) -> io::Result<()> {
        self.port.write_all(SETUP_CMD)
    }

    /// Poll the sensor if the interval has elapsed. Returns the mood the
    /// latest reading maps to; read or parse failures are logged and yield
    /// no change.
    pub fn poll(&mut self) -> Option<Mood> {
        if self.last_poll.elapsed() < self.poll_interval {
            return None;
        }
        self.last_poll = Instant::now();

        if let Err(e) = self.port.clear(serialport::ClearBuffer::Input) {
            warn!("sensor input flush failed: {e}");
            return None;
        }
        if let Err(e) = self.port.write_all(STATUS_QUERY) {
            warn!("sensor query failed: {e}");
            return None;
        }

        let mut line = String::new();
        let mut reader = BufReader::new(&mut *self.port);
        match reader.read_line(&mut line) {
            Ok(0) => {
                debug!("sensor sent no response");
                None
            }
            Ok(_) => {
                let line = line.trim();
                match parse_ack(line) {
                    Some(value) => {
                        debug!("sensor value {value}");
                        Some(mood_for_value(value, self.happy_threshold))
                    }
                    None => {
                        warn!("unparseable sensor response: {line:?}");
                        None
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                debug!("sensor read timed out");
                None
            }
            Err(e) => {
                warn!("sensor read failed: {e}");
                None
            }
        }
    }
}

/// Parse an `ACK;swa:<value>` response line into its integer payload.
pub fn parse_ack(line: &str) -> Option<i32> {
    line.strip_prefix(ACK_PREFIX)?.trim().parse().ok()
}

/// A reading above the threshold means the robot was petted.
pub fn mood_for_value(value: i32, happy_threshold: i32) -> Mood {
    if value > happy_threshold {
        Mood::Happy
    } else {
        Mood::Default
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_acknowledgement_lines() {
        assert_eq!(parse_ack("ACK;swa:12"), Some(12));
        assert_eq!(parse_ack("ACK;swa:0"), Some(0));
        assert_eq!(parse_ack("ACK;swa:-3"), Some(-3));
        assert_eq!(parse_ack("ACK;swa: 7"), Some(7));
    }

    #[test]
    fn rejects_malformed_lines() {
        assert_eq!(parse_ack(""), None);
        assert_eq!(parse_ack("NAK;swa:5"), None);
        assert_eq!(parse_ack("ACK;swa:"), None);
        assert_eq!(parse_ack("ACK;swa:abc"), None);
        assert_eq!(parse_ack("swa:5"), None);
    }

    #[test]
    fn threshold_crossing_maps_to_happy() {
        assert_eq!(mood_for_value(10, 9), Mood::Happy);
        assert_eq!(mood_for_value(9, 9), Mood::Default);
        assert_eq!(mood_for_value(0, 9), Mood::Default);
    }
}
