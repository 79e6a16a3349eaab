use std::io::{BufRead, BufReader, Write};
use std::thread;
use std::time::Duration;
use log::info;
use rand::Rng;
use serialport::SerialPort;
use crate::drivers::DeviceError;
/// Byte that asks the ADC for one reading.
pub const REQUEST_BYTE: u8 = b'a';
pub const BAUD_RATE: u32 = 9600;
pub const READ_TIMEOUT: Duration = Duration::from_secs(2);
/// Time the microcontroller needs after the port opens (it resets on DTR).
pub const SETTLE_DELAY: Duration = Duration::from_secs(2);
/// Something that yields one raw ADC code per request.
///
/// Implementations must not pipeline requests: a new request is only issued
/// after the previous response has been consumed.
pub trait SampleDevice {
    fn request_sample(&mut self) -> Result<i64, DeviceError>;
}
/// Parses one response line (`"123\r\n"`) into a raw code.
pub fn parse_response(line: &str) -> Result<i64, DeviceError> {
    let trimmed = line.trim();
    trimmed.parse::<i64>().map_err(|_| DeviceError::Parse {
        line: trimmed.to_owned(),
    })
}
/// Request/response ADC on a serial port.
pub struct SerialDevice {
    port_name: String,
    reader: BufReader<Box<dyn SerialPort>>,
    line: String,
}
impl SerialDevice {
    /// Opens the port and waits for the board to settle.
    pub fn open(port_name: &str) -> Result<Self, DeviceError> {
        if port_name.trim().is_empty() {
            return Err(DeviceError::NoPortConfigured);
        }
        let port = serialport::new(port_name, BAUD_RATE)
            .timeout(READ_TIMEOUT)
            .open()?;
        info!("opened {port_name} at {BAUD_RATE} baud, settling");
        thread::sleep(SETTLE_DELAY);
        Ok(Self {
            port_name: port_name.to_owned(),
            reader: BufReader::new(port),
            line: String::new(),
        })
    }
    pub fn port_name(&self) -> &str {
        &self.port_name
    }
}
impl SampleDevice for SerialDevice {
    fn request_sample(&mut self) -> Result<i64, DeviceError> {
        let port = self.reader.get_mut();
        port.write_all(&[REQUEST_BYTE])?;
        port.flush()?;
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Err(DeviceError::Disconnected);
        }
        parse_response(&self.line)
    }
}
/// Synthetic ADC for running the plot without hardware attached.
pub struct SimulatedDevice {
    phase: f64,
}
impl SimulatedDevice {
    pub fn new() -> Self {
        Self { phase: 0.0 }
    }
}
impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new()
    }
}
impl SampleDevice for SimulatedDevice {
    fn request_sample(&mut self) -> Result<i64, DeviceError> {
        self.phase += 0.05;
        // roughly 0..40 V after calibration, with a few codes of noise
        let code = 300.0 + 280.0 * self.phase.sin() + rand::thread_rng().gen_range(-4.0..4.0);
        Ok(code.round() as i64)
    }
}
/// Replays queued responses.
#[cfg(test)]
pub struct ScriptedDevice {
    queue: std::collections::VecDeque<Result<String, DeviceError>>,
}
#[cfg(test)]
impl ScriptedDevice {
    pub fn new(lines: impl IntoIterator<Item = &'static str>) -> Self {
        Self {
            queue: lines.into_iter().map(|l| Ok(l.to_owned())).collect(),
        }
    }
    pub fn push_error(&mut self, error: DeviceError) {
        self.queue.push_back(Err(error));
    }
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }
}
#[cfg(test)]
impl SampleDevice for ScriptedDevice {
    fn request_sample(&mut self) -> Result<i64, DeviceError> {
        match self.queue.pop_front() {
            Some(Ok(line)) => parse_response(&line),
            Some(Err(e)) => Err(e),
            None => Err(DeviceError::Disconnected),
        }
    }
}
