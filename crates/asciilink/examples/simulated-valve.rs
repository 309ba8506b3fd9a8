//! Drives an in-memory valve simulator through a JSON command catalog,
//! first from one thread and then from several sharing the same channel.
//!
//! Run with:
//!   cargo run --example simulated-valve

use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::thread;

use asciilink::codec::Value;
use asciilink::protocol::{CommandRegistry, Instrument};
use asciilink::transport::{Channel, StreamTransport};

const CATALOG: &str = r#"{
    "tables": {
        "ACCESS": [["local", "0"], ["remote", "1"], ["locked", "2"]]
    },
    "commands": {
        "position": { "query": "A:", "write": "R:", "body": { "integer": 6 } },
        "access": { "query": "c:01", "write": "c:01", "body": { "table": "ACCESS" } },
        "close": { "write": "C:" },
        "identity": { "query": "i:83" }
    }
}"#;

/// Answers requests the way the firmware would, one reply per line.
#[derive(Default)]
struct ValveSimulator {
    request: Vec<u8>,
    replies: VecDeque<u8>,
    position: u32,
    access: char,
}

impl ValveSimulator {
    fn handle(&mut self, line: &str) -> String {
        if line == "A:" {
            return format!("A:{:06}", self.position);
        }
        if let Some(target) = line.strip_prefix("R:") {
            return match target.parse::<u32>() {
                Ok(value) if value <= 100_000 => {
                    self.position = value;
                    "R:".to_string()
                }
                _ => "E:000030:".to_string(),
            };
        }
        if line == "C:" {
            self.position = 0;
            return "C:".to_string();
        }
        if line == "c:01" {
            return format!("c:01{}", self.access);
        }
        if let Some(mode) = line.strip_prefix("c:01") {
            self.access = mode.chars().next().unwrap_or('0');
            return "c:01".to_string();
        }
        if line == "i:83" {
            return "i:83 VAT590".to_string();
        }
        "E:000020:".to_string()
    }
}

impl Write for ValveSimulator {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.request.extend_from_slice(buf);
        while let Some(end) = self.request.windows(2).position(|w| w == b"\r\n") {
            let line: Vec<u8> = self.request.drain(..end + 2).collect();
            let reply = self.handle(&String::from_utf8_lossy(&line[..end]));
            self.replies.extend(reply.bytes().chain(*b"\r\n"));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Read for ValveSimulator {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.replies.is_empty() {
            return Err(io::ErrorKind::TimedOut.into());
        }
        let n = buf.len().min(self.replies.len());
        for (slot, byte) in buf.iter_mut().zip(self.replies.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let simulator = ValveSimulator {
        access: '1',
        ..ValveSimulator::default()
    };
    let channel = Channel::new(StreamTransport::new(simulator));
    let valve = Instrument::with_registry(channel, CommandRegistry::from_json(CATALOG)?);

    println!("identity: {}", valve.query("identity")?);
    println!("access:   {}", valve.query("access")?);

    valve.write("position", &Value::Int(42_000))?;
    println!("position: {}", valve.query("position")?);

    // Rejected by the device; logged, not raised.
    valve.write("position", &Value::Int(999_999))?;

    let valve = Arc::new(valve);
    let workers: Vec<_> = (1..=4)
        .map(|step| {
            let valve = Arc::clone(&valve);
            thread::spawn(move || -> asciilink::protocol::Result<Value> {
                valve.write("position", &Value::Int(step * 10_000))?;
                valve.query("position")
            })
        })
        .collect();
    for worker in workers {
        match worker.join() {
            Ok(reading) => println!("worker read {}", reading?),
            Err(_) => eprintln!("worker panicked"),
        }
    }

    valve.write("close", &Value::empty())?;
    println!("closed at {}", valve.query("position")?);
    Ok(())
}
