//! Batched delivery of key events to the virtual keyboard

use crate::keyboard::{KeyEvent, WireEvent, INPUT_EVENT_SIZE};
use log::trace;
use std::io::{self, Write};

/// Writes a whole batch of key events plus one `SYN_REPORT` in a single
/// `write` so readers of the virtual device see the batch commit at once.
pub struct EventSink<W: Write> {
    writer: W,
    buffer: Vec<u8>,
}

impl<W: Write> EventSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            // Six keys plus eight modifiers plus the marker covers any report
            buffer: Vec::with_capacity(INPUT_EVENT_SIZE * 16),
        }
    }

    /// Deliver `events`. An empty batch writes nothing, not even a marker.
    pub fn emit(&mut self, events: &[KeyEvent]) -> io::Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        self.buffer.clear();
        for event in events {
            event.to_wire().encode_into(&mut self.buffer);
        }
        WireEvent::SYN.encode_into(&mut self.buffer);

        let written = self.writer.write(&self.buffer)?;
        if written != self.buffer.len() {
            return Err(io::Error::new(
                io::ErrorKind::WriteZero,
                format!("short write: {} of {} bytes", written, self.buffer.len()),
            ));
        }
        trace!("emitted {} key event(s)", events.len());
        Ok(())
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
