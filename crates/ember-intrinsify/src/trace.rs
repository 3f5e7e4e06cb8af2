// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Advisory report of each transformation.

use std::sync::{Arc, Mutex};

/// Where the one-line transformation report goes.
#[derive(Debug, Clone, Default)]
pub enum TraceSink {
    #[default]
    Stdout,
    /// Captured lines, newline-terminated. Used by tests and embedders.
    Buffer(Arc<Mutex<String>>),
    Silent,
}

impl TraceSink {
    /// A buffer sink plus a handle to read it back.
    pub fn buffer() -> (Self, Arc<Mutex<String>>) {
        let buf = Arc::new(Mutex::new(String::new()));
        (TraceSink::Buffer(Arc::clone(&buf)), buf)
    }

    pub fn emit(&self, line: &str) {
        match self {
            TraceSink::Stdout => println!("{}", line),
            TraceSink::Buffer(buf) => {
                if let Ok(mut buf) = buf.lock() {
                    buf.push_str(line);
                    buf.push('\n');
                }
            }
            TraceSink::Silent => {}
        }
    }
}
