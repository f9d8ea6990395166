//! NMEA2000 Protocol Core
//!
//! This library implements the decoding pipeline for NMEA2000 marine data
//! networks bridged over a serial byte stream:
//! - Adapter framing for the Actisense NGT-1 (escaped binary envelopes) and
//!   CANUSB (printable-hex ASCII lines) adapters
//! - Fast packet reassembly for multi-frame PGNs
//! - A catalog-driven field decoder with definition disambiguation
//! - A pipeline composing the above into a byte-in, message-out loop
//!
//! # Example
//!
//! ```no_run
//! use std::fs::File;
//! use std::sync::mpsc;
//!
//! use n2k::{ActisensePort, PgnCatalog, Pipeline, SplitPort};
//!
//! let input = File::open("/dev/ttyUSB0").unwrap();
//! let output = File::options().write(true).open("/dev/ttyUSB0").unwrap();
//!
//! let (tx, rx) = mpsc::channel();
//! let pipeline = Pipeline::new(
//!     ActisensePort::open(SplitPort::new(input, output)).unwrap(),
//!     PgnCatalog::standard(),
//!     tx,
//! );
//!
//! std::thread::spawn(move || pipeline.run());
//! for message in rx {
//!     println!("{}", message.print(false));
//! }
//! ```

pub mod actisense;
pub mod canusb;
pub mod catalog;
pub mod decoder;
pub mod error;
pub mod fast_packet;
pub mod message_handler;
pub mod pipeline;
pub mod raw_message;

mod split_port;

// Re-export commonly used types
pub use actisense::ActisensePort;
pub use canusb::CanUsbPort;
pub use catalog::{Field, FieldKind, PgnCatalog, PgnDefinition, Unit};
pub use decoder::{FieldValue, ParsedMessage};
pub use error::{FieldDecodeError, FramingError, LengthError, ProtocolError, SequenceError};
pub use fast_packet::{EvictionPolicy, FastPacketAssembler, FastPacketRegistry};
pub use message_handler::MessageHandler;
pub use pipeline::{BusCommand, MessageSource, Pipeline};
pub use raw_message::{RawMessage, BROADCAST, MAX_FAST_PACKET_LEN};
pub use split_port::SplitPort;
