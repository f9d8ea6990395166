//! Fast packet reassembly.
//!
//! PGNs with payloads of 9 to 223 bytes arrive as trains of up to 32 CAN
//! frames. The first byte of every frame carries a 5-bit sequence number
//! and a rotating group identifier in bits 5-6 so interleaved trains from
//! the same sender can be told apart. Frame 0 additionally declares the
//! total byte count of the reassembled message.
//!
//! All reassembly state is owned by the [`FastPacketAssembler`] instance;
//! the pipeline constructs one per adapter.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::catalog::PgnCatalog;
use crate::error::SequenceError;
use crate::raw_message::RawMessage;

/// Sorted, de-duplicated set of PGNs that arrive as fast packet trains.
#[derive(Debug, Clone, Default)]
pub struct FastPacketRegistry {
    pgns: Vec<u32>,
}

impl FastPacketRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded from every catalog definition whose minimum size
    /// exceeds a single frame.
    pub fn from_catalog(catalog: &PgnCatalog) -> Self {
        Self {
            pgns: catalog.fast_packet_pgns(),
        }
    }

    pub fn add(&mut self, pgn: u32) {
        if let Err(at) = self.pgns.binary_search(&pgn) {
            self.pgns.insert(at, pgn);
        }
    }

    pub fn contains(&self, pgn: u32) -> bool {
        self.pgns.binary_search(&pgn).is_ok()
    }

    pub fn len(&self) -> usize {
        self.pgns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pgns.is_empty()
    }
}

/// Reclamation policy for reassemblies that never complete. Swept whenever
/// a new entry is created.
#[derive(Debug, Clone, Copy)]
pub struct EvictionPolicy {
    /// Entries older than this are dropped.
    pub max_age: Duration,
    /// Hard cap on concurrently pending entries; the oldest goes first.
    pub max_pending: usize,
}

impl Default for EvictionPolicy {
    fn default() -> Self {
        Self {
            max_age: Duration::from_secs(5),
            max_pending: 64,
        }
    }
}

/// Key identifying one reassembly in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct ReassemblyKey {
    group: u8,
    pgn: u32,
    source: u8,
}

#[derive(Debug)]
struct PendingMessage {
    header: RawMessage,
    total_len: usize,
    last_seq: u8,
    data: Vec<u8>,
    started: Instant,
}

/// Combines fast packet frames into complete messages. Frames whose PGN is
/// not in the registry pass through untouched.
#[derive(Debug)]
pub struct FastPacketAssembler {
    registry: FastPacketRegistry,
    pending: HashMap<ReassemblyKey, PendingMessage>,
    policy: EvictionPolicy,
}

impl FastPacketAssembler {
    pub fn new(registry: FastPacketRegistry) -> Self {
        Self::with_policy(registry, EvictionPolicy::default())
    }

    pub fn with_policy(registry: FastPacketRegistry, policy: EvictionPolicy) -> Self {
        Self {
            registry,
            pending: HashMap::new(),
            policy,
        }
    }

    /// Number of reassemblies currently in flight.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Feed one physical frame. Returns a complete message when one is
    /// available: either the frame itself (non-fast-packet PGN) or a
    /// finished reassembly.
    pub fn accept(&mut self, frame: RawMessage) -> Option<RawMessage> {
        if !self.registry.contains(frame.pgn) {
            return Some(frame);
        }
        if frame.data.is_empty() {
            return None;
        }

        let seq = frame.data[0] & 0x1F;
        let group = (frame.data[0] >> 5) & 0x03;
        let key = ReassemblyKey {
            group,
            pgn: frame.pgn,
            source: frame.source,
        };

        if seq == 0 {
            // Start of a new train; stale scraps for the same key go away.
            if self.pending.remove(&key).is_some() {
                debug!(pgn = frame.pgn, source = frame.source, "restarting reassembly");
            }
            if frame.data.len() < 2 {
                return None;
            }
            let total_len = frame.data[1] as usize;
            let chunk = &frame.data[2..];

            if chunk.len() >= total_len {
                let mut msg = frame.clone();
                msg.length = total_len as u8;
                msg.data = chunk[..total_len].to_vec();
                return Some(msg);
            }

            self.evict_stale();
            self.pending.insert(
                key,
                PendingMessage {
                    header: frame.clone(),
                    total_len,
                    last_seq: 0,
                    data: chunk.to_vec(),
                    started: Instant::now(),
                },
            );
            return None;
        }

        let Some(entry) = self.pending.get_mut(&key) else {
            trace!(pgn = frame.pgn, seq, err = %SequenceError::UnknownKey, "dropping frame");
            return None;
        };
        if entry.last_seq + 1 != seq {
            let err = SequenceError::OutOfOrder {
                expected: entry.last_seq + 1,
                got: seq,
            };
            trace!(pgn = frame.pgn, %err, "dropping frame");
            return None;
        }

        entry.data.extend_from_slice(&frame.data[1..]);
        entry.last_seq = seq;

        if entry.data.len() >= entry.total_len {
            let entry = self.pending.remove(&key).unwrap();
            let mut msg = entry.header;
            msg.length = entry.total_len as u8;
            msg.data = entry.data;
            msg.data.truncate(entry.total_len);
            return Some(msg);
        }
        None
    }

    fn evict_stale(&mut self) {
        let max_age = self.policy.max_age;
        self.pending.retain(|key, entry| {
            let keep = entry.started.elapsed() <= max_age;
            if !keep {
                debug!(pgn = key.pgn, source = key.source, "evicting stale reassembly");
            }
            keep
        });

        while self.pending.len() >= self.policy.max_pending {
            let Some(oldest) = self
                .pending
                .iter()
                .min_by_key(|(_, e)| e.started)
                .map(|(k, _)| *k)
            else {
                break;
            };
            debug!(pgn = oldest.pgn, source = oldest.source, "evicting oldest reassembly");
            self.pending.remove(&oldest);
        }
    }
}
