use std::fmt;
use std::sync::{Arc, Mutex};

/// Sequencer generates sequential sequence numbers for building RTP packets.
pub trait Sequencer: fmt::Debug {
    fn next_sequence_number(&self) -> u16;
    fn roll_over_count(&self) -> u64;
    fn clone_to(&self) -> Box<dyn Sequencer + Send + Sync>;
}

impl Clone for Box<dyn Sequencer + Send + Sync> {
    fn clone(&self) -> Box<dyn Sequencer + Send + Sync> {
        self.clone_to()
    }
}

/// NewRandomSequencer returns a new sequencer starting from a random sequence
/// number.
pub fn new_random_sequencer() -> impl Sequencer {
    let c = Counters {
        sequence_number: rand::random::<u16>(),
        roll_over_count: 0,
    };
    SequencerImpl(Arc::new(Mutex::new(c)))
}

/// NewFixedSequencer returns a new sequencer starting from a specific
/// sequence number.
pub fn new_fixed_sequencer(s: u16) -> impl Sequencer {
    let c = Counters {
        sequence_number: s.wrapping_sub(1),
        roll_over_count: 0,
    };
    SequencerImpl(Arc::new(Mutex::new(c)))
}

#[derive(Debug, Clone)]
struct SequencerImpl(Arc<Mutex<Counters>>);

#[derive(Debug)]
struct Counters {
    sequence_number: u16,
    roll_over_count: u64,
}

impl Sequencer for SequencerImpl {
    /// Returns the next sequence number, rolling over at 2^16.
    fn next_sequence_number(&self) -> u16 {
        let mut counters = self.0.lock().unwrap();
        counters.sequence_number = counters.sequence_number.wrapping_add(1);
        if counters.sequence_number == 0 {
            counters.roll_over_count += 1;
        }
        counters.sequence_number
    }

    /// Returns the amount of times the 16bit sequence number has wrapped.
    fn roll_over_count(&self) -> u64 {
        self.0.lock().unwrap().roll_over_count
    }

    fn clone_to(&self) -> Box<dyn Sequencer + Send + Sync> {
        Box::new(self.clone())
    }
}
