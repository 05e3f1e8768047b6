// AnkleWindow - fixed-capacity ring buffer of recent ankle samples
//
// Slots are allocated once; when full, the oldest sample is overwritten in
// place. The window only serves as bounded look-back for picking the launch
// reference, so it never grows past its capacity.

use serde::{Deserialize, Serialize};

/// One ankle measurement tagged with its frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnkleSample {
    /// Vertical pixel position (grows downward)
    pub y: f64,
    pub frame_index: u64,
}

#[derive(Debug, Clone)]
pub struct AnkleWindow {
    slots: Vec<AnkleSample>,
    capacity: usize,
    /// Slot the next sample is written to
    head: usize,
}

impl AnkleWindow {
    /// Create a window holding at most `capacity` samples (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn push(&mut self, sample: AnkleSample) {
        if self.slots.len() < self.capacity {
            self.slots.push(sample);
        } else {
            self.slots[self.head] = sample;
        }
        self.head = (self.head + 1) % self.capacity;
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.head = 0;
    }

    /// Samples from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &AnkleSample> {
        let split = if self.slots.len() < self.capacity {
            0
        } else {
            self.head
        };
        self.slots[split..].iter().chain(self.slots[..split].iter())
    }

    /// Sample closest to the ground (largest y), most recent on ties
    pub fn lowest_point(&self) -> Option<AnkleSample> {
        self.iter().fold(None, |best: Option<AnkleSample>, sample| match best {
            Some(b) if b.y > sample.y => Some(b),
            _ => Some(*sample),
        })
    }
}
