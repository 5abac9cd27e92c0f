use ringbuf::{
    traits::{Consumer, Observer, Producer, Split},
    HeapCons, HeapProd, HeapRb,
};

/// Decode-thread side of a session's sample queue.
pub struct SampleProducer {
    inner: HeapProd<f32>,
}

/// Output-callback side of a session's sample queue.
pub struct SampleConsumer {
    inner: HeapCons<f32>,
}

impl SampleProducer {
    /// Pushes as many samples as fit and returns how many were taken.
    pub fn push_slice(&mut self, samples: &[f32]) -> usize {
        self.inner.push_slice(samples)
    }

    pub fn vacant_len(&self) -> usize {
        self.inner.vacant_len()
    }
}

impl SampleConsumer {
    pub fn pop(&mut self) -> Option<f32> {
        self.inner.try_pop()
    }

    pub fn occupied_len(&self) -> usize {
        self.inner.occupied_len()
    }

    /// Drops everything buffered, returning the number of samples dropped.
    pub fn clear(&mut self) -> usize {
        self.inner.clear()
    }
}

/// Creates a lock-free SPSC sample queue holding `capacity` samples.
pub fn sample_queue(capacity: usize) -> (SampleProducer, SampleConsumer) {
    let rb = HeapRb::<f32>::new(capacity.max(1));
    let (prod, cons) = rb.split();
    (
        SampleProducer { inner: prod },
        SampleConsumer { inner: cons },
    )
}
