// SPDX-FileCopyrightText: 2025 Contributors to the Capture Input project.
// SPDX-License-Identifier: Apache-2.0

//! Bounded sample queues shared by the capture and consumer threads.
//!
//! Each queue has a soft maximum depth `M`. The producer may fill it up to the
//! hard capacity `M * TOLERATED_EXTRA_BUFFER_FACTOR`; past that, samples are
//! dropped and counted instead of queued. Once per host tick the consumer
//! trims each queue back down to `M`, oldest first, whether or not the
//! producer ever hit the hard capacity: fresh samples win over complete ones.
//!
//! ## Concurrency
//!
//! There is one producer (the SDK thread) and one consumer (the host tick).
//! The consumer only ever removes samples, so a producer-side
//! [`SampleQueue::has_room`] check stays valid until the producer pushes.

use std::{
    collections::VecDeque,
    sync::{
        Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU32, Ordering},
    },
};

use serde::Serialize;

use crate::{AudioSample, Pooled, SamplePool, VideoSample};

/// Hard capacity of a queue as a multiple of its soft maximum depth.
pub const TOLERATED_EXTRA_BUFFER_FACTOR: usize = 2;

/// Default soft maximum depth for both queues.
pub const DEFAULT_MAX_BUFFER_DEPTH: usize = 8;

/// Outcome of [`SampleQueue::try_push`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueue {
    /// The sample was queued.
    Queued,
    /// The queue was at hard capacity; the sample was discarded.
    Dropped,
}

/// FIFO of samples with a soft maximum depth and a drop counter.
pub struct SampleQueue<T> {
    samples: Mutex<VecDeque<T>>,
    max_depth: usize,
    drops: AtomicU32,
}

impl<T> SampleQueue<T> {
    /// Creates a queue trimmed to `max_depth` (at least 1).
    pub fn new(max_depth: usize) -> Self {
        let max_depth = max_depth.max(1);
        Self {
            samples: Mutex::new(VecDeque::with_capacity(max_depth * TOLERATED_EXTRA_BUFFER_FACTOR)),
            max_depth,
            drops: AtomicU32::new(0),
        }
    }

    /// Soft maximum depth kept after maintenance.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Depth at which the producer starts dropping.
    pub fn hard_capacity(&self) -> usize {
        self.max_depth * TOLERATED_EXTRA_BUFFER_FACTOR
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// `true` if one more sample fits with `reserved` extra slots held back.
    pub fn has_room(&self, reserved: usize) -> bool {
        self.len() + reserved < self.hard_capacity()
    }

    /// Appends without checking capacity. Pair with [`Self::has_room`].
    pub fn push(&self, sample: T) {
        self.lock().push_back(sample);
    }

    /// Appends unless the queue is at hard capacity. Never blocks on the
    /// consumer beyond the queue lock.
    pub fn try_push(&self, sample: T) -> Enqueue {
        let mut samples = self.lock();
        if samples.len() >= self.hard_capacity() {
            return Enqueue::Dropped;
        }
        samples.push_back(sample);
        Enqueue::Queued
    }

    /// Removes the oldest sample.
    pub fn pop(&self) -> Option<T> {
        self.lock().pop_front()
    }

    /// Removes every sample, oldest first.
    pub fn drain(&self) -> Vec<T> {
        self.lock().drain(..).collect()
    }

    /// Discards the oldest samples until at most `max_depth` remain.
    /// Returns how many were discarded.
    pub fn trim(&self) -> u32 {
        let mut samples = self.lock();
        let overflow = samples.len().saturating_sub(self.max_depth);
        samples.drain(..overflow);
        overflow as u32
    }

    /// Counts one sample lost at hard capacity.
    pub fn record_drop(&self) {
        self.drops.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the drops counted since the last call and resets to zero.
    pub fn take_drops(&self) -> u32 {
        self.drops.swap(0, Ordering::AcqRel)
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<T>> {
        self.samples.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Samples lost since the previous maintenance pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DropReport {
    pub audio: u32,
    pub video: u32,
}

impl DropReport {
    pub fn is_empty(&self) -> bool {
        self.audio == 0 && self.video == 0
    }
}

/// The audio and video queues of one channel, with the pools their samples
/// are drawn from.
pub struct SampleBuffer {
    audio: SampleQueue<Pooled<AudioSample>>,
    video: SampleQueue<Pooled<VideoSample>>,
    audio_pool: SamplePool<AudioSample>,
    video_pool: SamplePool<VideoSample>,
}

impl SampleBuffer {
    pub fn new(max_audio_depth: usize, max_video_depth: usize) -> Self {
        Self {
            audio: SampleQueue::new(max_audio_depth),
            video: SampleQueue::new(max_video_depth),
            audio_pool: SamplePool::new(),
            video_pool: SamplePool::new(),
        }
    }

    /// Borrows audio storage from the pool.
    pub fn acquire_audio(&self) -> Pooled<AudioSample> {
        self.audio_pool.acquire()
    }

    /// Borrows video storage from the pool.
    pub fn acquire_video(&self) -> Pooled<VideoSample> {
        self.video_pool.acquire()
    }

    /// Idle storage held by the (audio, video) pools.
    pub fn pooled(&self) -> (usize, usize) {
        (self.audio_pool.available(), self.video_pool.available())
    }

    pub fn audio(&self) -> &SampleQueue<Pooled<AudioSample>> {
        &self.audio
    }

    pub fn video(&self) -> &SampleQueue<Pooled<VideoSample>> {
        &self.video
    }

    /// Trims both queues to their soft maximum, then collects drop telemetry.
    ///
    /// Trimmed samples always count as lost. Producer-side drops are read
    /// (and reset) only when `read_drop_counters` is set.
    pub fn maintain(&self, read_drop_counters: bool) -> DropReport {
        let mut report = DropReport {
            audio: self.audio.trim(),
            video: self.video.trim(),
        };
        if read_drop_counters {
            report.audio += self.audio.take_drops();
            report.video += self.video.take_drops();
        }
        report
    }

    /// Empties both queues and frees idle pool storage.
    pub fn clear(&self) {
        self.audio.clear();
        self.video.clear();
        self.audio_pool.reset();
        self.video_pool.reset();
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BUFFER_DEPTH, DEFAULT_MAX_BUFFER_DEPTH)
    }
}
