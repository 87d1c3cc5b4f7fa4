//! 测试用的内存解码器与快照存储

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::application::ports::{
    AudioDecoderPort, DecodeError, FrameReader, Snapshot, SnapshotError, SnapshotStorePort,
};

/// 从内存数组读帧
pub struct VecReader {
    samples: Vec<f32>,
    pos: usize,
    calls: usize,
    largest_request: usize,
}

impl VecReader {
    pub fn new(samples: Vec<f32>) -> Self {
        Self {
            samples,
            pos: 0,
            calls: 0,
            largest_request: 0,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls
    }

    pub fn largest_request(&self) -> usize {
        self.largest_request
    }
}

impl FrameReader for VecReader {
    fn total_frames(&self) -> u64 {
        self.samples.len() as u64
    }

    fn sample_rate(&self) -> u32 {
        44_100
    }

    fn read_frames(&mut self, buf: &mut Vec<f32>, max_frames: usize) -> Result<usize, DecodeError> {
        self.calls += 1;
        self.largest_request = self.largest_request.max(max_frames);
        let end = (self.pos + max_frames).min(self.samples.len());
        buf.extend_from_slice(&self.samples[self.pos..end]);
        let read = end - self.pos;
        self.pos = end;
        Ok(read)
    }
}

/// 按 location 提供样本的解码器，并记录每个 location 被打开的次数
#[derive(Default)]
pub struct FakeDecoder {
    sources: Mutex<HashMap<String, Vec<f32>>>,
    opens: Mutex<HashMap<String, usize>>,
    total_opens: AtomicUsize,
}

impl FakeDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, location: &str, samples: Vec<f32>) {
        self.sources
            .lock()
            .unwrap()
            .insert(location.to_string(), samples);
    }

    pub fn open_count(&self, location: &str) -> usize {
        self.opens
            .lock()
            .unwrap()
            .get(location)
            .copied()
            .unwrap_or(0)
    }

    pub fn total_opens(&self) -> usize {
        self.total_opens.load(Ordering::SeqCst)
    }
}

impl AudioDecoderPort for FakeDecoder {
    fn open(&self, path: &Path) -> Result<Box<dyn FrameReader>, DecodeError> {
        let location = path.to_string_lossy().to_string();
        self.total_opens.fetch_add(1, Ordering::SeqCst);
        *self
            .opens
            .lock()
            .unwrap()
            .entry(location.clone())
            .or_default() += 1;

        match self.sources.lock().unwrap().get(&location) {
            Some(samples) => Ok(Box::new(VecReader::new(samples.clone()))),
            None => Err(DecodeError::OpenFailed(location)),
        }
    }
}

/// 内存快照存储
#[derive(Default)]
pub struct MemorySnapshotStore {
    current: Mutex<Snapshot>,
    saves: AtomicUsize,
}

impl MemorySnapshotStore {
    pub fn with_snapshot(snapshot: Snapshot) -> Self {
        Self {
            current: Mutex::new(snapshot),
            saves: AtomicUsize::new(0),
        }
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn current(&self) -> Snapshot {
        self.current.lock().unwrap().clone()
    }
}

impl SnapshotStorePort for MemorySnapshotStore {
    fn load(&self) -> Result<Snapshot, SnapshotError> {
        Ok(self.current())
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), SnapshotError> {
        *self.current.lock().unwrap() = snapshot.clone();
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
