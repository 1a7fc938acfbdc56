use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use super::pipeline::{FrameQuerySet, PassTimer};

const TIMER_BYTES: u64 = 2 * std::mem::size_of::<u64>() as u64;

const PENDING: u8 = 0;
const MAPPED: u8 = 1;
const FAILED: u8 = 2;

/// Begin/end timestamps around one render pass, read back asynchronously.
///
/// Lifecycle per frame: [`timestamp_writes`](Self::timestamp_writes) while
/// recording, [`resolve`](Self::resolve) before the encoder is finished,
/// [`request_readback`](Self::request_readback) after submission, then poll
/// [`is_ready`](PassTimer::is_ready).
#[derive(Debug)]
pub struct GpuTimer {
    query_set: wgpu::QuerySet,
    resolve_buffer: wgpu::Buffer,
    readback: wgpu::Buffer,
    state: Arc<AtomicU8>,
    requested: bool,
    period_ns: f64,
}

impl GpuTimer {
    pub fn new(device: &wgpu::Device, label: &str, period_ns: f32) -> Self {
        let query_set = device.create_query_set(&wgpu::QuerySetDescriptor {
            label: Some(label),
            ty: wgpu::QueryType::Timestamp,
            count: 2,
        });
        let resolve_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} resolve")),
            size: TIMER_BYTES,
            usage: wgpu::BufferUsages::QUERY_RESOLVE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        });
        let readback = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} readback")),
            size: TIMER_BYTES,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            query_set,
            resolve_buffer,
            readback,
            state: Arc::new(AtomicU8::new(PENDING)),
            requested: false,
            period_ns: f64::from(period_ns),
        }
    }

    pub fn timestamp_writes(&self) -> wgpu::RenderPassTimestampWrites<'_> {
        wgpu::RenderPassTimestampWrites {
            query_set: &self.query_set,
            beginning_of_pass_write_index: Some(0),
            end_of_pass_write_index: Some(1),
        }
    }

    /// Records the copy of both timestamps into the readback buffer.
    pub fn resolve(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.resolve_query_set(&self.query_set, 0..2, &self.resolve_buffer, 0);
        encoder.copy_buffer_to_buffer(&self.resolve_buffer, 0, &self.readback, 0, TIMER_BYTES);
    }

    /// Starts mapping the readback buffer. Call once, after the frame that
    /// wrote the timestamps was submitted.
    pub fn request_readback(&mut self) {
        if self.requested {
            return;
        }
        self.requested = true;

        let state = self.state.clone();
        self.readback
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| match result {
                Ok(()) => state.store(MAPPED, Ordering::Release),
                Err(err) => {
                    log::warn!("timer readback failed: {err}");
                    state.store(FAILED, Ordering::Release);
                }
            });
    }
}

impl PassTimer for GpuTimer {
    fn is_ready(&self) -> bool {
        self.state.load(Ordering::Acquire) != PENDING
    }

    fn elapsed_ns(&self) -> Option<f64> {
        if self.state.load(Ordering::Acquire) != MAPPED {
            return None;
        }
        let view = self.readback.slice(..).get_mapped_range();
        let stamps: &[u64] = bytemuck::cast_slice(&view);
        let ticks = stamps[1].saturating_sub(stamps[0]);
        Some(ticks as f64 * self.period_ns)
    }

    fn reset(&mut self) {
        if self.state.swap(PENDING, Ordering::AcqRel) == MAPPED {
            self.readback.unmap();
        }
        self.requested = false;
    }
}

/// Creates timer sets for frames.
pub struct GpuTimerPool {
    period_ns: f32,
    created: usize,
}

impl GpuTimerPool {
    /// The device must have `TIMESTAMP_QUERY` enabled; `period_ns` is the
    /// queue's nanoseconds per tick.
    pub fn new(period_ns: f32) -> Self {
        Self { period_ns, created: 0 }
    }

    pub fn make_set(&mut self, device: &wgpu::Device) -> FrameQuerySet<GpuTimer> {
        let id = self.created;
        self.created += 1;
        log::debug!("allocating timer set #{id}");
        FrameQuerySet::new(crate::render::PassId::ALL.map(|pass| {
            GpuTimer::new(device, &format!("{pass:?} timer #{id}"), self.period_ns)
        }))
    }

    /// Timer sets allocated so far.
    pub fn created(&self) -> usize {
        self.created
    }
}
