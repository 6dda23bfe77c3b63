//! Host buffer descriptors and the per-port buffer pool.
//!
//! Buffers are allocated by the host, described with [`HostBuffer`], and moved
//! into a port's [`BufferPool`] in bulk. From then on the node only tracks queue
//! membership: a fixed slot table indexed by buffer id plus a fixed FIFO ring of
//! free ids. Nothing in this module allocates after installation.

use crate::error::{NodeError, Result};
use crate::{MAX_BUFFERS, SAMPLE_SIZE};

/// Memory kind of a data block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// No memory attached.
    Invalid,
    /// Plain process memory.
    MemPtr,
    /// Memory backed by a shareable file descriptor.
    MemFd,
    /// DMA-capable memory backed by a file descriptor.
    DmaBuf,
    /// Memory referenced by id, not mapped.
    MemId,
}

impl DataType {
    /// Returns `true` for the kinds the node can read and write directly.
    pub const fn is_mappable(self) -> bool {
        matches!(self, Self::MemPtr | Self::MemFd | Self::DmaBuf)
    }
}

/// Valid sub-region of a data block. All fields are in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Chunk {
    /// Start of valid data.
    pub offset: u32,
    /// Length of valid data.
    pub size: u32,
    /// Distance between consecutive samples.
    pub stride: i32,
}

impl Chunk {
    /// A chunk covering `samples` float samples from the start of the block.
    pub fn samples(samples: usize) -> Self {
        Self {
            offset: 0,
            size: bytes_u32(samples),
            stride: SAMPLE_SIZE as i32,
        }
    }
}

/// One block of sample memory owned by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct DataBlock {
    /// Memory kind.
    pub data_type: DataType,
    /// Backing file descriptor for fd-based kinds.
    pub fd: Option<i64>,
    /// Offset of the mapping inside the backing memory.
    pub map_offset: u32,
    /// Mapped samples, or `None` if the block is not mapped.
    pub data: Option<Vec<f32>>,
    /// Valid region of `data`.
    pub chunk: Chunk,
}

impl DataBlock {
    /// A plain-memory block holding `samples`, with a chunk covering all of them.
    pub fn mem_ptr(samples: Vec<f32>) -> Self {
        let chunk = Chunk::samples(samples.len());
        Self {
            data_type: DataType::MemPtr,
            fd: None,
            map_offset: 0,
            data: Some(samples),
            chunk,
        }
    }

    /// A zeroed plain-memory block of `samples` capacity with an empty chunk.
    pub fn with_capacity(samples: usize) -> Self {
        Self {
            chunk: Chunk::default(),
            ..Self::mem_ptr(vec![0.0; samples])
        }
    }

    /// Capacity of the block in bytes.
    pub fn max_size(&self) -> u32 {
        self.data.as_ref().map_or(0, |d| bytes_u32(d.len()))
    }

    /// Returns `true` if the node can use this block.
    pub fn is_valid_memory(&self) -> bool {
        self.data_type.is_mappable() && self.data.is_some()
    }

    /// Full mapped sample storage.
    pub fn samples(&self) -> &[f32] {
        self.data.as_deref().unwrap_or(&[])
    }

    /// Samples inside the chunk, clamped to the mapped storage.
    pub fn chunk_samples(&self) -> &[f32] {
        let data = self.samples();
        let start = (self.chunk.offset as usize / SAMPLE_SIZE).min(data.len());
        let end = start
            .saturating_add(self.chunk.size as usize / SAMPLE_SIZE)
            .min(data.len());
        &data[start..end]
    }

    /// Bytes readable from the chunk offset to the end of the mapping.
    pub fn available_bytes(&self) -> u32 {
        self.max_size().saturating_sub(self.chunk.offset)
    }

    /// Copies `samples` to the start of the block and points the chunk at them.
    ///
    /// Returns the number of samples written, which is less than
    /// `samples.len()` if the block is smaller.
    pub fn write_samples(&mut self, samples: &[f32]) -> usize {
        let Some(data) = self.data.as_mut() else {
            return 0;
        };
        let n = samples.len().min(data.len());
        data[..n].copy_from_slice(&samples[..n]);
        self.chunk = Chunk::samples(n);
        n
    }
}

/// Metadata kinds a buffer can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetaType {
    /// Timing and sequence header ([`MetaHeader`]).
    Header,
}

impl MetaType {
    /// Wire id.
    pub const fn id(self) -> u32 {
        match self {
            Self::Header => 1,
        }
    }

    /// Size of the metadata on the wire.
    pub const fn size(self) -> usize {
        match self {
            Self::Header => MetaHeader::SIZE,
        }
    }
}

/// Timing and sequence header attached to a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetaHeader {
    /// Header flags.
    pub flags: u32,
    /// Sequence number.
    pub seq: u32,
    /// Presentation timestamp.
    pub pts: i64,
    /// Decoding timestamp relative to `pts`.
    pub dts_offset: i64,
}

impl MetaHeader {
    /// Size on the wire.
    pub const SIZE: usize = 24;
}

/// A piece of metadata attached to a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Meta {
    /// Timing and sequence header.
    Header(MetaHeader),
}

impl Meta {
    /// Kind of this metadata.
    pub fn meta_type(&self) -> MetaType {
        match self {
            Self::Header(_) => MetaType::Header,
        }
    }
}

/// A buffer as supplied by the host: data blocks plus metadata.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HostBuffer {
    /// Data blocks. Only the first one carries samples for this node.
    pub datas: Vec<DataBlock>,
    /// Attached metadata.
    pub metas: Vec<Meta>,
}

impl HostBuffer {
    /// Creates a buffer without metadata.
    pub fn new(datas: Vec<DataBlock>) -> Self {
        Self {
            datas,
            metas: Vec::new(),
        }
    }

    /// Builder-style: attaches a header.
    #[must_use]
    pub fn with_header(mut self, header: MetaHeader) -> Self {
        self.metas.push(Meta::Header(header));
        self
    }

    /// First data block, if any.
    pub fn first(&self) -> Option<&DataBlock> {
        self.datas.first()
    }

    /// First data block, mutably.
    pub fn first_mut(&mut self) -> Option<&mut DataBlock> {
        self.datas.first_mut()
    }

    /// Header metadata, if attached.
    pub fn header(&self) -> Option<&MetaHeader> {
        self.metas.iter().find_map(|m| match m {
            Meta::Header(h) => Some(h),
        })
    }

    /// Header metadata, mutably.
    pub fn header_mut(&mut self) -> Option<&mut MetaHeader> {
        self.metas.iter_mut().find_map(|m| match m {
            Meta::Header(h) => Some(h),
        })
    }

    fn is_valid_memory(&self) -> bool {
        self.first().is_some_and(DataBlock::is_valid_memory)
    }
}

/// What an output slot currently publishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputData {
    /// Nothing produced into this slot yet.
    #[default]
    Idle,
    /// The node's scratch buffer, `chunk` covering the mixed samples.
    Mixed(Chunk),
    /// An alias of a single input buffer.
    Passthrough {
        /// Input port that supplied the buffer.
        port_id: u32,
        /// Buffer id on that input port.
        buffer_id: u32,
    },
}

/// One installed buffer.
#[derive(Debug, Clone)]
pub struct BufferSlot {
    id: u32,
    queued: bool,
    host: HostBuffer,
    output: OutputData,
}

impl BufferSlot {
    /// Buffer id, equal to its position in the installed set.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Whether the buffer is on the free queue.
    pub fn is_queued(&self) -> bool {
        self.queued
    }

    /// Host descriptor.
    pub fn host(&self) -> &HostBuffer {
        &self.host
    }

    /// Host descriptor, mutably.
    pub fn host_mut(&mut self) -> &mut HostBuffer {
        &mut self.host
    }

    /// What the slot publishes as output.
    pub fn output(&self) -> OutputData {
        self.output
    }

    pub(crate) fn set_output(&mut self, output: OutputData) {
        self.output = output;
    }
}

/// Fixed-capacity buffer table with a FIFO free-queue.
///
/// # Example
///
/// ```rust
/// use floatmix_core::{BufferPool, DataBlock, HostBuffer};
///
/// let mut pool = BufferPool::new();
/// let buffers = (0..2).map(|_| HostBuffer::new(vec![DataBlock::with_capacity(64)])).collect();
/// pool.install(buffers, true).unwrap();
///
/// assert_eq!(pool.dequeue(), Some(0));
/// assert_eq!(pool.dequeue(), Some(1));
/// assert_eq!(pool.dequeue(), None);
/// ```
#[derive(Debug)]
pub struct BufferPool {
    slots: [Option<BufferSlot>; MAX_BUFFERS],
    n_buffers: u32,
    ring: [u32; MAX_BUFFERS],
    head: usize,
    queued: usize,
    queued_bytes: usize,
}

impl BufferPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| None),
            n_buffers: 0,
            ring: [0; MAX_BUFFERS],
            head: 0,
            queued: 0,
            queued_bytes: 0,
        }
    }

    /// Replaces the installed set with `buffers`.
    ///
    /// Every buffer is validated before anything changes: more than
    /// [`MAX_BUFFERS`] entries, or a first data block that is not mappable
    /// memory with data, fails the whole call and keeps the previous set. With
    /// `queue_all` every new buffer starts on the free queue.
    pub fn install(&mut self, buffers: Vec<HostBuffer>, queue_all: bool) -> Result<()> {
        if buffers.len() > MAX_BUFFERS {
            return Err(NodeError::TooManyBuffers {
                count: buffers.len(),
                max: MAX_BUFFERS,
            });
        }
        if let Some(index) = buffers.iter().position(|b| !b.is_valid_memory()) {
            #[cfg(feature = "tracing")]
            tracing::error!("floatmix: invalid memory on buffer {index}");
            return Err(NodeError::InvalidMemory {
                index: index as u32,
            });
        }

        self.clear();
        for (i, host) in buffers.into_iter().enumerate() {
            self.slots[i] = Some(BufferSlot {
                id: i as u32,
                queued: false,
                host,
                output: OutputData::Idle,
            });
            self.n_buffers += 1;
            if queue_all {
                self.enqueue(i as u32)?;
            }
        }
        Ok(())
    }

    /// Drops every installed buffer and empties the queue.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.n_buffers = 0;
        self.head = 0;
        self.queued = 0;
        self.queued_bytes = 0;
    }

    /// Appends buffer `id` to the tail of the free queue.
    pub fn enqueue(&mut self, id: u32) -> Result<()> {
        let slot = self
            .slots
            .get_mut(id as usize)
            .and_then(Option::as_mut)
            .ok_or(NodeError::UnknownBuffer(id))?;
        if slot.queued {
            return Err(NodeError::BufferQueued(id));
        }
        slot.queued = true;
        slot.output = OutputData::Idle;
        self.queued_bytes += slot.host.first().map_or(0, |d| d.chunk.size as usize);

        let tail = (self.head + self.queued) % MAX_BUFFERS;
        self.ring[tail] = id;
        self.queued += 1;
        #[cfg(feature = "tracing")]
        tracing::trace!("floatmix: queue buffer {id}");
        Ok(())
    }

    /// Removes and returns the head of the free queue, or `None` if it is empty.
    pub fn dequeue(&mut self) -> Option<u32> {
        if self.queued == 0 {
            return None;
        }
        let id = self.ring[self.head];
        self.head = (self.head + 1) % MAX_BUFFERS;
        self.queued -= 1;

        if let Some(slot) = self.slots[id as usize].as_mut() {
            slot.queued = false;
            let bytes = slot.host.first().map_or(0, |d| d.chunk.size as usize);
            self.queued_bytes = self.queued_bytes.saturating_sub(bytes);
        }
        #[cfg(feature = "tracing")]
        tracing::trace!("floatmix: dequeue buffer {id}");
        Some(id)
    }

    /// Installed buffer `id`.
    pub fn get(&self, id: u32) -> Option<&BufferSlot> {
        self.slots.get(id as usize).and_then(Option::as_ref)
    }

    /// Installed buffer `id`, mutably.
    pub fn get_mut(&mut self, id: u32) -> Option<&mut BufferSlot> {
        self.slots.get_mut(id as usize).and_then(Option::as_mut)
    }

    /// Number of installed buffers.
    pub fn len(&self) -> u32 {
        self.n_buffers
    }

    /// Returns `true` if no buffers are installed.
    pub fn is_empty(&self) -> bool {
        self.n_buffers == 0
    }

    /// Returns `true` if `id` names an installed buffer.
    pub fn contains(&self, id: u32) -> bool {
        id < self.n_buffers
    }

    /// Number of buffers on the free queue.
    pub fn queued(&self) -> usize {
        self.queued
    }

    /// Sum of the chunk sizes of queued buffers, in bytes.
    pub fn queued_bytes(&self) -> usize {
        self.queued_bytes
    }

    /// Returns `true` if buffer `id` is on the free queue.
    pub fn is_queued(&self, id: u32) -> bool {
        self.get(id).is_some_and(BufferSlot::is_queued)
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

fn bytes_u32(samples: usize) -> u32 {
    u32::try_from(samples.saturating_mul(SAMPLE_SIZE)).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffers(n: usize) -> Vec<HostBuffer> {
        (0..n)
            .map(|_| HostBuffer::new(vec![DataBlock::with_capacity(16)]))
            .collect()
    }

    #[test]
    fn install_without_queue_leaves_queue_empty() {
        let mut pool = BufferPool::new();
        pool.install(buffers(3), false).unwrap();
        assert_eq!(pool.len(), 3);
        assert_eq!(pool.queued(), 0);
        assert_eq!(pool.dequeue(), None);
    }

    #[test]
    fn queue_is_fifo() {
        let mut pool = BufferPool::new();
        pool.install(buffers(3), false).unwrap();
        pool.enqueue(2).unwrap();
        pool.enqueue(0).unwrap();
        pool.enqueue(1).unwrap();
        assert_eq!(pool.dequeue(), Some(2));
        assert_eq!(pool.dequeue(), Some(0));
        assert_eq!(pool.dequeue(), Some(1));
        assert_eq!(pool.dequeue(), None);
    }

    #[test]
    fn double_enqueue_rejected() {
        let mut pool = BufferPool::new();
        pool.install(buffers(1), false).unwrap();
        pool.enqueue(0).unwrap();
        assert_eq!(pool.enqueue(0), Err(NodeError::BufferQueued(0)));
        assert_eq!(pool.dequeue(), Some(0));
        assert!(!pool.is_queued(0));
        pool.enqueue(0).unwrap();
    }

    #[test]
    fn enqueue_unknown_rejected() {
        let mut pool = BufferPool::new();
        pool.install(buffers(2), false).unwrap();
        assert_eq!(pool.enqueue(2), Err(NodeError::UnknownBuffer(2)));
    }

    #[test]
    fn ring_wraps_around() {
        let mut pool = BufferPool::new();
        pool.install(buffers(MAX_BUFFERS), true).unwrap();
        for _ in 0..3 * MAX_BUFFERS {
            let id = pool.dequeue().unwrap();
            pool.enqueue(id).unwrap();
        }
        assert_eq!(pool.queued(), MAX_BUFFERS);
    }

    #[test]
    fn invalid_memory_keeps_previous_set() {
        let mut pool = BufferPool::new();
        pool.install(buffers(2), true).unwrap();

        let mut bad = buffers(3);
        bad[1].datas[0].data = None;
        assert_eq!(
            pool.install(bad, true),
            Err(NodeError::InvalidMemory { index: 1 })
        );
        assert_eq!(pool.len(), 2);
        assert_eq!(pool.queued(), 2);

        let mut bad = buffers(1);
        bad[0].datas[0].data_type = DataType::MemId;
        assert!(pool.install(bad, true).is_err());

        assert_eq!(
            pool.install(vec![HostBuffer::default()], true),
            Err(NodeError::InvalidMemory { index: 0 })
        );
    }

    #[test]
    fn too_many_buffers_rejected() {
        let mut pool = BufferPool::new();
        assert_eq!(
            pool.install(buffers(MAX_BUFFERS + 1), false),
            Err(NodeError::TooManyBuffers {
                count: MAX_BUFFERS + 1,
                max: MAX_BUFFERS
            })
        );
    }

    #[test]
    fn reinstall_discards_queue() {
        let mut pool = BufferPool::new();
        pool.install(buffers(4), true).unwrap();
        pool.install(buffers(1), false).unwrap();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.queued(), 0);
        assert!(pool.get(3).is_none());
    }

    #[test]
    fn queued_bytes_tracks_chunks() {
        let mut pool = BufferPool::new();
        let set = vec![HostBuffer::new(vec![DataBlock::mem_ptr(vec![0.0; 8])])];
        pool.install(set, true).unwrap();
        assert_eq!(pool.queued_bytes(), 32);
        pool.dequeue();
        assert_eq!(pool.queued_bytes(), 0);
    }

    #[test]
    fn chunk_samples_honor_offset() {
        let mut block = DataBlock::mem_ptr(vec![1.0, 2.0, 3.0, 4.0]);
        block.chunk = Chunk {
            offset: 4,
            size: 8,
            stride: 4,
        };
        assert_eq!(block.chunk_samples(), &[2.0, 3.0]);
        assert_eq!(block.available_bytes(), 12);

        block.chunk.size = 1000;
        assert_eq!(block.chunk_samples(), &[2.0, 3.0, 4.0]);
    }

    #[test]
    fn write_samples_truncates_to_capacity() {
        let mut block = DataBlock::with_capacity(2);
        assert_eq!(block.write_samples(&[1.0, 2.0, 3.0]), 2);
        assert_eq!(block.chunk.size, 8);
        assert_eq!(block.chunk_samples(), &[1.0, 2.0]);
    }

    #[test]
    fn header_meta_accessible() {
        let mut buf = HostBuffer::new(vec![DataBlock::with_capacity(4)]).with_header(MetaHeader {
            seq: 7,
            ..MetaHeader::default()
        });
        assert_eq!(buf.header().map(|h| h.seq), Some(7));
        if let Some(h) = buf.header_mut() {
            h.pts = 1000;
        }
        assert_eq!(buf.header().map(|h| h.pts), Some(1000));
        assert_eq!(MetaType::Header.size(), 24);
    }
}
