use super::builder::{BufferCreator, BufferSlot};
use super::command::CommandManager;
use super::vertex::{IndexType, Vertex2D};

/// Sizing of the CPU-side vertex batches.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct Renderer2DConfig {
    /// Batches per frame; requests beyond the last batch are dropped.
    pub max_batches: usize,
    /// Vertices per batch. At most 65536 since indices are 16-bit.
    pub batch_vertex_capacity: usize,
    pub batch_index_capacity: usize,
}

impl Default for Renderer2DConfig {
    fn default() -> Self {
        Self {
            max_batches: 64,
            batch_vertex_capacity: 65_535,
            batch_index_capacity: 65_535 * 3,
        }
    }
}

/// Vertices and indices drawn together from one pair of GPU buffers.
#[derive(Debug, Clone, Default)]
pub struct VertexBatch {
    vertices: Vec<Vertex2D>,
    indices: Vec<IndexType>,
}

impl VertexBatch {
    #[inline]
    pub fn vertices(&self) -> &[Vertex2D] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[IndexType] {
        &self.indices
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }
}

/// Per-frame vertex/index storage, split into fixed-capacity batches.
///
/// Batch 0 is active after `reset()`. Moving to the next batch records an
/// `UpdateBuffers` command so draws recorded afterwards index into it.
#[derive(Debug)]
pub struct VertexBufferManager2D {
    config: Renderer2DConfig,
    batches: Vec<VertexBatch>,
    active: usize,
}

impl VertexBufferManager2D {
    pub fn new(config: Renderer2DConfig) -> Self {
        let vertex_limit = IndexType::MAX as usize + 1;
        let config = Renderer2DConfig {
            max_batches: config.max_batches.max(1),
            batch_vertex_capacity: config.batch_vertex_capacity.min(vertex_limit),
            ..config
        };

        Self {
            config,
            batches: vec![VertexBatch::default()],
            active: 0,
        }
    }

    #[inline]
    pub fn config(&self) -> &Renderer2DConfig {
        &self.config
    }

    /// Empties every batch (allocations are kept) and reactivates batch 0.
    pub fn reset(&mut self) {
        for batch in &mut self.batches {
            batch.clear();
        }
        self.active = 0;
    }

    /// Batches in use this frame, including an empty batch 0.
    #[inline]
    pub fn batches(&self) -> &[VertexBatch] {
        &self.batches[..=self.active]
    }

    #[inline]
    pub fn batch(&self, index: u32) -> &VertexBatch {
        match self.batches().get(index as usize) {
            Some(b) => b,
            None => panic!("batch index {index} out of range ({} in use)", self.active + 1),
        }
    }

    /// Binds this storage and `commands` into a [`BufferCreator`] for the builders.
    #[inline]
    pub fn writer<'a>(&'a mut self, commands: &'a mut CommandManager) -> BatchWriter<'a> {
        BatchWriter { buffers: self, commands }
    }

    /// Reserves space, rolling over to a new batch when the active one is full.
    ///
    /// Returns `None` for a request larger than a batch, or when the last batch is full.
    pub fn request(
        &mut self,
        commands: &mut CommandManager,
        vertex_count: u16,
        index_count: u32,
    ) -> Option<BufferSlot<'_>> {
        let vertex_count = vertex_count as usize;
        let index_count = index_count as usize;

        if vertex_count > self.config.batch_vertex_capacity
            || index_count > self.config.batch_index_capacity
        {
            return None;
        }

        if !self.fits(self.active, vertex_count, index_count) {
            if self.active + 1 >= self.config.max_batches {
                return None;
            }

            self.active += 1;
            if self.batches.len() <= self.active {
                self.batches.push(VertexBatch::default());
            }
            commands.push_update_buffers(self.active as u32);
        }

        let batch = &mut self.batches[self.active];
        let v0 = batch.vertices.len();
        let i0 = batch.indices.len();
        batch.vertices.resize(v0 + vertex_count, Vertex2D::default());
        batch.indices.resize(i0 + index_count, 0);

        Some(BufferSlot {
            vertices: &mut batch.vertices[v0..],
            indices: &mut batch.indices[i0..],
            index_offset: v0 as IndexType,
        })
    }

    fn fits(&self, batch: usize, vertex_count: usize, index_count: usize) -> bool {
        let b = &self.batches[batch];
        b.vertices.len() + vertex_count <= self.config.batch_vertex_capacity
            && b.indices.len() + index_count <= self.config.batch_index_capacity
    }
}

impl Default for VertexBufferManager2D {
    fn default() -> Self {
        Self::new(Renderer2DConfig::default())
    }
}

/// [`BufferCreator`] that writes into the active batch and records batch switches.
pub struct BatchWriter<'a> {
    buffers: &'a mut VertexBufferManager2D,
    commands: &'a mut CommandManager,
}

impl BufferCreator for BatchWriter<'_> {
    #[inline]
    fn create_buffer(&mut self, vertex_count: u16, index_count: u32) -> Option<BufferSlot<'_>> {
        self.buffers.request(self.commands, vertex_count, index_count)
    }
}
