use std::num::NonZeroU64;

use crate::shader::{Program, ShaderError};

use super::pass::Slot;

/// Bind group holding a pass's own uniform block.
pub const UNIFORM_GROUP: u32 = 0;
/// Bind group holding outputs of earlier passes (see [`Slot`]).
pub const INPUT_GROUP: u32 = 1;
/// Bind groups a [`PassBinder`] tracks; higher indices are bound every time.
pub const TRACKED_GROUPS: usize = 2;

// ── input layout ──────────────────────────────────────────────────────────

/// Input slots a program reads, checked against the slot table.
///
/// A declared slot name at the wrong `(group, binding)` is a link error. Other
/// group-1 declarations are rejected too, since nothing could fill them.
pub fn program_inputs(program: &Program) -> Result<Vec<Slot>, ShaderError> {
    let mut slots = Vec::new();
    for decl in program.bindings() {
        match Slot::from_name(&decl.name) {
            Some(slot) if decl.group == INPUT_GROUP && decl.binding == slot.binding() => {
                slots.push(slot);
            }
            Some(slot) => {
                return Err(ShaderError::Link {
                    name: program.name.clone(),
                    message: format!(
                        "`{}` must be declared at @group({INPUT_GROUP}) @binding({}), found ({}, {})",
                        decl.name,
                        slot.binding(),
                        decl.group,
                        decl.binding
                    ),
                });
            }
            None if decl.group == INPUT_GROUP => {
                return Err(ShaderError::Link {
                    name: program.name.clone(),
                    message: format!("unknown input `{}` in @group({INPUT_GROUP})", decl.name),
                });
            }
            None => {}
        }
    }
    slots.sort_by_key(|s| s.binding());
    Ok(slots)
}

/// Bind group layout for the inputs one program reads.
pub struct InputLayout {
    slots: Vec<Slot>,
    layout: wgpu::BindGroupLayout,
}

impl InputLayout {
    pub fn new(device: &wgpu::Device, program: &Program) -> Result<Self, ShaderError> {
        let slots = program_inputs(program)?;
        let entries: Vec<wgpu::BindGroupLayoutEntry> = slots
            .iter()
            .map(|slot| wgpu::BindGroupLayoutEntry {
                binding: slot.binding(),
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: slot.binding_type(),
                count: None,
            })
            .collect();

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{} inputs", program.name)),
            entries: &entries,
        });

        Ok(Self { slots, layout })
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn binder<'r>(&self, program: &Program) -> InputBinder<'r> {
        InputBinder {
            program: program.name.clone(),
            wanted: self.slots.clone(),
            offered: Vec::new(),
        }
    }
}

/// Collects the resources other passes offer for one program's inputs.
///
/// Passes offer every output they have; the binder keeps only what the
/// program declared, like setting an unused sampler uniform.
pub struct InputBinder<'r> {
    program: String,
    wanted: Vec<Slot>,
    offered: Vec<(Slot, wgpu::BindingResource<'r>)>,
}

impl<'r> InputBinder<'r> {
    pub fn offer(&mut self, slot: Slot, resource: wgpu::BindingResource<'r>) {
        if self.wanted.contains(&slot) {
            self.offered.retain(|(s, _)| *s != slot);
            self.offered.push((slot, resource));
        }
    }

    /// Builds the input bind group; every declared input must have been offered.
    pub fn finish(
        self,
        device: &wgpu::Device,
        layout: &InputLayout,
    ) -> Result<wgpu::BindGroup, ShaderError> {
        let missing: Vec<&str> = self
            .wanted
            .iter()
            .filter(|w| !self.offered.iter().any(|(s, _)| s == *w))
            .map(|s| s.name())
            .collect();
        if !missing.is_empty() {
            return Err(ShaderError::Link {
                name: self.program,
                message: format!("inputs not provided by any pass: {}", missing.join(", ")),
            });
        }

        let entries: Vec<wgpu::BindGroupEntry<'_>> = self
            .offered
            .into_iter()
            .map(|(slot, resource)| wgpu::BindGroupEntry {
                binding: slot.binding(),
                resource,
            })
            .collect();

        Ok(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{} inputs", self.program)),
            layout: layout.layout(),
            entries: &entries,
        }))
    }
}

// ── uniforms ──────────────────────────────────────────────────────────────

/// One uniform buffer at `@group(0) @binding(0)`.
pub struct UniformBlock {
    buffer: wgpu::Buffer,
    layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
}

impl UniformBlock {
    pub fn new<T: bytemuck::Pod>(device: &wgpu::Device, label: &str) -> Self {
        let size = std::mem::size_of::<T>() as u64;

        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(&format!("{label} uniforms")),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some(&format!("{label} uniform layout")),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(size),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label} uniform group")),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });

        Self {
            buffer,
            layout,
            bind_group,
        }
    }

    pub fn write<T: bytemuck::Pod>(&self, queue: &wgpu::Queue, value: &T) {
        queue.write_buffer(&self.buffer, 0, bytemuck::bytes_of(value));
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.layout
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

// ── pass binder ───────────────────────────────────────────────────────────

/// Last object bound to one binding point, compared by identity.
#[derive(Debug)]
pub struct LastBound<'r, T>(Option<&'r T>);

impl<T> Default for LastBound<'_, T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<'r, T> LastBound<'r, T> {
    /// Records `next` as bound; returns `false` if it already was.
    pub fn replace(&mut self, next: &'r T) -> bool {
        if self.0.is_some_and(|last| std::ptr::eq(last, next)) {
            return false;
        }
        self.0 = Some(next);
        true
    }
}

/// Records `group` at `index`; returns `false` if it was already bound there.
/// Untracked indices always need a bind.
fn needs_bind<'r, T>(slots: &mut [LastBound<'r, T>], index: u32, group: &'r T) -> bool {
    match slots.get_mut(index as usize) {
        Some(last) => last.replace(group),
        None => true,
    }
}

/// Render pass wrapper that skips redundant state changes.
///
/// Tracks the last pipeline, bind groups and vertex/index buffers for the
/// lifetime of one pass; dropping it ends the pass.
pub struct PassBinder<'e, 'r> {
    pass: wgpu::RenderPass<'e>,
    pipeline: LastBound<'r, wgpu::RenderPipeline>,
    bind_groups: [LastBound<'r, wgpu::BindGroup>; TRACKED_GROUPS],
    vertex_buffer: LastBound<'r, wgpu::Buffer>,
    index_buffer: LastBound<'r, wgpu::Buffer>,
    skipped: u32,
}

impl<'e, 'r> PassBinder<'e, 'r> {
    pub fn new(pass: wgpu::RenderPass<'e>) -> Self {
        Self {
            pass,
            pipeline: LastBound::default(),
            bind_groups: Default::default(),
            vertex_buffer: LastBound::default(),
            index_buffer: LastBound::default(),
            skipped: 0,
        }
    }

    pub fn set_pipeline(&mut self, pipeline: &'r wgpu::RenderPipeline) {
        if self.pipeline.replace(pipeline) {
            self.pass.set_pipeline(pipeline);
        } else {
            self.skipped += 1;
        }
    }

    pub fn set_bind_group(&mut self, index: u32, group: &'r wgpu::BindGroup) {
        if needs_bind(&mut self.bind_groups, index, group) {
            self.pass.set_bind_group(index, group, &[]);
        } else {
            self.skipped += 1;
        }
    }

    pub fn set_vertex_buffer(&mut self, buffer: &'r wgpu::Buffer) {
        if self.vertex_buffer.replace(buffer) {
            self.pass.set_vertex_buffer(0, buffer.slice(..));
        } else {
            self.skipped += 1;
        }
    }

    pub fn set_index_buffer(&mut self, buffer: &'r wgpu::Buffer) {
        if self.index_buffer.replace(buffer) {
            self.pass.set_index_buffer(buffer.slice(..), wgpu::IndexFormat::Uint32);
        } else {
            self.skipped += 1;
        }
    }

    pub fn draw(&mut self, vertices: std::ops::Range<u32>) {
        self.pass.draw(vertices, 0..1);
    }

    pub fn draw_indexed(&mut self, indices: std::ops::Range<u32>) {
        self.pass.draw_indexed(indices, 0, 0..1);
    }

    /// Number of state changes elided so far.
    pub fn skipped(&self) -> u32 {
        self.skipped
    }

    /// Ends the pass.
    pub fn end(self) {}
}
