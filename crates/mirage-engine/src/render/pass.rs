use std::ops::Range;

/// The five passes of a frame, in submission order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PassId {
    Geometry,
    Shadow,
    Resolve,
    Reflection,
    Composite,
}

impl PassId {
    pub const COUNT: usize = 5;

    /// Frame order.
    pub const ALL: [PassId; Self::COUNT] = [
        PassId::Geometry,
        PassId::Shadow,
        PassId::Resolve,
        PassId::Reflection,
        PassId::Composite,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Name shown in the performance counters.
    pub fn label(self) -> &'static str {
        match self {
            PassId::Geometry => "G-Buffer Construction",
            PassId::Shadow => "Shadow Map Generation",
            PassId::Resolve => "Lighting Resolution",
            PassId::Reflection => "SSR Buffers Construction",
            PassId::Composite => "Final Combine Step",
        }
    }

    /// Geometry passes test and write depth; the full-screen passes do not.
    pub fn uses_depth(self) -> bool {
        matches!(self, PassId::Geometry | PassId::Shadow)
    }

    /// Input slots this pass's outputs occupy when bound for a later pass.
    pub fn outputs(self) -> &'static [Slot] {
        match self {
            PassId::Resolve => &[Slot::ResolveTexture],
            PassId::Geometry => &[
                Slot::ColorTexture,
                Slot::DepthTexture,
                Slot::NormalTexture,
                Slot::SpecularShininessTexture,
            ],
            PassId::Shadow => &[Slot::ShadowMap, Slot::ShadowSampler],
            PassId::Reflection => &[Slot::SsrTexcoordTexture, Slot::SsrVisibilityTexture],
            PassId::Composite => &[],
        }
    }

    /// Contiguous binding range of [`outputs`](Self::outputs) in the input group.
    pub fn output_range(self) -> Range<u32> {
        let outputs = self.outputs();
        match (outputs.first(), outputs.last()) {
            (Some(first), Some(last)) => first.binding()..last.binding() + 1,
            _ => 0..0,
        }
    }
}

// ── input slots ───────────────────────────────────────────────────────────

/// One binding of the input group (`@group(1)`), shared by every
/// full-screen program. Each slot has a fixed index and WGSL name.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Slot {
    ResolveTexture,
    ColorTexture,
    DepthTexture,
    NormalTexture,
    SpecularShininessTexture,
    ShadowMap,
    ShadowSampler,
    SsrTexcoordTexture,
    SsrVisibilityTexture,
    LinearSampler,
}

impl Slot {
    pub const ALL: [Slot; 10] = [
        Slot::ResolveTexture,
        Slot::ColorTexture,
        Slot::DepthTexture,
        Slot::NormalTexture,
        Slot::SpecularShininessTexture,
        Slot::ShadowMap,
        Slot::ShadowSampler,
        Slot::SsrTexcoordTexture,
        Slot::SsrVisibilityTexture,
        Slot::LinearSampler,
    ];

    pub fn binding(self) -> u32 {
        self as u32
    }

    /// Variable name a program uses to receive this slot.
    pub fn name(self) -> &'static str {
        match self {
            Slot::ResolveTexture => "resolve_texture",
            Slot::ColorTexture => "color_texture",
            Slot::DepthTexture => "depth_texture",
            Slot::NormalTexture => "normal_texture",
            Slot::SpecularShininessTexture => "specular_shininess_texture",
            Slot::ShadowMap => "shadow_map",
            Slot::ShadowSampler => "shadow_sampler",
            Slot::SsrTexcoordTexture => "ssr_texcoord_texture",
            Slot::SsrVisibilityTexture => "ssr_visibility_texture",
            Slot::LinearSampler => "linear_sampler",
        }
    }

    /// Pass whose output fills the slot; `None` for shared samplers.
    pub fn owner(self) -> Option<PassId> {
        PassId::ALL.into_iter().find(|p| p.outputs().contains(&self))
    }

    pub fn binding_type(self) -> wgpu::BindingType {
        let texture = |sample_type| wgpu::BindingType::Texture {
            sample_type,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        };
        let float = wgpu::TextureSampleType::Float { filterable: true };

        match self {
            Slot::ResolveTexture
            | Slot::ColorTexture
            | Slot::NormalTexture
            | Slot::SpecularShininessTexture => texture(float),
            Slot::DepthTexture | Slot::ShadowMap => texture(wgpu::TextureSampleType::Depth),
            Slot::SsrTexcoordTexture => texture(wgpu::TextureSampleType::Sint),
            Slot::SsrVisibilityTexture => {
                texture(wgpu::TextureSampleType::Float { filterable: false })
            }
            Slot::ShadowSampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
            Slot::LinearSampler => wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
        }
    }

    pub fn from_name(name: &str) -> Option<Slot> {
        Slot::ALL.into_iter().find(|s| s.name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn output_ranges_follow_the_unit_contract() {
        assert_eq!(PassId::Resolve.output_range(), 0..1);
        assert_eq!(PassId::Geometry.output_range(), 1..5);
        assert_eq!(PassId::Shadow.output_range(), 5..7);
        assert_eq!(PassId::Reflection.output_range(), 7..9);
        assert!(PassId::Composite.output_range().is_empty());
    }

    #[test]
    fn outputs_are_contiguous_and_disjoint() {
        let mut seen = HashSet::new();
        for pass in PassId::ALL {
            let bindings: Vec<u32> = pass.outputs().iter().map(|s| s.binding()).collect();
            let range: Vec<u32> = pass.output_range().collect();
            assert_eq!(bindings, range, "{pass:?}");
            for b in bindings {
                assert!(seen.insert(b), "binding {b} reused");
            }
        }
    }

    #[test]
    fn every_slot_has_a_unique_name_and_index() {
        let names: HashSet<_> = Slot::ALL.iter().map(|s| s.name()).collect();
        assert_eq!(names.len(), Slot::ALL.len());
        for (i, slot) in Slot::ALL.iter().enumerate() {
            assert_eq!(slot.binding() as usize, i);
            assert_eq!(Slot::from_name(slot.name()), Some(*slot));
        }
    }

    #[test]
    fn only_geometry_passes_use_depth() {
        let depth: Vec<_> = PassId::ALL.into_iter().filter(|p| p.uses_depth()).collect();
        assert_eq!(depth, vec![PassId::Geometry, PassId::Shadow]);
    }

    #[test]
    fn slot_owners() {
        assert_eq!(Slot::NormalTexture.owner(), Some(PassId::Geometry));
        assert_eq!(Slot::SsrVisibilityTexture.owner(), Some(PassId::Reflection));
        assert_eq!(Slot::LinearSampler.owner(), None);
    }
}
