//! Pipeline state values recorded per draw.
//!
//! These are backend-agnostic descriptions; the wgpu backend translates them
//! when it builds pipelines and samplers.

/// Blend factor.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum Blend {
    Zero,
    One,
    SrcColor,
    InvSrcColor,
    SrcAlpha,
    InvSrcAlpha,
    DestAlpha,
    InvDestAlpha,
    DestColor,
    InvDestColor,
    SrcAlphaSat,
}

/// Blend equation.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum BlendOp {
    Add,
    Subtract,
    RevSubtract,
    Min,
    Max,
}

/// Output-merger blend configuration.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct BlendState {
    pub enable: bool,
    pub src: Blend,
    pub dst: Blend,
    pub op: BlendOp,
    pub src_alpha: Blend,
    pub dst_alpha: Blend,
    pub op_alpha: BlendOp,
}

impl BlendState {
    /// Straight alpha blending. The engine default.
    pub const NON_PREMULTIPLIED: BlendState = BlendState {
        enable: true,
        src: Blend::SrcAlpha,
        dst: Blend::InvSrcAlpha,
        op: BlendOp::Add,
        src_alpha: Blend::Zero,
        dst_alpha: Blend::One,
        op_alpha: BlendOp::Add,
    };

    pub const PREMULTIPLIED: BlendState = BlendState {
        src: Blend::One,
        ..Self::NON_PREMULTIPLIED
    };

    pub const OPAQUE: BlendState = BlendState {
        enable: false,
        ..Self::NON_PREMULTIPLIED
    };

    pub const ADDITIVE: BlendState = BlendState {
        dst: Blend::One,
        ..Self::NON_PREMULTIPLIED
    };

    pub const SUBTRACTIVE: BlendState = BlendState {
        dst: Blend::One,
        op: BlendOp::RevSubtract,
        ..Self::NON_PREMULTIPLIED
    };

    pub const MULTIPLICATIVE: BlendState = BlendState {
        src: Blend::Zero,
        dst: Blend::SrcColor,
        ..Self::NON_PREMULTIPLIED
    };

    pub const DEFAULT_2D: BlendState = Self::NON_PREMULTIPLIED;
}

impl Default for BlendState {
    fn default() -> Self {
        Self::DEFAULT_2D
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum FillMode {
    Solid,
    Wireframe,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum CullMode {
    Off,
    Front,
    Back,
}

/// Rasterizer configuration.
///
/// `scissor_enable` decides whether the recorded scissor rect is applied at all.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct RasterizerState {
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub scissor_enable: bool,
}

impl RasterizerState {
    pub const SOLID_CULL_NONE: RasterizerState = RasterizerState {
        fill_mode: FillMode::Solid,
        cull_mode: CullMode::Off,
        scissor_enable: false,
    };

    pub const SOLID_CULL_BACK: RasterizerState = RasterizerState {
        cull_mode: CullMode::Back,
        ..Self::SOLID_CULL_NONE
    };

    pub const SOLID_CULL_FRONT: RasterizerState = RasterizerState {
        cull_mode: CullMode::Front,
        ..Self::SOLID_CULL_NONE
    };

    pub const WIREFRAME_CULL_NONE: RasterizerState = RasterizerState {
        fill_mode: FillMode::Wireframe,
        ..Self::SOLID_CULL_NONE
    };

    pub const DEFAULT_2D: RasterizerState = Self::SOLID_CULL_NONE;

    /// Same state with scissor testing enabled.
    #[inline]
    pub const fn with_scissor(self) -> Self {
        Self { scissor_enable: true, ..self }
    }
}

impl Default for RasterizerState {
    fn default() -> Self {
        Self::DEFAULT_2D
    }
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureAddressMode {
    Repeat,
    Mirror,
    Clamp,
    Border,
}

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureFilter {
    Nearest,
    Linear,
}

/// Texture sampling configuration bound to one sampler slot.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct SamplerState {
    pub address_u: TextureAddressMode,
    pub address_v: TextureAddressMode,
    pub address_w: TextureAddressMode,
    pub min: TextureFilter,
    pub mag: TextureFilter,
    pub mip: TextureFilter,
    pub max_anisotropy: u8,
}

impl SamplerState {
    /// Number of sampler slots per shader stage.
    pub const MAX_SAMPLER_COUNT: usize = 8;

    pub const CLAMP_LINEAR: SamplerState = SamplerState {
        address_u: TextureAddressMode::Clamp,
        address_v: TextureAddressMode::Clamp,
        address_w: TextureAddressMode::Clamp,
        min: TextureFilter::Linear,
        mag: TextureFilter::Linear,
        mip: TextureFilter::Linear,
        max_anisotropy: 1,
    };

    pub const CLAMP_NEAREST: SamplerState = SamplerState {
        min: TextureFilter::Nearest,
        mag: TextureFilter::Nearest,
        mip: TextureFilter::Nearest,
        ..Self::CLAMP_LINEAR
    };

    pub const REPEAT_LINEAR: SamplerState = SamplerState {
        address_u: TextureAddressMode::Repeat,
        address_v: TextureAddressMode::Repeat,
        address_w: TextureAddressMode::Repeat,
        ..Self::CLAMP_LINEAR
    };

    pub const REPEAT_NEAREST: SamplerState = SamplerState {
        address_u: TextureAddressMode::Repeat,
        address_v: TextureAddressMode::Repeat,
        address_w: TextureAddressMode::Repeat,
        ..Self::CLAMP_NEAREST
    };

    pub const MIRROR_LINEAR: SamplerState = SamplerState {
        address_u: TextureAddressMode::Mirror,
        address_v: TextureAddressMode::Mirror,
        address_w: TextureAddressMode::Mirror,
        ..Self::CLAMP_LINEAR
    };

    pub const DEFAULT_2D: SamplerState = Self::CLAMP_LINEAR;
}

impl Default for SamplerState {
    fn default() -> Self {
        Self::DEFAULT_2D
    }
}

/// Vertex shader handle. `INVALID` tells the backend to bind the engine default.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct VertexShaderId(pub u32);

impl VertexShaderId {
    pub const INVALID: VertexShaderId = VertexShaderId(u32::MAX);

    /// Built-in 2D shape vertex shader.
    pub const SHAPE: VertexShaderId = VertexShaderId(0);

    #[inline]
    pub const fn is_invalid(self) -> bool {
        self.0 == u32::MAX
    }
}

/// Pixel (fragment) shader handle. `INVALID` tells the backend to bind the engine default.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct PixelShaderId(pub u32);

impl PixelShaderId {
    pub const INVALID: PixelShaderId = PixelShaderId(u32::MAX);

    /// Built-in 2D shape pixel shader.
    pub const SHAPE: PixelShaderId = PixelShaderId(0);

    #[inline]
    pub const fn is_invalid(self) -> bool {
        self.0 == u32::MAX
    }
}
