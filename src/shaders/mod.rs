pub mod shadow_casting;
pub mod standard;

pub use shadow_casting::{
    ShadowCastingFragmentShader, ShadowCastingUniform, ShadowCastingVertexShader,
};
pub use standard::{
    shading_normal, shadow_factor, MaterialInput, StandardAttribute, StandardFragmentShader,
    StandardMaterial, StandardUniform, StandardVarying, StandardVertexShader,
};
