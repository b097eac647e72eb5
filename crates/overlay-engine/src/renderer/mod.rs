pub mod instance;
pub mod shader;
pub mod traits;

// Re-export key types for convenient access
pub use instance::{DrawBuffer, DrawInstance};
pub use shader::{
    CutoutBlendConfigurator, ParamValue, ParameterBlock, ShaderConfigurator, ShaderPayload,
    ShaderRegistry, TintConfigurator,
};
pub use traits::{DrawCall, DrawSink};
