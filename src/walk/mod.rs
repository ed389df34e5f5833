pub mod primvars;
pub mod renderable;
pub mod shaders;
pub mod walker;
