pub mod runner;
pub mod shader_compiler;
