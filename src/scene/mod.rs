pub mod anim;
pub mod model;
pub mod snapshot;
