pub mod compositor;
pub mod frame;
pub mod geometry;
pub mod render;
