//! Render pipelines entities can be drawn with.

pub mod textured;
