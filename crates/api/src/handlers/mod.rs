pub mod generate;
pub mod mesh;
pub mod multiview;
