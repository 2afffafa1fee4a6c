pub mod enrollment;
pub mod relay;
