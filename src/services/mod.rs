pub mod patterns;
pub mod recommend;
pub mod roadmap;
pub mod stats;
