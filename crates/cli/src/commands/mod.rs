pub mod ask;
pub mod kb;
pub mod serve;
