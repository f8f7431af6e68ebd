pub mod navigation;
pub mod policy;
