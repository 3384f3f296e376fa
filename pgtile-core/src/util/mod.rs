#[cfg(feature = "config-file")]
pub mod load_cfg;
pub mod vec_ops;
