pub mod fs_atomic;
pub mod path_processing;

pub use fs_atomic::write_atomically;
pub use path_processing::{clean_path, expand_tilde, is_clean_path};
