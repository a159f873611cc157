pub mod dump;
pub mod image_io;

pub use dump::{read_descriptors, write_descriptors, DumpReader};
pub use image_io::load_grayscale;
