pub mod tiff;
pub mod worldfile;
