pub mod embedding;
pub mod limit;
pub mod metadata;
pub mod modality;
pub mod rgb_image;
