use clap::{Parser, Subcommand};
use std::path::Path;

#[derive(Parser)]
#[command(name = "crossmodal", about = "Cross-modal text/image search over a vector store")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the collection if it does not exist
    Init,
    /// Find images matching a text query
    SearchText {
        query: String,
        #[arg(long, default_value = "5")]
        limit: usize,
        /// Print only image references
        #[arg(long)]
        paths_only: bool,
    },
    /// Find texts matching an image file (PNG, JPEG, ...)
    SearchImage {
        image: String,
        #[arg(long, default_value = "5")]
        limit: usize,
        /// Print only the matched texts
        #[arg(long)]
        texts_only: bool,
    },
    /// Embed and store one or more texts
    UploadText {
        #[arg(required = true)]
        texts: Vec<String>,
        /// JSON array with one metadata object per text
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Embed and store an image file (PNG, JPEG, ...)
    UploadImage {
        image: String,
        /// Reference stored with the record; defaults to the file name
        #[arg(long)]
        image_ref: Option<String>,
        /// JSON metadata object
        #[arg(long)]
        metadata: Option<String>,
    },
    /// Show a record by id
    Get { id: String },
    /// List stored records
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete a record by id
    Delete { id: String },
    /// Record counts per modality
    Stats,
}

/// Reference for an uploaded image when none is given: the bare file name,
/// so `./cat.jpg` and `photos/cat.jpg` map to the same record.
pub fn default_image_ref(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or(path)
        .to_string()
}
