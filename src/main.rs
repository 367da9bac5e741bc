use clap::Parser;
use crossmodal::cli::commands::{default_image_ref, Cli, Commands};
use crossmodal::config::Settings;
use crossmodal::domain::error::DomainError;
use crossmodal::domain::values::metadata::Metadata;
use crossmodal::domain::values::rgb_image::RgbImage;
use crossmodal::CrossModal;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let cm = match init().await {
        Ok(cm) => cm,
        Err(e) => {
            eprintln!("Error initializing crossmodal: {e}");
            std::process::exit(1);
        }
    };

    let result = run_command(cm, cli.command).await;
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn init() -> Result<CrossModal, DomainError> {
    let settings = Settings::from_env()?;
    CrossModal::new(&settings).await
}

async fn run_command(cm: CrossModal, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::Init => {
            cm.init().await?;
            println!("Collection ready");
        }
        Commands::SearchText { query, limit, paths_only } => {
            let hits = cm.search_text(&query, limit).await?;
            if paths_only {
                for hit in &hits {
                    println!("{}", hit.payload);
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            }
        }
        Commands::SearchImage { image, limit, texts_only } => {
            let img = read_image(&image)?;
            let hits = cm.search_image(&img, limit).await?;
            if texts_only {
                for hit in &hits {
                    println!("{}", hit.payload);
                }
            } else {
                println!("{}", serde_json::to_string_pretty(&hits)?);
            }
        }
        Commands::UploadText { texts, metadata } => {
            let metadata = metadata
                .map(|json| parse_metadata_list(&json))
                .transpose()?;
            let count = cm.upload_texts(&texts, metadata).await?;
            println!("Successfully uploaded {count} text items");
        }
        Commands::UploadImage { image, image_ref, metadata } => {
            let img = read_image(&image)?;
            let metadata = metadata
                .map(|json| -> Result<Metadata, Box<dyn std::error::Error>> {
                    Ok(Metadata::from_json(serde_json::from_str(&json)?)?)
                })
                .transpose()?;
            let reference = image_ref.unwrap_or_else(|| default_image_ref(&image));
            let count = cm.upload_image(reference, img, metadata).await?;
            println!("Successfully uploaded {count} image items");
        }
        Commands::Get { id } => {
            let record = cm.get(&id).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
        }
        Commands::List { limit } => {
            let records = cm.list(limit).await?;
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        Commands::Delete { id } => {
            if cm.delete(&id).await? {
                println!("Deleted {id}");
            } else {
                println!("No record with id {id}");
            }
        }
        Commands::Stats => {
            let stats = cm.stats().await?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
    }
    Ok(())
}

fn read_image(path: &str) -> Result<RgbImage, Box<dyn std::error::Error>> {
    let bytes = std::fs::read(path).map_err(|e| format!("Cannot read {path}: {e}"))?;
    Ok(RgbImage::decode(&bytes)?)
}

fn parse_metadata_list(json: &str) -> Result<Vec<Metadata>, Box<dyn std::error::Error>> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    let items = value
        .as_array()
        .ok_or("--metadata must be a JSON array with one object per text")?;
    let parsed = items
        .iter()
        .cloned()
        .map(Metadata::from_json)
        .collect::<Result<Vec<_>, String>>()?;
    Ok(parsed)
}
