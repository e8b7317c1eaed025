//! Generate a literacy poster and save it locally.
//!
//! Reads the API key from `KIE_API_KEY`. Falls back to opening the image in
//! a browser if the download fails.
//!
//! ```sh
//! KIE_API_KEY=... cargo run --example generate_poster -- "Animals" "Learn the word: cat"
//! ```

use kieai_rs::{FileSaver, GenerateOptions, KieClient, KieConfig, KieError};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kieai_rs=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let topic = args.next().unwrap_or_else(|| "Fruits".to_string());
    let title = args.next().unwrap_or_else(|| "My First Words".to_string());

    let config = KieConfig::from_env();
    if !config.has_api_key() {
        eprintln!("Set KIE_API_KEY first");
        return Ok(());
    }
    let client = KieClient::new(config);

    let prompt = format!(
        "A bright, friendly children's literacy poster titled \"{}\" about {}, \
         with large labeled illustrations and simple words",
        title, topic
    );

    let url = client
        .generate(&prompt, &GenerateOptions::new().resolution("2K"), |status| {
            println!("  {}", status)
        })
        .await?;
    println!("Image ready: {}", url);

    let filename = format!("{}.png", title.replace(' ', "_"));
    match FileSaver::new("./posters").save(&url, &filename).await {
        Ok(path) => println!("Saved to {}", path.display()),
        Err(e @ KieError::DownloadFallback { .. }) => eprintln!("{}", e),
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
