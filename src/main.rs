use std::env;

/// Main entry point for the dashboard web application
///
/// Binds the address given as the first argument (default 127.0.0.1:3000)
/// and stores data under the directory given as the second argument
/// (default "database").
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let addr = args
        .get(1)
        .cloned()
        .unwrap_or_else(|| "127.0.0.1:3000".to_string());
    let data_dir = args
        .get(2)
        .cloned()
        .unwrap_or_else(|| "database".to_string());

    // Start the web application
    chemdash::app::run(&addr, &data_dir).await?;

    Ok(())
}
