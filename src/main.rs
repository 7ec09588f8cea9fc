#[tokio::main]
async fn main() {
    if let Err(e) = buchatech_lib::run().await {
        eprintln!("buchatech: {e}");
        std::process::exit(1);
    }
}
