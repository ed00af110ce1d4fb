//! Binary entry point for the Cosmic Void game server.

#[tokio::main]
async fn main() {
    if let Err(e) = lib_cosmic_void::init().await {
        eprintln!("❌ Fatal error: {e}");
        std::process::exit(1);
    }
}
