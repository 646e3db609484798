#[tokio::main]
async fn main() {
    if let Err(e) = medassist_lib::run().await {
        eprintln!("medassist: {e}");
        std::process::exit(1);
    }
}
