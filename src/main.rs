#[tokio::main]
async fn main() {
    if let Err(e) = ticket_copilot::run().await {
        eprintln!("ticket-copilot: {e}");
        std::process::exit(1);
    }
}
