use civic_queue_api::run;

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("civic-queue error: {err}");
        std::process::exit(1);
    }
}
