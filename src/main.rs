#[tokio::main]
async fn main() {
    if let Err(e) = scada_assist_lib::run().await {
        eprintln!("scada-assist: {e}");
        std::process::exit(1);
    }
}
