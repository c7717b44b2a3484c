mod cli;

#[tokio::main]
async fn main() {
    // Parse CLI, resolve settings and count.
    if let Err(err) = cli::run_from_args().await {
        eprintln!("tablecount error: {:#}", err);
        std::process::exit(1);
    }
}
