fn main() {
    if let Err(e) = airgap_wallet::cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
