//! `govpress` binary.

#[tokio::main]
async fn main() {
    let exit_code = govpress_cli::run().await;
    std::process::exit(exit_code);
}
