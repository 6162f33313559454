//! rTaskSync main entrypoint.

use rtasksync::run;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        rtasksync::ui::messages::error(format!("Error: {e}"));
        if e.requires_reconnect() {
            eprintln!("   Run `rtasksync connect` again with valid credentials.");
        }
        std::process::exit(1);
    }
}
