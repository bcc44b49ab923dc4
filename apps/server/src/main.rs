//! Lectern HTTP server — auth, course/lecture CRUD, and file uploads.

#[tokio::main]
async fn main() {
    if let Err(e) = lectern_server::start_server().await {
        eprintln!("server error: {e}");
        std::process::exit(1);
    }
}
