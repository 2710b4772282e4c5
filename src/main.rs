mod app;
mod client;
mod config;
mod logging;
mod markup;
mod tui;

fn main() {
    if let Err(e) = app::run() {
        eprintln!("{:#}", e); // pretty anyhow chain
        std::process::exit(1);
    }
}
