//! Sign Speller - ASL fingerspelling with a webcam
//!
//! Main entry point for the application.

use sign_speller::SignSpellerApp;

fn main() -> eframe::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Starting Sign Speller v{}", env!("CARGO_PKG_VERSION"));

    // Configure native options
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 820.0])
            .with_min_inner_size([720.0, 600.0])
            .with_title("Sign Speller"),
        vsync: true,
        ..Default::default()
    };

    // Run the app
    eframe::run_native(
        "Sign Speller",
        native_options,
        Box::new(|cc| Box::new(SignSpellerApp::new(cc))),
    )
}
