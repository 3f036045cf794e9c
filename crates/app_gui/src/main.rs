mod app;

use eframe::NativeOptions;
use plant_core::{Dashboard, select_source};

fn main() {
    tracing_subscriber::fmt::init();

    let arg = std::env::args().nth(1);
    let cwd = std::env::current_dir().unwrap_or_else(|_| ".".into());
    let (dashboard, status) = match select_source(arg.as_deref(), &cwd) {
        Ok(Some(source)) => {
            let mut dashboard = Dashboard::new(None);
            dashboard.set_source(source);
            (dashboard, String::new())
        }
        Ok(None) => (Dashboard::new(None), String::new()),
        Err(e) => {
            let status = format!("Cannot open {}: {e}", arg.unwrap_or_default());
            (Dashboard::new(None), status)
        }
    };

    let title = format!(
        "Plant AI Test Dashboard {}",
        env!("PLANT_DASHBOARD_VERSION")
    );
    let options = NativeOptions::default();
    if let Err(e) = eframe::run_native(
        &title,
        options,
        Box::new(move |_cc| {
            Ok::<_, Box<dyn std::error::Error + Send + Sync>>(Box::new(app::UiApp::new(
                dashboard, status,
            )))
        }),
    ) {
        eprintln!("Dashboard exited with error: {e}");
    }
}
