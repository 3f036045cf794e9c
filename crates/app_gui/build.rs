use std::env;

fn main() {
    let version = env::var("PLANT_DASHBOARD_VERSION")
        .or_else(|_| env::var("CARGO_PKG_VERSION"))
        .unwrap_or_else(|_| "dev".to_string());
    println!("cargo:rerun-if-env-changed=PLANT_DASHBOARD_VERSION");
    println!("cargo:rustc-env=PLANT_DASHBOARD_VERSION={version}");
}
