use std::time::{SystemTime, UNIX_EPOCH};

fn main() {
    // askama compiles templates in; cargo rescans the whole directory for changes.
    println!("cargo:rerun-if-changed=templates");
    println!("cargo:rerun-if-changed=build.rs");

    // Shown in the page footer so a stale running binary is easy to spot.
    let build_id = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "dev".to_string());
    println!("cargo:rustc-env=ACTIVITY_BOARD_BUILD_ID={}", build_id);
}
