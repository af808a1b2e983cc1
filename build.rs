//! Stamps the build time into `B3DM_BUILD_STAMP` for the CLI banner.
//!
//! Set `B3DM_BUILD_STAMP` in the environment for reproducible builds.

use time::macros::format_description;
use time::OffsetDateTime;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=B3DM_BUILD_STAMP");

    let stamp = std::env::var("B3DM_BUILD_STAMP").unwrap_or_else(|_| {
        let format = format_description!("[year]-[month]-[day] [hour]:[minute] UTC");
        OffsetDateTime::now_utc()
            .format(&format)
            .unwrap_or_else(|_| "unknown".to_string())
    });
    println!("cargo:rustc-env=B3DM_BUILD_STAMP={}", stamp);
}
