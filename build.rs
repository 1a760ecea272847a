use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    // Copy kernel.ld into OUT_DIR so the image link can find it
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::copy("kernel.ld", out_dir.join("kernel.ld")).unwrap();
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=kernel.ld");
    println!("cargo:rerun-if-changed=build.rs");
}
