use std::env;
use std::fs;
use std::path::PathBuf;

fn main() {
    // Copy the linker fragments into OUT_DIR so link.x can find them
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::copy("memory.x", out_dir.join("memory.x")).unwrap();
    fs::copy("device.x", out_dir.join("device.x")).unwrap();
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=device.x");
    println!("cargo:rerun-if-changed=build.rs");
}
