//! Build script to compile the C variant of the hash primitive.

use std::env;

fn main() {
    println!("cargo:rustc-check-cfg=cfg(c_implementation_active)");
    let build = cc::Build::new();
    let compiler = build.get_compiler();
    let is_gnu_like = compiler.is_like_gnu() || compiler.is_like_clang();
    let is_msvc = compiler.is_like_msvc();

    if !(is_gnu_like || is_msvc) {
        println!("cargo:warning=C compiler is not compatible (needs GCC, Clang, or MSVC). C variant disabled.");
        return;
    }

    let compiler_name = if compiler.is_like_clang() {
        let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
        if target_os == "macos" {
            "Apple Clang"
        } else {
            "Clang"
        }
    } else if compiler.is_like_gnu() {
        "GCC"
    } else {
        "MSVC"
    };

    let rustflags = env::var("RUSTFLAGS").unwrap_or_default();
    let encoded_rustflags = env::var("CARGO_ENCODED_RUSTFLAGS").unwrap_or_default();
    let is_rust_native =
        rustflags.contains("target-cpu=native") || encoded_rustflags.contains("target-cpu=native");

    let mut build = cc::Build::new();

    let c_files = glob::glob("src/**/*.c")
        .expect("Failed to read glob pattern")
        .filter_map(|entry| entry.ok());

    for file in c_files {
        println!("cargo:rerun-if-changed={}", file.display());
        build.file(file);
    }

    build.opt_level(3);

    // Match the Rust baseline so the two variants are timed on equal terms.
    if is_rust_native {
        build.flag_if_supported("-march=native");
    }

    build.compile("mix_hash_c");

    println!("cargo:rustc-cfg=c_implementation_active");
    println!("cargo:rustc-env=C_COMPILER_NAME={}", compiler_name);
}
