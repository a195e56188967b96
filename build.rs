// build.rs

fn main() {
    // --- Link against libX11 ---
    // pkg-config first; if the .pc file is missing fall back to the usual linker flags.
    if let Err(err) = pkg_config::probe_library("x11") {
        eprintln!(
            "pkg-config failed for library 'x11' ({}). Falling back to manual linking.",
            err
        );
        println!("cargo:rustc-link-lib=X11");
        println!("cargo:rustc-link-search=/usr/lib");
        eprintln!("Manual linking flags applied. Ensure the X11 development library is installed.");
    } else {
        eprintln!("pkg-config successfully found libX11. Linking configured automatically.");
    }
}
