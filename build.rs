// Copies the static demo site into `dist/`; serve it next to a
// `wasm-pack build --target web --out-dir static/pkg` bundle.
use std::{fs, path::Path};

use fs_extra::dir::{copy, CopyOptions};

fn main() {
    println!("cargo:rerun-if-changed=static");

    let out_dir = Path::new("dist");
    if out_dir.exists() {
        fs::remove_dir_all(out_dir).ok();
    }
    fs::create_dir_all(out_dir).ok();

    let static_dir = Path::new("static");
    if static_dir.exists() {
        let mut options = CopyOptions::new();
        options.content_only = true;
        options.overwrite = true;
        if let Err(e) = copy(static_dir, out_dir, &options) {
            println!("cargo:warning=could not copy static site: {e}");
        }
    }
}
