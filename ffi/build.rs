use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src");

    let crate_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(_) => return,
    };

    let generated = cbindgen::Builder::new()
        .with_crate(&crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("HTTPFAST_H")
        .generate();

    match generated {
        Ok(bindings) => {
            bindings.write_to_file(crate_dir.join("include").join("httpfast.h"));
        }
        Err(e) => println!("cargo:warning=skipping C header generation: {e}"),
    }
}
