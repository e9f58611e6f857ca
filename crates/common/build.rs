use std::env;
use std::path::PathBuf;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let out_dir = PathBuf::from(env::var("OUT_DIR")?);

    let mut protos = vec!["diag", "test", "user"];
    if env::var_os("CARGO_FEATURE_PROBE").is_some() {
        protos.push("probe");
    }
    let protos: Vec<String> = protos
        .into_iter()
        .map(|pkg| format!("api/{pkg}/{pkg}.proto"))
        .collect();

    tonic_build::configure()
        .file_descriptor_set_path(out_dir.join("lingo_descriptor.bin"))
        .compile_protos(&protos, &["api"])?;

    println!("cargo:rerun-if-changed=api");
    Ok(())
}
