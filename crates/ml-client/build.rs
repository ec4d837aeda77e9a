fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Fall back to the bundled protoc when none is configured
    if std::env::var_os("PROTOC").is_none() {
        std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);
    }

    // Compile the proto file for the engagement model client
    tonic_build::compile_protos("../../proto/engagement.proto")?;
    println!("cargo:rerun-if-changed=../../proto/engagement.proto");
    Ok(())
}
