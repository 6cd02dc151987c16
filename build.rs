use std::io::Write;

const IN_DIRNAME: &str = "assets/shaders";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed={}", IN_DIRNAME);
    let out_dirname = std::env::var("OUT_DIR")?;

    std::fs::create_dir_all(&out_dirname)?;

    let mut compiler = shaderc::Compiler::new().ok_or("failed to create shaderc compiler")?;

    for entry in std::fs::read_dir(IN_DIRNAME)? {
        let in_path = entry?.path();
        let kind = match in_path.extension().and_then(|ext| ext.to_str()) {
            Some("vert") => shaderc::ShaderKind::Vertex,
            Some("frag") => shaderc::ShaderKind::Fragment,
            _ => continue,
        };
        let in_filename = match in_path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        println!("cargo:rerun-if-changed={}", in_path.display());

        let source = std::fs::read_to_string(&in_path)?;
        let spirv = compiler.compile_into_spirv(&source, kind, &in_filename, "main", None)?;

        let out_path = format!("{}/{}.spv", out_dirname, in_filename);
        std::fs::File::create(&out_path)?.write_all(spirv.as_binary_u8())?;
    }
    Ok(())
}
