use std::path::Path;
use std::process::Command;

/* ======================================================================== */
/* Shader compilation                                                       */

// Compile shaders/*.vert and *.frag to SPIR-V with glslc when the .spv is
// missing or older than its source. Without glslc the build continues and
// the .spv files must be provided by hand.
fn compile_shader(source: &Path) {
    let target = source.with_extension(format!(
        "{}.spv",
        source.extension().and_then(|e| e.to_str()).unwrap_or_default()
    ));
    println!("cargo:rerun-if-changed={}", source.display());

    let modified = |p: &Path| std::fs::metadata(p).and_then(|m| m.modified()).ok();
    if let (Some(src), Some(dst)) = (modified(source), modified(&target)) {
        if dst >= src {
            return;
        }
    }

    match Command::new("glslc").arg(source).arg("-o").arg(&target).status() {
        Ok(status) if status.success() => {}
        Ok(status) => panic!("glslc failed on {} ({})", source.display(), status),
        Err(e) => println!(
            "cargo:warning=glslc not found ({}); {} must be compiled by hand",
            e,
            target.display()
        ),
    }
}

fn main() {
    let shader_dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("shaders");
    println!("cargo:rerun-if-changed={}", shader_dir.display());

    for name in ["triangle.vert", "triangle.frag"] {
        compile_shader(&shader_dir.join(name));
    }
}
