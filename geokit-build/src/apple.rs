//! Apple platform build utilities.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

/// A Swift helper library compiled alongside a bridged Rust module.
#[derive(Debug, Clone)]
pub struct SwiftLibrary {
    /// The crate name the bridge glue is generated under (e.g. "geokit-location").
    pub pkg_name: String,
    /// Swift source files, relative to the crate manifest directory.
    pub swift_sources: Vec<PathBuf>,
    /// Output library name (e.g. "LocationHelper").
    pub lib_name: String,
    /// Frameworks to link.
    pub frameworks: Vec<String>,
}

impl SwiftLibrary {
    /// Create a library description that links `Foundation`.
    #[must_use]
    pub fn new(pkg_name: impl Into<String>, lib_name: impl Into<String>) -> Self {
        Self {
            pkg_name: pkg_name.into(),
            swift_sources: Vec::new(),
            lib_name: lib_name.into(),
            frameworks: vec!["Foundation".to_string()],
        }
    }

    /// Add a Swift source file.
    #[must_use]
    pub fn swift_source(mut self, path: impl Into<PathBuf>) -> Self {
        self.swift_sources.push(path.into());
        self
    }

    /// Add a framework to link.
    #[must_use]
    pub fn framework(mut self, name: impl Into<String>) -> Self {
        self.frameworks.push(name.into());
        self
    }
}

/// Returns true when the crate being built targets iOS or macOS.
///
/// Build scripts run on the host, so this reads cargo's target
/// configuration instead of `cfg!`.
#[must_use]
pub fn is_apple_target() -> bool {
    matches!(
        env::var("CARGO_CFG_TARGET_OS").as_deref(),
        Ok("ios" | "macos")
    )
}

/// Generate the swift-bridge glue for `bridge_rs`, compile the Swift
/// sources of `library` against it and link the result.
///
/// Steps:
/// 1. Swift bridge generation
/// 2. Bridging header
/// 3. Swift compilation to an object file
/// 4. Static library creation
/// 5. Swift runtime and framework linking
///
/// Does nothing when the target is not an Apple platform.
///
/// # Panics
///
/// Panics when any of the external tools (`xcrun`, `swiftc`, `ar`) is
/// missing or fails, which aborts the build with the tool's output.
pub fn compile_swift(bridge_rs: &str, library: &SwiftLibrary) {
    println!("cargo:rerun-if-changed={bridge_rs}");
    if !is_apple_target() {
        return;
    }

    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));
    let manifest_dir =
        PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo"));

    for source in &library.swift_sources {
        println!("cargo:rerun-if-changed={}", manifest_dir.join(source).display());
    }

    swift_bridge_build::parse_bridges(vec![bridge_rs])
        .write_all_concatenated(out_dir.clone(), &library.pkg_name);

    let bridging_h = write_bridging_header(&out_dir, &library.pkg_name);
    let combined = write_combined_source(&out_dir, &manifest_dir, library);

    let target = env::var("TARGET").expect("TARGET is set by cargo");
    let obj_file = out_dir.join(format!("{}.o", library.lib_name));

    let mut swiftc = Command::new("swiftc");
    swiftc
        .arg("-emit-object")
        .arg("-o")
        .arg(&obj_file)
        .arg("-sdk")
        .arg(sdk_path(&target))
        .arg("-import-objc-header")
        .arg(&bridging_h)
        .arg("-parse-as-library")
        .arg("-module-name")
        .arg(&library.lib_name)
        .arg("-target")
        .arg(swift_target(&target))
        .arg(&combined);

    let output = swiftc.output().expect("failed to run swiftc");
    assert!(
        output.status.success(),
        "swift compilation failed ({:?}):\n{}",
        swiftc.get_args().collect::<Vec<_>>(),
        String::from_utf8_lossy(&output.stderr)
    );

    let lib_file = out_dir.join(format!("lib{}.a", library.lib_name));
    let ar_status = Command::new("ar")
        .arg("rcs")
        .arg(&lib_file)
        .arg(&obj_file)
        .status()
        .expect("failed to run ar");
    assert!(ar_status.success(), "ar failed");

    println!("cargo:rustc-link-search=native={}", out_dir.display());
    println!("cargo:rustc-link-lib=static={}", library.lib_name);
    println!(
        "cargo:rustc-link-search=native={}",
        swift_runtime_dir(&target).display()
    );
    for framework in &library.frameworks {
        println!("cargo:rustc-link-lib=framework={framework}");
    }
}

fn write_bridging_header(out_dir: &Path, pkg_name: &str) -> PathBuf {
    let core_h = out_dir.join("SwiftBridgeCore.h");
    let pkg_h = out_dir.join(format!("{pkg_name}/{pkg_name}.h"));
    let bridging_h = out_dir.join("Bridging-Header.h");

    let content = format!(
        "#include \"{}\"\n#include \"{}\"\n",
        core_h.display(),
        pkg_h.display()
    );
    fs::write(&bridging_h, content).expect("failed to write bridging header");
    bridging_h
}

fn write_combined_source(out_dir: &Path, manifest_dir: &Path, library: &SwiftLibrary) -> PathBuf {
    let core_swift = out_dir.join("SwiftBridgeCore.swift");
    let generated = out_dir.join(format!("{0}/{0}.swift", library.pkg_name));
    let combined = out_dir.join(format!("Combined{}.swift", library.lib_name));

    let mut content = read_source(&core_swift);
    content.push('\n');
    content.push_str(&read_source(&generated));
    for source in &library.swift_sources {
        content.push('\n');
        content.push_str(&read_source(&manifest_dir.join(source)));
    }

    fs::write(&combined, content).expect("failed to write combined Swift file");
    combined
}

fn read_source(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()))
}

fn sdk_path(target: &str) -> String {
    let sdk = if target.contains("ios") {
        "iphoneos"
    } else {
        "macosx"
    };
    let output = Command::new("xcrun")
        .args(["--sdk", sdk, "--show-sdk-path"])
        .output()
        .expect("xcrun failed");
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

fn swift_target(target: &str) -> &'static str {
    if target.contains("ios") {
        "arm64-apple-ios14.0"
    } else if target.contains("aarch64") {
        "arm64-apple-macos12.3"
    } else {
        "x86_64-apple-macos12.3"
    }
}

fn swift_runtime_dir(target: &str) -> PathBuf {
    let output = Command::new("xcrun")
        .args(["--find", "swiftc"])
        .output()
        .expect("xcrun --find swiftc failed");
    let swiftc = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
    let platform = if target.contains("ios") {
        "iphoneos"
    } else {
        "macosx"
    };
    swiftc
        .parent()
        .and_then(Path::parent)
        .map(|toolchain| toolchain.join("lib/swift").join(platform))
        .expect("swiftc lives in <toolchain>/bin")
}
