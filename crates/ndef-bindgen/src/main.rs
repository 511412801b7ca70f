//! Generates the Kotlin and Swift bindings for the bridge
//!
//! Swift builds need the split headers/modulemap output of the swift
//! generator, everything else goes through the standard `uniffi-bindgen`.

#[derive(Debug, PartialEq, Eq)]
enum Generator {
    Standard,
    Swift,
}

const SWIFT_FLAGS: [&str; 4] = ["--swift-sources", "--headers", "--modulemap", "--xcframework"];

fn generator(args: &[String]) -> Generator {
    let swift = args
        .iter()
        .any(|arg| SWIFT_FLAGS.iter().any(|flag| arg.starts_with(flag)));

    if swift { Generator::Swift } else { Generator::Standard }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    match generator(&args) {
        Generator::Standard => uniffi::uniffi_bindgen_main(),
        Generator::Swift => uniffi::uniffi_bindgen_swift(),
    }
}
