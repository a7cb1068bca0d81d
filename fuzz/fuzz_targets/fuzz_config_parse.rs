//! Fuzz target for TOML config parsing and layer resolution.

#![no_main]

use bugsafe_config::{ConfigBuilder, ConfigLayer, ConfigSource};
use libfuzzer_sys::fuzz_target;
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(layer) = ConfigLayer::from_toml(text, Path::new("fuzz.toml")) {
        let _ = ConfigBuilder::new()
            .layer(ConfigSource::CliArgument, layer)
            .build();
    }
});
