use std::fs;

fn main() {
    // Validate default config at compile time
    let config_path = "src/default_config.toml";
    println!("cargo:rerun-if-changed={}", config_path);

    let content = fs::read_to_string(config_path).expect("Failed to read default_config.toml");

    let table = match content.parse::<toml::Table>() {
        Ok(table) => table,
        Err(e) => panic!("Invalid default_config.toml: {}", e),
    };

    // Theme colors must be #RRGGBB so the compiled default never falls back
    if let Some(toml::Value::Table(theme)) = table.get("theme") {
        for (key, value) in theme {
            let ok = value.as_str().is_some_and(|s| {
                s.len() == 7 && s.starts_with('#') && s[1..].chars().all(|c| c.is_ascii_hexdigit())
            });
            if !ok {
                panic!("Invalid default_config.toml: theme.{} is not a #RRGGBB color", key);
            }
        }
    }
}
