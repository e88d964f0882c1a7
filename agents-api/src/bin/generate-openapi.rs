//! OpenAPI Document Generator
//!
//! Prints the Agents API OpenAPI document to stdout, JSON by default or YAML
//! with `--yaml`.
//!
//! Usage:
//!   cargo run -p agents-api --bin generate-openapi > openapi.json
//!   cargo run -p agents-api --bin generate-openapi -- --yaml > openapi.yaml

use agents_api::ApiDoc;

fn main() {
    let yaml = std::env::args().skip(1).any(|arg| arg == "--yaml");
    let rendered = if yaml {
        ApiDoc::to_yaml()
    } else {
        ApiDoc::to_json().map_err(|e| e.to_string())
    };

    match rendered {
        Ok(document) => println!("{}", document),
        Err(e) => {
            eprintln!("Failed to serialize OpenAPI document: {}", e);
            std::process::exit(1);
        }
    }
}
