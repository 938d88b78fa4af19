use std::fs;

fn main() -> anyhow::Result<()> {
    let port = std::env::var("APP_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(8000);
    let path = std::env::args().nth(1).unwrap_or_else(|| "openapi.json".to_string());

    let doc = learnhub::docs::build_openapi(port);
    fs::write(&path, serde_json::to_string_pretty(&doc)?)?;
    println!("wrote {}", path);
    Ok(())
}
