use anyhow::Result;
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let output = serde_json::to_string_pretty(value)?;
    println!("{output}");
    Ok(())
}

/// Successful response in the marketplace envelope shape.
#[derive(Serialize)]
pub struct Envelope<'a, T: Serialize> {
    pub success: bool,
    pub data: &'a T,
}

pub fn print_envelope<T: Serialize>(data: &T) -> Result<()> {
    print_json(&Envelope {
        success: true,
        data,
    })
}
