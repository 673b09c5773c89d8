use super::{json_pretty, EXIT_SUCCESS};
use chelm_schema::TestDigest;

pub fn run(image_id: &str, json: bool) -> Result<u8, String> {
    let digest = TestDigest::of(image_id);
    if json {
        let payload = serde_json::json!({
            "image_id": image_id,
            "algorithm": digest.algorithm(),
            "digest": digest,
        });
        println!("{}", json_pretty(&payload)?);
    } else {
        println!("{digest}");
    }
    Ok(EXIT_SUCCESS)
}
