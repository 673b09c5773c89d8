use super::{json_pretty, load_meta, EXIT_SUCCESS};
use std::path::Path;

pub fn run(meta_path: &Path, json: bool) -> Result<u8, String> {
    let meta = load_meta(meta_path)?;
    let names = meta.case_names();
    if json {
        println!("{}", json_pretty(&names)?);
    } else if names.is_empty() {
        println!("no test cases declared");
    } else {
        for name in names {
            println!("{name}");
        }
    }
    Ok(EXIT_SUCCESS)
}
