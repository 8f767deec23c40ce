//! Loading cassettes for replay.

use std::path::Path;

use super::format::Cassette;
use super::replayer::CassetteReplayer;

/// Load a cassette file and create a replayer.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_cassette(path: &Path) -> Result<CassetteReplayer, String> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read cassette file {}: {e}", path.display()))?;
    let cassette: Cassette = serde_yaml::from_str(&content)
        .map_err(|e| format!("Failed to parse cassette file {}: {e}", path.display()))?;
    Ok(CassetteReplayer::new(&cassette))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cassette::format::{Cassette, Interaction};
    use chrono::Utc;
    use serde_json::json;

    #[test]
    fn load_valid_cassette() {
        let dir = std::env::temp_dir().join("nanobanana_cassette_config_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.cassette.yaml");

        let cassette = Cassette {
            name: "test".into(),
            recorded_at: Utc::now(),
            commit: "abc".into(),
            interactions: vec![Interaction {
                seq: 0,
                port: "image_generator".into(),
                method: "generate".into(),
                input: json!({"model": "flash", "prompt": "a cat"}),
                output: json!({"Ok": {"data": "AQID", "mime_type": "image/png"}}),
            }],
        };
        let yaml = serde_yaml::to_string(&cassette).unwrap();
        std::fs::write(&path, yaml).unwrap();

        let mut replayer = load_cassette(&path).unwrap();
        let input = json!({"model": "flash", "prompt": "a cat"});
        let i = replayer.next_interaction("image_generator", "generate", &input).unwrap();
        assert_eq!(i.seq, 0);
        assert_eq!(i.output["Ok"]["mime_type"], "image/png");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn load_nonexistent_fails() {
        let err = load_cassette(Path::new("/nonexistent/cassette.yaml")).err().unwrap();
        assert!(err.contains("Failed to read cassette file"));
    }

    #[test]
    fn load_garbage_fails() {
        let dir = std::env::temp_dir().join("nanobanana_cassette_garbage_test");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bad.cassette.yaml");
        std::fs::write(&path, "interactions: [unterminated").unwrap();

        let err = load_cassette(&path).err().unwrap();
        assert!(err.contains("Failed to parse cassette file"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
