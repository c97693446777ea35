//! Relative URI handling for external buffers and images.

use std::path::{Path, PathBuf};

/// Whether a URI embeds its payload (`data:` scheme).
pub fn is_data_uri(uri: &str) -> bool {
    uri.starts_with("data:")
}

/// Decode `%XX` escapes. Invalid escapes are kept verbatim; invalid UTF-8 is
/// replaced rather than rejected.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut output = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(h), Some(l)) = (hex_digit(bytes[i + 1]), hex_digit(bytes[i + 2])) {
                output.push((h << 4) | l);
                i += 3;
                continue;
            }
        }
        output.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&output).into_owned()
}

fn hex_digit(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Resolve a relative URI against the directory holding the asset.
pub fn resolve_relative(asset_dir: &Path, uri: &str) -> PathBuf {
    asset_dir.join(percent_decode(uri))
}

/// Directory containing the asset. Only URIs are percent-decoded, never the
/// asset path itself.
pub fn asset_directory(asset_path: &Path) -> PathBuf {
    asset_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("Hello%20World"), "Hello World");
        assert_eq!(percent_decode("%2F"), "/");
        assert_eq!(percent_decode("test"), "test");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
    }

    #[test]
    fn test_resolve_relative() {
        let dir = Path::new("/models/tau");
        assert_eq!(
            resolve_relative(dir, "Tau%20Body.bin"),
            PathBuf::from("/models/tau/Tau Body.bin")
        );
        assert_eq!(
            resolve_relative(dir, "textures/skin.png"),
            PathBuf::from("/models/tau/textures/skin.png")
        );
    }

    #[test]
    fn test_asset_directory() {
        assert_eq!(
            asset_directory(Path::new("/models/my pet/pet.gltf")),
            PathBuf::from("/models/my pet")
        );
        assert_eq!(asset_directory(Path::new("pet.glb")), PathBuf::from(""));
    }

    #[test]
    fn test_data_uri() {
        assert!(is_data_uri("data:image/png;base64,AAAA"));
        assert!(!is_data_uri("skin.png"));
    }
}
