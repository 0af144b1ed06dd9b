use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::debug;

use super::BiometricError;

/// Decodes an uploaded image, accepting data URIs and unpadded input.
pub fn decode_base64_image(image_base64: &str) -> Result<Vec<u8>, BiometricError> {
    let data = match image_base64.split_once(',') {
        Some((prefix, data)) => {
            debug!(prefix, "Stripping data URI prefix");
            data
        }
        None => image_base64,
    };

    let mut data = data.trim().to_string();
    let missing_padding = data.len() % 4;
    if missing_padding != 0 {
        data.push_str(&"=".repeat(4 - missing_padding));
    }

    let bytes = STANDARD
        .decode(data.as_bytes())
        .map_err(|_| BiometricError::InvalidImage)?;

    if bytes.is_empty() {
        return Err(BiometricError::InvalidImage);
    }
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_base64_decodes() {
        assert_eq!(decode_base64_image("aGVsbG8=").unwrap(), b"hello");
    }

    #[test]
    fn data_uri_prefix_is_stripped() {
        let bytes = decode_base64_image("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(bytes, b"hello");
    }

    #[test]
    fn missing_padding_is_repaired() {
        assert_eq!(decode_base64_image("aGVsbG8").unwrap(), b"hello");
        assert_eq!(decode_base64_image("aGk").unwrap(), b"hi");
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(
            decode_base64_image("***not base64***"),
            Err(BiometricError::InvalidImage)
        ));
        assert!(matches!(decode_base64_image(""), Err(BiometricError::InvalidImage)));
    }
}
