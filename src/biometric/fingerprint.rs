use tracing::info;

use super::BiometricError;

/// Templates come from the same reader software, so a match is exact equality.
pub fn fingerprints_match(captured: &str, stored: Option<&[u8]>) -> Result<bool, BiometricError> {
    let stored = match stored {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return Err(BiometricError::NoStoredTemplate("fingerprint")),
    };

    let matched = std::str::from_utf8(stored).is_ok_and(|s| s == captured);
    info!(matched, "Fingerprint comparison finished");
    Ok(matched)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_templates_match() {
        assert!(fingerprints_match("<fmd>abc</fmd>", Some(b"<fmd>abc</fmd>")).unwrap());
    }

    #[test]
    fn different_templates_do_not_match() {
        assert!(!fingerprints_match("<fmd>abc</fmd>", Some(b"<fmd>abd</fmd>")).unwrap());
        assert!(!fingerprints_match("abc", Some(&[0xff, 0xfe])).unwrap());
    }

    #[test]
    fn missing_template_is_an_error() {
        assert!(matches!(
            fingerprints_match("abc", None),
            Err(BiometricError::NoStoredTemplate("fingerprint"))
        ));
        assert!(fingerprints_match("abc", Some(b"")).is_err());
    }
}
