use regex::Regex;
use std::sync::OnceLock;

fn package_prefix() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?:[a-zA-Z][a-zA-Z0-9-]+)(?:\.[a-zA-Z][a-zA-Z0-9-]+)+-(.*)$").unwrap()
    })
}

fn commit_sha() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[a-f0-9]{40}$").unwrap())
}

/// Display form of a release version.
///
/// Strips a leading package identifier (`com.example.app-1.0` becomes `1.0`)
/// and cuts a full commit SHA down to 7 characters. Short versions are
/// returned untouched.
pub fn short_version(version: &str) -> &str {
    // Length in UTF-16 units, matching how the web UI measures versions.
    if version.encode_utf16().count() < 12 {
        return version;
    }

    let version = package_prefix()
        .captures(version)
        .and_then(|caps| caps.get(1))
        .map_or(version, |m| m.as_str());

    if commit_sha().is_match(version) {
        &version[..7]
    } else {
        version
    }
}
