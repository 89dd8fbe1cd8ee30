//! PEM armor for bare public keys.

const BEGIN: &str = "-----BEGIN CERTIFICATE-----";
const END: &str = "-----END CERTIFICATE-----";
const LINE_WIDTH: usize = 64;

/// Wraps a bare base64 key body in certificate armor.
///
/// Keys that already carry a `-----BEGIN` line are returned unchanged.
/// Otherwise whitespace is removed, the body is folded to 64-character
/// lines and framed with `BEGIN CERTIFICATE` / `END CERTIFICATE`, ending in
/// a newline.
///
/// ```
/// use palisade_jwt::normalize_public_key;
///
/// let pem = normalize_public_key("QUJD");
/// assert_eq!(pem, "-----BEGIN CERTIFICATE-----\nQUJD\n-----END CERTIFICATE-----\n");
/// ```
#[must_use]
pub fn normalize_public_key(key: &str) -> String {
    if key.contains("-----BEGIN") {
        return key.to_string();
    }

    let body: Vec<char> = key.chars().filter(|c| !c.is_whitespace()).collect();

    let mut pem = String::with_capacity(body.len() + body.len() / LINE_WIDTH + 64);
    pem.push_str(BEGIN);
    pem.push('\n');
    for line in body.chunks(LINE_WIDTH) {
        pem.extend(line);
        pem.push('\n');
    }
    pem.push_str(END);
    pem.push('\n');
    pem
}
