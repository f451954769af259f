const ENTITIES: [(&str, &str); 2] = [("&#39;", "'"), ("&amp;", "&")];

/// Undo the HTML entity encoding that labels may have been stored with.
///
/// Decoding repeats until nothing changes, so decoding an already-decoded
/// string is a no-op.
pub fn decode_entities(text: &str) -> String {
    let mut decoded = text.to_string();
    loop {
        let next = ENTITIES
            .iter()
            .fold(decoded.clone(), |acc, (entity, plain)| acc.replace(entity, plain));
        if next == decoded {
            return decoded;
        }
        decoded = next;
    }
}
