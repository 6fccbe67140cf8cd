/// Normalises a user-entered email address (trimmed, lower-cased) and
/// applies a shape check: one `@`, a non-empty local part, a dotted domain,
/// no whitespace. Deliverability is the email provider's problem.
pub fn normalize(raw: &str) -> Option<String> {
    let email = raw.trim().to_lowercase();

    if email.chars().any(char::is_whitespace) {
        return None;
    }

    let (local, domain) = email.split_once('@')?;
    if local.is_empty() || domain.contains('@') {
        return None;
    }

    let labels_ok = domain.split('.').all(|label| !label.is_empty());
    if !domain.contains('.') || !labels_ok {
        return None;
    }

    Some(email)
}
