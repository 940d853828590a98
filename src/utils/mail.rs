//! Single-mailbox parsing for the `[mailer] FROM` value.

/// A parsed `Display Name <local@domain>` mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mailbox {
    pub name: String,
    pub address: String,
}

/// Parses one RFC 5322 mailbox: either a bare `addr-spec` or
/// `[display-name] <addr-spec>`, where the display name may be quoted.
pub fn parse_address(input: &str) -> Result<Mailbox, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("mail: no address".to_string());
    }

    if let Some(open) = input.rfind('<') {
        let close = input[open..]
            .find('>')
            .map(|i| open + i)
            .ok_or_else(|| "mail: unclosed angle-addr".to_string())?;
        if !input[close + 1..].trim().is_empty() {
            return Err("mail: expected single address".to_string());
        }
        let name = parse_display_name(input[..open].trim())?;
        let address = validate_addr_spec(input[open + 1..close].trim())?;
        return Ok(Mailbox { name, address });
    }

    if input.contains('>') {
        return Err("mail: unexpected '>'".to_string());
    }
    let address = validate_addr_spec(input)?;
    Ok(Mailbox {
        name: String::new(),
        address,
    })
}

fn parse_display_name(raw: &str) -> Result<String, String> {
    if raw.is_empty() {
        return Ok(String::new());
    }
    if let Some(inner) = raw.strip_prefix('"') {
        let inner = inner
            .strip_suffix('"')
            .ok_or_else(|| "mail: unclosed quoted-string".to_string())?;
        let mut name = String::with_capacity(inner.len());
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some(escaped) => name.push(escaped),
                    None => return Err("mail: bad quoted-string".to_string()),
                }
            } else {
                name.push(c);
            }
        }
        return Ok(name);
    }
    if raw.chars().any(|c| matches!(c, '"' | '<' | '>' | '@' | ',' | ';' | ':')) {
        return Err(format!("mail: invalid display name '{raw}'"));
    }
    Ok(raw.split_whitespace().collect::<Vec<_>>().join(" "))
}

fn validate_addr_spec(spec: &str) -> Result<String, String> {
    let (local, domain) = spec
        .rsplit_once('@')
        .ok_or_else(|| "mail: missing @ in addr-spec".to_string())?;
    if local.is_empty() {
        return Err("mail: missing local part".to_string());
    }
    if domain.is_empty() {
        return Err("mail: no domain in addr-spec".to_string());
    }
    let forbidden = |c: char| c.is_whitespace() || matches!(c, '<' | '>' | '(' | ')' | ',' | ';' | ':' | '"');
    if local.chars().any(forbidden) || domain.chars().any(forbidden) || domain.contains('@') {
        return Err(format!("mail: invalid addr-spec '{spec}'"));
    }
    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err(format!("mail: invalid domain '{domain}'"));
    }
    Ok(spec.to_string())
}
