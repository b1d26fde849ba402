/// Normalize a substance name to a comparison key.
///
/// Steps:
/// 1. Lowercase
/// 2. Fold accented Latin letters to their base letter
/// 3. Replace spaces, hyphens, parentheses and other separators with underscores
/// 4. Collapse repeated underscores and trim them from both ends
///
/// "Lambda-Cyhalothrine" and "lambda cyhalothrine" share a key, as do
/// "Chlorpyrifos-méthyl" and "chlorpyrifos methyl".
pub fn normalize_substance(raw: &str) -> String {
    let lower = raw.trim().to_lowercase();

    let mut normalized = String::with_capacity(lower.len());
    for c in lower.chars() {
        match fold_diacritic(c) {
            Some(base) => normalized.push_str(base),
            None if c.is_ascii_alphanumeric() => normalized.push(c),
            None => normalized.push('_'),
        }
    }

    let mut result = String::with_capacity(normalized.len());
    let mut prev_underscore = true; // skips leading underscores
    for c in normalized.chars() {
        if c == '_' {
            if !prev_underscore {
                result.push('_');
            }
            prev_underscore = true;
        } else {
            result.push(c);
            prev_underscore = false;
        }
    }
    if result.ends_with('_') {
        result.pop();
    }

    result
}

/// Base letters for the accented characters that show up in European
/// residue names.
fn fold_diacritic(c: char) -> Option<&'static str> {
    let base = match c {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' => "a",
        'æ' => "ae",
        'ç' | 'č' | 'ć' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ě' => "e",
        'ì' | 'í' | 'î' | 'ï' => "i",
        'ñ' | 'ń' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' => "o",
        'œ' => "oe",
        'ß' => "ss",
        'š' | 'ś' => "s",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' => "u",
        'ý' | 'ÿ' => "y",
        'ž' | 'ź' | 'ż' => "z",
        _ => return None,
    };
    Some(base)
}
