/// Replace placeholders in `template` all at once.
///
/// At each position the longest matching key wins, so `$10` is not read as `$1` followed by
/// `0`. Replaced text is never scanned again.
pub(crate) fn substitute<K, V>(template: &str, pairs: &[(K, V)]) -> String
where
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut keys = pairs
        .iter()
        .map(|(k, v)| (k.as_ref(), v.as_ref()))
        .filter(|(k, _)| !k.is_empty())
        .collect::<Vec<_>>();
    if keys.is_empty() {
        return template.to_owned();
    }
    keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    'outer: while !rest.is_empty() {
        for (key, value) in &keys {
            if let Some(tail) = rest.strip_prefix(key) {
                out.push_str(value);
                rest = tail;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            out.push(ch);
        }
        rest = chars.as_str();
    }
    out
}

/// Positional placeholders `$1`, `$2`... for `values`.
pub(crate) fn positional<S: AsRef<str>>(values: &[S]) -> Vec<(String, String)> {
    values
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("${}", i + 1), v.as_ref().to_owned()))
        .collect()
}

/// Keep a parameter value from being read as a placeholder later.
pub(crate) fn escape_param(value: &str) -> String {
    value.replace('$', "&#036;").replace('{', "&#123;")
}
