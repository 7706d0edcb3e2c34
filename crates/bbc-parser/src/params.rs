use crate::template::{escape_param, substitute};
use bbc_types::Param;
use regex::Regex;
use std::collections::hash_map::{Entry, HashMap};
use tracing::{debug, trace};

/// Upper bound of parameter orders tried for one tag, 7!.
pub(crate) const MAX_PERMUTE_ITERATIONS: usize = 5040;

/// Parameters matched in an opening tag.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct ParamMatch {
    /// `{name}` placeholder and its rendered value, for every declared parameter.
    pub(crate) values: Vec<(String, String)>,

    /// Bytes matched, from the space after the tag name through the closing `]`.
    pub(crate) consumed: usize,
}

/// Compiled parameter patterns, keyed by their source.
///
/// Patterns are built from grammars only, so the cache is bounded by the registry.
#[derive(Debug, Default)]
pub(crate) struct ParamCache {
    compiled: HashMap<String, Regex>,
}

impl ParamCache {
    fn regex(&mut self, pattern: String) -> Option<&Regex> {
        match self.compiled.entry(pattern) {
            Entry::Occupied(x) => Some(x.into_mut()),
            Entry::Vacant(x) => {
                trace!("compiling parameter pattern {}", x.key());
                // Fragments come from patterns validated when the grammar was built.
                let re = Regex::new(x.key()).ok()?;
                Some(x.insert(re))
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.compiled.len()
    }
}

/// Match `text`, which starts right after the tag name, against `params` in any order.
///
/// Text that is not a run of ` name=...` pairs for known names is rejected before any order
/// is tried. Otherwise declared order comes first, then every other order until one matches
/// or [`MAX_PERMUTE_ITERATIONS`] orders were tried. Each order is compiled once per `cache`.
pub(crate) fn match_parameters(
    params: &[Param],
    text: &str,
    cache: &mut ParamCache,
) -> Option<ParamMatch> {
    if params.is_empty() {
        return None;
    }

    let shape = format!(
        r"(?is)^(?:\s+(?:{})=.*?)*?\]",
        params
            .iter()
            .map(|x| regex::escape(&x.name))
            .collect::<Vec<_>>()
            .join("|")
    );
    if !cache.regex(shape)?.is_match(text) {
        return None;
    }

    let fragments = params
        .iter()
        .enumerate()
        .map(|(i, p)| fragment(i, p))
        .collect::<Vec<_>>();
    let mut order = (0..params.len()).collect::<Vec<_>>();

    for _ in 0..MAX_PERMUTE_ITERATIONS {
        let pattern = format!(
            "(?i)^{}\\]",
            order.iter().map(|x| fragments[*x].as_str()).collect::<String>()
        );
        if let Some(captures) = cache.regex(pattern)?.captures(text) {
            let consumed = captures.get(0).map_or(0, |x| x.end());
            let values = params
                .iter()
                .enumerate()
                .map(|(i, p)| {
                    let value = captures
                        .name(&format!("v{i}"))
                        .map(|x| render_value(p, x.as_str()))
                        .unwrap_or_default();
                    (format!("{{{}}}", p.name), value)
                })
                .collect();
            return Some(ParamMatch { values, consumed });
        }
        if !next_permutation(&mut order) {
            return None;
        }
    }

    debug!("gave up matching parameters after {MAX_PERMUTE_ITERATIONS} orders");
    None
}

/// ` name=value` for parameter `i`, optional fragments may be absent.
fn fragment(i: usize, param: &Param) -> String {
    let quote = if param.quoted { "&quot;" } else { "" };
    let value = param.pattern.as_deref().unwrap_or(".+?");
    format!(
        r"(?P<p{i}>\s+{}={quote}(?P<v{i}>(?:{value})){quote}){}",
        regex::escape(&param.name),
        if param.optional { "?" } else { "" }
    )
}

fn render_value(param: &Param, value: &str) -> String {
    let rendered = if let Some(template) = &param.value {
        substitute(template, &[("$1", value)])
    } else if let Some(filter) = &param.filter {
        filter.call(value)
    } else {
        value.to_owned()
    };
    escape_param(&rendered)
}

/// Advance `order` to the next lexicographic permutation. `false` after the last one.
pub(crate) fn next_permutation(order: &mut [usize]) -> bool {
    let Some(i) = order.windows(2).rposition(|w| w[0] < w[1]) else {
        return false;
    };
    let Some(j) = order.iter().rposition(|x| *x > order[i]) else {
        return false;
    };
    order.swap(i, j);
    order[i + 1..].reverse();
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn img_params() -> Vec<Param> {
        vec![
            Param::optional("alt"),
            Param::optional("width")
                .pattern(r"\d+")
                .unwrap()
                .value("max-width:$1px;"),
            Param::optional("height").pattern(r"\d+").unwrap(),
        ]
    }

    fn matches(params: &[Param], text: &str) -> Option<ParamMatch> {
        match_parameters(params, text, &mut ParamCache::default())
    }

    fn value<'a>(m: &'a ParamMatch, key: &str) -> &'a str {
        m.values
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap()
    }

    #[test]
    fn declared_order() {
        let text = " alt=cat width=20]http://x/a.png[/img]";
        let m = matches(&img_params(), text).unwrap();
        assert_eq!(value(&m, "{alt}"), "cat");
        assert_eq!(value(&m, "{width}"), "max-width:20px;");
        assert_eq!(value(&m, "{height}"), "");
        assert_eq!(&text[..m.consumed], " alt=cat width=20]");
    }

    #[test]
    fn any_order_gives_same_values() {
        let a = matches(&img_params(), " width=20 height=10 alt=x]").unwrap();
        let b = matches(&img_params(), " height=10 alt=x width=20]").unwrap();
        assert_eq!(a.values, b.values);
    }

    #[test]
    fn required_parameter_missing() {
        let params = vec![Param::required("author"), Param::optional("date")];
        assert!(matches(&params, " date=1]").is_none());
        assert!(matches(&params, "]").is_none());
    }

    #[test]
    fn values_cannot_inject_placeholders() {
        let params = vec![Param::required("author")];
        let m = matches(&params, " author=${x}]").unwrap();
        assert_eq!(value(&m, "{author}"), "&#036;&#123;x}");
    }

    #[test]
    fn filter_and_quoting() {
        let params = vec![Param::required("name")
            .quoted()
            .filter(|x| x.to_uppercase())];
        let m = matches(&params, " name=&quot;bob&quot;]").unwrap();
        assert_eq!(value(&m, "{name}"), "BOB");
        assert!(matches(&params, " name=bob]").is_none());
    }

    #[test]
    fn unrelated_text_compiles_nothing_per_order() {
        let mut cache = ParamCache::default();
        for text in [" q]x", " alt]", " widthx=1]", " q]x [img alt=y]"] {
            assert!(match_parameters(&img_params(), text, &mut cache).is_none());
        }
        // Only the shape check.
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn compiled_orders_are_reused() {
        let mut cache = ParamCache::default();
        let text = " height=10 alt=x]";
        let first = match_parameters(&img_params(), text, &mut cache).unwrap();
        let compiled = cache.len();
        let again = match_parameters(&img_params(), text, &mut cache).unwrap();
        assert_eq!(first, again);
        assert_eq!(cache.len(), compiled);
    }

    #[test]
    fn permutations_in_order() {
        let mut order = vec![0, 1, 2];
        let mut seen = vec![order.clone()];
        while next_permutation(&mut order) {
            seen.push(order.clone());
        }
        assert_eq!(seen.len(), 6);
        assert_eq!(seen.last(), Some(&vec![2, 1, 0]));
    }
}
