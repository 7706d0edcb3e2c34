use bbc_codes::Codes;
use bbc_parser::{FootnoteCounter, Parser, ParserSettings, SmileyMap};
use bbc_types::{Param, Quoting, TagGrammar, TagKind};
use std::sync::Arc;
use std::time::{Duration, Instant};

fn parser() -> Parser {
    Parser::new(Arc::new(Codes::standard().unwrap()))
}

fn parse(message: &str) -> String {
    parser().parse(message)
}

fn parser_with_disabled(disabled: &[&str]) -> Parser {
    let mut codes = Codes::standard().unwrap();
    codes.set_disabled(disabled).unwrap();
    Parser::new(Arc::new(codes))
}

fn parser_with(grammar: TagGrammar) -> Parser {
    let mut codes = Codes::standard().unwrap();
    codes.add_code(grammar);
    Parser::new(Arc::new(codes))
}

#[test]
fn plain_text() {
    assert_eq!(parse(""), "");
    assert_eq!(parse("hello\nworld"), "hello<br />world");
    assert_eq!(parse("a [ b ] c"), "a [ b ] c");
    assert_eq!(parse("x[unknown]y"), "x[unknown]y");
}

#[test]
fn smart_punctuation() {
    assert_eq!(parse("\u{201c}hi\u{201d}\u{2026}"), "\"hi\"...");
}

#[test]
fn simple_tags() {
    assert_eq!(
        parse("[b]hi[/b]"),
        "<strong class=\"bbc_strong\">hi</strong>"
    );
    assert_eq!(parse("[I]x[/i]"), "<em>x</em>");
    assert_eq!(parse("a[hr]b"), "a<hr />b");
}

#[test]
fn unterminated_tags_closed_at_end() {
    assert_eq!(parse("[b]hi"), "<strong class=\"bbc_strong\">hi</strong>");
    assert_eq!(parse("[b][i]x"), "<strong class=\"bbc_strong\"><em>x</em></strong>");
}

#[test]
fn closer_closes_everything_opened_after() {
    assert_eq!(
        parse("[b][i]x[/b]y"),
        "<strong class=\"bbc_strong\"><em>x</em></strong>y"
    );
}

#[test]
fn stray_closer_kept() {
    assert_eq!(parse("a[/b]c"), "a[/b]c");
    assert_eq!(parse("[b]a[/]c[/b]"), "<strong class=\"bbc_strong\">a[/]c</strong>");
}

#[test]
fn block_tag_closes_inline_tags() {
    // The inline closer cannot reach past the quote and stays text.
    assert_eq!(
        parse("[i][quote]x[/i]"),
        "<em></em><div class=\"quoteheader\">Quote</div>\
         <blockquote class=\"bbc_standard_quote\">x[/i]</blockquote>"
    );
}

#[test]
fn unparsed_content() {
    assert_eq!(
        parse("[code]a [b]x[/b][/code]"),
        "<div class=\"codeheader\">Code</div><pre class=\"bbc_code prettyprint\">a [b]x[/b]</pre>"
    );
    assert_eq!(parse("[nobbc][b]x[/b][/nobbc]"), "[b]x[/b]");
}

#[test]
fn incomplete_tag_left_as_text() {
    assert_eq!(parse("[code]x"), "[code]x");
    assert_eq!(parse("[url=http://a.com"), "[url=http://a.com");
}

#[test]
fn equals_value() {
    assert_eq!(
        parse("[url=http://a.com]site[/url]"),
        "<a href=\"http://a.com\" class=\"bbc_link\" target=\"_blank\">site</a>"
    );
    assert_eq!(
        parse("[url=&quot;a.com&quot;]site[/url]"),
        "<a href=\"http://a.com\" class=\"bbc_link\" target=\"_blank\">site</a>"
    );
    assert_eq!(
        parse("[color=red]x[/color]"),
        "<span style=\"color: red;\" class=\"bbc_color\">x</span>"
    );
}

#[test]
fn test_pattern_rejects_value() {
    assert_eq!(parse("[color=red;x]y[/color]"), "[color=red;x]y[/color]");
}

#[test]
fn parameters_in_any_order() {
    let expected = "<img src=\"http://x.com/a.png\" title=\"\" alt=\"\" \
        style=\"width:100%;max-width:100px;max-height:50px;\" class=\"bbc_img resized\" />";
    assert_eq!(
        parse("[img width=100 height=50]http://x.com/a.png[/img]"),
        expected
    );
    assert_eq!(
        parse("[img height=50 width=100]http://x.com/a.png[/img]"),
        expected
    );
}

#[test]
fn quote_parameters() {
    assert_eq!(
        parse("[quote author=Bob date=0]x[/quote]"),
        "<div class=\"quoteheader\">Quote from: Bob on January 01, 1970, 12:00:00 AM</div>\
         <blockquote class=\"bbc_standard_quote\">x</blockquote>"
    );
}

#[test]
fn nested_quotes_alternate() {
    assert_eq!(
        parse("[quote]a[quote]b[/quote][/quote]"),
        "<div class=\"quoteheader\">Quote</div><blockquote class=\"bbc_standard_quote\">a\
         <div class=\"quoteheader\">Quote</div><blockquote class=\"bbc_alternate_quote\">b\
         </blockquote></blockquote>"
    );
}

#[test]
fn parsed_equals_value() {
    assert_eq!(
        parse("[quote=Bob]hi[/quote]"),
        "<div class=\"quoteheader\">Quote from: Bob</div>\
         <blockquote class=\"bbc_standard_quote\">hi</blockquote>"
    );
    // Only links are parsed in the value.
    let html = parse("[quote=&quot;[b]Bob[/b] [url]http://a.com[/url]&quot;]hi[/quote]");
    assert!(html.contains("Quote from: [b]Bob[/b] <a href=\"http://a.com\""));
}

#[test]
fn item_codes_build_a_list() {
    assert_eq!(
        parse("[*]one\n[*]two\nafter"),
        "<ul style=\"list-style-type: disc\" class=\"bbc_list\"><li>one</li><li>two</li></ul>after"
    );
}

#[test]
fn zero_item_code_needs_separator() {
    assert_eq!(parse("x[0]"), "x[0]");
}

#[test]
fn list_and_table() {
    assert_eq!(
        parse("[list]\n[li]a[/li]\n[/list]"),
        "<ul class=\"bbc_list\"><li>a</li></ul>"
    );
    assert_eq!(
        parse("[table][tr][td]a[/td][/tr][/table]"),
        "<div class=\"bbc_table_container\"><table class=\"bbc_table\">\
         <tr><td>a</td></tr></table></div>"
    );
}

#[test]
fn disabled_tags() {
    let mut parser = parser_with_disabled(&["b", "url"]);
    assert_eq!(parser.parse("[b]hi[/b]"), "hi");
    assert_eq!(
        parser.parse("[url=http://a.com]site[/url]"),
        "site (http://a.com)"
    );
    // Links are not detected while the tag is disabled.
    assert_eq!(parser.parse("see http://a.com"), "see http://a.com");
}

#[test]
fn bare_links() {
    assert_eq!(
        parse("go to http://example.com now"),
        "go to <a href=\"http://example.com\" class=\"bbc_link\" target=\"_blank\">\
         http://example.com</a> now"
    );
    // Code content is final.
    assert_eq!(
        parse("[code]http://example.com[/code]"),
        "<div class=\"codeheader\">Code</div>\
         <pre class=\"bbc_code prettyprint\">http://example.com</pre>"
    );

    let mut parser = parser().with_settings(ParserSettings {
        autolink_urls: false,
        ..Default::default()
    });
    assert_eq!(parser.parse("http://example.com"), "http://example.com");
}

#[test]
fn tabs_kept_visible() {
    assert_eq!(parse("a\tb"), "a&nbsp;&nbsp;&nbsp;b");
}

#[test]
fn no_cache_tags() {
    let mut parser = parser();
    let html = parser.parse("[time]0[/time]");
    assert_eq!(
        html,
        "<time class=\"bbc_time\">January 01, 1970, 12:00:00 AM</time>"
    );
    assert!(!parser.can_cache_result());

    parser.parse("[b]x[/b]");
    assert!(parser.can_cache_result());
}

#[test]
fn footnotes_numbered_across_messages() {
    let mut parser = parser();
    let mut counter = FootnoteCounter::new(2);
    let html = parser.parse_with_footnotes("a[footnote]note[/footnote]", &mut counter);
    assert_eq!(counter.total(), 3);
    assert_eq!(
        html,
        "a<sup class=\"bbc_footnotes\">\
         <a class=\"target\" href=\"#fn1_2\" id=\"ref1_2\">[1]</a></sup>\
         <div class=\"bbc_footnotes\"><div class=\"target\" id=\"fn1_2\"><sup>1&nbsp;</sup>note\
         <a class=\"footnote_return\" href=\"#ref1_2\">&crarr;</a></div></div>"
    );
}

#[test]
fn smileys_only_in_text() {
    let mut parser = parser().with_smiley_parser(SmileyMap::standard("/s"));
    let html = parser.parse("hi :) [code]:)[/code]");
    assert_eq!(html.matches("smiley.gif").count(), 1);
    assert!(html.contains("prettyprint\">:)</pre>"));

    parser.enable_smileys(false);
    assert_eq!(parser.parse("hi :)"), "hi :)");
}

#[test]
fn bbc_off() {
    let mut parser = parser().with_settings(ParserSettings {
        enable_bbc: false,
        ..Default::default()
    });
    assert_eq!(parser.parse("[b]x[/b]\n"), "[b]x[/b]\n");
}

#[test]
fn escaped_html() {
    let mut parser = parser().with_settings(ParserSettings {
        enable_post_html: true,
        ..Default::default()
    });
    assert_eq!(parser.parse("a&lt;br&gt;b"), "a<br />b");
}

#[test]
fn unmatched_parameter_tags_are_cheap() {
    let message = "[img q]x ".repeat(2000);
    let start = Instant::now();
    let html = parse(&message);
    assert!(start.elapsed() < Duration::from_secs(5));
    assert_eq!(html.matches("[img q]").count(), 2000);
}

#[test]
fn parameter_orders_are_bounded() {
    let params = (1..=8)
        .map(|i| Param::optional(format!("p{i}")).pattern(r"\d+"))
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    let grammar = TagGrammar::new(
        "box",
        TagKind::parsed_content("<div data-a=\"{p1}\" data-b=\"{p8}\">", "</div>"),
    )
    .params(params);
    let mut parser = parser_with(grammar);

    // No order of eight parameters matches, the search gives up and leaves the text.
    assert_eq!(parser.parse("[box p1=x]y[/box]"), "[box p1=x]y[/box]");
    // Only orders starting with the first parameter fit under the bound.
    assert_eq!(parser.parse("[box p8=8 p1=1]y[/box]"), "[box p8=8 p1=1]y[/box]");
    assert_eq!(
        parser.parse("[box p1=1 p8=8]y[/box]"),
        "<div data-a=\"1\" data-b=\"8\">y</div>"
    );
}

#[test]
fn smileys_in_footnote_with_tags() {
    let mut parser = parser().with_smiley_parser(SmileyMap::standard("/s"));
    let html = parser.parse("a[footnote][b]x[/b] ;)[/footnote]");
    assert_eq!(html.matches("wink.gif").count(), 1);
    assert!(html.contains("<strong class=\"bbc_strong\">x</strong> <img src=\"/s/wink.gif\""));
    assert!(html.contains("&crarr;</a></div></div>"));
    assert!(!html.contains('\r'));
}

#[test]
fn no_cache_tag_in_parsed_value() {
    let grammar = TagGrammar::new(
        "spoiler",
        TagKind::parsed_equals("<details><summary>$1</summary>", "</details>")
            .with_quoting(Quoting::Optional),
    );
    let mut parser = parser_with(grammar);

    let html = parser.parse("[spoiler=&quot;[time]0[/time]&quot;]x[/spoiler]");
    assert!(html.starts_with("<details><summary><time class=\"bbc_time\">"));
    assert!(html.ends_with("</summary>x</details>"));
    assert!(!parser.can_cache_result());

    parser.parse("[spoiler=&quot;[b]y[/b]&quot;]x[/spoiler]");
    assert!(parser.can_cache_result());
}

#[test]
fn comma_values() {
    assert_eq!(
        parse("[glow=red,2,300]x[/glow]"),
        "<span style=\"text-shadow: red 1px 1px 300\">x</span>"
    );
    assert_eq!(parse("[glow=red]x[/glow]"), "[glow=red]x[/glow]");
}

#[test]
fn comma_values_with_content() {
    assert_eq!(
        parse("[flash=200,100]http://a.com/f.swf[/flash]"),
        "<object type=\"application/x-shockwave-flash\" data=\"http://a.com/f.swf\" \
         width=\"200\" height=\"100\"><param name=\"movie\" value=\"http://a.com/f.swf\" />\
         </object>"
    );
}

#[test]
fn equals_value_with_content() {
    assert_eq!(
        parse("[code=php]x[/code]"),
        "<div class=\"codeheader\">Code: (php)</div><pre class=\"bbc_code prettyprint\">x</pre>"
    );
}

#[test]
fn denied_children_inherited_by_descendants() {
    assert_eq!(
        parse("[url=http://a.com][b][url]http://b.com[/url][/b][/url]"),
        "<a href=\"http://a.com\" class=\"bbc_link\" target=\"_blank\">\
         <strong class=\"bbc_strong\">[url]http://b.com</strong></a>[/b][/url]"
    );
}

#[test]
fn disallowed_parent_uses_replacement() {
    assert_eq!(
        parse("[quote][footnote]x[/footnote][/quote]"),
        "<div class=\"quoteheader\">Quote</div>\
         <blockquote class=\"bbc_standard_quote\">x</blockquote>"
    );
}

#[test]
fn container_closed_by_foreign_child() {
    assert_eq!(
        parse("[list][b]x[/b]"),
        "<ul class=\"bbc_list\"></ul><strong class=\"bbc_strong\">x</strong>"
    );
}

#[test]
fn block_closer_closes_nested_tags() {
    assert_eq!(
        parse("[quote][center][b]x[/quote]"),
        "<div class=\"quoteheader\">Quote</div><blockquote class=\"bbc_standard_quote\">\
         <div class=\"centertext\"><strong class=\"bbc_strong\">x</strong></div></blockquote>"
    );
}
