use crate::validate;
use crate::CodesError;
use bbc_types::{Param, Quoting, TagGrammar, TagKind, Trim};

/// Css colors by name, hex or rgb().
const COLOR: &str =
    r"#[\da-fA-F]{3}|#[\da-fA-F]{6}|[A-Za-z]{1,20}|rgb\(\d{1,3}, ?\d{1,3}, ?\d{1,3}\)";

const LIST_TYPES: &str = "none|disc|circle|square|decimal|decimal-leading-zero|\
    lower-roman|upper-roman|lower-alpha|upper-alpha|lower-greek|lower-latin|upper-latin|\
    hebrew|armenian|georgian|cjk-ideographic|hiragana|katakana|hiragana-iroha|katakana-iroha";

const FONT_SIZE: &str =
    r"[1-7]|[\d.]{1,4}(?:px|pt|em)|(?:x{1,2}-)?(?:small|large)|medium|larger|smaller";

const LINK: &str = "<a href=\"$1\" class=\"bbc_link\" target=\"_blank\">";

const INNER_LINK: &str = "<a href=\"$1\" class=\"bbc_link\">";

const EMAIL: &str = "<a href=\"mailto:$1\" class=\"bbc_email\">";

const QUOTE_AUTHOR: &str = r"[^<>\]]{1,192}?";

/// The standard tag set.
pub(crate) fn grammars() -> Result<Vec<TagGrammar>, CodesError> {
    let grammars = vec![
        // Inline formatting.
        TagGrammar::new("b", TagKind::parsed_content("<strong class=\"bbc_strong\">", "</strong>")),
        TagGrammar::new("i", TagKind::parsed_content("<em>", "</em>")),
        TagGrammar::new("u", TagKind::parsed_content("<span class=\"bbc_u\">", "</span>")),
        TagGrammar::new("s", TagKind::parsed_content("<del>", "</del>")),
        TagGrammar::new("sub", TagKind::parsed_content("<sub>", "</sub>")),
        TagGrammar::new("sup", TagKind::parsed_content("<sup>", "</sup>")),
        TagGrammar::new("tt", TagKind::parsed_content("<span class=\"bbc_tt\">", "</span>")),
        TagGrammar::new("pre", TagKind::parsed_content("<pre class=\"bbc_pre\">", "</pre>")),
        TagGrammar::new(
            "color",
            TagKind::unparsed_equals("<span style=\"color: $1;\" class=\"bbc_color\">", "</span>"),
        )
        .test(COLOR)?,
        TagGrammar::new(
            "size",
            TagKind::unparsed_equals(
                "<span style=\"font-size: $1;\" class=\"bbc_size\">",
                "</span>",
            ),
        )
        .test(FONT_SIZE)?
        .validate(validate::size),
        TagGrammar::new(
            "font",
            TagKind::unparsed_equals(
                "<span style=\"font-family: $1;\" class=\"bbc_font\">",
                "</span>",
            ),
        )
        .test(r"[A-Za-z0-9_,\-\s]+")?,
        TagGrammar::new(
            "glow",
            TagKind::unparsed_commas("<span style=\"text-shadow: $1 1px 1px $3\">", "</span>"),
        )
        .test(r"[#0-9a-zA-Z\-]{3,12},(?:[012]\d{1,2}|\d{1,2})(?:,[^\]]+)?")?,
        TagGrammar::new(
            "abbr",
            TagKind::unparsed_equals("<abbr title=\"$1\">", "</abbr>")
                .with_quoting(Quoting::Optional),
        )
        .disabled_after(" ($1)"),
        TagGrammar::new("anchor", TagKind::unparsed_equals("<span id=\"post_$1\">", "</span>"))
            .test(r"#?[A-Za-z][A-Za-z0-9_\-]*")?,
        TagGrammar::new(
            "member",
            TagKind::unparsed_equals(
                "<a href=\"?action=profile;u=$1\" class=\"mention\">@",
                "</a>",
            ),
        )
        .test(r"\d+")?
        .disabled_before("@")
        .disabled_after(""),
        // Alignment and layout.
        TagGrammar::new("center", TagKind::parsed_content("<div class=\"centertext\">", "</div>"))
            .block_level(),
        TagGrammar::new(
            "left",
            TagKind::parsed_content("<div style=\"text-align: left;\">", "</div>"),
        )
        .block_level(),
        TagGrammar::new(
            "right",
            TagKind::parsed_content("<div style=\"text-align: right;\">", "</div>"),
        )
        .block_level(),
        TagGrammar::new("br", TagKind::closed("<br />")),
        TagGrammar::new("hr", TagKind::closed("<hr />")).block_level(),
        TagGrammar::new(
            "me",
            TagKind::unparsed_equals("<div class=\"meaction\">&nbsp;$1 ", "</div>")
                .with_quoting(Quoting::Optional),
        )
        .block_level()
        .disabled_before("/me ")
        .disabled_after("<br />"),
        // Code and verbatim content.
        TagGrammar::new(
            "code",
            TagKind::unparsed_content(
                "<div class=\"codeheader\">Code</div>\
                 <pre class=\"bbc_code prettyprint\">$1</pre>",
            ),
        )
        .block_level()
        .no_autolink()
        .disabled_content("<pre>$1</pre>")
        .validate(validate::code),
        TagGrammar::new(
            "code",
            TagKind::unparsed_equals_content(
                "<div class=\"codeheader\">Code: ($2)</div>\
                 <pre class=\"bbc_code prettyprint\">$1</pre>",
            ),
        )
        .block_level()
        .no_autolink()
        .disabled_content("<pre>$1</pre>")
        .validate(validate::code),
        TagGrammar::new("nobbc", TagKind::unparsed_content("$1")).no_autolink(),
        TagGrammar::new("html", TagKind::unparsed_content("<div>$1</div>"))
            .block_level()
            .no_autolink()
            .disabled_content("$1")
            .validate(validate::html),
        TagGrammar::new("time", TagKind::unparsed_content("<time class=\"bbc_time\">$1</time>"))
            .no_cache()
            .disabled_content("$1")
            .validate(validate::time),
        // Quotes, most specific first.
        TagGrammar::new(
            "quote",
            TagKind::parsed_content(
                "<div class=\"quoteheader\">\
                 <a href=\"?{link}\">Quote from: {author}{date}</a></div><blockquote>",
                "</blockquote>",
            ),
        )
        .params(vec![
            Param::required("author").pattern(QUOTE_AUTHOR)?,
            Param::required("link").pattern(r"(?:topic|msg)=[\d.#msg]{1,40}")?,
            Param::optional("date").pattern(r"\d+")?.filter(date),
        ])
        .block_level(),
        TagGrammar::new(
            "quote",
            TagKind::parsed_content(
                "<div class=\"quoteheader\">Quote from: {author}{date}</div><blockquote>",
                "</blockquote>",
            ),
        )
        .params(vec![
            Param::required("author").pattern(QUOTE_AUTHOR)?,
            Param::optional("date").pattern(r"\d+")?.filter(date),
        ])
        .block_level(),
        TagGrammar::new(
            "quote",
            TagKind::parsed_equals(
                "<div class=\"quoteheader\">Quote from: $1</div><blockquote>",
                "</blockquote>",
            )
            .with_quoting(Quoting::Optional)
            .with_parsed_tags(["url", "iurl"]),
        )
        .block_level(),
        TagGrammar::new(
            "quote",
            TagKind::parsed_content(
                "<div class=\"quoteheader\">Quote</div><blockquote>",
                "</blockquote>",
            ),
        )
        .block_level(),
        // Links.
        TagGrammar::new("url", TagKind::unparsed_content(format!("{LINK}$1</a>")))
            .no_autolink()
            .disabled_content("$1")
            .validate(validate::link),
        TagGrammar::new(
            "url",
            TagKind::unparsed_equals(LINK, "</a>").with_quoting(Quoting::Optional),
        )
        .no_autolink()
        .disallow_children(["email", "url", "iurl"])
        .disabled_after(" ($1)")
        .validate(validate::link),
        TagGrammar::new("iurl", TagKind::unparsed_content(format!("{INNER_LINK}$1</a>")))
            .no_autolink()
            .disabled_content("$1")
            .validate(validate::inner_link),
        TagGrammar::new(
            "iurl",
            TagKind::unparsed_equals(INNER_LINK, "</a>").with_quoting(Quoting::Optional),
        )
        .no_autolink()
        .disallow_children(["email", "url", "iurl"])
        .disabled_after(" ($1)")
        .validate(validate::inner_link),
        TagGrammar::new("email", TagKind::unparsed_content(format!("{EMAIL}$1</a>")))
            .no_autolink()
            .disabled_content("$1")
            .validate(validate::email),
        TagGrammar::new("email", TagKind::unparsed_equals(EMAIL, "</a>"))
            .no_autolink()
            .disallow_children(["email", "url", "iurl"])
            .disabled_after(" ($1)")
            .validate(validate::email),
        // Media.
        TagGrammar::new(
            "img",
            TagKind::unparsed_content(
                "<img src=\"$1\" title=\"{title}\" alt=\"{alt}\" style=\"{width}{height}\" \
                 class=\"bbc_img resized\" />",
            ),
        )
        .params(vec![
            Param::optional("alt"),
            Param::optional("width")
                .pattern(r"\d+")?
                .value("width:100%;max-width:$1px;"),
            Param::optional("height")
                .pattern(r"\d+")?
                .value("max-height:$1px;"),
            Param::optional("title"),
        ])
        .disabled_content("($1)")
        .validate(validate::link),
        TagGrammar::new(
            "img",
            TagKind::unparsed_content("<img src=\"$1\" alt=\"\" class=\"bbc_img\" />"),
        )
        .disabled_content("($1)")
        .validate(validate::link),
        TagGrammar::new(
            "flash",
            TagKind::unparsed_commas_content(
                "<object type=\"application/x-shockwave-flash\" data=\"$1\" width=\"$2\" \
                 height=\"$3\"><param name=\"movie\" value=\"$1\" /></object>",
            ),
        )
        .test(r"\d+,\d+")?
        .disabled_content("<a href=\"$1\" target=\"_blank\" class=\"new_win\">$1</a>")
        .validate(validate::link),
        // Lists.
        TagGrammar::new(
            "list",
            TagKind::parsed_content(
                "<ul class=\"bbc_list\" style=\"list-style-type: {type};\">",
                "</ul>",
            ),
        )
        .params(vec![Param::required("type").pattern(LIST_TYPES)?])
        .block_level()
        .trim(Trim::Inside)
        .require_children(["li", "list"]),
        TagGrammar::new("list", TagKind::parsed_content("<ul class=\"bbc_list\">", "</ul>"))
            .block_level()
            .trim(Trim::Inside)
            .require_children(["li", "list"]),
        TagGrammar::new("li", TagKind::parsed_content("<li>", "</li>"))
            .block_level()
            .trim(Trim::Outside)
            .require_parents(["list"])
            .disabled_before("")
            .disabled_after("<br />"),
        // Tables.
        TagGrammar::new(
            "table",
            TagKind::parsed_content(
                "<div class=\"bbc_table_container\"><table class=\"bbc_table\">",
                "</table></div>",
            ),
        )
        .block_level()
        .trim(Trim::Inside)
        .require_children(["tr"]),
        TagGrammar::new("tr", TagKind::parsed_content("<tr>", "</tr>"))
            .block_level()
            .trim(Trim::Both)
            .require_parents(["table"])
            .require_children(["td", "th"]),
        TagGrammar::new("td", TagKind::parsed_content("<td>", "</td>"))
            .block_level()
            .trim(Trim::Outside)
            .require_parents(["tr"])
            .disabled_before("")
            .disabled_after(""),
        TagGrammar::new("th", TagKind::parsed_content("<th>", "</th>"))
            .block_level()
            .trim(Trim::Outside)
            .require_parents(["tr"])
            .disabled_before("")
            .disabled_after(""),
        // Footnotes, collected at the end of the message.
        TagGrammar::new(
            "footnote",
            TagKind::parsed_content("<sup class=\"bbc_footnotes\">%fn%", "%fn%</sup>"),
        )
        .block_level()
        .trim(Trim::Both)
        .disallow_parents(["quote", "anchor", "footnote", "code"], Some(("", ""))),
    ];

    Ok(grammars)
}

/// `date` parameter of quotes.
fn date(value: &str) -> String {
    match validate::format_time(value) {
        Some(v) => format!(" on {v}"),
        None => String::new(),
    }
}
