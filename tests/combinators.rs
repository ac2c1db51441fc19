use pretty_assertions::assert_eq;
use pull_xml::errors::Error;
use pull_xml::events::Event;
use pull_xml::name::QName;
use pull_xml::parse_str;

#[test]
fn people_and_ages() {
    let xml = r#"<people><person age="25">Michael</person><person age="2">Eliezer</person></people>"#;
    let mut reader = parse_str(xml);
    let people = reader
        .tag_no_attr("people", |r| {
            r.many(|r| {
                r.tag_name(
                    "person",
                    |attrs| attrs.require_attr("age"),
                    |r, age| Ok((age, r.content()?)),
                )
            })
        })
        .unwrap()
        .unwrap();
    assert_eq!(
        people,
        vec![
            ("25".to_string(), "Michael".to_string()),
            ("2".to_string(), "Eliezer".to_string()),
        ]
    );
}

#[test]
fn leftover_attributes_are_an_error() {
    let mut reader = parse_str(r#"<x a="1" b="2"/>"#);
    let result = reader.tag_name("x", |attrs| attrs.require_attr("a"), |_, a| Ok(a));
    match result {
        Err(Error::UnparsedAttributes(left)) => {
            assert_eq!(left.len(), 1);
            assert_eq!(left[0].name, QName::new("b"));
            assert_eq!(left[0].flat_value(), "2");
        }
        other => panic!("expected UnparsedAttributes, got {:?}", other),
    }
}

#[test]
fn ignore_attrs_accepts_leftovers() {
    let mut reader = parse_str(r#"<x a="1" b="2"/>"#);
    let a = reader
        .tag_name(
            "x",
            |attrs| {
                let a = attrs.require_attr("a")?;
                attrs.ignore_attrs();
                Ok(a)
            },
            |_, a| Ok(a),
        )
        .unwrap()
        .unwrap();
    assert_eq!(a, "1");
}

#[test]
fn whitespace_around_tags_is_transparent() {
    let xml = "<a>\n  <b>1</b>\n  <b>2</b>\n</a>";
    let mut reader = parse_str(xml);
    let values = reader
        .tag_no_attr("a", |r| r.many(|r| r.tag_no_attr("b", |r| r.content())))
        .unwrap()
        .unwrap();
    assert_eq!(values, vec!["1".to_string(), "2".to_string()]);
}

#[test]
fn mixed_content_is_not_skipped() {
    // non-whitespace text before the end tag must fail the tag combinator
    let mut reader = parse_str("<a>text</a>");
    let result = reader.tag_no_attr("a", |_| Ok(()));
    assert!(matches!(result, Err(Error::Expected { .. })));
}

#[test]
fn content_without_text_is_empty_and_does_not_advance() {
    let mut reader = parse_str("<a><b/></a>");
    reader
        .tag_no_attr("a", |r| {
            assert_eq!(r.content()?, "");
            // the <b/> is still there
            let got = r.tag_no_attr("b", |_| Ok(()))?;
            assert!(got.is_some());
            Ok(())
        })
        .unwrap()
        .unwrap();
}

#[test]
fn content_coalesces_fragments() {
    let mut reader = parse_str("<a>x&amp;y&foo;z</a>");
    let text = reader.tag_no_attr("a", |r| r.content()).unwrap().unwrap();
    assert_eq!(text, "x&y&foo;z");
}

#[test]
fn content_maybe_distinguishes_absence() {
    let mut reader = parse_str("<a><b/></a>");
    reader
        .tag_no_attr("a", |r| {
            assert_eq!(r.content_maybe()?, None);
            r.force("b element", |r| r.tag_no_attr("b", |_| Ok(())))
        })
        .unwrap()
        .unwrap();

    let mut reader = parse_str("<a> </a>");
    reader
        .tag_no_attr("a", |r| {
            assert_eq!(r.content_maybe()?, Some(" ".to_string()));
            Ok(())
        })
        .unwrap()
        .unwrap();
}

#[test]
fn choose_takes_the_first_match() {
    let mut reader = parse_str("<b>2</b>");
    let got = reader
        .choose(&mut [
            &mut |r: &mut _| r.tag_no_attr("a", |r| r.content()),
            &mut |r: &mut _| r.tag_no_attr("b", |r| r.content()),
        ])
        .unwrap();
    assert_eq!(got, Some("2".to_string()));
}

#[test]
fn choose_leaves_cursor_on_total_mismatch() {
    let mut reader = parse_str("<c/>");
    let got: Option<String> = reader
        .choose(&mut [
            &mut |r: &mut _| r.tag_no_attr("a", |r| r.content()),
            &mut |r: &mut _| r.tag_no_attr("b", |r| r.content()),
        ])
        .unwrap();
    assert_eq!(got, None);
    // the element is still fully consumable
    assert!(reader.tag_no_attr("c", |_| Ok(())).unwrap().is_some());
}

#[test]
fn choose_does_not_consume_leading_comments() {
    let mut reader = parse_str("<!--note--><b/>");
    let got: Option<()> = reader
        .choose(&mut [
            &mut |r: &mut _| r.tag_no_attr("a", |_| Ok(())),
            &mut |r: &mut _| r.tag_no_attr("b", |_| Ok(())),
        ])
        .unwrap();
    // a rejecting branch must not touch the comment, so nothing matches
    // until the consumer handles it
    assert_eq!(got, None);
    assert_eq!(
        reader.next_event().unwrap(),
        Some(Event::Comment("note".to_string()))
    );
    assert!(reader.tag_no_attr("b", |_| Ok(())).unwrap().is_some());
}

#[test]
fn only_blank_text_is_transparent_to_tags() {
    // a processing instruction between siblings stops tag matching; it
    // stays in the stream for the consumer
    let mut reader = parse_str("<r><a/><?skip me?><a/></r>");
    reader
        .tag_no_attr("r", |r| {
            let matched = r.many(|r| r.tag_no_attr("a", |_| Ok(())))?;
            assert_eq!(matched.len(), 1);
            match r.next_event()? {
                Some(Event::PI { target, .. }) => assert_eq!(target, "skip"),
                other => panic!("expected the instruction, got {:?}", other),
            }
            let matched = r.many(|r| r.tag_no_attr("a", |_| Ok(())))?;
            assert_eq!(matched.len(), 1);
            Ok(())
        })
        .unwrap()
        .unwrap();
}

#[test]
fn many_stops_at_first_mismatch() {
    let mut reader = parse_str("<r><a/><a/><b/></r>");
    reader
        .tag_no_attr("r", |r| {
            let matched = r.many(|r| r.tag_no_attr("a", |_| Ok(())))?;
            assert_eq!(matched.len(), 2);
            r.force("b element", |r| r.tag_no_attr("b", |_| Ok(())))
        })
        .unwrap()
        .unwrap();
}

#[test]
fn force_reports_the_offending_event() {
    let mut reader = parse_str("<b/>");
    let result = reader.force("a element", |r| r.tag_no_attr("a", |_| Ok(())));
    match result {
        Err(Error::Expected { msg, event }) => {
            assert_eq!(msg, "a element");
            assert!(matches!(event, Some(Event::Start(_))));
        }
        other => panic!("expected Expected error, got {:?}", other),
    }
}

#[test]
fn end_tag_mismatch_is_reported() {
    let mut reader = parse_str("<a></b>");
    let result = reader.tag_no_attr("a", |_| Ok(()));
    match result {
        Err(Error::EndEventMismatch { expected, found }) => {
            assert_eq!(expected, QName::new("a"));
            assert_eq!(found, QName::new("b"));
        }
        other => panic!("expected EndEventMismatch, got {:?}", other),
    }
}

#[test]
fn ignore_elem_skips_a_whole_subtree() {
    let mut reader = parse_str("<r><skip><deep><deeper/></deep></skip><keep/></r>");
    reader
        .tag_no_attr("r", |r| {
            assert_eq!(r.ignore_elem()?, Some(()));
            r.force("keep element", |r| r.tag_no_attr("keep", |_| Ok(())))
        })
        .unwrap()
        .unwrap();
}

#[test]
fn ignore_elem_does_not_cross_the_enclosing_end() {
    let mut reader = parse_str("<r></r>");
    reader
        .tag_no_attr("r", |r| {
            assert_eq!(r.ignore_elem()?, None);
            assert_eq!(r.ignore_elem()?, None);
            Ok(())
        })
        .unwrap()
        .unwrap();
}

#[test]
fn ignore_siblings_leaves_the_end_tag() {
    let mut reader = parse_str("<r><a/>text<b><c/></b></r>");
    reader
        .tag_no_attr("r", |r| {
            r.ignore_siblings()?;
            Ok(())
        })
        .unwrap()
        .unwrap();
}

#[test]
fn skip_till_finds_a_later_sibling() {
    let mut reader = parse_str("<r><a/><b/><c>hit</c><d/></r>");
    reader
        .tag_no_attr("r", |r| {
            let hit = r.skip_till(|r| r.tag_no_attr("c", |r| r.content()))?;
            assert_eq!(hit, Some("hit".to_string()));
            r.ignore_siblings()
        })
        .unwrap()
        .unwrap();
}

#[test]
fn skip_till_gives_up_at_end_of_siblings() {
    let mut reader = parse_str("<r><a/><b/></r>");
    reader
        .tag_no_attr("r", |r| {
            let miss: Option<()> = r.skip_till(|r| r.tag_no_attr("zzz", |_| Ok(())))?;
            assert_eq!(miss, None);
            Ok(())
        })
        .unwrap()
        .unwrap();
}

#[test]
fn skip_siblings_keeps_the_parse_result() {
    let mut reader = parse_str("<r><a>1</a><b/><c/></r>");
    let got = reader
        .tag_no_attr("r", |r| {
            r.skip_siblings(|r| r.tag_no_attr("a", |r| r.content()))
        })
        .unwrap()
        .unwrap();
    assert_eq!(got, Some("1".to_string()));
}

#[test]
fn nested_structures_compose() {
    let xml = r#"
        <library>
            <book id="1">
                <title>Dune</title>
                <author>Herbert</author>
            </book>
            <book id="2">
                <title>Solaris</title>
                <author>Lem</author>
            </book>
        </library>"#;
    let mut reader = parse_str(xml);
    let books = reader
        .force("library element", |r| {
            r.tag_no_attr("library", |r| {
                r.many(|r| {
                    r.tag_name(
                        "book",
                        |attrs| attrs.require_attr("id"),
                        |r, id| {
                            let title = r.force("title element", |r| {
                                r.tag_no_attr("title", |r| r.content())
                            })?;
                            let author = r.force("author element", |r| {
                                r.tag_no_attr("author", |r| r.content())
                            })?;
                            Ok((id, title, author))
                        },
                    )
                })
            })
        })
        .unwrap();
    assert_eq!(
        books,
        vec![
            (
                "1".to_string(),
                "Dune".to_string(),
                "Herbert".to_string()
            ),
            (
                "2".to_string(),
                "Solaris".to_string(),
                "Lem".to_string()
            ),
        ]
    );
}

#[test]
fn namespaced_tag_matching() {
    let xml = r#"<d:doc xmlns:d="urn:d"><d:item/></d:doc>"#;
    let mut reader = parse_str(xml);
    reader
        .force("doc element", |r| {
            r.tag_no_attr(QName::namespaced("doc", "urn:d"), |r| {
                r.force("item element", |r| {
                    r.tag_no_attr(QName::namespaced("item", "urn:d"), |_| Ok(()))
                })
            })
        })
        .unwrap();
}

#[test]
fn matcher_witness_reaches_the_attr_parser() {
    // a `tag` matcher can accept several names and tell the attribute
    // parser which one it saw
    let xml = r#"<circle r="5"/>"#;
    let mut reader = parse_str(xml);
    let shape = reader
        .tag(
            |name: &QName| match name.local.as_str() {
                "circle" | "square" => Some(name.local.clone()),
                _ => None,
            },
            |kind, attrs| {
                let size = match kind.as_str() {
                    "circle" => attrs.require_attr("r")?,
                    _ => attrs.require_attr("side")?,
                };
                Ok((kind, size))
            },
            |_, shape| Ok(shape),
        )
        .unwrap();
    assert_eq!(shape, Some(("circle".to_string(), "5".to_string())));
}
