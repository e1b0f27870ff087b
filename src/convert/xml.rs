// src/convert/xml.rs

//! Markup rendition: every line becomes an `<item>` nested by indentation
//! under a `<UVLData>` root.

use super::outline::{OutlineNode, outline};
use crate::error::{Error, Result};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use std::io::Cursor;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn xml_err(e: quick_xml::Error) -> Error {
    Error::ConversionError(format!("XML write failed: {e}"))
}

fn write_node(writer: &mut XmlWriter, node: &OutlineNode) -> Result<()> {
    let start = BytesStart::new("item").with_attributes([("name", node.text.as_str())]);
    if node.children.is_empty() {
        return writer.write_event(Event::Empty(start)).map_err(xml_err);
    }

    writer.write_event(Event::Start(start)).map_err(xml_err)?;
    for child in &node.children {
        write_node(writer, child)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("item")))
        .map_err(xml_err)
}

pub fn to_xml(content: &str) -> Result<String> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(xml_err)?;
    writer
        .write_event(Event::Start(BytesStart::new("UVLData")))
        .map_err(xml_err)?;
    for node in outline(content) {
        write_node(&mut writer, &node)?;
    }
    writer
        .write_event(Event::End(BytesEnd::new("UVLData")))
        .map_err(xml_err)?;

    let mut bytes = writer.into_inner().into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(|e| Error::ConversionError(e.to_string()))
}
