use std::io::Cursor;

use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use re3data_lib::types::RepositoryLink;
use re3data_lib::RepositoryRecord;

type XmlWriter = Writer<Cursor<Vec<u8>>>;

fn write_text(writer: &mut XmlWriter, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Writes the declaration and root element, calling `body` for the children.
/// An empty collection becomes a self-closing root.
fn document<F>(root_tag: &str, is_empty: bool, body: F) -> Result<String>
where
    F: FnOnce(&mut XmlWriter) -> Result<()>,
{
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    if is_empty {
        writer.write_event(Event::Empty(BytesStart::new(root_tag)))?;
    } else {
        writer.write_event(Event::Start(BytesStart::new(root_tag)))?;
        body(&mut writer)?;
        writer.write_event(Event::End(BytesEnd::new(root_tag)))?;
    }

    let buf = writer.into_inner().into_inner();
    Ok(String::from_utf8(buf)?)
}

/// One `<repository>` element per record; null columns are omitted.
pub fn records_to_xml(columns: &[String], records: &[RepositoryRecord]) -> Result<String> {
    document("repositories", records.is_empty(), |writer| {
        for record in records {
            writer.write_event(Event::Start(BytesStart::new("repository")))?;
            for column in columns {
                if let Some(value) = record.get(column) {
                    write_text(writer, column, value)?;
                }
            }
            writer.write_event(Event::End(BytesEnd::new("repository")))?;
        }
        Ok(())
    })
}

pub fn links_to_xml(links: &[RepositoryLink]) -> Result<String> {
    document("links", links.is_empty(), |writer| {
        for link in links {
            let mut start = BytesStart::new("link");
            if let Some(id) = link.repository_id() {
                start.push_attribute(("id", id));
            }
            start.push_attribute(("href", link.href()));
            writer.write_event(Event::Empty(start))?;
        }
        Ok(())
    })
}

pub fn counts_to_xml(title: &str, counts: &[(String, usize)]) -> Result<String> {
    document("counts", counts.is_empty(), |writer| {
        write_text(writer, "title", title)?;
        for (value, count) in counts {
            let mut start = BytesStart::new("count");
            start.push_attribute(("value", value.as_str()));
            writer.write_event(Event::Start(start))?;
            writer.write_event(Event::Text(BytesText::new(&count.to_string())))?;
            writer.write_event(Event::End(BytesEnd::new("count")))?;
        }
        Ok(())
    })
}
