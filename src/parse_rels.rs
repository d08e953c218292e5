use crate::parse_xml::{inner_end, parse_document, xml_text};
use crate::xml_edit::{apply_splices, escape_attr, Splice};
use crate::Result;

/// A single `<Relationship>` entry of a `.rels` part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
}

/// Parses relationship (`.rels`) XML data into its entries.
///
/// Entries missing one of `Id`, `Type` or `Target` are skipped.
///
/// # Errors
///
/// An error is returned if the data is not valid UTF-8 or not well-formed XML.
pub fn parse_rels(xml_data: &[u8]) -> Result<Vec<Relationship>> {
    let xml_str = xml_text(xml_data)?;
    let doc = parse_document(xml_str)?;
    let root = doc.root_element();

    let mut rels = Vec::new();
    for rel in root.children().filter(|n| n.is_element() && n.tag_name().name() == "Relationship") {
        if let (Some(id), Some(rel_type), Some(target)) =
            (rel.attribute("Id"), rel.attribute("Type"), rel.attribute("Target"))
        {
            rels.push(Relationship {
                id: id.to_string(),
                rel_type: rel_type.to_string(),
                target: target.to_string(),
            });
        }
    }

    Ok(rels)
}

/// First `rId<n>` not used by `rels`.
pub fn next_rel_id(rels: &[Relationship]) -> String {
    let max = rels
        .iter()
        .filter_map(|rel| rel.id.strip_prefix("rId"))
        .filter_map(|num| num.parse::<u32>().ok())
        .max()
        .unwrap_or(0);
    format!("rId{}", max + 1)
}

/// Appends a relationship to an existing `.rels` part.
pub fn append_relationship(xml_data: &[u8], rel: &Relationship) -> Result<String> {
    let xml_str = xml_text(xml_data)?;
    let doc = parse_document(xml_str)?;
    let root = doc.root_element();

    let entry = format!(
        r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
        escape_attr(&rel.id),
        escape_attr(&rel.rel_type),
        escape_attr(&rel.target)
    );

    let splice = match inner_end(&root) {
        Some(at) => Splice::insert(at, entry),
        None => {
            // `<Relationships .../>` with no entries yet
            let range = root.range();
            let open = &xml_str[range.start..range.end - 2];
            Splice::replace(range, format!("{open}>{entry}</Relationships>"))
        }
    };
    Ok(apply_splices(xml_str, vec![splice]))
}

/// Removes every relationship whose type is one of `rel_types`.
pub fn remove_relationships_of_types(xml_data: &[u8], rel_types: &[&str]) -> Result<String> {
    let xml_str = xml_text(xml_data)?;
    let doc = parse_document(xml_str)?;

    let splices = doc
        .root_element()
        .children()
        .filter(|n| n.is_element() && n.tag_name().name() == "Relationship")
        .filter(|n| n.attribute("Type").is_some_and(|t| rel_types.contains(&t)))
        .map(|n| Splice::replace(n.range(), ""))
        .collect();

    Ok(apply_splices(xml_str, splices))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{COMMENTS_REL_TYPE, NOTES_SLIDE_REL_TYPE, SLIDE_OWNED_REL_TYPES, SLIDE_REL_TYPE};
    use std::fs;
    use std::path::PathBuf;

    fn load_xml(filename: &str) -> Vec<u8> {
        let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
        path.push("tests");
        path.push("test_data");
        path.push("xml");
        path.push(filename);
        fs::read(path).expect("Unable to read test data file")
    }

    #[test]
    fn test_parse_slide_rels() {
        let xml_data = load_xml("slide1.xml.rels");
        let rels = parse_rels(&xml_data).expect("rels should parse");

        assert_eq!(rels.len(), 3);
        assert_eq!(rels[0].id, "rId1");
        assert!(rels[0].rel_type.ends_with("/slideLayout"));
        assert_eq!(rels[0].target, "../slideLayouts/slideLayout1.xml");
        assert_eq!(rels[2].rel_type, NOTES_SLIDE_REL_TYPE);
    }

    #[test]
    fn test_next_rel_id() {
        let rels = parse_rels(&load_xml("presentation.xml.rels")).unwrap();
        assert_eq!(next_rel_id(&rels), "rId5");
        assert_eq!(next_rel_id(&[]), "rId1");
    }

    #[test]
    fn test_append_relationship() {
        let xml = append_relationship(
            &load_xml("presentation.xml.rels"),
            &Relationship {
                id: "rId5".into(),
                rel_type: SLIDE_REL_TYPE.into(),
                target: "slides/slide2.xml".into(),
            },
        )
        .unwrap();

        let rels = parse_rels(xml.as_bytes()).unwrap();
        let last = rels.last().unwrap();
        assert_eq!(last.id, "rId5");
        assert_eq!(last.target, "slides/slide2.xml");
    }

    #[test]
    fn test_append_relationship_to_empty_part() {
        let empty = br#"<?xml version="1.0"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"/>"#;
        let rel = Relationship { id: "rId1".into(), rel_type: "t".into(), target: "x.xml".into() };
        let xml = append_relationship(empty, &rel).unwrap();

        assert_eq!(parse_rels(xml.as_bytes()).unwrap(), vec![rel]);
    }

    #[test]
    fn test_remove_notes_relationship() {
        let xml = remove_relationships_of_types(&load_xml("slide1.xml.rels"), &[NOTES_SLIDE_REL_TYPE]).unwrap();
        let rels = parse_rels(xml.as_bytes()).unwrap();

        assert_eq!(rels.len(), 2);
        assert!(rels.iter().all(|r| r.rel_type != NOTES_SLIDE_REL_TYPE));
    }

    #[test]
    fn test_remove_slide_owned_relationships() {
        let rels = format!(
            r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/chart" Target="../charts/chart1.xml"/><Relationship Id="rId2" Type="{COMMENTS_REL_TYPE}" Target="../comments/comment1.xml"/><Relationship Id="rId3" Type="{NOTES_SLIDE_REL_TYPE}" Target="../notesSlides/notesSlide1.xml"/></Relationships>"#
        );
        let xml = remove_relationships_of_types(rels.as_bytes(), SLIDE_OWNED_REL_TYPES).unwrap();
        let rels = parse_rels(xml.as_bytes()).unwrap();

        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].target, "../charts/chart1.xml");
    }
}
